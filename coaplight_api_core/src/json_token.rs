// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

//! Minimal, non-strict JSON tokenizer.
//!
//! The input is never copied: every token is a typed `[start, end)` byte range
//! over the input buffer. Strings exclude their quotes, containers include
//! their braces. Tokens are written into a fixed-capacity array, so a document
//! with more than [`MAX_TOKENS`] values fails with [`TokenizeError::NoMemory`]
//! instead of growing.

/// Capacity of the token array handed to the attribute scanner.
pub const MAX_TOKENS: usize = 10;

pub type Tokens = heapless::Vec<Token, MAX_TOKENS>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Object,
    Array,
    String,
    Primitive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    /// Returns the bytes covered by this token, or `None` if the token does
    /// not fit inside `input`.
    pub fn span<'a>(&self, input: &'a [u8]) -> Option<&'a [u8]> {
        input.get(self.start..self.end)
    }

    /// True if `other` lies strictly inside this token's span.
    pub fn strictly_contains(&self, other: &Token) -> bool {
        other.start > self.start && other.end < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizeError {
    /// More than [`MAX_TOKENS`] values in the document.
    NoMemory,
    /// Unexpected or mismatched character.
    Invalid,
    /// The document ends in the middle of a string or container.
    Partial,
}

impl core::fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TokenizeError::NoMemory => write!(f, "too many JSON tokens"),
            TokenizeError::Invalid => write!(f, "invalid JSON character"),
            TokenizeError::Partial => write!(f, "incomplete JSON document"),
        }
    }
}

#[derive(Clone, Copy)]
struct PendingToken {
    kind: TokenKind,
    start: usize,
    end: Option<usize>,
}

/// Tokenizes `input`. Parsing stops at the first NUL byte, if any.
pub fn tokenize(input: &[u8]) -> Result<Tokens, TokenizeError> {
    let input = match input.iter().position(|b| *b == 0) {
        Some(nul) => &input[..nul],
        None => input,
    };

    let mut pending = heapless::Vec::<PendingToken, MAX_TOKENS>::new();
    let mut pos = 0;

    while pos < input.len() {
        match input[pos] {
            b'{' | b'[' => {
                let kind = if input[pos] == b'{' { TokenKind::Object } else { TokenKind::Array };
                pending
                    .push(PendingToken { kind, start: pos, end: None })
                    .map_err(|_| TokenizeError::NoMemory)?;
                pos += 1;
            }
            b'}' | b']' => {
                let kind = if input[pos] == b'}' { TokenKind::Object } else { TokenKind::Array };
                let open = pending
                    .iter_mut()
                    .rev()
                    .find(|t| matches!(t.kind, TokenKind::Object | TokenKind::Array) && t.end.is_none())
                    .ok_or(TokenizeError::Invalid)?;
                if open.kind != kind {
                    return Err(TokenizeError::Invalid);
                }
                open.end = Some(pos + 1);
                pos += 1;
            }
            b'"' => {
                let end = scan_string(input, pos + 1)?;
                pending
                    .push(PendingToken {
                        kind: TokenKind::String,
                        start: pos + 1,
                        end: Some(end),
                    })
                    .map_err(|_| TokenizeError::NoMemory)?;
                pos = end + 1;
            }
            b'\t' | b'\r' | b'\n' | b' ' | b':' | b',' => pos += 1,
            _ => {
                let end = scan_primitive(input, pos)?;
                pending
                    .push(PendingToken {
                        kind: TokenKind::Primitive,
                        start: pos,
                        end: Some(end),
                    })
                    .map_err(|_| TokenizeError::NoMemory)?;
                pos = end;
            }
        }
    }

    let mut tokens = Tokens::new();
    for t in pending {
        let end = t.end.ok_or(TokenizeError::Partial)?;
        // Capacities are equal, so this cannot fail.
        let _ = tokens.push(Token { kind: t.kind, start: t.start, end });
    }
    Ok(tokens)
}

// Returns the index of the closing quote.
fn scan_string(input: &[u8], mut pos: usize) -> Result<usize, TokenizeError> {
    while pos < input.len() {
        match input[pos] {
            b'"' => return Ok(pos),
            b'\\' => {
                let escaped = *input.get(pos + 1).ok_or(TokenizeError::Partial)?;
                match escaped {
                    b'"' | b'/' | b'\\' | b'b' | b'f' | b'r' | b'n' | b't' => pos += 2,
                    b'u' => {
                        let hex = input.get(pos + 2..pos + 6).ok_or(TokenizeError::Partial)?;
                        if !hex.iter().all(u8::is_ascii_hexdigit) {
                            return Err(TokenizeError::Invalid);
                        }
                        pos += 6;
                    }
                    _ => return Err(TokenizeError::Invalid),
                }
            }
            _ => pos += 1,
        }
    }
    Err(TokenizeError::Partial)
}

// Returns the index one past the last primitive character.
fn scan_primitive(input: &[u8], start: usize) -> Result<usize, TokenizeError> {
    let mut pos = start;
    while pos < input.len() {
        match input[pos] {
            b'\t' | b'\r' | b'\n' | b' ' | b',' | b':' | b']' | b'}' => break,
            c if !(32..127).contains(&c) => return Err(TokenizeError::Invalid),
            _ => pos += 1,
        }
    }
    Ok(pos)
}
