// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

//! Extraction of numeric attributes from a flat JSON object.
//!
//! The scanner walks the tokens of an already tokenized document and proposes
//! `(name, value)` pairs for the names in an allow-list. A malformed document
//! is rejected as a whole, while a single bad attribute is only skipped. The
//! caller decides what to do with the accepted pairs.

use crate::json_token::{Token, TokenKind, MAX_TOKENS};

/// Capacity of the local copies of an attribute name or value. One byte is
/// reserved for a terminator, so spans of at most `MAX_ATTRIBUTE_LEN - 1`
/// bytes fit.
pub const MAX_ATTRIBUTE_LEN: usize = 30;

/// A flat object of [`MAX_TOKENS`] tokens holds at most this many pairs.
pub const MAX_ATTRIBUTES: usize = MAX_TOKENS / 2;

type AttributeBuf = heapless::Vec<u8, MAX_ATTRIBUTE_LEN>;

/// An allow-listed attribute. Values must lie in `(min_exclusive, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSpec {
    pub name: &'static str,
    pub min_exclusive: i64,
    pub max: i64,
}

impl AttributeSpec {
    pub const fn new(name: &'static str, min_exclusive: i64, max: i64) -> Self {
        Self { name, min_exclusive, max }
    }

    pub fn accepts(&self, value: i64) -> bool {
        value > self.min_exclusive && value <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptedAttribute {
    pub name: &'static str,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedAttribute {
    pub name: AttributeBuf,
    pub reason: ScanError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanError {
    /// No root token, the root is not an object, or a token leaves the root span.
    StructuralError,
    /// The name/value alternation was broken.
    UnexpectedTokenKind,
    /// A name or value is [`MAX_ATTRIBUTE_LEN`] bytes or longer.
    OversizedSpan,
    /// The value has trailing characters after its numeric prefix.
    NumericParseError,
    UnknownAttribute,
    OutOfRange,
    /// The scan finished without a single accepted attribute.
    NoAttributesAccepted,
}

impl core::fmt::Display for ScanError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            ScanError::StructuralError => "not a flat JSON object",
            ScanError::UnexpectedTokenKind => "unexpected token kind",
            ScanError::OversizedSpan => "attribute name or value too long",
            ScanError::NumericParseError => "value is not a decimal integer",
            ScanError::UnknownAttribute => "unknown attribute",
            ScanError::OutOfRange => "value out of range",
            ScanError::NoAttributesAccepted => "no attributes accepted",
        };
        write!(f, "{}", msg)
    }
}

/// Result of a scan that accepted at least one attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Accepted pairs in document order. A name may appear more than once.
    pub accepted: heapless::Vec<AcceptedAttribute, MAX_ATTRIBUTES>,
    pub skipped: heapless::Vec<SkippedAttribute, MAX_ATTRIBUTES>,
    /// Set if the scan stopped before the last token.
    pub stopped_by: Option<ScanError>,
}

impl ScanOutcome {
    /// Last accepted value for `name`.
    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.accepted.iter().rev().find(|a| a.name == name).map(|a| a.value)
    }
}

enum Expect {
    Name,
    Value(Token),
}

/// Scans `tokens` (produced from `input`) for the attributes in `allow_list`.
pub fn scan(input: &[u8], tokens: &[Token], allow_list: &[AttributeSpec]) -> Result<ScanOutcome, ScanError> {
    let root = tokens.first().ok_or(ScanError::StructuralError)?;
    if root.kind != TokenKind::Object || root.span(input).is_none() {
        return Err(ScanError::StructuralError);
    }
    if !tokens[1..].iter().all(|t| root.strictly_contains(t)) {
        return Err(ScanError::StructuralError);
    }

    let mut outcome = ScanOutcome::default();
    let mut expect = Expect::Name;

    for token in &tokens[1..] {
        expect = match expect {
            Expect::Name => {
                if token.kind != TokenKind::String {
                    outcome.stopped_by = Some(ScanError::UnexpectedTokenKind);
                    break;
                }
                Expect::Value(*token)
            }
            Expect::Value(name_token) => {
                if token.kind != TokenKind::Primitive || !starts_like_number(token, input) {
                    outcome.stopped_by = Some(ScanError::UnexpectedTokenKind);
                    break;
                }

                let name = copy_span(&name_token, input)?;
                let value = copy_span(token, input)?;

                match evaluate(&name, &value, allow_list) {
                    Ok(accepted) => {
                        // Capacity matches the maximum number of pairs.
                        let _ = outcome.accepted.push(accepted);
                    }
                    Err(reason) => {
                        log::debug!("skipping attribute: {}", reason);
                        let _ = outcome.skipped.push(SkippedAttribute { name, reason });
                    }
                }
                Expect::Name
            }
        };
    }

    if outcome.accepted.is_empty() {
        return Err(ScanError::NoAttributesAccepted);
    }
    Ok(outcome)
}

fn starts_like_number(token: &Token, input: &[u8]) -> bool {
    matches!(input.get(token.start), Some(b'-' | b'0'..=b'9'))
}

fn copy_span(token: &Token, input: &[u8]) -> Result<AttributeBuf, ScanError> {
    let span = token.span(input).ok_or(ScanError::StructuralError)?;
    if span.len() >= MAX_ATTRIBUTE_LEN {
        return Err(ScanError::OversizedSpan);
    }
    AttributeBuf::from_slice(span).map_err(|_| ScanError::OversizedSpan)
}

fn evaluate(name: &[u8], value: &[u8], allow_list: &[AttributeSpec]) -> Result<AcceptedAttribute, ScanError> {
    let value = parse_decimal(value)?;
    let spec = allow_list
        .iter()
        .find(|spec| spec.name.as_bytes() == name)
        .ok_or(ScanError::UnknownAttribute)?;
    if !spec.accepts(value) {
        return Err(ScanError::OutOfRange);
    }
    Ok(AcceptedAttribute { name: spec.name, value })
}

fn parse_decimal(value: &[u8]) -> Result<i64, ScanError> {
    let text = core::str::from_utf8(value).map_err(|_| ScanError::NumericParseError)?;
    text.parse::<i64>().map_err(|err| match err.kind() {
        core::num::IntErrorKind::PosOverflow | core::num::IntErrorKind::NegOverflow => ScanError::OutOfRange,
        _ => ScanError::NumericParseError,
    })
}
