// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

/// Capacity of a response payload.
pub const RESPONSE_PAYLOAD_SIZE: usize = 200;

pub type ResponsePayload = heapless::String<RESPONSE_PAYLOAD_SIZE>;

/// Default CoAP port.
pub const COAP_DEFAULT_PORT: u16 = 5683;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
}

impl core::fmt::Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Status::Ok => write!(f, "Ok"),
            Status::Error => write!(f, "Error"),
        }
    }
}

/// CoAP Content-Format of a response payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFormat {
    TextPlain,
    Json,
}

impl ContentFormat {
    pub fn id(&self) -> u16 {
        match self {
            ContentFormat::TextPlain => 0,
            ContentFormat::Json => 50,
        }
    }

    /// Option value in minimal uint encoding (zero is the empty value).
    pub fn option_value(&self) -> alloc::vec::Vec<u8> {
        let id = self.id();
        match id {
            0 => alloc::vec::Vec::new(),
            1..=0xff => alloc::vec![id as u8],
            _ => alloc::vec::Vec::from(id.to_be_bytes()),
        }
    }
}

/// A response produced by one of the resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub content_format: ContentFormat,
    pub payload: ResponsePayload,
    /// Set if no registered resource matched and the default handler answered.
    pub from_default_handler: bool,
}

impl Reply {
    pub fn json(payload: ResponsePayload) -> Self {
        Self {
            content_format: ContentFormat::Json,
            payload,
            from_default_handler: false,
        }
    }
}
