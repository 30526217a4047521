// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-FileCopyrightText: © 2023 Claudio Cicconetti <c.cicconetti@iit.cnr.it>
// SPDX-FileCopyrightText: © 2023 Siemens AG
// SPDX-License-Identifier: MIT
use coap_lite::{CoapOption, MessageClass, MessageType, RequestType, ResponseType};

use crate::common::ContentFormat;

/// Path the switch simulator toggles.
pub const LIGHT_TOGGLE_PATH: &str = "light/toggle";

/// An inbound request, borrowing its payload from the received datagram.
#[derive(Debug, Clone)]
pub struct CoapRequest<'a> {
    pub message_type: MessageType,
    pub method: RequestType,
    pub message_id: u16,
    pub token: alloc::vec::Vec<u8>,
    pub path: alloc::string::String,
    pub payload: &'a [u8],
}

impl CoapRequest<'_> {
    pub fn is_confirmable(&self) -> bool {
        matches!(self.message_type, MessageType::Confirmable)
    }
}

#[derive(Debug, Clone)]
pub struct CoapResponse<'a> {
    pub message_type: MessageType,
    pub code: ResponseType,
    pub message_id: u16,
    pub token: alloc::vec::Vec<u8>,
    pub payload: &'a [u8],
}

#[derive(Debug, Clone)]
pub enum CoapMessage<'a> {
    Request(CoapRequest<'a>),
    Response(CoapResponse<'a>),
    /// Empty message, e.g. a bare ACK or a ping.
    Empty(MessageType, u16),
}

pub struct CoapDecoder {}

#[derive(Debug)]
pub struct CoapDecoderError;

impl core::fmt::Display for CoapDecoderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "CoAP decoder error")
    }
}

impl CoapDecoder {
    pub fn decode(data: &[u8]) -> Result<CoapMessage<'_>, CoapDecoderError> {
        let packet = coap_lite::Packet::from_bytes(data).map_err(|_| CoapDecoderError {})?;
        let body_len = packet.payload.len();
        let body_ref = &data[(data.len() - body_len)..];

        match packet.header.code {
            MessageClass::Request(method) => {
                let path = match packet.get_option(CoapOption::UriPath) {
                    Some(options) => {
                        let mut vec = alloc::vec::Vec::new();
                        for option in options.iter() {
                            vec.push(core::str::from_utf8(option).map_err(|_| CoapDecoderError {})?);
                        }
                        vec.join("/")
                    }
                    _ => alloc::string::String::new(),
                };
                Ok(CoapMessage::Request(CoapRequest {
                    message_type: packet.header.get_type(),
                    method,
                    message_id: packet.header.message_id,
                    token: packet.get_token().to_vec(),
                    path,
                    payload: body_ref,
                }))
            }
            MessageClass::Response(code) => Ok(CoapMessage::Response(CoapResponse {
                message_type: packet.header.get_type(),
                code,
                message_id: packet.header.message_id,
                token: packet.get_token().to_vec(),
                payload: body_ref,
            })),
            MessageClass::Empty => Ok(CoapMessage::Empty(packet.header.get_type(), packet.header.message_id)),
            _ => Err(CoapDecoderError {}),
        }
    }
}

pub struct COAPEncoder {}

#[derive(Debug)]
pub enum CoapEncoderError {
    /// coap-lite refused to serialize the packet.
    Packet,
    /// The encoded packet does not fit the output buffer.
    BufferTooSmall(usize),
}

impl core::fmt::Display for CoapEncoderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CoapEncoderError::Packet => write!(f, "CoAP encoder error"),
            CoapEncoderError::BufferTooSmall(len) => write!(f, "CoAP packet of {} bytes does not fit the buffer", len),
        }
    }
}

type Encoded<'a, Endpoint> = Result<((&'a mut [u8], Endpoint), &'a mut [u8]), CoapEncoderError>;

impl COAPEncoder {
    /// Piggy-backed response: an ACK carrying the content, with the message id
    /// and token of `request`.
    pub fn encode_response<'a, Endpoint>(
        endpoint: Endpoint,
        request: &CoapRequest<'_>,
        content_format: ContentFormat,
        payload: &[u8],
        out_buf: &'a mut [u8],
    ) -> Encoded<'a, Endpoint> {
        let mut packet = coap_lite::Packet::new();
        packet.header.set_version(1);
        packet.header.set_type(MessageType::Acknowledgement);
        packet.header.code = MessageClass::Response(ResponseType::Content);
        packet.header.message_id = request.message_id;
        packet.set_token(request.token.clone());
        packet.add_option(CoapOption::ContentFormat, content_format.option_value());
        packet.payload = alloc::vec::Vec::from(payload);
        Self::write_out(endpoint, &packet, out_buf)
    }

    /// Confirmable `PUT light/toggle` without payload.
    pub fn encode_toggle_request<'a, Endpoint>(
        endpoint: Endpoint,
        message_id: u16,
        token: &[u8],
        out_buf: &'a mut [u8],
    ) -> Encoded<'a, Endpoint> {
        Self::encode(endpoint, RequestType::Put, LIGHT_TOGGLE_PATH, message_id, token, true, &[], out_buf)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn encode<'a, 'b, Endpoint>(
        endpoint: Endpoint,
        method: RequestType,
        path: &'b str,
        message_id: u16,
        token: &'b [u8],
        confirmable: bool,
        payload: &'b [u8],
        out_buf: &'a mut [u8],
    ) -> Encoded<'a, Endpoint> {
        let mut req = coap_lite::CoapRequest::<Endpoint>::new();
        req.set_method(method);
        req.set_path(path);
        req.message.header.message_id = message_id;
        req.message.set_token(token.to_vec());
        match confirmable {
            true => {
                req.message.header.set_type(MessageType::Confirmable);
            }
            false => {
                req.message.header.set_type(MessageType::NonConfirmable);
            }
        }

        req.message.payload = alloc::vec::Vec::<u8>::from(payload);
        Self::write_out(endpoint, &req.message, out_buf)
    }

    fn write_out<'a, Endpoint>(endpoint: Endpoint, packet: &coap_lite::Packet, out_buf: &'a mut [u8]) -> Encoded<'a, Endpoint> {
        let out = packet.to_bytes().map_err(|_| CoapEncoderError::Packet)?;
        if out.len() > out_buf.len() {
            return Err(CoapEncoderError::BufferTooSmall(out.len()));
        }
        let (data, tail) = out_buf.split_at_mut(out.len());
        data.clone_from_slice(&out);
        Ok(((data, endpoint), tail))
    }
}
