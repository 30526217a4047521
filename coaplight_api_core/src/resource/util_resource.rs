// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-FileCopyrightText: © 2023 Claudio Cicconetti <c.cicconetti@iit.cnr.it>
// SPDX-FileCopyrightText: © 2023 Siemens AG
// SPDX-License-Identifier: MIT
use core::fmt::Write;

use coap_lite::RequestType;

use crate::coap_mapping::CoapRequest;
use crate::common::{ContentFormat, Reply, ResponsePayload};
use crate::identity::NodeIdentity;

pub struct UtilResource<I: NodeIdentity> {
    identity: I,
}

impl<I: NodeIdentity> UtilResource<I> {
    pub fn new(identity: I) -> Self {
        Self { identity }
    }

    /// Answers GET requests for paths nobody registered.
    pub fn handle_default(&self, request: &CoapRequest<'_>) -> Option<Reply> {
        if !matches!(request.method, RequestType::Get) {
            return None;
        }
        let mut payload = ResponsePayload::new();
        let _ = payload.push_str("Hello World");
        Some(Reply {
            content_format: ContentFormat::TextPlain,
            payload,
            from_default_handler: true,
        })
    }

    fn identity_payload(&self) -> ResponsePayload {
        let ipaddr = self
            .identity
            .mesh_local_address()
            .map(|addr| crate::identity::format_address(&addr))
            .unwrap_or_default();

        let mut payload = ResponsePayload::new();
        let _ = write!(
            payload,
            "{{\"eui\":\"{}\",\"ipaddr\":\"{}\"}}",
            crate::identity::format_eui64(&self.identity.eui64()),
            ipaddr
        );
        payload
    }
}

impl<I: NodeIdentity> crate::resource::Resource for UtilResource<I> {
    fn paths(&self) -> &'static [&'static str] {
        &["ping", "ident"]
    }

    fn handle(&mut self, request: &CoapRequest<'_>) -> Option<Reply> {
        if !matches!(request.method, RequestType::Get) {
            return None;
        }
        match request.path.as_str() {
            "ping" => {
                let mut payload = ResponsePayload::new();
                let _ = payload.push_str("{\"res\":\"pong\"}");
                Some(Reply::json(payload))
            }
            "ident" => Some(Reply::json(self.identity_payload())),
            _ => None,
        }
    }
}
