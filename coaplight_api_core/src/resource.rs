// SPDX-FileCopyrightText: © 2023 TUM
// SPDX-License-Identifier: MIT
pub mod light_resource;
pub mod util_resource;

use crate::coap_mapping::CoapRequest;
use crate::common::Reply;

/// A CoAP resource serving one or more URI paths.
pub trait Resource {
    fn paths(&self) -> &'static [&'static str];

    /// Handles a confirmable request for one of [`Resource::paths`]. `None`
    /// means the request is ignored and nothing is sent back.
    fn handle(&mut self, request: &CoapRequest<'_>) -> Option<Reply>;

    fn serves(&self, path: &str) -> bool {
        self.paths().iter().any(|p| *p == path)
    }
}

/// All resources of a device: the light plus the utility service, which also
/// answers for unregistered paths.
pub struct CoapLightDevice<I: crate::identity::NodeIdentity> {
    light: light_resource::LightResource,
    util: util_resource::UtilResource<I>,
}

impl<I: crate::identity::NodeIdentity> CoapLightDevice<I> {
    pub fn new(identity: I) -> Self {
        Self {
            light: light_resource::LightResource::default(),
            util: util_resource::UtilResource::new(identity),
        }
    }

    pub fn light_state(&self) -> crate::light::LightState {
        self.light.state
    }

    /// Dispatches `request` to the resource serving its path. Only
    /// confirmable requests are answered.
    pub fn handle(&mut self, request: &CoapRequest<'_>) -> Option<Reply> {
        if !request.is_confirmable() {
            log::debug!("ignoring non-confirmable request for /{}", request.path);
            return None;
        }

        let resources: [&mut dyn Resource; 2] = [&mut self.light, &mut self.util];
        for r in resources {
            if r.serves(&request.path) {
                return r.handle(request);
            }
        }
        self.util.handle_default(request)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::ContentFormat;
    use crate::identity::StaticIdentity;
    use coap_lite::{MessageType, RequestType};

    fn device() -> CoapLightDevice<StaticIdentity> {
        CoapLightDevice::new(StaticIdentity {
            eui64: [0x18, 0xb4, 0x30, 0, 0, 0, 0, 1],
            mesh_local_address: Some("fd00::abcd".parse().unwrap()),
        })
    }

    fn request<'a>(message_type: MessageType, method: RequestType, path: &str, payload: &'a [u8]) -> CoapRequest<'a> {
        CoapRequest {
            message_type,
            method,
            message_id: 1,
            token: alloc::vec![1],
            path: path.into(),
            payload,
        }
    }

    fn con(method: RequestType, path: &str, payload: &[u8]) -> Option<Reply> {
        device().handle(&request(MessageType::Confirmable, method, path, payload))
    }

    #[test]
    fn light_session() {
        let mut dev = device();
        let mut send = |method, path: &str, payload: &'static [u8]| {
            dev.handle(&request(MessageType::Confirmable, method, path, payload))
                .map(|r| r.payload)
        };

        assert_eq!(send(RequestType::Get, "light", b"").unwrap().as_str(), r#"{"level": 0, "toggleLevel": 255, "step": 255}"#);
        assert_eq!(
            send(RequestType::Put, "light/set", br#"{"step":10,"toggleLevel":200}"#).unwrap().as_str(),
            r#"{"status":"Ok" , "step":10 , "toggleLevel":200}"#
        );
        assert_eq!(send(RequestType::Put, "light/toggle", b"").unwrap().as_str(), r#"{"status":"Ok", "level":200}"#);
        assert_eq!(send(RequestType::Put, "light/up", b"").unwrap().as_str(), r#"{"status":"Ok", "level":210}"#);
        assert_eq!(send(RequestType::Put, "light/down", b"").unwrap().as_str(), r#"{"status":"Ok", "level":200}"#);
        assert_eq!(send(RequestType::Put, "light/toggle", b"").unwrap().as_str(), r#"{"status":"Ok", "level":0}"#);
        assert_eq!(send(RequestType::Put, "light/set", br#"{"step":0}"#).unwrap().as_str(), r#"{"status":"Error"}"#);
        assert_eq!(dev.light_state().step, 10);
    }

    #[test]
    fn wrong_method_is_ignored() {
        assert!(con(RequestType::Put, "light", b"").is_none());
        assert!(con(RequestType::Get, "light/toggle", b"").is_none());
        assert!(con(RequestType::Post, "light/set", br#"{"step":1}"#).is_none());
        assert!(con(RequestType::Put, "ping", b"").is_none());
        assert!(con(RequestType::Delete, "whatever", b"").is_none());
    }

    #[test]
    fn non_confirmable_is_ignored() {
        let mut dev = device();
        assert!(dev.handle(&request(MessageType::NonConfirmable, RequestType::Put, "light/toggle", b"")).is_none());
        assert_eq!(dev.light_state().level, 0);
    }

    #[test]
    fn utility_paths() {
        let reply = con(RequestType::Get, "ping", b"").unwrap();
        assert_eq!(reply.payload.as_str(), r#"{"res":"pong"}"#);
        assert_eq!(reply.content_format, ContentFormat::Json);

        let reply = con(RequestType::Get, "ident", b"").unwrap();
        assert_eq!(reply.payload.as_str(), r#"{"eui":"18:b4:30:0:0:0:0:1","ipaddr":"fd00:0:0:0:0:0:0:abcd"}"#);

        let reply = con(RequestType::Get, "some/other/path", b"").unwrap();
        assert_eq!(reply.payload.as_str(), "Hello World");
        assert_eq!(reply.content_format, ContentFormat::TextPlain);
        assert!(reply.from_default_handler);
    }
}
