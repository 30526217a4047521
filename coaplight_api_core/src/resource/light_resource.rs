// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-FileCopyrightText: © 2023 Claudio Cicconetti <c.cicconetti@iit.cnr.it>
// SPDX-FileCopyrightText: © 2023 Siemens AG
// SPDX-License-Identifier: MIT
use coap_lite::RequestType;

use crate::coap_mapping::CoapRequest;
use crate::common::Reply;
use crate::light::LightState;

/// The `light` resource tree: state query plus the four PUT operations.
#[derive(Debug, Default)]
pub struct LightResource {
    pub state: LightState,
}

impl crate::resource::Resource for LightResource {
    fn paths(&self) -> &'static [&'static str] {
        &["light", "light/toggle", "light/up", "light/down", "light/set"]
    }

    fn handle(&mut self, request: &CoapRequest<'_>) -> Option<Reply> {
        match (request.path.as_str(), &request.method) {
            ("light", RequestType::Get) => Some(Reply::json(self.state.render())),
            ("light/toggle", RequestType::Put) => {
                self.state.toggle();
                Some(Reply::json(self.state.render_level_status()))
            }
            ("light/up", RequestType::Put) => {
                self.state.up();
                Some(Reply::json(self.state.render_level_status()))
            }
            ("light/down", RequestType::Put) => {
                self.state.down();
                Some(Reply::json(self.state.render_level_status()))
            }
            ("light/set", RequestType::Put) => {
                let result = self.state.set_from_json(request.payload);
                Some(Reply::json(result.render()))
            }
            _ => {
                log::debug!("unsupported method {:?} on /{}", request.method, request.path);
                None
            }
        }
    }
}
