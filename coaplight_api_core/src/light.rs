// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT
use core::fmt::Write;

use crate::attribute_scanner::{AttributeSpec, ScanError};
use crate::common::{ResponsePayload, Status};

pub const LIGHT_MAX_LEVEL: u8 = 255;
pub const LIGHT_DEFAULT_LEVEL: u8 = 0;
pub const LIGHT_DEFAULT_TOGGLE_LEVEL: u8 = LIGHT_MAX_LEVEL;
pub const LIGHT_DEFAULT_STEP: u8 = LIGHT_MAX_LEVEL;

/// Largest `light/set` payload that is looked at.
pub const REQUEST_PAYLOAD_SIZE: usize = 512;

pub const ATTR_STEP: &str = "step";
pub const ATTR_TOGGLE_LEVEL: &str = "toggleLevel";

/// Attributes accepted by `light/set`.
pub const LIGHT_ATTRIBUTES: [AttributeSpec; 2] = [
    AttributeSpec::new(ATTR_STEP, 0, LIGHT_MAX_LEVEL as i64),
    AttributeSpec::new(ATTR_TOGGLE_LEVEL, 0, LIGHT_MAX_LEVEL as i64),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightState {
    pub level: u8,
    pub toggle_level: u8,
    pub step: u8,
}

impl Default for LightState {
    fn default() -> Self {
        Self {
            level: LIGHT_DEFAULT_LEVEL,
            toggle_level: LIGHT_DEFAULT_TOGGLE_LEVEL,
            step: LIGHT_DEFAULT_STEP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeUpdate {
    pub name: &'static str,
    pub new_value: u8,
    pub changed: bool,
}

/// Result of applying a `light/set` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetResult {
    pub status: Status,
    pub step: Option<AttributeUpdate>,
    pub toggle_level: Option<AttributeUpdate>,
}

impl SetResult {
    fn failed() -> Self {
        Self {
            status: Status::Error,
            step: None,
            toggle_level: None,
        }
    }
}

impl LightState {
    pub fn toggle(&mut self) {
        self.level = if self.level == 0 { self.toggle_level } else { 0 };
    }

    pub fn up(&mut self) {
        self.level = self.level.saturating_add(self.step);
    }

    pub fn down(&mut self) {
        self.level = self.level.saturating_sub(self.step);
    }

    /// Parses a `light/set` payload and applies the accepted attributes.
    pub fn set_from_json(&mut self, payload: &[u8]) -> SetResult {
        if payload.is_empty() || payload.len() > REQUEST_PAYLOAD_SIZE {
            log::debug!("light/set payload size {} not accepted", payload.len());
            return SetResult::failed();
        }
        let payload = strip_line_ending(payload);

        let tokens = match crate::json_token::tokenize(payload) {
            Ok(tokens) => tokens,
            Err(err) => {
                log::debug!("light/set payload is not JSON: {}", err);
                return SetResult::failed();
            }
        };

        let outcome = match crate::attribute_scanner::scan(payload, &tokens, &LIGHT_ATTRIBUTES) {
            Ok(outcome) => outcome,
            Err(err) => {
                log::debug!("light/set rejected: {}", err);
                return SetResult::failed();
            }
        };
        if let Some(stopped_by) = outcome.stopped_by {
            log::debug!("light/set scan stopped early: {}", stopped_by);
        }

        self.apply(outcome.value_of(ATTR_STEP), outcome.value_of(ATTR_TOGGLE_LEVEL))
    }

    /// Applies the values allowed by [`LIGHT_ATTRIBUTES`]. A `None` or
    /// rejected value leaves the attribute alone.
    pub fn apply(&mut self, step: Option<i64>, toggle_level: Option<i64>) -> SetResult {
        let step = step.filter(|v| allowed(ATTR_STEP, *v));
        let toggle_level = toggle_level.filter(|v| allowed(ATTR_TOGGLE_LEVEL, *v));
        if step.is_none() && toggle_level.is_none() {
            log::debug!("light/set: {}", ScanError::NoAttributesAccepted);
            return SetResult::failed();
        }
        SetResult {
            status: Status::Ok,
            step: step.and_then(|v| update(&mut self.step, ATTR_STEP, v)),
            toggle_level: toggle_level.and_then(|v| update(&mut self.toggle_level, ATTR_TOGGLE_LEVEL, v)),
        }
    }

    /// `{"level": L, "toggleLevel": T, "step": S}`
    pub fn render(&self) -> ResponsePayload {
        let mut out = ResponsePayload::new();
        let _ = write!(
            out,
            "{{\"level\": {}, \"toggleLevel\": {}, \"step\": {}}}",
            self.level, self.toggle_level, self.step
        );
        out
    }

    /// `{"status":"Ok", "level":L}`
    pub fn render_level_status(&self) -> ResponsePayload {
        let mut out = ResponsePayload::new();
        let _ = write!(out, "{{\"status\":\"{}\", \"level\":{}}}", Status::Ok, self.level);
        out
    }
}

fn allowed(name: &str, value: i64) -> bool {
    LIGHT_ATTRIBUTES
        .iter()
        .any(|attr| attr.name == name && attr.accepts(value))
}

// Values outside u8 never reach here, the allow-list bounds them to (0, 255].
fn update(slot: &mut u8, name: &'static str, value: i64) -> Option<AttributeUpdate> {
    let new_value = u8::try_from(value).ok()?;
    let changed = *slot != new_value;
    *slot = new_value;
    Some(AttributeUpdate { name, new_value, changed })
}

impl SetResult {
    /// Status plus the attributes whose value actually changed, e.g.
    /// `{"status":"Ok" , "step":10 , "toggleLevel":200}`.
    pub fn render(&self) -> ResponsePayload {
        let mut out = ResponsePayload::new();
        let _ = write!(out, "{{\"status\":\"{}\"", self.status);
        for update in [self.step, self.toggle_level].iter().flatten().filter(|u| u.changed) {
            let _ = write!(out, " , \"{}\":{}", update.name, update.new_value);
        }
        let _ = out.push('}');
        out
    }
}

fn strip_line_ending(payload: &[u8]) -> &[u8] {
    let payload = payload.strip_suffix(b"\n").unwrap_or(payload);
    payload.strip_suffix(b"\r").unwrap_or(payload)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let state = LightState::default();
        assert_eq!(state.render().as_str(), r#"{"level": 0, "toggleLevel": 255, "step": 255}"#);
    }

    #[test]
    fn toggle_up_down() {
        let mut state = LightState {
            level: 0,
            toggle_level: 100,
            step: 60,
        };
        state.toggle();
        assert_eq!(state.level, 100);
        state.toggle();
        assert_eq!(state.level, 0);

        state.down();
        assert_eq!(state.level, 0);
        state.up();
        state.up();
        assert_eq!(state.level, 120);
        state.up();
        state.up();
        state.up();
        assert_eq!(state.level, 255);
        assert_eq!(state.render_level_status().as_str(), r#"{"status":"Ok", "level":255}"#);
    }

    #[test]
    fn set_both() {
        let mut state = LightState::default();
        let result = state.set_from_json(br#"{"step":10,"toggleLevel":200}"#);
        assert_eq!(result.status, Status::Ok);
        assert_eq!(state.step, 10);
        assert_eq!(state.toggle_level, 200);
        assert_eq!(result.render().as_str(), r#"{"status":"Ok" , "step":10 , "toggleLevel":200}"#);
    }

    #[test]
    fn set_is_idempotent() {
        let mut state = LightState::default();
        state.set_from_json(br#"{"step":10}"#);
        let again = state.set_from_json(br#"{"step":10}"#);
        assert_eq!(again.status, Status::Ok);
        assert_eq!(
            again.step,
            Some(AttributeUpdate {
                name: ATTR_STEP,
                new_value: 10,
                changed: false
            })
        );
        assert_eq!(again.render().as_str(), r#"{"status":"Ok"}"#);
    }

    #[test]
    fn set_only_toggle_level_changed() {
        let mut state = LightState::default();
        let result = state.set_from_json(b"{\"step\":255,\"toggleLevel\":3}\r\n");
        assert_eq!(result.render().as_str(), r#"{"status":"Ok" , "toggleLevel":3}"#);
    }

    #[test]
    fn apply_rejects_values_outside_the_allow_list() {
        let mut state = LightState::default();
        let result = state.apply(Some(0), Some(300));
        assert_eq!(result.status, Status::Error);
        assert_eq!(result.render().as_str(), r#"{"status":"Error"}"#);
        assert_eq!(state, LightState::default());

        let result = state.apply(Some(0), Some(7));
        assert_eq!(result.render().as_str(), r#"{"status":"Ok" , "toggleLevel":7}"#);
        assert_eq!(state.step, LIGHT_DEFAULT_STEP);
        assert_eq!(state.toggle_level, 7);
    }

    #[test]
    fn set_failures_leave_state_untouched() {
        let mut state = LightState::default();
        for payload in [
            &br#"{"step":0}"#[..],
            br#"{"step":"abc"}"#,
            br#"{"unknown":5}"#,
            b"5",
            b"",
            b"{not json",
        ] {
            let result = state.set_from_json(payload);
            assert_eq!(result.status, Status::Error);
            assert_eq!(result.render().as_str(), r#"{"status":"Error"}"#);
        }
        assert_eq!(state, LightState::default());

        let oversized = [b' '; REQUEST_PAYLOAD_SIZE + 1];
        assert_eq!(state.set_from_json(&oversized).status, Status::Error);
    }
}
