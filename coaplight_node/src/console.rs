// SPDX-FileCopyrightText: © 2024 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

//! Operator console: one command per line on stdin.

use crate::switch_sim::{SwitchSimHandle, SWITCHSIM_DEFAULT_PERIOD_MS, SWITCHSIM_MAX_PERIOD_MS};
use coaplight_api_core::light::LightState;

const SWITCHSIM_USAGE: &str = "Use: switchsim {stop|start} <ipv6addr> [period_ms], eg. 'switchsim start ::1' or 'switchsim stop'";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    InvalidArgs,
    Parse,
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::InvalidArgs => write!(f, "InvalidArgs"),
            CommandError::Parse => write!(f, "Parse"),
        }
    }
}

pub struct Console {
    switch_sim: SwitchSimHandle,
    light_state: tokio::sync::watch::Receiver<LightState>,
    light_port: u16,
}

impl Console {
    pub fn new(switch_sim: SwitchSimHandle, light_state: tokio::sync::watch::Receiver<LightState>, light_port: u16) -> Self {
        Self {
            switch_sim,
            light_state,
            light_port,
        }
    }

    /// Reads commands from stdin until it is closed.
    pub async fn run(mut self) {
        use tokio::io::AsyncBufReadExt;

        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if let Some(output) = self.execute(&line) {
                        println!("{}", output);
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    log::error!("console read error: {}", err);
                    break;
                }
            }
        }
        log::debug!("console closed");
    }

    /// Executes one command line and returns what to print, if anything.
    pub fn execute(&mut self, line: &str) -> Option<String> {
        let mut args = line.split_whitespace();
        let command = args.next()?;
        let args: Vec<&str> = args.collect();
        let output = match command {
            "switchsim" => match self.switchsim(&args) {
                Ok(output) => output,
                Err(err) => format!("ERROR, in switchsim command: {}", err),
            },
            "state" => self.light_state.borrow().render().to_string(),
            "help" => String::from("Commands: help, state, switchsim"),
            other => format!("Error: unknown command '{}'", other),
        };
        Some(output)
    }

    fn switchsim(&mut self, args: &[&str]) -> Result<String, CommandError> {
        match args.first().copied() {
            Some("start") => {
                let target: std::net::IpAddr = args.get(1).ok_or(CommandError::InvalidArgs)?.parse().map_err(|_| CommandError::Parse)?;
                let period_ms = match args.get(2) {
                    Some(raw) => {
                        let period_ms = parse_u32(raw)?;
                        if period_ms == 0 || period_ms >= SWITCHSIM_MAX_PERIOD_MS {
                            return Err(CommandError::InvalidArgs);
                        }
                        period_ms
                    }
                    None => SWITCHSIM_DEFAULT_PERIOD_MS,
                };
                self.switch_sim
                    .start(
                        std::net::SocketAddr::new(target, self.light_port),
                        std::time::Duration::from_millis(period_ms as u64),
                    )
                    .map_err(|err| {
                        log::error!("{}", err);
                        CommandError::InvalidArgs
                    })?;
                Ok(format!("SUCCESS, starting switchsim app on ip = {}", format_target(&target)))
            }
            Some("stop") => {
                self.switch_sim.stop().map_err(|err| {
                    log::error!("{}", err);
                    CommandError::InvalidArgs
                })?;
                Ok(String::from("SUCCESS, stopping switchsim app"))
            }
            Some("help") => Ok(String::from(SWITCHSIM_USAGE)),
            _ => Err(CommandError::InvalidArgs),
        }
    }
}

fn format_target(target: &std::net::IpAddr) -> String {
    match target {
        std::net::IpAddr::V4(v4) => v4.to_string(),
        std::net::IpAddr::V6(v6) => coaplight_api_core::identity::format_address(v6).to_string(),
    }
}

/// Unsigned integer with C `strtol` base detection: `0x` hex, leading `0`
/// octal, decimal otherwise. Negative values clamp to zero, values too large
/// for `i64` saturate.
pub fn parse_u32(raw: &str) -> Result<u32, CommandError> {
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let (radix, digits) = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        (16, hex)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(CommandError::Parse);
    }
    let value = match i64::from_str_radix(digits, radix) {
        Ok(value) => value,
        Err(err) if *err.kind() == std::num::IntErrorKind::PosOverflow => i64::MAX,
        Err(_) => return Err(CommandError::Parse),
    };
    if negative {
        return Ok(0);
    }
    Ok(u32::try_from(value).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::switch_sim::SwitchSim;

    fn console() -> (Console, SwitchSim) {
        let (sim, handle) = SwitchSim::new();
        let (_tx, rx) = tokio::sync::watch::channel(LightState::default());
        (Console::new(handle, rx, 5683), sim)
    }

    #[test]
    fn strtol_like_parsing() {
        assert_eq!(parse_u32("100"), Ok(100));
        assert_eq!(parse_u32("0x10"), Ok(16));
        assert_eq!(parse_u32("010"), Ok(8));
        assert_eq!(parse_u32("0"), Ok(0));
        assert_eq!(parse_u32("-5"), Ok(0));
        assert_eq!(parse_u32("12ms"), Err(CommandError::Parse));
        assert_eq!(parse_u32("0x"), Err(CommandError::Parse));
        assert_eq!(parse_u32("099"), Err(CommandError::Parse));
        assert_eq!(parse_u32("99999999999"), Ok(u32::MAX));
        assert_eq!(parse_u32("99999999999999999999999"), Ok(u32::MAX));
        assert_eq!(parse_u32("0xffffffffffffffffffff"), Ok(u32::MAX));
        assert_eq!(parse_u32("-99999999999999999999999"), Ok(0));
        assert_eq!(parse_u32("+-5"), Err(CommandError::Parse));
        assert_eq!(parse_u32("0x-5"), Err(CommandError::Parse));
    }

    #[test]
    fn switchsim_commands() {
        let (mut console, _sim) = console();

        assert_eq!(console.execute("").as_deref(), None);
        assert_eq!(
            console.execute("switchsim start ::1").unwrap(),
            "SUCCESS, starting switchsim app on ip = 0:0:0:0:0:0:0:1"
        );
        assert_eq!(
            console.execute("switchsim start 127.0.0.1 0x10").unwrap(),
            "SUCCESS, starting switchsim app on ip = 127.0.0.1"
        );
        assert_eq!(console.execute("switchsim stop").unwrap(), "SUCCESS, stopping switchsim app");
        assert_eq!(console.execute("switchsim help").unwrap(), SWITCHSIM_USAGE);

        for line in [
            "switchsim",
            "switchsim restart",
            "switchsim start",
            "switchsim start ::1 0",
            "switchsim start ::1 255000",
            "switchsim start ::1 -3",
            "switchsim start ::1 99999999999999999999999",
        ] {
            assert_eq!(console.execute(line).unwrap(), "ERROR, in switchsim command: InvalidArgs", "{}", line);
        }
        for line in ["switchsim start nonsense", "switchsim start ::1 5s"] {
            assert_eq!(console.execute(line).unwrap(), "ERROR, in switchsim command: Parse", "{}", line);
        }
    }

    #[test]
    fn commands_reach_the_simulator() {
        let (mut console, mut sim) = console();
        console.execute("switchsim start fd00::1 250");
        console.execute("switchsim stop");

        let mut received = Vec::new();
        while let Ok(command) = sim.try_next_command() {
            received.push(command);
        }
        assert_eq!(
            received,
            vec![
                crate::switch_sim::SwitchSimCommand::Start {
                    target: "[fd00::1]:5683".parse().unwrap(),
                    period: std::time::Duration::from_millis(250),
                },
                crate::switch_sim::SwitchSimCommand::Stop,
            ]
        );
    }

    #[test]
    fn state_and_help() {
        let (mut console, _sim) = console();
        assert_eq!(console.execute("state").unwrap(), r#"{"level": 0, "toggleLevel": 255, "step": 255}"#);
        assert!(console.execute("help").unwrap().contains("switchsim"));
        assert_eq!(console.execute("reboot").unwrap(), "Error: unknown command 'reboot'");
    }
}
