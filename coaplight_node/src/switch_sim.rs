// SPDX-FileCopyrightText: © 2024 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

//! Switch simulator: periodically sends `PUT light/toggle` to a target light.

use coaplight_api_core::coap_mapping::{COAPEncoder, CoapDecoder, CoapMessage};

pub const SWITCHSIM_DEFAULT_PERIOD_MS: u32 = 5000;
pub const SWITCHSIM_START_DELAY_MS: u64 = 0;
/// Exclusive upper bound of the period.
pub const SWITCHSIM_MAX_PERIOD_MS: u32 = 255000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchSimCommand {
    Start { target: std::net::SocketAddr, period: std::time::Duration },
    Stop,
}

#[derive(Clone)]
pub struct SwitchSimHandle {
    sender: tokio::sync::mpsc::UnboundedSender<SwitchSimCommand>,
}

impl SwitchSimHandle {
    pub fn start(&self, target: std::net::SocketAddr, period: std::time::Duration) -> anyhow::Result<()> {
        self.send(SwitchSimCommand::Start { target, period })
    }

    pub fn stop(&self) -> anyhow::Result<()> {
        self.send(SwitchSimCommand::Stop)
    }

    fn send(&self, command: SwitchSimCommand) -> anyhow::Result<()> {
        self.sender
            .send(command)
            .map_err(|_| anyhow::anyhow!("switch simulator task is not running"))
    }
}

pub struct SwitchSim {
    commands: tokio::sync::mpsc::UnboundedReceiver<SwitchSimCommand>,
    sock: Option<tokio::net::UdpSocket>,
    target: Option<std::net::SocketAddr>,
    timer: Option<tokio::time::Interval>,
    next_message_id: u16,
}

impl SwitchSim {
    pub fn new() -> (Self, SwitchSimHandle) {
        let (sender, commands) = tokio::sync::mpsc::unbounded_channel();
        (
            SwitchSim {
                commands,
                sock: None,
                target: None,
                timer: None,
                next_message_id: rand::random(),
            },
            SwitchSimHandle { sender },
        )
    }

    /// Runs until every [`SwitchSimHandle`] is dropped.
    pub async fn run(mut self) {
        let mut buffer = vec![0_u8; 1500];

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(command) => self.apply(command).await,
                        None => break,
                    }
                }
                _ = next_fire(&mut self.timer) => {
                    self.fire().await;
                }
                res = recv_response(&self.sock, &mut buffer) => {
                    match res {
                        Ok((size, sender)) => log_response(&buffer[..size], sender),
                        Err(err) => log::error!("SwitchSim: UDP/COAP Receive Error: {:?}", err),
                    }
                }
            }
        }
        log::debug!("SwitchSim: command channel closed");
    }

    #[cfg(test)]
    pub(crate) fn try_next_command(&mut self) -> Result<SwitchSimCommand, tokio::sync::mpsc::error::TryRecvError> {
        self.commands.try_recv()
    }

    async fn apply(&mut self, command: SwitchSimCommand) {
        match command {
            SwitchSimCommand::Start { target, period } => {
                if let Err(err) = self.ensure_socket(&target).await {
                    log::error!("SwitchSim: cannot bind socket: {}", err);
                    return;
                }
                let first = tokio::time::Instant::now() + std::time::Duration::from_millis(SWITCHSIM_START_DELAY_MS);
                let mut timer = tokio::time::interval_at(first, period);
                timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                self.target = Some(target);
                self.timer = Some(timer);
                log::info!("SwitchSim: toggling {} every {:?}", target, period);
            }
            SwitchSimCommand::Stop => {
                self.timer = None;
                log::info!("SwitchSim: stopped");
            }
        }
    }

    async fn ensure_socket(&mut self, target: &std::net::SocketAddr) -> anyhow::Result<()> {
        if let Some(sock) = &self.sock {
            if sock.local_addr()?.is_ipv4() == target.is_ipv4() {
                return Ok(());
            }
        }
        let bind_addr = match target {
            std::net::SocketAddr::V4(_) => "0.0.0.0:0",
            std::net::SocketAddr::V6(_) => "[::]:0",
        };
        self.sock = Some(tokio::net::UdpSocket::bind(bind_addr).await?);
        Ok(())
    }

    async fn fire(&mut self) {
        let (target, sock) = match (&self.target, &self.sock) {
            (Some(target), Some(sock)) => (*target, sock),
            _ => return,
        };

        let message_id = self.next_message_id;
        self.next_message_id = self.next_message_id.wrapping_add(1);
        let token: [u8; 2] = rand::random();

        let mut buffer = [0_u8; 64];
        let (data, endpoint) = match COAPEncoder::encode_toggle_request(target, message_id, &token, &mut buffer) {
            Ok(((data, endpoint), _tail)) => (data, endpoint),
            Err(err) => {
                log::error!("SwitchSim: {}", err);
                return;
            }
        };
        log::info!("SwitchSim: Sending PUT light/toggle msg");
        if let Err(err) = sock.send_to(data, endpoint).await {
            log::error!("SwitchSim: UDP/COAP Send Error: {:?}", err);
        }
    }
}

async fn next_fire(timer: &mut Option<tokio::time::Interval>) -> tokio::time::Instant {
    match timer {
        Some(timer) => timer.tick().await,
        None => std::future::pending().await,
    }
}

async fn recv_response(
    sock: &Option<tokio::net::UdpSocket>,
    buffer: &mut [u8],
) -> std::io::Result<(usize, std::net::SocketAddr)> {
    match sock {
        Some(sock) => sock.recv_from(buffer).await,
        None => std::future::pending().await,
    }
}

fn log_response(data: &[u8], sender: std::net::SocketAddr) {
    match CoapDecoder::decode(data) {
        Ok(CoapMessage::Response(response)) => {
            log::info!(
                "SwitchSim: {} replied {:?} '{}'",
                sender,
                response.code,
                String::from_utf8_lossy(response.payload)
            );
        }
        Ok(_) => log::debug!("SwitchSim: ignoring non-response message from {}", sender),
        Err(err) => log::warn!("SwitchSim: {} from {}", err, sender),
    }
}
