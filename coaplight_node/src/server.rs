// SPDX-FileCopyrightText: © 2024 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT
use coaplight_api_core::coap_mapping::{COAPEncoder, CoapDecoder, CoapMessage};
use coaplight_api_core::identity::NodeIdentity;
use coaplight_api_core::light::LightState;
use coaplight_api_core::resource::CoapLightDevice;

/// CoAP server for the light and utility resources.
///
/// The server owns the device: requests are handled one at a time in the
/// receive loop. After each request the light state is published on a watch
/// channel for readers outside the loop.
pub struct CoapLightServer<I: NodeIdentity> {
    sock: tokio::net::UdpSocket,
    device: CoapLightDevice<I>,
    state_publisher: tokio::sync::watch::Sender<LightState>,
}

impl<I: NodeIdentity> CoapLightServer<I> {
    pub async fn bind(
        listen_addr: std::net::SocketAddr,
        device: CoapLightDevice<I>,
    ) -> anyhow::Result<(Self, tokio::sync::watch::Receiver<LightState>)> {
        let sock = tokio::net::UdpSocket::bind(listen_addr).await?;
        let (state_publisher, state_receiver) = tokio::sync::watch::channel(device.light_state());
        Ok((
            CoapLightServer {
                sock,
                device,
                state_publisher,
            },
            state_receiver,
        ))
    }

    pub fn local_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        Ok(self.sock.local_addr()?)
    }

    pub async fn run(mut self) {
        let mut buffer = vec![0_u8; 1500];

        loop {
            let (size, sender) = match self.sock.recv_from(&mut buffer[..]).await {
                Ok(ret) => ret,
                Err(err) => {
                    log::error!("UDP/COAP Receive Error: {:?}", err);
                    continue;
                }
            };
            self.handle_datagram(&buffer[..size], sender).await;
        }
    }

    async fn handle_datagram(&mut self, data: &[u8], sender: std::net::SocketAddr) {
        let request = match CoapDecoder::decode(data) {
            Ok(CoapMessage::Request(request)) => request,
            Ok(_) => {
                log::debug!("Unhandled COAP Message from {}", sender);
                return;
            }
            Err(err) => {
                log::warn!("UDP/COAP Decode Error from {}: {}", sender, err);
                return;
            }
        };

        let reply = self.device.handle(&request);
        self.state_publisher.send_replace(self.device.light_state());

        let reply = match reply {
            Some(reply) => reply,
            None => return,
        };

        let mut buffer = [0_u8; 512];
        let ((data, endpoint), _tail) =
            match COAPEncoder::encode_response(sender, &request, reply.content_format, reply.payload.as_bytes(), &mut buffer) {
                Ok(ret) => ret,
                Err(err) => {
                    log::error!("UDP/COAP Encode Error: {}", err);
                    return;
                }
            };

        if let Err(err) = self.sock.send_to(data, endpoint).await {
            log::error!("UDP/COAP Send Error: {:?}", err);
            return;
        }
        if reply.from_default_handler {
            log::info!("Got COAP message in default handler, replying '{}'", reply.payload);
        } else {
            log::info!("Got COAP message /{}, replying '{}'", request.path, reply.payload);
        }
    }
}
