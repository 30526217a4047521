// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-FileCopyrightText: © 2023 Claudio Cicconetti <c.cicconetti@iit.cnr.it>
// SPDX-FileCopyrightText: © 2023 Siemens AG
// SPDX-License-Identifier: MIT
pub mod console;
pub mod server;
pub mod switch_sim;
pub mod util;

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct CoapLightNodeSettings {
    /// URL the CoAP server listens on, e.g., `coap://[::]:5683`.
    pub coap_url: String,
    /// EUI-64 reported by `GET ident`.
    pub eui64: String,
    /// Mesh-local address reported by `GET ident`, empty if the node has none.
    #[serde(default)]
    pub mesh_local_address: String,
    /// Port the switch simulator sends toggles to.
    #[serde(default = "default_switchsim_port")]
    pub switchsim_port: u16,
    /// Read operator commands from stdin.
    #[serde(default)]
    pub console: bool,
}

fn default_switchsim_port() -> u16 {
    coaplight_api_core::common::COAP_DEFAULT_PORT
}

pub fn coaplight_node_default_conf() -> String {
    String::from(
        r##"coap_url = "coap://[::]:5683"
eui64 = "18:b4:30:00:00:00:00:01"
mesh_local_address = "fd00:db8::1"
switchsim_port = 5683
console = true
"##,
    )
}

fn identity_from_settings(settings: &CoapLightNodeSettings) -> anyhow::Result<coaplight_api_core::identity::StaticIdentity> {
    let mesh_local_address = match settings.mesh_local_address.trim() {
        "" => None,
        raw => Some(
            raw.parse::<std::net::Ipv6Addr>()
                .map_err(|_| anyhow::anyhow!("invalid mesh_local_address: {}", raw))?,
        ),
    };
    Ok(coaplight_api_core::identity::StaticIdentity {
        eui64: util::parse_eui64(&settings.eui64)?,
        mesh_local_address,
    })
}

pub async fn coaplight_node_main(settings: CoapLightNodeSettings) -> anyhow::Result<()> {
    log::info!("Starting CoAP Light Node");
    log::debug!("Settings: {:?}", settings);

    let listen_addr = util::parse_coap_host(&settings.coap_url)?;
    let identity = identity_from_settings(&settings)?;

    // Create the server, which owns the light state.
    let device = coaplight_api_core::resource::CoapLightDevice::new(identity);
    let (server, light_state) = server::CoapLightServer::bind(listen_addr, device).await?;
    log::info!("CoAP server listening on {}", server.local_addr()?);

    // Create the switch simulator, idle until started from the console.
    let (switch_sim, switch_sim_handle) = switch_sim::SwitchSim::new();

    let console_task = async {
        if settings.console {
            console::Console::new(switch_sim_handle, light_state, settings.switchsim_port).run().await;
        } else {
            // Keep the handle alive so that the simulator keeps running.
            let _handle = switch_sim_handle;
            std::future::pending::<()>().await;
        }
    };

    let _ = futures::join!(server.run(), switch_sim.run(), console_task);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_conf_is_valid() {
        let settings: CoapLightNodeSettings = toml::from_str(&coaplight_node_default_conf()).unwrap();
        assert_eq!(util::parse_coap_host(&settings.coap_url).unwrap(), "[::]:5683".parse().unwrap());
        let identity = identity_from_settings(&settings).unwrap();
        assert_eq!(identity.eui64, [0x18, 0xb4, 0x30, 0, 0, 0, 0, 1]);
        assert_eq!(identity.mesh_local_address, Some("fd00:db8::1".parse().unwrap()));
        assert!(settings.console);
    }

    #[test]
    fn optional_settings() {
        let settings: CoapLightNodeSettings = toml::from_str(
            r#"coap_url = "coap://127.0.0.1:5683"
eui64 = "0:0:0:0:0:0:0:0"
"#,
        )
        .unwrap();
        assert_eq!(settings.switchsim_port, 5683);
        assert!(!settings.console);
        assert_eq!(identity_from_settings(&settings).unwrap().mesh_local_address, None);

        let mut bad = settings.clone();
        bad.mesh_local_address = String::from("10.0.0.1");
        assert!(identity_from_settings(&bad).is_err());
    }

    #[tokio::test]
    async fn switch_sim_toggles_the_light() {
        let device = coaplight_api_core::resource::CoapLightDevice::new(coaplight_api_core::identity::StaticIdentity {
            eui64: [0; 8],
            mesh_local_address: None,
        });
        let (server, mut light_state) = server::CoapLightServer::bind("127.0.0.1:0".parse().unwrap(), device).await.unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run());

        let (switch_sim, handle) = switch_sim::SwitchSim::new();
        tokio::spawn(switch_sim.run());
        handle.start(addr, std::time::Duration::from_millis(100_000)).unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(2), light_state.wait_for(|state| state.level == 255))
            .await
            .expect("light was not toggled")
            .unwrap();
        handle.stop().unwrap();
    }
}
