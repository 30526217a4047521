// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-FileCopyrightText: © 2023 Claudio Cicconetti <c.cicconetti@iit.cnr.it>
// SPDX-License-Identifier: MIT

use std::net::{IpAddr, SocketAddr};

/// Parse the socket address from a `coap://host:port` url.
///
/// The host must be an IP address, IPv6 addresses in brackets. Names are not
/// resolved because the result is used to bind a socket.
pub fn parse_coap_host(raw: &str) -> anyhow::Result<SocketAddr> {
    let re = regex::Regex::new(r"(\w+):\/\/(.*):(\d+)")?;
    let val = match re.captures(raw) {
        Some(val) => val,
        None => return Err(anyhow::anyhow!("Regexp Parse Error, got '{:?}'", raw)),
    };
    if &val[1] != "coap" {
        return Err(anyhow::anyhow!("Protocol Parse Error, got '{:?}'", raw));
    }
    let port: u16 = match val[3].parse() {
        Ok(prt) => prt,
        Err(_) => {
            return Err(anyhow::anyhow!("Port Parse Error, got '{:?}'", raw));
        }
    };
    let ip = val[2]
        .parse::<IpAddr>()
        .ok()
        .or_else(|| val[2].strip_prefix('[')?.strip_suffix(']')?.parse::<IpAddr>().ok());
    match ip {
        Some(ip) => Ok(SocketAddr::new(ip, port)),
        None => Err(anyhow::anyhow!("Host Parse Error, got '{:?}'", raw)),
    }
}

/// Parse an EUI-64 written as eight colon-separated hex bytes.
pub fn parse_eui64(raw: &str) -> anyhow::Result<[u8; 8]> {
    let mut eui = [0_u8; 8];
    let mut groups = raw.trim().split(':');
    for byte in eui.iter_mut() {
        let group = groups.next().ok_or_else(|| anyhow::anyhow!("EUI-64 needs 8 groups, got '{}'", raw))?;
        *byte = u8::from_str_radix(group, 16).map_err(|_| anyhow::anyhow!("EUI-64 Parse Error, got '{}'", raw))?;
    }
    if groups.next().is_some() {
        anyhow::bail!("EUI-64 needs 8 groups, got '{}'", raw);
    }
    Ok(eui)
}

pub fn create_template(path: &str, content: &str) -> anyhow::Result<()> {
    assert!(!path.is_empty());
    match std::path::Path::new(&path).exists() {
        true => anyhow::bail!("cannot overwrite configuration file: {}", path),
        false => {
            std::fs::write(path, content)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coap_host() {
        assert!(parse_coap_host("coap://192.168.3.3").is_err(), "Missing port");
        assert!(parse_coap_host("http://127.0.0.1:5683").is_err(), "Wrong scheme");
        assert!(parse_coap_host("coap://localhost:5683").is_err(), "Names are not resolved");
        assert_eq!(parse_coap_host("coap://127.0.0.1:5683").unwrap(), "127.0.0.1:5683".parse().unwrap());
        assert_eq!(parse_coap_host("coap://[::]:5683").unwrap(), "[::]:5683".parse().unwrap());
        assert_eq!(parse_coap_host("coap://[fd00::1]:61631").unwrap(), "[fd00::1]:61631".parse().unwrap());
    }

    #[test]
    fn test_parse_eui64() {
        assert_eq!(parse_eui64("18:b4:30:0:0:0:0:1").unwrap(), [0x18, 0xb4, 0x30, 0, 0, 0, 0, 1]);
        assert!(parse_eui64("18:b4:30:0:0:0:0").is_err());
        assert!(parse_eui64("18:b4:30:0:0:0:0:1:2").is_err());
        assert!(parse_eui64("18:b4:30:0:0:0:0:zz").is_err());
        assert!(parse_eui64("18:b4:30:0:0:0:0:100").is_err());
    }

    #[test]
    fn test_create_template() {
        let path = std::env::temp_dir().join(format!("coaplight-template-{}.toml", std::process::id()));
        let path = path.to_str().unwrap();
        let _ = std::fs::remove_file(path);

        create_template(path, "console = false\n").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "console = false\n");
        assert!(create_template(path, "console = true\n").is_err());

        std::fs::remove_file(path).unwrap();
    }
}
