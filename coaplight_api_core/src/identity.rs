// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT
use core::fmt::Write;

/// Identity queries answered by the network stack the device runs on.
pub trait NodeIdentity {
    /// Factory-assigned IEEE EUI-64.
    fn eui64(&self) -> [u8; 8];
    /// Mesh-local unicast address, if one is assigned.
    fn mesh_local_address(&self) -> Option<core::net::Ipv6Addr>;
}

/// Identity with fixed values, e.g. taken from a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticIdentity {
    pub eui64: [u8; 8],
    pub mesh_local_address: Option<core::net::Ipv6Addr>,
}

impl NodeIdentity for StaticIdentity {
    fn eui64(&self) -> [u8; 8] {
        self.eui64
    }

    fn mesh_local_address(&self) -> Option<core::net::Ipv6Addr> {
        self.mesh_local_address
    }
}

/// Eight unpadded lowercase hex groups, without `::` compression.
pub fn format_address(addr: &core::net::Ipv6Addr) -> heapless::String<64> {
    let mut out = heapless::String::new();
    for (i, group) in addr.segments().iter().enumerate() {
        let sep = if i == 0 { "" } else { ":" };
        let _ = write!(out, "{}{:x}", sep, group);
    }
    out
}

/// Eight unpadded lowercase hex bytes.
pub fn format_eui64(eui64: &[u8; 8]) -> heapless::String<32> {
    let mut out = heapless::String::new();
    for (i, byte) in eui64.iter().enumerate() {
        let sep = if i == 0 { "" } else { ":" };
        let _ = write!(out, "{}{:x}", sep, byte);
    }
    out
}
