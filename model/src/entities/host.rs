// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Declarative model: host entities.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::entities::RxMode;

/// A host running a programmable software switch. Addresses are textual
/// IPv4/IPv6, optionally carrying a `/prefix` suffix; empty strings mean
/// "not configured", mirroring the wire schema this model is loaded from.
#[derive(Builder, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[builder(default, setter(into))]
#[serde(default)]
pub struct HostEntity {
    pub name: String,
    /// Admin NIC of the switch; also the outgoing interface of vxlan
    /// static routes sourced at this host.
    pub eth_if_name: String,
    pub eth_ipv4: String,
    pub eth_ipv6: String,
    pub loopback_mac_addr: String,
    pub loopback_ipv4: String,
    pub loopback_ipv6: String,
    /// Tunnel source address used for every vxlan terminating here.
    pub vxlan_tunnel_ipv4: String,
    pub create_vxlan_static_route: bool,
    pub mtu: u32,
    pub rx_mode: RxMode,
}
