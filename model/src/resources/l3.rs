// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Derived model: static routes and ARP entries.

use serde::{Deserialize, Serialize};

use crate::addrs::strip_subnet_suffix;

/// A static route on one switch. The destination may keep its `/prefix`;
/// the next hop is always stored stripped.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct StaticRoute {
    pub vrf_id: u32,
    pub description: String,
    pub dst_ip_addr: String,
    pub next_hop_addr: String,
    pub outgoing_interface: String,
    pub weight: u32,
    pub preference: u32,
}

impl StaticRoute {
    pub fn new(
        vrf_id: u32,
        description: &str,
        dst_ip_addr: &str,
        next_hop_addr: &str,
        outgoing_interface: &str,
        weight: u32,
        preference: u32,
    ) -> Self {
        Self {
            vrf_id,
            description: description.to_owned(),
            dst_ip_addr: dst_ip_addr.to_owned(),
            next_hop_addr: strip_subnet_suffix(next_hop_addr).to_owned(),
            outgoing_interface: outgoing_interface.to_owned(),
            weight,
            preference,
        }
    }
}

/// A static ARP entry, unique per (interface, ip).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ArpEntry {
    pub interface: String,
    pub ip_address: String,
    pub phys_address: String,
    pub static_config: bool,
}

impl ArpEntry {
    pub fn new(interface: &str, ip_address: &str, phys_address: &str) -> Self {
        Self {
            interface: interface.to_owned(),
            ip_address: ip_address.to_owned(),
            phys_address: phys_address.to_owned(),
            static_config: true,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn next_hop_is_stripped_but_destination_is_kept() {
        let route = StaticRoute::new(
            0,
            "IF_STATIC_ROUTE_H2H_vswitch2",
            "10.0.20.2/24",
            "192.168.4.2/24",
            "GigabitEthernet13/0",
            5,
            0,
        );
        assert_eq!(route.dst_ip_addr, "10.0.20.2/24");
        assert_eq!(route.next_hop_addr, "192.168.4.2");
    }
}
