// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Derived model: bridge domains, L2 FIB entries and cross-connects.

use serde::{Deserialize, Serialize};

use crate::entities::BdParms;

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct BridgeDomainInterface {
    pub name: String,
}

/// An L2 broadcast domain on one switch. The member list behaves as a set:
/// adding an interface twice is a no-op. Members keep insertion order on
/// the write path; [`BridgeDomain::sorted_members`] exists for display and
/// comparison but is deliberately not applied when publishing.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BridgeDomain {
    pub name: String,
    pub flood: bool,
    pub unknown_unicast_flood: bool,
    pub forward: bool,
    pub learn: bool,
    pub arp_termination: bool,
    pub mac_age: u32,
    #[serde(default)]
    pub interfaces: Vec<BridgeDomainInterface>,
}

impl BridgeDomain {
    pub fn new(name: &str, parms: &BdParms) -> Self {
        Self {
            name: name.to_owned(),
            flood: parms.flood,
            unknown_unicast_flood: parms.unknown_unicast_flood,
            forward: parms.forward,
            learn: parms.learn,
            arp_termination: parms.arp_termination,
            mac_age: parms.mac_age,
            interfaces: vec![],
        }
    }

    /// Add a member interface; returns false when it was already present.
    pub fn add_interface(&mut self, if_name: &str) -> bool {
        if self.contains_interface(if_name) {
            return false;
        }
        self.interfaces.push(BridgeDomainInterface {
            name: if_name.to_owned(),
        });
        true
    }

    pub fn contains_interface(&self, if_name: &str) -> bool {
        self.interfaces.iter().any(|member| member.name == if_name)
    }

    /// Members in name order. Not used when publishing; member order there
    /// is insertion order.
    pub fn sorted_members(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .interfaces
            .iter()
            .map(|member| member.name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum L2FibAction {
    #[serde(rename = "FORWARD")]
    #[default]
    Forward,
}

/// A static (mac, outgoing-interface) entry in a bridge.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct L2FibEntry {
    pub bridge_domain: String,
    pub phys_address: String,
    pub action: L2FibAction,
    pub outgoing_interface: String,
    pub static_config: bool,
}

impl L2FibEntry {
    pub fn forward(bridge_domain: &str, mac: &str, outgoing_interface: &str) -> Self {
        Self {
            bridge_domain: bridge_domain.to_owned(),
            phys_address: mac.to_owned(),
            action: L2FibAction::Forward,
            outgoing_interface: outgoing_interface.to_owned(),
            static_config: true,
        }
    }
}

/// One direction of an L2 cross-connect; always installed as a symmetric
/// pair of records.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct XConnect {
    pub receive_interface: String,
    pub transmit_interface: String,
}

impl XConnect {
    pub fn new(rx_if: &str, tx_if: &str) -> Self {
        Self {
            receive_interface: rx_if.to_owned(),
            transmit_interface: tx_if.to_owned(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bridge_members_are_a_set() {
        let mut bd = BridgeDomain::new("BD_INTERNAL_EW_vswitch1", &BdParms::dynamic_defaults());
        assert!(bd.add_interface("if1"));
        assert!(bd.add_interface("if2"));
        assert!(!bd.add_interface("if1"));
        assert_eq!(bd.interfaces.len(), 2);
    }

    #[test]
    fn sorted_members_does_not_reorder_the_record() {
        let mut bd = BridgeDomain::new("BD_H2H_a_b", &BdParms::dynamic_defaults());
        bd.add_interface("zz");
        bd.add_interface("aa");
        assert_eq!(bd.sorted_members(), vec!["aa", "zz"]);
        assert_eq!(bd.interfaces[0].name, "zz");
    }
}
