// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Derived model: switch-side interface records.

use serde::{Deserialize, Serialize};

use crate::addrs::{ip_address_list, strip_subnet_suffix};
use crate::entities::RxMode;
use crate::namegen;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum VppInterfaceType {
    #[serde(rename = "ETHERNET_CSMACD")]
    #[default]
    Ethernet,
    #[serde(rename = "SOFTWARE_LOOPBACK")]
    Loopback,
    #[serde(rename = "VXLAN_TUNNEL")]
    VxlanTunnel,
    #[serde(rename = "MEMORY_INTERFACE")]
    Memif,
    #[serde(rename = "AF_PACKET_INTERFACE")]
    AfPacket,
}

/// Receive-mode as the dataplane agent spells it. The controller-side
/// [`RxMode::Unknown`] has no translation: no settings are emitted.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RxModeSettings {
    pub rx_mode: DataplaneRxMode,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum DataplaneRxMode {
    #[serde(rename = "POLLING")]
    Polling,
    #[serde(rename = "INTERRUPT")]
    Interrupt,
}

impl RxModeSettings {
    /// Translate the controller rx-mode enum to the dataplane one.
    pub fn from_controller(mode: RxMode) -> Option<Self> {
        match mode {
            RxMode::Unknown => None,
            RxMode::Polling => Some(Self {
                rx_mode: DataplaneRxMode::Polling,
            }),
            RxMode::Interrupt => Some(Self {
                rx_mode: DataplaneRxMode::Interrupt,
            }),
        }
    }
}

/// VXLAN tunnel payload. Endpoint addresses are stored stripped of any
/// `/prefix` suffix.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct VxlanLink {
    pub src_address: String,
    pub dst_address: String,
    pub vni: u32,
}

/// Shared-memory interface payload. Both ends of a pair carry the same id
/// and socket; exactly one end is the master.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MemifLink {
    pub id: u32,
    pub master: bool,
    pub socket_filename: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AfpacketLink {
    pub host_if_name: String,
}

/// Parameters for a memif end; the socket is derived from the master
/// container's name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MemifParams {
    pub id: u32,
    pub master: bool,
    pub master_container: String,
}

/// A switch-side interface record.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct VppInterface {
    pub name: String,
    #[serde(rename = "type")]
    pub if_type: VppInterfaceType,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub phys_address: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_addresses: Vec<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub mtu: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rx_mode_settings: Option<RxModeSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vxlan: Option<VxlanLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memif: Option<MemifLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub afpacket: Option<AfpacketLink>,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl VppInterface {
    fn base(name: &str, if_type: VppInterfaceType) -> Self {
        Self {
            name: name.to_owned(),
            if_type,
            enabled: true,
            phys_address: String::new(),
            ip_addresses: vec![],
            mtu: 0,
            rx_mode_settings: None,
            vxlan: None,
            memif: None,
            afpacket: None,
        }
    }

    pub fn ethernet(name: &str, ipv4: &str, mac: &str, ipv6: &str, mtu: u32, rx: RxMode) -> Self {
        let mut iface = Self::base(name, VppInterfaceType::Ethernet);
        iface.phys_address = mac.to_owned();
        iface.ip_addresses = ip_address_list(ipv4, ipv6);
        iface.mtu = mtu;
        iface.rx_mode_settings = RxModeSettings::from_controller(rx);
        iface
    }

    pub fn loopback(name: &str, mac: &str, ipv4: &str, ipv6: &str, mtu: u32, rx: RxMode) -> Self {
        let mut iface = Self::base(name, VppInterfaceType::Loopback);
        iface.phys_address = mac.to_owned();
        iface.ip_addresses = ip_address_list(ipv4, ipv6);
        iface.mtu = mtu;
        iface.rx_mode_settings = RxModeSettings::from_controller(rx);
        iface
    }

    pub fn vxlan_tunnel(name: &str, vni: u32, src: &str, dst: &str) -> Self {
        let mut iface = Self::base(name, VppInterfaceType::VxlanTunnel);
        iface.vxlan = Some(VxlanLink {
            src_address: strip_subnet_suffix(src).to_owned(),
            dst_address: strip_subnet_suffix(dst).to_owned(),
            vni,
        });
        iface
    }

    pub fn memif(
        name: &str,
        params: MemifParams,
        ipv4: &str,
        mac: &str,
        ipv6: &str,
        mtu: u32,
        rx: RxMode,
    ) -> Self {
        let mut iface = Self::base(name, VppInterfaceType::Memif);
        iface.phys_address = mac.to_owned();
        iface.ip_addresses = ip_address_list(ipv4, ipv6);
        iface.mtu = mtu;
        iface.rx_mode_settings = RxModeSettings::from_controller(rx);
        iface.memif = Some(MemifLink {
            id: params.id,
            master: params.master,
            socket_filename: namegen::memif_socket(&params.master_container),
        });
        iface
    }

    pub fn afpacket(
        name: &str,
        host_if_name: &str,
        ipv4: &str,
        mac: &str,
        ipv6: &str,
        mtu: u32,
        rx: RxMode,
    ) -> Self {
        let mut iface = Self::base(name, VppInterfaceType::AfPacket);
        iface.phys_address = mac.to_owned();
        iface.ip_addresses = ip_address_list(ipv4, ipv6);
        iface.mtu = mtu;
        iface.rx_mode_settings = RxModeSettings::from_controller(rx);
        iface.afpacket = Some(AfpacketLink {
            host_if_name: host_if_name.to_owned(),
        });
        iface
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn vxlan_endpoints_are_stripped() {
        let iface = VppInterface::vxlan_tunnel("IF_VXLAN_H2H_a_b", 5001, "10.0.20.1/24", "10.0.20.2/24");
        let vxlan = iface.vxlan.expect("vxlan payload");
        assert_eq!(vxlan.src_address, "10.0.20.1");
        assert_eq!(vxlan.dst_address, "10.0.20.2");
        assert_eq!(vxlan.vni, 5001);
    }

    #[test]
    fn unknown_rx_mode_emits_no_settings() {
        let iface = VppInterface::ethernet("GigabitEthernet13/0", "", "", "", 1500, RxMode::Unknown);
        assert!(iface.rx_mode_settings.is_none());
        let iface = VppInterface::ethernet("GigabitEthernet13/0", "", "", "", 1500, RxMode::Polling);
        assert_eq!(
            iface.rx_mode_settings,
            Some(RxModeSettings {
                rx_mode: DataplaneRxMode::Polling
            })
        );
    }

    #[test]
    fn memif_socket_follows_master_container() {
        let iface = VppInterface::memif(
            "port1",
            MemifParams {
                id: 3,
                master: false,
                master_container: "vswitch1".to_owned(),
            },
            "10.0.1.1/24",
            "02:00:00:00:00:01",
            "",
            1500,
            RxMode::Unknown,
        );
        let memif = iface.memif.expect("memif payload");
        assert_eq!(memif.socket_filename, "/tmp/memif_vswitch1.sock");
        assert!(!memif.master);
        assert_eq!(iface.ip_addresses, vec!["10.0.1.1/24".to_owned()]);
    }
}
