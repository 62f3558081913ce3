// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Declarative model: service function chains and their elements.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::entities::{BdParms, RxMode};

/// The kind of a chain. Ten kinds collapse into three wiring algorithms:
/// north-south over vxlan, north-south over a NIC, and east-west.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum SfcType {
    #[serde(rename = "SFC_UNKNOWN_TYPE")]
    #[default]
    Unknown,
    #[serde(rename = "SFC_NS_VXLAN")]
    NsVxlan,
    #[serde(rename = "SFC_NS_NIC_BD")]
    NsNicBd,
    #[serde(rename = "SFC_NS_NIC_VRF")]
    NsNicVrf,
    #[serde(rename = "SFC_NS_NIC_L2XCONN")]
    NsNicL2Xconn,
    #[serde(rename = "SFC_EW_MEMIF")]
    EwMemif,
    #[serde(rename = "SFC_EW_BD")]
    EwBd,
    #[serde(rename = "SFC_EW_BD_L2FIB")]
    EwBdL2Fib,
    #[serde(rename = "SFC_EW_L2XCONN")]
    EwL2Xconn,
    #[serde(rename = "SFC_NS_VXLAN_VRF")]
    NsVxlanVrf,
}

/// What an element of a chain refers to.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum SfcElementType {
    #[serde(rename = "ELEMENT_UNKNOWN")]
    #[default]
    Unknown,
    #[serde(rename = "EXTERNAL_ENTITY")]
    ExternalEntity,
    #[serde(rename = "HOST_ENTITY")]
    HostEntity,
    #[serde(rename = "VPP_CONTAINER_MEMIF")]
    VppContainerMemif,
    #[serde(rename = "NON_VPP_CONTAINER_MEMIF")]
    NonVppContainerMemif,
    #[serde(rename = "VPP_CONTAINER_AFP")]
    VppContainerAfp,
    #[serde(rename = "NON_VPP_CONTAINER_AFP")]
    NonVppContainerAfp,
}

/// A static route an element asks the engine to install (VRF chains).
/// The outgoing interface is the vswitch end of the element's pair and is
/// chosen by the engine, not the operator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct L3VrfRoute {
    pub vrf_id: u32,
    pub description: String,
    pub dst_ip_addr: String,
    pub next_hop_addr: String,
    pub weight: u32,
    pub preference: u32,
}

/// A static ARP entry an element asks the engine to install (VRF chains).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct L3ArpEntry {
    pub ip_address: String,
    pub phys_address: String,
}

/// One element of a chain: a VNF container port, or a reference to a host
/// or external entity the chain terminates on.
#[derive(Builder, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[builder(default, setter(into))]
#[serde(default)]
pub struct SfcElement {
    pub container: String,
    pub port_label: String,
    /// Which host's switch owns this element's vswitch-end interface.
    pub etcd_vpp_switch_key: String,
    /// Legacy spelling still accepted from old inputs; the engine never
    /// reads it. Pending operator review.
    pub etcd_vpp_switch_key1: String,
    pub ipv4_addr: String,
    pub ipv6_addr: String,
    pub mac_addr: String,
    #[serde(rename = "type")]
    pub element_type: SfcElementType,
    pub vlan_id: u32,
    pub mtu: u32,
    pub rx_mode: RxMode,
    pub l2fib_macs: Vec<String>,
    pub l3vrf_routes: Vec<L3VrfRoute>,
    pub l3arp_entries: Vec<L3ArpEntry>,
}

/// A service function chain: an ordered list of elements plus the policy
/// knobs that shape how they are wired together.
#[derive(Builder, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[builder(default, setter(into))]
#[serde(default)]
pub struct SfcEntity {
    pub name: String,
    #[serde(rename = "type")]
    pub sfc_type: SfcType,
    /// When set, container ports without an explicit IPv4 get one assigned
    /// from this prefix.
    pub sfc_ipv4_prefix: String,
    /// Fan-out knob for stress tests: insert this many synthetic `vnfx-N`
    /// hops into each east-west memif pair.
    pub vnf_repeat_count: u32,
    /// Per-chain bridge parameters; east-west L2-FIB chains carrying these
    /// get their own bridge instead of the host default.
    pub bd_parms: Option<BdParms>,
    pub elements: Vec<SfcElement>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sfc_type_wire_names() {
        let json = serde_json::to_string(&SfcType::EwBdL2Fib).expect("serializes");
        assert_eq!(json, "\"SFC_EW_BD_L2FIB\"");
        let back: SfcType = serde_json::from_str(&json).expect("parses");
        assert_eq!(back, SfcType::EwBdL2Fib);
    }

    #[test]
    fn element_defaults_to_unknown_type() {
        let element: SfcElement = serde_json::from_str("{\"container\": \"vnf1\"}").expect("parses");
        assert_eq!(element.element_type, SfcElementType::Unknown);
        assert_eq!(element.container, "vnf1");
    }

    #[test]
    fn legacy_switch_key_is_carried() {
        let element: SfcElement =
            serde_json::from_str("{\"etcd_vpp_switch_key1\": \"vswitch1\"}").expect("parses");
        assert_eq!(element.etcd_vpp_switch_key1, "vswitch1");
        assert!(element.etcd_vpp_switch_key.is_empty());
    }
}
