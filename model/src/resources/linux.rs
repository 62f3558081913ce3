// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Derived model: kernel veth interfaces managed through the agents'
//! linux plugin.

use serde::{Deserialize, Serialize};

use crate::addrs::ip_address_list;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum LinuxInterfaceType {
    #[serde(rename = "VETH")]
    #[default]
    Veth,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum LinuxNamespaceType {
    #[serde(rename = "MICROSERVICE_REF_NS")]
    #[default]
    MicroserviceRef,
}

/// The container namespace an interface end lives in, referenced by the
/// container's microservice label.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct LinuxNamespace {
    #[serde(rename = "type")]
    pub ns_type: LinuxNamespaceType,
    pub microservice: String,
}

/// One end of a kernel veth pair. Both ends must exist before an af-packet
/// interface binds to the host-side name.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LinuxInterface {
    pub name: String,
    #[serde(rename = "type")]
    pub if_type: LinuxInterfaceType,
    pub enabled: bool,
    pub host_if_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub phys_address: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_addresses: Vec<String>,
    pub mtu: u32,
    pub namespace: LinuxNamespace,
    pub peer_if_name: String,
}

impl LinuxInterface {
    #[allow(clippy::too_many_arguments)]
    pub fn veth(
        name: &str,
        host_if_name: &str,
        peer_if_name: &str,
        container: &str,
        mac: &str,
        ipv4: &str,
        ipv6: &str,
        mtu: u32,
    ) -> Self {
        Self {
            name: name.to_owned(),
            if_type: LinuxInterfaceType::Veth,
            enabled: true,
            host_if_name: host_if_name.to_owned(),
            phys_address: mac.to_owned(),
            ip_addresses: ip_address_list(ipv4, ipv6),
            mtu,
            namespace: LinuxNamespace {
                ns_type: LinuxNamespaceType::MicroserviceRef,
                microservice: container.to_owned(),
            },
            peer_if_name: peer_if_name.to_owned(),
        }
    }
}
