// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Declarative model: external entities (physical routers at the edge).

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// The host-side interface an external entity is reachable through.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EeHostInterface {
    pub if_name: String,
    pub ipv4_addr: String,
}

/// The vxlan endpoint the external entity terminates tunnels on.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EeHostVxlan {
    pub if_name: String,
    pub source_ipv4: String,
}

/// Optional bridge-domain hint for the router side of the wiring; consumed
/// by the external-entity driver, opaque to the wiring engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EeHostBd {
    pub id: u32,
    pub bdi_ipv4: String,
    pub interfaces: Vec<String>,
}

/// Kind of driver used to push configuration to the router.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum ExternalDriverType {
    #[serde(rename = "EE_DRIVER_TYPE_UNKNOWN")]
    #[default]
    Unknown,
    #[serde(rename = "EE_DRIVER_TYPE_IOSXE_SSH")]
    IosXeSsh,
}

/// A physical router outside the switch fleet. The controller wires vxlan
/// bridges toward it and hands the router-side reconfiguration to the
/// external-entity driver.
#[derive(Builder, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[builder(default, setter(into))]
#[serde(default)]
pub struct ExternalEntity {
    pub name: String,
    pub mgmt_ipv4: String,
    pub mgmt_port: u32,
    pub basic_auth_user: String,
    pub basic_auth_passwd: String,
    pub ee_driver_type: ExternalDriverType,
    pub host_interface: Option<EeHostInterface>,
    pub host_vxlan: Option<EeHostVxlan>,
    pub host_bd: Option<EeHostBd>,
}
