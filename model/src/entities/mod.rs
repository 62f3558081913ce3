// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Declarative input model.
//! This is what a loader (YAML, JSON, RPC) hands the controller: the
//! operator's description of hosts, external routers and service chains.

pub mod external;
pub mod host;
pub mod sfc;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use crate::{ConfigError, ConfigResult};

pub use external::{EeHostBd, EeHostInterface, EeHostVxlan, ExternalEntity, ExternalEntityBuilder};
pub use host::{HostEntity, HostEntityBuilder};
pub use sfc::{
    L3ArpEntry, L3VrfRoute, SfcElement, SfcElementBuilder, SfcElementType, SfcEntity,
    SfcEntityBuilder, SfcType,
};

/// Packet receive mode requested for an interface.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum RxMode {
    #[serde(rename = "RX_MODE_UNKNOWN")]
    #[default]
    Unknown,
    #[serde(rename = "RX_MODE_POLLING")]
    Polling,
    #[serde(rename = "RX_MODE_INTERRUPT")]
    Interrupt,
}

/// Bridge-domain parameter set. Two canonical instances live in
/// [`SystemParameters`]: the dynamic (flood/learn) one and the static
/// (L2-FIB driven) one.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BdParms {
    pub flood: bool,
    pub unknown_unicast_flood: bool,
    pub forward: bool,
    pub learn: bool,
    pub arp_termination: bool,
    pub mac_age: u32,
}

impl BdParms {
    /// Flood/learn bridge used by dynamic east-west chains.
    pub fn dynamic_defaults() -> Self {
        Self {
            flood: true,
            unknown_unicast_flood: true,
            forward: true,
            learn: true,
            arp_termination: false,
            mac_age: 0,
        }
    }

    /// Static bridge used by L2-FIB driven chains.
    pub fn static_defaults() -> Self {
        Self {
            flood: false,
            unknown_unicast_flood: false,
            forward: true,
            learn: false,
            arp_termination: false,
            mac_age: 0,
        }
    }
}

/// System-wide wiring defaults. Zero-valued fields are filled in by
/// [`ControllerConfig::validate`] before the engine sees them.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemParameters {
    pub mtu: u32,
    pub starting_vlan_id: u32,
    pub default_static_route_weight: u32,
    pub default_static_route_preference: u32,
    pub dynamic_bridge_parms: BdParms,
    pub static_bridge_parms: BdParms,
}

impl SystemParameters {
    pub const DEFAULT_MTU: u32 = 1500;
    pub const DEFAULT_STARTING_VLAN_ID: u32 = 5000;
    pub const DEFAULT_STATIC_ROUTE_WEIGHT: u32 = 5;
    pub const DEFAULT_STATIC_ROUTE_PREFERENCE: u32 = 0;
}

impl Default for SystemParameters {
    fn default() -> Self {
        Self {
            mtu: Self::DEFAULT_MTU,
            starting_vlan_id: Self::DEFAULT_STARTING_VLAN_ID,
            default_static_route_weight: Self::DEFAULT_STATIC_ROUTE_WEIGHT,
            default_static_route_preference: Self::DEFAULT_STATIC_ROUTE_PREFERENCE,
            dynamic_bridge_parms: BdParms::dynamic_defaults(),
            static_bridge_parms: BdParms::static_defaults(),
        }
    }
}

/// The full declarative input: everything one reconcile cycle consumes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub system_parameters: SystemParameters,
    pub host_entities: Vec<HostEntity>,
    pub external_entities: Vec<ExternalEntity>,
    pub sfc_entities: Vec<SfcEntity>,
}

impl ControllerConfig {
    /// Normalize defaults and reject duplicate entity names. The wiring
    /// engine assumes a validated config; deeper semantic checks (element
    /// counts, dangling references) are reported per chain while wiring.
    pub fn validate(&mut self) -> ConfigResult {
        debug!("validating controller config");
        let sp = &mut self.system_parameters;
        if sp.mtu == 0 {
            sp.mtu = SystemParameters::DEFAULT_MTU;
        }
        if sp.starting_vlan_id == 0 {
            sp.starting_vlan_id = SystemParameters::DEFAULT_STARTING_VLAN_ID;
        }
        if sp.default_static_route_weight == 0 {
            sp.default_static_route_weight = SystemParameters::DEFAULT_STATIC_ROUTE_WEIGHT;
        }

        check_unique("host", self.host_entities.iter().map(|he| he.name.as_str()))?;
        check_unique(
            "external",
            self.external_entities.iter().map(|ee| ee.name.as_str()),
        )?;
        check_unique("sfc", self.sfc_entities.iter().map(|sfc| sfc.name.as_str()))?;
        Ok(())
    }
}

fn check_unique<'a>(kind: &'static str, names: impl Iterator<Item = &'a str>) -> ConfigResult {
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ConfigError::DuplicateEntity {
                kind,
                name: name.to_owned(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn system_parameter_defaults() {
        let sp = SystemParameters::default();
        assert_eq!(sp.mtu, 1500);
        assert_eq!(sp.starting_vlan_id, 5000);
        assert_eq!(sp.default_static_route_weight, 5);
        assert_eq!(sp.default_static_route_preference, 0);
        assert!(sp.dynamic_bridge_parms.learn);
        assert!(!sp.static_bridge_parms.learn);
    }

    #[test]
    fn validate_fills_zeroed_defaults() {
        let mut config = ControllerConfig::default();
        config.system_parameters.mtu = 0;
        config.system_parameters.starting_vlan_id = 0;
        config.validate().expect("config is valid");
        assert_eq!(config.system_parameters.mtu, 1500);
        assert_eq!(config.system_parameters.starting_vlan_id, 5000);
    }

    #[test]
    fn validate_rejects_duplicate_hosts() {
        let mut config = ControllerConfig::default();
        for _ in 0..2 {
            config.host_entities.push(HostEntity {
                name: "vswitch1".to_owned(),
                ..HostEntity::default()
            });
        }
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateEntity {
                kind: "host",
                name: "vswitch1".to_owned()
            })
        );
    }
}
