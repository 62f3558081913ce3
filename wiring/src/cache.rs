// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! In-memory derived state.
//!
//! The cache answers one question for the engine: "has this sub-resource
//! already been created during this run?". Edge entries hold three
//! independently-nullable slots that only ever move from absent to
//! present; removal is the reconciler's business, not the engine's. The
//! cached bridge-domain records are authoritative for member lists while a
//! run is in flight.

use std::collections::BTreeMap;

use sfcctl_model::entities::{ExternalEntity, HostEntity, SfcEntity, SystemParameters};
use sfcctl_model::resources::{BridgeDomain, StaticRoute, VppInterface};

/// Declarative entities seen so far, by name.
#[derive(Default)]
pub struct EntityCache {
    pub system: SystemParameters,
    pub hes: BTreeMap<String, HostEntity>,
    pub ees: BTreeMap<String, ExternalEntity>,
    pub sfcs: BTreeMap<String, SfcEntity>,
}

/// Lazily-materialized state of one (host, host) or (host, external)
/// edge. Slots fill in the order tunnel, route, bridge; a filled slot is
/// never overwritten.
#[derive(Default)]
pub struct EdgeState {
    pub vxlan_if: Option<VppInterface>,
    pub route: Option<StaticRoute>,
    pub bridge: Option<BridgeDomain>,
}

/// Per-host state: the two default east-west bridges.
#[derive(Default)]
pub struct HostState {
    pub ew_bridge: Option<BridgeDomain>,
    pub ew_l2fib_bridge: Option<BridgeDomain>,
}

/// Address assignment recorded for one container port.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SfcIfAddr {
    pub ip_address: String,
    pub mac_address: String,
}

/// All derived state of one engine run.
#[derive(Default)]
pub struct StateCache {
    pub he: BTreeMap<String, HostState>,
    pub he_to_ees: BTreeMap<String, BTreeMap<String, EdgeState>>,
    pub he_to_hes: BTreeMap<String, BTreeMap<String, EdgeState>>,
    /// Override bridges of chains that carry their own bridge parameters,
    /// per (chain, switch).
    pub sfc_to_hes: BTreeMap<String, BTreeMap<String, BridgeDomain>>,
    pub sfc_if_addr: BTreeMap<String, SfcIfAddr>,
}

impl StateCache {
    pub fn he_to_ee_mut(&mut self, he: &str, ee: &str) -> Option<&mut EdgeState> {
        self.he_to_ees.get_mut(he)?.get_mut(ee)
    }

    pub fn he_to_he_mut(&mut self, sh: &str, dh: &str) -> Option<&mut EdgeState> {
        self.he_to_hes.get_mut(sh)?.get_mut(dh)
    }

    pub fn set_sfc_if_addr(&mut self, container: &str, port: &str, ip: &str, mac: &str) {
        self.sfc_if_addr.insert(
            format!("{container}/{port}"),
            SfcIfAddr {
                ip_address: ip.to_owned(),
                mac_address: mac.to_owned(),
            },
        );
    }

    pub fn sfc_if_addr(&self, container: &str, port: &str) -> Option<&SfcIfAddr> {
        self.sfc_if_addr.get(&format!("{container}/{port}"))
    }
}
