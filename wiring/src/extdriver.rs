// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! External-entity driver seam.
//!
//! The engine holds a driver handle and calls it exactly once per
//! (external entity, host) edge, the first time a vxlan bridge toward
//! that entity comes into existence. What the driver does with the call
//! (ssh to the router, queue a message) is its own business.

use sfcctl_model::entities::{ExternalEntity, HostEntity};
use sfcctl_model::resources::StaticRoute;

/// Pushes wiring decisions down to a physical router.
pub trait ExternalEntityDriver: Send {
    /// Called once per (ee, he) edge with the VNI chosen for the tunnel
    /// and the router-side static route toward the host.
    fn wire_external_to_host(
        &mut self,
        ee: &ExternalEntity,
        he: &HostEntity,
        vni: u32,
        route: &StaticRoute,
    ) -> impl Future<Output = ()> + Send;
}

/// Driver that drops every call; for hosts with no external entities.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullDriver;

impl ExternalEntityDriver for NullDriver {
    async fn wire_external_to_host(
        &mut self,
        _ee: &ExternalEntity,
        _he: &HostEntity,
        _vni: u32,
        _route: &StaticRoute,
    ) {
    }
}

/// One recorded driver invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedWire {
    pub ee: String,
    pub he: String,
    pub vni: u32,
    pub route: StaticRoute,
}

/// Driver that records every call; test instrumentation.
#[derive(Debug, Default)]
pub struct RecordingDriver {
    pub wires: Vec<RecordedWire>,
}

impl ExternalEntityDriver for RecordingDriver {
    async fn wire_external_to_host(
        &mut self,
        ee: &ExternalEntity,
        he: &HostEntity,
        vni: u32,
        route: &StaticRoute,
    ) {
        self.wires.push(RecordedWire {
            ee: ee.name.clone(),
            he: he.name.clone(),
            vni,
            route: route.clone(),
        });
    }
}
