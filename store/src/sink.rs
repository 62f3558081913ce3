// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Write sinks for derived resources.
//!
//! The engine writes the reconcilable resource kinds through a
//! [`ResourceSink`]. In normal operation that is the [`LiveStoreSink`],
//! which writes straight through to the store. During a reconcile cycle it
//! is a [`ReconcileBuffer`], which accumulates the would-be writes into an
//! "after" map for the diff instead of touching the store.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use sfcctl_model::resources::{BridgeDomain, LinuxInterface, StaticRoute, VppInterface};

use crate::keys;
use crate::{Store, StoreError, StoreResult, to_store_value};

/// Destination of reconcilable resource writes.
pub trait ResourceSink {
    fn put_interface(
        &mut self,
        switch: &str,
        iface: &VppInterface,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn put_bridge_domain(
        &mut self,
        switch: &str,
        bd: &BridgeDomain,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn put_static_route(
        &mut self,
        switch: &str,
        route: &StaticRoute,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn put_linux_interface(
        &mut self,
        switch: &str,
        iface: &LinuxInterface,
    ) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Write-through sink used outside reconciliation.
#[derive(Debug)]
pub struct LiveStoreSink<S> {
    store: Arc<S>,
}

impl<S: Store> LiveStoreSink<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    async fn put<T: serde::Serialize>(&self, key: String, record: &T) -> StoreResult<()> {
        let value = to_store_value(&key, record)?;
        self.store.put(&key, value).await
    }
}

impl<S: Store> ResourceSink for LiveStoreSink<S> {
    async fn put_interface(&mut self, switch: &str, iface: &VppInterface) -> StoreResult<()> {
        self.put(keys::interface_key(switch, &iface.name), iface).await
    }

    async fn put_bridge_domain(&mut self, switch: &str, bd: &BridgeDomain) -> StoreResult<()> {
        self.put(keys::bridge_domain_key(switch, &bd.name), bd).await
    }

    async fn put_static_route(&mut self, switch: &str, route: &StaticRoute) -> StoreResult<()> {
        let key = keys::route_key(switch, route.vrf_id, &route.dst_ip_addr, &route.next_hop_addr);
        self.put(key, route).await
    }

    async fn put_linux_interface(&mut self, switch: &str, iface: &LinuxInterface) -> StoreResult<()> {
        self.put(keys::linux_interface_key(switch, &iface.name), iface)
            .await
    }
}

/// Buffering sink used while a reconcile cycle re-derives the target
/// state. Bridge-domain writes merge member lists so that repeated puts of
/// the same bridge accumulate rather than clobber.
#[derive(Debug, Default)]
pub struct ReconcileBuffer {
    after: BTreeMap<String, Value>,
}

impl ReconcileBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The accumulated "after" state, consumed by the diff.
    pub fn into_after(self) -> BTreeMap<String, Value> {
        self.after
    }

    fn buffer<T: serde::Serialize>(&mut self, key: String, record: &T) -> StoreResult<()> {
        let value = to_store_value(&key, record)?;
        self.after.insert(key, value);
        Ok(())
    }
}

impl ResourceSink for ReconcileBuffer {
    async fn put_interface(&mut self, switch: &str, iface: &VppInterface) -> StoreResult<()> {
        self.buffer(keys::interface_key(switch, &iface.name), iface)
    }

    async fn put_bridge_domain(&mut self, switch: &str, bd: &BridgeDomain) -> StoreResult<()> {
        let key = keys::bridge_domain_key(switch, &bd.name);
        let merged = match self.after.get(&key) {
            None => bd.clone(),
            Some(buffered) => {
                let previous: BridgeDomain = serde_json::from_value(buffered.clone())
                    .map_err(|source| StoreError::Decode {
                        key: key.clone(),
                        source,
                    })?;
                let mut merged = bd.clone();
                for member in &previous.interfaces {
                    merged.add_interface(&member.name);
                }
                merged
            }
        };
        debug!(%key, members = merged.interfaces.len(), "buffering bridge domain");
        self.buffer(key, &merged)
    }

    async fn put_static_route(&mut self, switch: &str, route: &StaticRoute) -> StoreResult<()> {
        let key = keys::route_key(switch, route.vrf_id, &route.dst_ip_addr, &route.next_hop_addr);
        self.buffer(key, route)
    }

    async fn put_linux_interface(&mut self, switch: &str, iface: &LinuxInterface) -> StoreResult<()> {
        self.buffer(keys::linux_interface_key(switch, &iface.name), iface)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use sfcctl_model::entities::BdParms;

    #[tokio::test]
    async fn buffered_bridges_accumulate_members() {
        let mut buffer = ReconcileBuffer::new();
        let mut bd = BridgeDomain::new("BD_INTERNAL_EW_sw1", &BdParms::dynamic_defaults());
        bd.add_interface("if1");
        buffer.put_bridge_domain("sw1", &bd).await.expect("buffered");

        let mut bd2 = BridgeDomain::new("BD_INTERNAL_EW_sw1", &BdParms::dynamic_defaults());
        bd2.add_interface("if2");
        buffer.put_bridge_domain("sw1", &bd2).await.expect("buffered");

        let after = buffer.into_after();
        let merged: BridgeDomain = serde_json::from_value(
            after
                .get("/sfc-controller/v1/switch/sw1/bridge-domain/BD_INTERNAL_EW_sw1")
                .expect("bridge is buffered")
                .clone(),
        )
        .expect("decodes");
        assert!(merged.contains_interface("if1"));
        assert!(merged.contains_interface("if2"));
    }
}
