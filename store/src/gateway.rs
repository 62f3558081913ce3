// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The store gateway: typed writes for every derived resource kind, plus
//! the sink swap that brackets a reconcile cycle.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use sfcctl_model::resources::{
    ArpEntry, BridgeDomain, L2FibEntry, LinuxInterface, StaticRoute, VppInterface, XConnect,
};

use crate::sink::{LiveStoreSink, ReconcileBuffer, ResourceSink};
use crate::{Store, StoreResult, keys, to_store_value};

enum WriteSink<S> {
    Live(LiveStoreSink<S>),
    Reconcile(ReconcileBuffer),
}

/// Gateway between the wiring engine and the store.
///
/// Interfaces, bridge domains, static routes and linux interfaces flow
/// through the current [`ResourceSink`]; ARP, L2-FIB and cross-connect
/// records always take the direct path and stay outside the reconcile
/// diff.
pub struct StoreGateway<S> {
    store: Arc<S>,
    sink: WriteSink<S>,
}

impl<S: Store> StoreGateway<S> {
    pub fn new(store: Arc<S>) -> Self {
        let sink = WriteSink::Live(LiveStoreSink::new(store.clone()));
        Self { store, sink }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn reconcile_in_progress(&self) -> bool {
        matches!(self.sink, WriteSink::Reconcile(_))
    }

    /// Start buffering reconcilable writes into a fresh "after" set.
    pub fn begin_reconcile(&mut self) {
        debug!("store gateway: buffering writes for reconciliation");
        self.sink = WriteSink::Reconcile(ReconcileBuffer::new());
    }

    /// Stop buffering and hand back the accumulated "after" set. Returns
    /// an empty map when no reconcile was in progress.
    pub fn end_reconcile(&mut self) -> BTreeMap<String, Value> {
        let previous = std::mem::replace(
            &mut self.sink,
            WriteSink::Live(LiveStoreSink::new(self.store.clone())),
        );
        match previous {
            WriteSink::Live(_) => BTreeMap::new(),
            WriteSink::Reconcile(buffer) => buffer.into_after(),
        }
    }

    pub async fn put_interface(&mut self, switch: &str, iface: &VppInterface) -> StoreResult<()> {
        match &mut self.sink {
            WriteSink::Live(sink) => sink.put_interface(switch, iface).await,
            WriteSink::Reconcile(sink) => sink.put_interface(switch, iface).await,
        }
    }

    pub async fn put_bridge_domain(&mut self, switch: &str, bd: &BridgeDomain) -> StoreResult<()> {
        match &mut self.sink {
            WriteSink::Live(sink) => sink.put_bridge_domain(switch, bd).await,
            WriteSink::Reconcile(sink) => sink.put_bridge_domain(switch, bd).await,
        }
    }

    pub async fn put_static_route(&mut self, switch: &str, route: &StaticRoute) -> StoreResult<()> {
        match &mut self.sink {
            WriteSink::Live(sink) => sink.put_static_route(switch, route).await,
            WriteSink::Reconcile(sink) => sink.put_static_route(switch, route).await,
        }
    }

    pub async fn put_linux_interface(
        &mut self,
        switch: &str,
        iface: &LinuxInterface,
    ) -> StoreResult<()> {
        match &mut self.sink {
            WriteSink::Live(sink) => sink.put_linux_interface(switch, iface).await,
            WriteSink::Reconcile(sink) => sink.put_linux_interface(switch, iface).await,
        }
    }

    /// Direct path: static ARP entries never go through the sink.
    pub async fn put_arp_entry(&self, switch: &str, arp: &ArpEntry) -> StoreResult<()> {
        let key = keys::arp_key(switch, &arp.interface, &arp.ip_address);
        let value = to_store_value(&key, arp)?;
        self.store.put(&key, value).await
    }

    /// Direct path, like ARP.
    pub async fn put_l2fib_entry(&self, switch: &str, entry: &L2FibEntry) -> StoreResult<()> {
        let key = keys::l2fib_key(switch, &entry.bridge_domain, &entry.phys_address);
        let value = to_store_value(&key, entry)?;
        self.store.put(&key, value).await
    }

    /// Direct path, like ARP.
    pub async fn put_xconnect(&self, switch: &str, xconn: &XConnect) -> StoreResult<()> {
        let key = keys::xconnect_key(switch, &xconn.receive_interface);
        let value = to_store_value(&key, xconn)?;
        self.store.put(&key, value).await
    }
}
