// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Identifier allocation with persisted bindings.
//!
//! Four monotonic counters hand out VLAN/VNI ids, memif ids, MAC-instance
//! ids and veth ids. Every binding of an id to an entity is persisted to
//! the store under its own namespace, and the counters themselves are
//! *not* persisted: on restart each one is rebuilt as the maximum id over
//! its bindings, so a live id can never be re-issued.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use sfcctl_store::{Store, StoreError, StoreResult, keys, to_store_value};

use crate::errors::AllocationError;

/// The four id sequences, grouped in one record so engine instances stay
/// isolated from each other (notably under parallel tests).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Sequencer {
    pub vlan_id: u32,
    pub memif_id: u32,
    pub mac_instance_id: u32,
    pub veth_id: u32,
}

/// Per-host binding: the MAC-instance id backing the generated loopback
/// address, when the operator did not supply one.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostIds {
    pub loopback_mac_id: Option<u32>,
}

/// VLAN/VNI bound to a (host, external-entity) or (host, host) edge.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VniBinding {
    pub vlan_id: u32,
}

/// Ids bound to one (chain, container, port): absent fields were never
/// allocated for that port.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SfcPortIds {
    pub ip_id: Option<u32>,
    pub mac_addr_id: Option<u32>,
    pub memif_id: Option<u32>,
    pub veth_id: Option<u32>,
}

/// Allocator over the store-persisted binding tables. In-memory tables are
/// keyed by the full store key so lookup and persistence share one
/// spelling.
pub struct IdAllocator<S> {
    store: Arc<S>,
    seq: Sequencer,
    he_ids: BTreeMap<String, HostIds>,
    he2ee_ids: BTreeMap<String, VniBinding>,
    he2he_ids: BTreeMap<String, VniBinding>,
    sfc_ids: BTreeMap<String, SfcPortIds>,
}

impl<S: Store> IdAllocator<S> {
    /// Load all persisted bindings and rebuild the counters from them.
    pub async fn load(store: Arc<S>) -> StoreResult<Self> {
        let he_ids = load_table::<HostIds, _>(&store, &keys::he_ids_prefix()).await?;
        let he2ee_ids = load_table::<VniBinding, _>(&store, &keys::he2ee_ids_prefix()).await?;
        let he2he_ids = load_table::<VniBinding, _>(&store, &keys::he2he_ids_prefix()).await?;
        let sfc_ids = load_table::<SfcPortIds, _>(&store, &keys::sfc_ids_prefix()).await?;

        let vlan_id = he2ee_ids
            .values()
            .map(|binding| binding.vlan_id)
            .chain(he2he_ids.values().map(|binding| binding.vlan_id))
            .max()
            .unwrap_or(0);
        let mut seq = Sequencer {
            vlan_id,
            ..Sequencer::default()
        };
        for ids in sfc_ids.values() {
            seq.memif_id = seq.memif_id.max(ids.memif_id.unwrap_or(0));
            seq.mac_instance_id = seq.mac_instance_id.max(ids.mac_addr_id.unwrap_or(0));
            seq.veth_id = seq.veth_id.max(ids.veth_id.unwrap_or(0));
        }
        for ids in he_ids.values() {
            seq.mac_instance_id = seq.mac_instance_id.max(ids.loopback_mac_id.unwrap_or(0));
        }

        if seq != Sequencer::default() {
            info!(?seq, "id allocator restored from persisted bindings");
        }
        Ok(Self {
            store,
            seq,
            he_ids,
            he2ee_ids,
            he2he_ids,
            sfc_ids,
        })
    }

    /// Seed the VLAN counter from the system parameters. Only the first
    /// call has an effect; a counter restored from bindings stays put.
    pub fn seed_vlan(&mut self, starting_vlan_id: u32) {
        if self.seq.vlan_id == 0 {
            self.seq.vlan_id = starting_vlan_id.saturating_sub(1);
            debug!(vlan_id = self.seq.vlan_id, "seeded vlan sequence");
        }
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.seq
    }

    pub fn alloc_vlan_id(&mut self) -> Result<u32, AllocationError> {
        next(&mut self.seq.vlan_id, "vlan")
    }

    pub fn alloc_memif_id(&mut self) -> Result<u32, AllocationError> {
        next(&mut self.seq.memif_id, "memif")
    }

    pub fn alloc_mac_instance_id(&mut self) -> Result<u32, AllocationError> {
        next(&mut self.seq.mac_instance_id, "mac-instance")
    }

    pub fn alloc_veth_id(&mut self) -> Result<u32, AllocationError> {
        next(&mut self.seq.veth_id, "veth")
    }

    pub fn host_ids(&self, he: &str) -> Option<&HostIds> {
        self.he_ids.get(&keys::he_ids_key(he))
    }

    pub async fn record_host_ids(&mut self, he: &str, ids: HostIds) -> StoreResult<()> {
        let key = keys::he_ids_key(he);
        self.store.put(&key, to_store_value(&key, &ids)?).await?;
        self.he_ids.insert(key, ids);
        Ok(())
    }

    pub fn he2ee_vlan_id(&self, he: &str, ee: &str) -> Option<u32> {
        self.he2ee_ids
            .get(&keys::he2ee_ids_key(he, ee))
            .map(|binding| binding.vlan_id)
    }

    pub async fn record_he2ee_vlan_id(&mut self, he: &str, ee: &str, vlan_id: u32) -> StoreResult<()> {
        let key = keys::he2ee_ids_key(he, ee);
        let binding = VniBinding { vlan_id };
        self.store.put(&key, to_store_value(&key, &binding)?).await?;
        self.he2ee_ids.insert(key, binding);
        Ok(())
    }

    pub fn he2he_vlan_id(&self, sh: &str, dh: &str) -> Option<u32> {
        self.he2he_ids
            .get(&keys::he2he_ids_key(sh, dh))
            .map(|binding| binding.vlan_id)
    }

    pub async fn record_he2he_vlan_id(&mut self, sh: &str, dh: &str, vlan_id: u32) -> StoreResult<()> {
        let key = keys::he2he_ids_key(sh, dh);
        let binding = VniBinding { vlan_id };
        self.store.put(&key, to_store_value(&key, &binding)?).await?;
        self.he2he_ids.insert(key, binding);
        Ok(())
    }

    pub fn sfc_port_ids(&self, sfc: &str, container: &str, port: &str) -> Option<&SfcPortIds> {
        self.sfc_ids.get(&keys::sfc_ids_key(sfc, container, port))
    }

    pub async fn record_sfc_port_ids(
        &mut self,
        sfc: &str,
        container: &str,
        port: &str,
        ids: SfcPortIds,
    ) -> StoreResult<()> {
        let key = keys::sfc_ids_key(sfc, container, port);
        self.store.put(&key, to_store_value(&key, &ids)?).await?;
        self.sfc_ids.insert(key, ids);
        Ok(())
    }
}

fn next(counter: &mut u32, kind: &'static str) -> Result<u32, AllocationError> {
    if *counter == u32::MAX {
        return Err(AllocationError::CounterExhausted(kind));
    }
    *counter += 1;
    Ok(*counter)
}

async fn load_table<T, S>(store: &Arc<S>, prefix: &str) -> StoreResult<BTreeMap<String, T>>
where
    T: serde::de::DeserializeOwned,
    S: Store,
{
    let mut table = BTreeMap::new();
    for (key, value) in store.list(prefix).await? {
        let record = serde_json::from_value(value)
            .map_err(|source| StoreError::Decode { key: key.clone(), source })?;
        table.insert(key, record);
    }
    Ok(table)
}
