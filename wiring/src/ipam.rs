// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Per-prefix IPv4 address assignment for chains.
//!
//! Each chain carrying an `sfc_ipv4_prefix` gets a pool tracking which
//! host-ids are spoken for, whether the engine assigned them or the
//! operator pinned them. Host-id 0 (the network) and the broadcast id are
//! reserved. Pools live as long as the engine: reconcile cycles re-mark
//! the same ids, so allocation stays stable across re-applies.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use tracing::debug;

use crate::errors::AllocationError;

#[derive(Debug)]
struct SubnetPool {
    network: u32,
    prefix_len: u8,
    used: BTreeSet<u32>,
}

impl SubnetPool {
    fn parse(prefix: &str) -> Result<Self, AllocationError> {
        let bad = || AllocationError::PrefixNotConfigured(prefix.to_owned());
        let (addr, len) = prefix.split_once('/').ok_or_else(bad)?;
        let addr: Ipv4Addr = addr.parse().map_err(|_| bad())?;
        let prefix_len: u8 = len.parse().map_err(|_| bad())?;
        if prefix_len > 30 {
            // nothing allocatable below a /30
            return Err(bad());
        }
        let mask = u32::MAX << (32 - prefix_len);
        Ok(Self {
            network: u32::from(addr) & mask,
            prefix_len,
            used: BTreeSet::new(),
        })
    }

    /// Host-id of the broadcast address; ids above it do not exist.
    fn broadcast_id(&self) -> u32 {
        (1u32 << (32 - self.prefix_len)) - 1
    }

    fn address_of(&self, host_id: u32) -> String {
        format!(
            "{}/{}",
            Ipv4Addr::from(self.network | host_id),
            self.prefix_len
        )
    }

    /// Host-id of `addr` if it falls inside this subnet.
    fn host_id_of(&self, addr: &str) -> Option<u32> {
        let addr: Ipv4Addr = addr.parse().ok()?;
        let addr = u32::from(addr);
        let mask = u32::MAX << (32 - self.prefix_len);
        (addr & mask == self.network).then_some(addr & !mask)
    }
}

/// The address manager: one pool per configured prefix, created lazily on
/// first use.
#[derive(Debug, Default)]
pub struct Ipam {
    pools: BTreeMap<String, SubnetPool>,
}

impl Ipam {
    pub fn new() -> Self {
        Self::default()
    }

    fn pool(&mut self, prefix: &str) -> Result<&mut SubnetPool, AllocationError> {
        if !self.pools.contains_key(prefix) {
            let pool = SubnetPool::parse(prefix)?;
            self.pools.insert(prefix.to_owned(), pool);
        }
        Ok(self
            .pools
            .get_mut(prefix)
            .unwrap_or_else(|| unreachable!()))
    }

    /// Assign the lowest free host-id in the prefix. Returns the textual
    /// `addr/len` form together with the id.
    pub fn allocate_from_subnet(
        &mut self,
        prefix: &str,
    ) -> Result<(String, u32), AllocationError> {
        let pool = self.pool(prefix)?;
        let broadcast = pool.broadcast_id();
        let mut candidate = 1;
        while candidate < broadcast && pool.used.contains(&candidate) {
            candidate += 1;
        }
        if candidate >= broadcast {
            return Err(AllocationError::SubnetExhausted(prefix.to_owned()));
        }
        pool.used.insert(candidate);
        let addr = pool.address_of(candidate);
        debug!(%prefix, host_id = candidate, %addr, "allocated chain address");
        Ok((addr, candidate))
    }

    /// Resolve a persisted host-id back to its address and mark it used.
    /// Re-marking an id already in use is idempotent; that is how bindings
    /// survive re-applies.
    pub fn set_ip_id_in_subnet(
        &mut self,
        prefix: &str,
        host_id: u32,
    ) -> Result<String, AllocationError> {
        let pool = self.pool(prefix)?;
        if host_id == 0 || host_id >= pool.broadcast_id() {
            return Err(AllocationError::IdOutOfRange {
                prefix: prefix.to_owned(),
                id: host_id,
            });
        }
        pool.used.insert(host_id);
        Ok(pool.address_of(host_id))
    }

    /// Reserve the host-id behind an operator-chosen address, so it will
    /// not be handed out again. Addresses outside the subnet are silently
    /// ignored.
    pub fn set_ip_addr_if_inside_subnet(&mut self, prefix: &str, addr: &str) {
        let Ok(pool) = self.pool(prefix) else {
            return;
        };
        if let Some(host_id) = pool.host_id_of(addr) {
            if host_id != 0 && host_id < pool.broadcast_id() {
                pool.used.insert(host_id);
            }
        }
    }

    /// Debug rendering of a pool's occupancy.
    pub fn dump_subnet(&self, prefix: &str) -> String {
        match self.pools.get(prefix) {
            None => format!("{prefix}: no pool"),
            Some(pool) => format!(
                "{prefix}: {} of {} host ids used",
                pool.used.len(),
                pool.broadcast_id().saturating_sub(1),
            ),
        }
    }
}
