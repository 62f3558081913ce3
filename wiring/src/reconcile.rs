// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Reconciliation: bracket a full re-derivation of the target state with a
//! before/after diff, so the store ends up equal to the target with the
//! minimum set of writes and stale keys from earlier input versions get
//! deleted.

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{error, info};

use sfcctl_model::ConfigError;
use sfcctl_model::entities::ControllerConfig;
use sfcctl_store::{Store, keys};

use crate::cache::{EntityCache, StateCache};
use crate::engine::WiringEngine;
use crate::errors::WireError;
use crate::extdriver::ExternalEntityDriver;

/// What a reconcile cycle did.
#[derive(Debug, Default)]
pub struct ReconcileSummary {
    /// Keys written because they were new or their value changed.
    pub puts: usize,
    /// Keys deleted because nothing derives them anymore.
    pub deletes: usize,
    /// Chains skipped over configuration errors; the rest of the cycle
    /// proceeded without them.
    pub skipped_sfcs: Vec<(String, ConfigError)>,
}

impl ReconcileSummary {
    /// True when the cycle found the store already equal to the target.
    pub fn is_noop(&self) -> bool {
        self.puts == 0 && self.deletes == 0
    }
}

impl<S: Store, D: ExternalEntityDriver> WiringEngine<S, D> {
    /// Run one reconcile cycle over the given input.
    ///
    /// The published state is snapshotted, the whole target state is
    /// re-derived into a buffer, and the diff is applied: deletes for
    /// keys nothing derives anymore, puts for new or changed keys, no
    /// writes for equal keys. Id bindings live outside the diff: they are
    /// write-once and must survive entity removal.
    pub async fn reconcile(
        &mut self,
        config: &ControllerConfig,
    ) -> Result<ReconcileSummary, WireError> {
        info!(
            hosts = config.host_entities.len(),
            externals = config.external_entities.len(),
            sfcs = config.sfc_entities.len(),
            "starting reconcile cycle"
        );
        let before = self.snapshot_published().await?;

        // derived state is rebuilt from scratch each cycle; allocator
        // bindings and ipam reservations deliberately persist
        self.entities = EntityCache::default();
        self.state = StateCache::default();
        self.gateway.begin_reconcile();

        let skipped = match self.rewire_all(config).await {
            Ok(skipped) => skipped,
            Err(err) => {
                // drop the buffer; the next cycle starts clean
                self.gateway.end_reconcile();
                return Err(err);
            }
        };
        let after = self.gateway.end_reconcile();

        let store = self.gateway.store().clone();
        let mut summary = ReconcileSummary {
            skipped_sfcs: skipped,
            ..ReconcileSummary::default()
        };
        for key in before.keys() {
            if !after.contains_key(key) {
                store.delete(key).await?;
                summary.deletes += 1;
            }
        }
        for (key, value) in &after {
            if before.get(key) != Some(value) {
                store.put(key, value.clone()).await?;
                summary.puts += 1;
            }
        }

        info!(
            puts = summary.puts,
            deletes = summary.deletes,
            skipped = summary.skipped_sfcs.len(),
            "reconcile cycle complete"
        );
        Ok(summary)
    }

    /// The prior published state, scoped to the resource kinds the diff
    /// owns.
    async fn snapshot_published(&self) -> Result<BTreeMap<String, Value>, WireError> {
        let mut before = BTreeMap::new();
        for (key, value) in self
            .gateway
            .store()
            .list(&keys::switches_prefix())
            .await?
        {
            if keys::is_reconciled_key(&key) {
                before.insert(key, value);
            }
        }
        Ok(before)
    }

    /// Re-derive everything: hosts first, then every ordered host pair and
    /// every (host, external) edge, then the chains in input order. A
    /// chain with a configuration error is skipped and reported; store and
    /// allocation errors abort the cycle.
    async fn rewire_all(
        &mut self,
        config: &ControllerConfig,
    ) -> Result<Vec<(String, ConfigError)>, WireError> {
        self.set_system_parameters(&config.system_parameters);

        for he in &config.host_entities {
            self.wire_host(he).await?;
        }
        for sh in &config.host_entities {
            for dh in &config.host_entities {
                if sh.name != dh.name {
                    self.wire_host_pair(sh, dh);
                }
            }
        }
        for he in &config.host_entities {
            for ee in &config.external_entities {
                self.wire_host_to_external(he, ee)?;
            }
        }

        let mut skipped = Vec::new();
        for sfc in &config.sfc_entities {
            match self.wire_sfc(sfc).await {
                Ok(()) => {}
                Err(WireError::Config(err)) => {
                    error!(sfc = %sfc.name, error = %err, "skipping chain");
                    skipped.push((sfc.name.clone(), err));
                }
                Err(err) => return Err(err),
            }
        }
        Ok(skipped)
    }
}
