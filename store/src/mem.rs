// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use serde_json::Value;
use std::collections::BTreeMap;
use std::ops::Bound;
use tokio::sync::Mutex;

use crate::{Store, StoreResult};

/// In-memory [`Store`]: the reference implementation, used by tests and by
/// dry runs. A `BTreeMap` keeps listings in key order like etcd does.
#[derive(Debug, Default)]
pub struct MemStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl Store for MemStore {
    async fn put(&self, key: &str, value: Value) -> StoreResult<()> {
        self.entries.lock().await.insert(key.to_owned(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn list(&self, prefix: &str) -> StoreResult<Vec<(String, Value)>> {
        let entries = self.entries.lock().await;
        Ok(entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}
