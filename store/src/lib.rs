// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Key-value store abstraction for the SFC controller.
//!
//! The controller publishes derived resources as JSON values under
//! deterministic per-switch keys (see [`keys`]); per-host agents consume
//! them. The engine only needs put/get/list/delete; watching belongs to
//! the agents and stays out of this trait. [`MemStore`] is the reference
//! implementation; an etcd-backed client implements the same trait.

use serde_json::Value;
use thiserror::Error;

pub mod gateway;
pub mod keys;
pub mod sink;

mod mem;

pub use gateway::StoreGateway;
pub use mem::MemStore;
pub use sink::{LiveStoreSink, ReconcileBuffer, ResourceSink};

/// Errors surfaced by a store backend or by (de)serializing values on the
/// way in and out.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize value for key '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode value at key '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A replicated key-value store, as seen by the controller.
pub trait Store: Send + Sync + 'static {
    fn put(&self, key: &str, value: Value) -> impl Future<Output = StoreResult<()>> + Send;

    fn get(&self, key: &str) -> impl Future<Output = StoreResult<Option<Value>>> + Send;

    /// All entries whose key starts with `prefix`, in key order.
    fn list(&self, prefix: &str)
    -> impl Future<Output = StoreResult<Vec<(String, Value)>>> + Send;

    fn delete(&self, key: &str) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Serialize a resource record into a store value.
pub fn to_store_value<T: serde::Serialize>(key: &str, record: &T) -> StoreResult<Value> {
    serde_json::to_value(record).map_err(|source| StoreError::Serialize {
        key: key.to_owned(),
        source,
    })
}
