// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use thiserror::Error;

use sfcctl_model::ConfigError;
use sfcctl_store::StoreError;

/// Identifier and address allocation failures.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum AllocationError {
    #[error("the {0} id space is exhausted")]
    CounterExhausted(&'static str),
    #[error("'{0}' is not a usable ipv4 prefix")]
    PrefixNotConfigured(String),
    #[error("host id {id} is out of range for prefix '{prefix}'")]
    IdOutOfRange { prefix: String, id: u32 },
    #[error("no free addresses left in prefix '{0}'")]
    SubnetExhausted(String),
}

/// Anything that can stop a wiring operation. Config errors skip the
/// offending chain; allocation and store errors abort the cycle and are
/// retried by the next one.
#[derive(Debug, Error)]
pub enum WireError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("internal invariant violation: {0}")]
    Internal(&'static str),
}
