// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use thiserror::Error;

/// The reasons why an input configuration cannot be wired.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("chain '{0}' has an unknown type")]
    UnknownSfcType(String),
    #[error("only one external entity is allowed in north-south chain '{0}'")]
    TooManyExternalEntities(String),
    #[error("only one destination host is allowed in north-south chain '{0}'")]
    TooManyDestinationHosts(String),
    #[error("north-south chain '{0}' names neither an external entity nor a destination host")]
    NoNorthSouthTarget(String),
    #[error("external entity '{ee}' not found for chain '{sfc}'")]
    ExternalEntityNotFound { sfc: String, ee: String },
    #[error("host entity '{host}' not found for chain '{sfc}'")]
    HostNotFound { sfc: String, host: String },
    #[error("only one host entity is allowed in north-south NIC chain '{0}'")]
    TooManyNicHosts(String),
    #[error("no host entity in north-south NIC chain '{0}'")]
    NoNicHost(String),
    #[error("east-west memif chain '{0}' must have an even number of elements")]
    OddMemifElementCount(String),
    #[error("external entity not allowed in east-west chain '{0}'")]
    ExternalEntityInEastWestChain(String),
    #[error("host '{host}' is not wired for chain '{sfc}'")]
    HostNotWired { sfc: String, host: String },
    #[error("host '{src}' is not wired to '{dst}' for chain '{sfc}'")]
    EdgeNotWired {
        sfc: String,
        src: String,
        dst: String,
    },
    #[error("external entity '{0}' is missing its host interface or vxlan endpoint")]
    InvalidExternalEntity(String),
    #[error("duplicate {kind} entity '{name}'")]
    DuplicateEntity { kind: &'static str, name: String },
}

/// Result-like type for configurations
pub type ConfigResult = Result<(), ConfigError>;
