// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Derived resource records.
//!
//! Each record is what a per-switch agent consumes from the store: field
//! names and enum spellings are the wire contract, so everything here is
//! serde-serializable and deliberately textual where the agents expect
//! text. Constructors are pure: they normalize addresses and translate
//! enums but never allocate ids or touch the store.

pub mod interface;
pub mod l2;
pub mod l3;
pub mod linux;

pub use interface::{
    AfpacketLink, DataplaneRxMode, MemifLink, MemifParams, RxModeSettings, VppInterface,
    VppInterfaceType, VxlanLink,
};
pub use l2::{BridgeDomain, BridgeDomainInterface, L2FibAction, L2FibEntry, XConnect};
pub use l3::{ArpEntry, StaticRoute};
pub use linux::{LinuxInterface, LinuxNamespace};
