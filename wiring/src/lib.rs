// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The SFC wiring engine.
//!
//! Turns the declarative model into per-switch resource records: it owns
//! identifier allocation ([`sequencer`]), chain address assignment
//! ([`ipam`]), the derived-state cache ([`cache`]), the per-chain wiring
//! policy ([`engine`]) and the before/after reconciliation that keeps the
//! store equal to the target state ([`reconcile`]).

pub mod cache;
pub mod engine;
pub mod extdriver;
pub mod ipam;
pub mod reconcile;
pub mod sequencer;

mod errors;

pub use engine::WiringEngine;
pub use errors::{AllocationError, WireError};
pub use reconcile::ReconcileSummary;
