// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-universe merge: source arbitration and sequence checking.
//!
//! The merge is synchronous and clock-free: callers pass the arrival time of
//! each step, so the same sequence of `(packet, now)` pairs always yields the
//! same outcomes.
//!
//! Policy on a universe:
//! - the source(s) with the highest credited priority win;
//! - a tie between several winners is a conflict and the packet is dropped
//!   (no per-slot HTP merge);
//! - packets from losing sources are dropped before sequence checking;
//! - only changed payloads are forwarded.

/// Sequence number acceptance.
pub mod sequence;
/// Source records and winner selection.
pub mod source;
/// Universe state and the handling step.
pub mod universe;

pub use source::{admit_or_update, winning_set, SourceRecord, SourceSet};
pub use universe::{Outcome, UniverseState};
