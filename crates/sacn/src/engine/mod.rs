// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Receive engine: receive loop, universe registry and per-universe workers.
//!
//! # Architecture
//!
//! ```text
//! sacn-rx thread                     sacn-univ-N threads
//! Listener::run_loop  --Dispatch-->  UniverseWorker (owns UniverseState)
//!        |                                 |
//!  UniverseRegistry (DashMap)        Sinks (bounded data / error channels)
//! ```
//!
//! Steps for one universe are applied in arrival order by its single worker;
//! different universes proceed in parallel.

pub mod listener;
pub mod metrics;
pub mod registry;
pub mod sink;
pub mod worker;

pub use listener::Listener;
pub use metrics::{MetricsSnapshot, ReceiverMetrics};
pub use registry::UniverseRegistry;
pub use sink::{channels, ErrorKind, ReceiveError, Sinks};
pub use worker::{Dispatch, UniverseWorker};
