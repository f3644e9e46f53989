// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # sacn - ANSI E1.31 (Streaming ACN) receiver
//!
//! Receives E1.31 data packets over UDP, arbitrates between the sources
//! transmitting to each universe, and forwards only the winning source's data.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sacn::{ReceiverConfig, ReceiverSocket};
//!
//! fn main() -> sacn::Result<()> {
//!     let receiver = ReceiverSocket::bind(ReceiverConfig::from_env())?;
//!     receiver.activate(1)?;
//!
//!     loop {
//!         crossbeam::select! {
//!             recv(receiver.data()) -> packet => match packet {
//!                 Ok(packet) => println!("{} -> {:?}", packet.cid(), packet.data()),
//!                 Err(_) => break,
//!             },
//!             recv(receiver.errors()) -> err => if let Ok(err) = err {
//!                 eprintln!("{}", err);
//!             },
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Merge policy
//!
//! | Situation | Result |
//! |-----------|--------|
//! | Single highest-priority source, new sequence, new data | forwarded on the data sink |
//! | Same data as last forwarded | accepted, not forwarded |
//! | Stale or duplicate sequence number | dropped silently |
//! | Source below the highest priority | dropped silently |
//! | Several sources tied at the highest priority | `SourcesExceeded` on the error sink |
//! | Nothing accepted for longer than the timeout | `Timeout` on the error sink, every cycle |
//! | Non-zero START code (e.g. 0xDD per-address priority) | ignored, counts as no packet |
//!
//! A source that lowers its priority keeps its previous priority for one
//! timeout period (2.5 s by default); silent sources are forgotten after the
//! same period.
//!
//! ## Modules
//!
//! - [`protocol`]: wire format decoding
//! - [`merge`]: per-universe arbitration, clock-free and synchronous
//! - [`engine`]: receive loop, universe workers and sinks
//! - [`transport`]: UDP socket and multicast membership
//! - [`config`]: constants and [`ReceiverConfig`]

pub mod config;
pub mod engine;
pub mod error;
pub mod merge;
pub mod protocol;
mod receiver;
pub mod transport;

pub use config::ReceiverConfig;
pub use engine::{ErrorKind, MetricsSnapshot, ReceiveError};
pub use error::{Error, Result};
pub use protocol::{Cid, DataPacket, DecodeError};
pub use receiver::ReceiverSocket;
pub use transport::DatagramSource;
