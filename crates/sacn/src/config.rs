// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Receiver configuration - protocol constants and runtime settings.
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: Compile-time constants (E1.31 port, timeouts, packet sizes)
//! - **Level 2 (Dynamic)**: [`ReceiverConfig`] for per-receiver settings, with
//!   environment overrides via [`ReceiverConfig::from_env`]
//!
//! # Example
//!
//! ```
//! use sacn::config::{ReceiverConfig, ACN_PORT};
//! use std::time::Duration;
//!
//! let config = ReceiverConfig::default().timeout(Duration::from_millis(500));
//! assert_eq!(config.bind_addr.port(), ACN_PORT);
//! ```

use crate::error::{Error, Result};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

// =======================================================================
// E1.31 constants
// =======================================================================

/// ACN SDT multicast port (IANA registered, E1.31 Sec.9.3.1).
pub const ACN_PORT: u16 = 5568;

/// Network data loss timeout in milliseconds (E1.31 Sec.6.7.1).
///
/// Used for the read deadline, source eviction, the priority hold period and
/// universe silence detection.
pub const TIMEOUT_MS: u64 = 2500;

/// Largest E1.31 data packet: 126-byte header + 512 DMX slots.
pub const MAX_PACKET_SIZE: usize = 638;

/// Sequence numbers at most this far behind the last accepted one are treated
/// as a counter wrap rather than a stale packet.
pub const SEQUENCE_WRAP_WINDOW: i8 = 20;

/// Lowest universe number that may be activated.
pub const MIN_UNIVERSE: u16 = 1;

/// Highest universe number that may be activated.
pub const MAX_UNIVERSE: u16 = 63999;

/// Default bound of the data and error sinks.
pub const DEFAULT_SINK_CAPACITY: usize = 64;

/// Bound of each universe worker's step queue. Steps offered to a full queue
/// are dropped.
pub const WORKER_QUEUE_CAPACITY: usize = 256;

/// Environment variable overriding [`ReceiverConfig::bind_addr`].
pub const ENV_BIND_ADDR: &str = "SACN_BIND_ADDR";
/// Environment variable overriding [`ReceiverConfig::multicast_interface`].
pub const ENV_MULTICAST_IF: &str = "SACN_MULTICAST_IF";
/// Environment variable overriding [`ReceiverConfig::timeout`] (milliseconds).
pub const ENV_TIMEOUT_MS: &str = "SACN_TIMEOUT_MS";

/// Default receive timeout as a [`Duration`].
#[inline]
pub const fn default_timeout() -> Duration {
    Duration::from_millis(TIMEOUT_MS)
}

/// Runtime settings for a [`ReceiverSocket`](crate::ReceiverSocket).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverConfig {
    /// Local address the UDP socket binds to (default `0.0.0.0:5568`).
    pub bind_addr: SocketAddr,
    /// Interface used for multicast membership (`None` lets the OS choose).
    pub multicast_interface: Option<Ipv4Addr>,
    /// Join `239.255.<hi>.<lo>` when a universe is activated.
    pub multicast: bool,
    /// Read deadline, source timeout and universe silence timeout.
    pub timeout: Duration,
    /// Bound of the data and error sinks (0 = rendezvous).
    pub sink_capacity: usize,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, ACN_PORT)),
            multicast_interface: None,
            multicast: true,
            timeout: default_timeout(),
            sink_capacity: DEFAULT_SINK_CAPACITY,
        }
    }
}

impl ReceiverConfig {
    /// Defaults with `SACN_BIND_ADDR`, `SACN_MULTICAST_IF` and `SACN_TIMEOUT_MS`
    /// applied on top. Unparsable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(var) = std::env::var(ENV_BIND_ADDR) {
            match var.parse::<SocketAddr>() {
                Ok(addr) => config.bind_addr = addr,
                Err(_) => log::warn!("[CONFIG] ignoring invalid {}='{}'", ENV_BIND_ADDR, var),
            }
        }

        if let Ok(var) = std::env::var(ENV_MULTICAST_IF) {
            match var.parse::<Ipv4Addr>() {
                Ok(addr) => config.multicast_interface = Some(addr),
                Err(_) => log::warn!("[CONFIG] ignoring invalid {}='{}'", ENV_MULTICAST_IF, var),
            }
        }

        if let Ok(var) = std::env::var(ENV_TIMEOUT_MS) {
            match var.parse::<u64>() {
                Ok(ms) if ms > 0 => config.timeout = Duration::from_millis(ms),
                _ => log::warn!("[CONFIG] ignoring invalid {}='{}'", ENV_TIMEOUT_MS, var),
            }
        }

        config
    }

    /// Set the bind address.
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the multicast interface.
    pub fn multicast_interface(mut self, iface: Ipv4Addr) -> Self {
        self.multicast_interface = Some(iface);
        self
    }

    /// Enable or disable multicast group membership (unicast-only when disabled).
    pub fn multicast(mut self, enabled: bool) -> Self {
        self.multicast = enabled;
        self
    }

    /// Set the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the sink capacity.
    pub fn sink_capacity(mut self, capacity: usize) -> Self {
        self.sink_capacity = capacity;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be non-zero".into()));
        }
        if self.multicast && !self.bind_addr.is_ipv4() {
            return Err(Error::Config(format!(
                "multicast reception requires an IPv4 bind address, got {}",
                self.bind_addr
            )));
        }
        Ok(())
    }
}

/// Check that `universe` lies in the E1.31 data universe range.
pub fn validate_universe(universe: u16) -> Result<()> {
    if (MIN_UNIVERSE..=MAX_UNIVERSE).contains(&universe) {
        Ok(())
    } else {
        Err(Error::InvalidUniverse(universe))
    }
}
