// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Receiver API errors.
//!
//! Merge-level conditions (timeouts, conflicting sources) are not errors of the
//! API; they are reported through the error sink as
//! [`ReceiveError`](crate::engine::ReceiveError).

use std::io;
use std::net::Ipv4Addr;
use thiserror::Error;

/// Errors returned by the receiver API.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid universe {0} (valid range 1..=63999)")]
    InvalidUniverse(u16),

    #[error("failed to join multicast group {group} for universe {universe}: {source}")]
    MulticastJoin {
        universe: u16,
        group: Ipv4Addr,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("receiver is closed")]
    Closed,
}

/// Result alias for receiver operations.
pub type Result<T> = std::result::Result<T, Error>;
