// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Outbound data and error channels.

use crate::protocol::DataPacket;
use crossbeam::channel::{self, Receiver, Sender};
use std::fmt;
use thiserror::Error;

/// Merge condition reported on the error sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Nothing accepted on the universe for longer than the timeout.
    Timeout,
    /// Several sources tied at the highest priority.
    SourcesExceeded,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("timeout"),
            Self::SourcesExceeded => f.write_str("sources exceeded"),
        }
    }
}

/// Error sink element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("universe {universe}: {kind}")]
pub struct ReceiveError {
    pub universe: u16,
    pub kind: ErrorKind,
}

impl ReceiveError {
    pub fn new(universe: u16, kind: ErrorKind) -> Self {
        Self { universe, kind }
    }
}

/// Sending halves of both sinks, cloned into every universe worker.
///
/// The sinks disconnect once every clone is dropped.
#[derive(Debug, Clone)]
pub struct Sinks {
    pub data: Sender<DataPacket>,
    pub errors: Sender<ReceiveError>,
}

/// Create bounded data and error sinks of `capacity` each.
pub fn channels(capacity: usize) -> (Sinks, Receiver<DataPacket>, Receiver<ReceiveError>) {
    let (data_tx, data_rx) = channel::bounded(capacity);
    let (errors_tx, errors_rx) = channel::bounded(capacity);
    let sinks = Sinks {
        data: data_tx,
        errors: errors_tx,
    };
    (sinks, data_rx, errors_rx)
}
