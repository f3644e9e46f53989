// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the receive loop and the universe workers.
///
/// All fields use relaxed atomics; readers only need monotonic snapshots.
#[derive(Debug, Default)]
pub struct ReceiverMetrics {
    /// Datagrams read from the socket.
    pub datagrams_received: AtomicU64,
    /// Bytes read from the socket.
    pub bytes_received: AtomicU64,
    /// Datagrams that failed to decode.
    pub datagrams_invalid: AtomicU64,
    /// Decoded packets for a universe that is not active.
    pub packets_unmatched: AtomicU64,
    /// Read deadlines that expired without a datagram.
    pub read_timeouts: AtomicU64,
    /// Packets forwarded to the data sink.
    pub data_emitted: AtomicU64,
    /// Accepted packets whose payload did not change.
    pub data_unchanged: AtomicU64,
    /// Packets from sources that were not winning.
    pub packets_dropped: AtomicU64,
    /// Packets refused because their universe's step queue was full.
    pub queue_overflows: AtomicU64,
    /// Packets rejected by the sequence check.
    pub sequence_rejected: AtomicU64,
    /// `SourcesExceeded` reports.
    pub conflicts: AtomicU64,
    /// `Timeout` reports.
    pub timeouts: AtomicU64,
}

impl ReceiverMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Current counter values.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            datagrams_received: self.datagrams_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            datagrams_invalid: self.datagrams_invalid.load(Ordering::Relaxed),
            packets_unmatched: self.packets_unmatched.load(Ordering::Relaxed),
            read_timeouts: self.read_timeouts.load(Ordering::Relaxed),
            data_emitted: self.data_emitted.load(Ordering::Relaxed),
            data_unchanged: self.data_unchanged.load(Ordering::Relaxed),
            packets_dropped: self.packets_dropped.load(Ordering::Relaxed),
            queue_overflows: self.queue_overflows.load(Ordering::Relaxed),
            sequence_rejected: self.sequence_rejected.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`ReceiverMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub datagrams_received: u64,
    pub bytes_received: u64,
    pub datagrams_invalid: u64,
    pub packets_unmatched: u64,
    pub read_timeouts: u64,
    pub data_emitted: u64,
    pub data_unchanged: u64,
    pub packets_dropped: u64,
    pub queue_overflows: u64,
    pub sequence_rejected: u64,
    pub conflicts: u64,
    pub timeouts: u64,
}
