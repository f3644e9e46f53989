// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-source bookkeeping and priority arbitration.
//!
//! Every source seen on a universe keeps a [`SourceRecord`]. A source keeps
//! credit for its highest recent priority for one timeout period after it
//! lowers it, so a transmitter ramping down does not hand the universe over
//! immediately.

use crate::protocol::{Cid, DataPacket};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Liveness and priority state of one transmitter on one universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRecord {
    /// Last packet from this source, at any priority.
    pub last_time: Instant,
    /// Last packet from this source at its credited priority.
    pub last_time_high_prio: Instant,
    /// Priority currently credited to this source.
    pub highest_prio: u8,
}

impl SourceRecord {
    /// Record for a source first seen at `now` with `priority`.
    pub fn new(priority: u8, now: Instant) -> Self {
        Self {
            last_time: now,
            last_time_high_prio: now,
            highest_prio: priority,
        }
    }

    /// Returns whether nothing was heard from this source for more than `timeout`.
    #[inline]
    pub fn is_expired(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_time) > timeout
    }

    fn observe(&mut self, priority: u8, now: Instant, timeout: Duration) {
        self.last_time = now;

        if priority > self.highest_prio {
            self.highest_prio = priority;
            self.last_time_high_prio = now;
        } else if priority == self.highest_prio {
            self.last_time_high_prio = now;
        } else if now.saturating_duration_since(self.last_time_high_prio) > timeout {
            // Higher priority not repeated within the hold period
            self.highest_prio = priority;
            self.last_time_high_prio = now;
        }
    }
}

/// Sources of one universe, keyed by CID.
pub type SourceSet = HashMap<Cid, SourceRecord>;

/// Account for `packet` in `sources`.
///
/// Other sources silent for more than `timeout` are evicted first; the sender
/// is then inserted or has its liveness and credited priority updated.
pub fn admit_or_update(
    sources: &mut SourceSet,
    packet: &DataPacket,
    now: Instant,
    timeout: Duration,
) {
    let cid = packet.cid();
    sources.retain(|other, record| *other == cid || !record.is_expired(now, timeout));

    sources
        .entry(cid)
        .and_modify(|record| record.observe(packet.priority(), now, timeout))
        .or_insert_with(|| SourceRecord::new(packet.priority(), now));
}

/// CIDs tied at the highest credited priority (empty for an empty set).
pub fn winning_set(sources: &SourceSet) -> HashSet<Cid> {
    let Some(max) = sources.values().map(|record| record.highest_prio).max() else {
        return HashSet::new();
    };

    sources
        .iter()
        .filter(|(_, record)| record.highest_prio == max)
        .map(|(cid, _)| *cid)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(2500);
    const A: Cid = Cid::new([0xa; 16]);
    const B: Cid = Cid::new([0xb; 16]);

    fn packet(cid: Cid, priority: u8) -> DataPacket {
        DataPacket::builder(1, cid).priority(priority).build()
    }

    #[test]
    fn test_new_source_inserted() {
        let now = Instant::now();
        let mut sources = SourceSet::new();
        admit_or_update(&mut sources, &packet(A, 100), now, TIMEOUT);

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[&A], SourceRecord::new(100, now));
    }

    #[test]
    fn test_priority_raised_immediately() {
        let t0 = Instant::now();
        let mut sources = SourceSet::new();
        admit_or_update(&mut sources, &packet(A, 100), t0, TIMEOUT);

        let t1 = t0 + Duration::from_millis(10);
        admit_or_update(&mut sources, &packet(A, 150), t1, TIMEOUT);
        assert_eq!(sources[&A].highest_prio, 150);
        assert_eq!(sources[&A].last_time_high_prio, t1);
    }

    #[test]
    fn test_equal_priority_refreshes_hold() {
        let t0 = Instant::now();
        let mut sources = SourceSet::new();
        admit_or_update(&mut sources, &packet(A, 100), t0, TIMEOUT);

        let t1 = t0 + Duration::from_millis(500);
        admit_or_update(&mut sources, &packet(A, 100), t1, TIMEOUT);
        assert_eq!(sources[&A].last_time, t1);
        assert_eq!(sources[&A].last_time_high_prio, t1);
    }

    #[test]
    fn test_lower_priority_held_within_timeout() {
        let t0 = Instant::now();
        let mut sources = SourceSet::new();
        admit_or_update(&mut sources, &packet(A, 150), t0, TIMEOUT);

        // Exactly one timeout later: not strictly greater, credit kept
        let t1 = t0 + TIMEOUT;
        admit_or_update(&mut sources, &packet(A, 50), t1, TIMEOUT);
        assert_eq!(sources[&A].highest_prio, 150);
        assert_eq!(sources[&A].last_time, t1);
        assert_eq!(sources[&A].last_time_high_prio, t0);
    }

    #[test]
    fn test_lower_priority_applied_after_timeout() {
        let t0 = Instant::now();
        let mut sources = SourceSet::new();
        admit_or_update(&mut sources, &packet(A, 150), t0, TIMEOUT);

        let t1 = t0 + TIMEOUT + Duration::from_millis(1);
        admit_or_update(&mut sources, &packet(A, 50), t1, TIMEOUT);
        assert_eq!(sources[&A].highest_prio, 50);
        assert_eq!(sources[&A].last_time_high_prio, t1);
    }

    #[test]
    fn test_stale_sources_evicted() {
        let t0 = Instant::now();
        let mut sources = SourceSet::new();
        admit_or_update(&mut sources, &packet(A, 100), t0, TIMEOUT);

        admit_or_update(&mut sources, &packet(B, 50), t0 + TIMEOUT, TIMEOUT);
        assert!(sources.contains_key(&A), "A still inside the window");

        let late = t0 + TIMEOUT + Duration::from_millis(1);
        admit_or_update(&mut sources, &packet(B, 50), late, TIMEOUT);
        assert!(!sources.contains_key(&A));
        assert!(sources.contains_key(&B));
    }

    #[test]
    fn test_sender_never_evicted_by_own_packet() {
        let t0 = Instant::now();
        let mut sources = SourceSet::new();
        admit_or_update(&mut sources, &packet(A, 100), t0, TIMEOUT);

        let late = t0 + TIMEOUT * 3;
        admit_or_update(&mut sources, &packet(A, 100), late, TIMEOUT);
        assert_eq!(sources[&A].last_time, late);
    }

    #[test]
    fn test_winning_set() {
        let now = Instant::now();
        let mut sources = SourceSet::new();
        assert!(winning_set(&sources).is_empty());

        sources.insert(A, SourceRecord::new(100, now));
        sources.insert(B, SourceRecord::new(50, now));
        assert_eq!(winning_set(&sources), HashSet::from([A]));

        sources.insert(B, SourceRecord::new(100, now));
        assert_eq!(winning_set(&sources), HashSet::from([A, B]));
    }
}
