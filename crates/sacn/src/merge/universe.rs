// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::sequence;
use super::source::{admit_or_update, winning_set, SourceSet};
use crate::protocol::{DataPacket, DMX_START_CODE};
use std::time::{Duration, Instant};

/// Result of one handling step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Packet accepted with a new payload; forward it to the data sink.
    Emitted,
    /// Packet accepted, payload identical to the last one.
    Unchanged,
    /// Several sources tied at the top priority; packet discarded.
    Conflict,
    /// Packet from a source that is not winning; discarded.
    Dropped,
    /// Winning source, but a stale or duplicate sequence number.
    SequenceRejected,
    /// Nothing accepted for longer than the timeout.
    TimedOut,
    /// No packet this cycle, still within the timeout.
    Idle,
}

/// Merge state of one active universe.
#[derive(Debug)]
pub struct UniverseState {
    universe: u16,
    timeout: Duration,
    sources: SourceSet,
    last_sequence: Option<u8>,
    last_data: Vec<u8>,
    last_time: Instant,
}

impl UniverseState {
    /// Fresh state for `universe`, activated at `now`.
    pub fn new(universe: u16, timeout: Duration, now: Instant) -> Self {
        Self {
            universe,
            timeout,
            sources: SourceSet::new(),
            last_sequence: None,
            last_data: Vec::new(),
            last_time: now,
        }
    }

    /// Run one handling step.
    ///
    /// `packet` is this cycle's datagram, if any. A packet addressed to another
    /// universe, or carrying a non-DMX START code (e.g. 0xDD per-address
    /// priority), counts as no packet.
    pub fn handle(&mut self, packet: Option<&DataPacket>, now: Instant) -> Outcome {
        match packet {
            Some(packet)
                if packet.universe() == self.universe
                    && packet.start_code() == DMX_START_CODE =>
            {
                self.apply(packet, now)
            }
            _ => self.check_timeout(now),
        }
    }

    fn apply(&mut self, packet: &DataPacket, now: Instant) -> Outcome {
        admit_or_update(&mut self.sources, packet, now, self.timeout);

        let winners = winning_set(&self.sources);
        if winners.len() > 1 {
            return Outcome::Conflict;
        }
        if !winners.contains(&packet.cid()) {
            return Outcome::Dropped;
        }

        if let Some(last) = self.last_sequence {
            if !sequence::accept(last, packet.sequence()) {
                return Outcome::SequenceRejected;
            }
        }
        self.last_sequence = Some(packet.sequence());
        self.last_time = now;

        if self.last_data == packet.data() {
            Outcome::Unchanged
        } else {
            self.last_data.clear();
            self.last_data.extend_from_slice(packet.data());
            Outcome::Emitted
        }
    }

    fn check_timeout(&self, now: Instant) -> Outcome {
        if now.saturating_duration_since(self.last_time) > self.timeout {
            Outcome::TimedOut
        } else {
            Outcome::Idle
        }
    }

    pub fn universe(&self) -> u16 {
        self.universe
    }

    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    pub fn last_sequence(&self) -> Option<u8> {
        self.last_sequence
    }

    pub fn last_data(&self) -> &[u8] {
        &self.last_data
    }

    pub fn last_time(&self) -> Instant {
        self.last_time
    }
}
