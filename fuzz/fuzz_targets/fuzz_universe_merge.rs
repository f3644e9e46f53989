// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use sacn::merge::{Outcome, UniverseState};
use sacn::protocol::{Cid, DataPacket};
use std::time::{Duration, Instant};

const TIMEOUT: Duration = Duration::from_millis(100);

// Each 4-byte chunk is one step: [source, priority, sequence, elapsed ms]
fuzz_target!(|data: &[u8]| {
    let mut now = Instant::now();
    let mut state = UniverseState::new(1, TIMEOUT, now);

    for step in data.chunks_exact(4) {
        now += Duration::from_millis(u64::from(step[3]));
        let payload = [step[1], step[2]];
        let prev_sequence = state.last_sequence();
        let prev_data = state.last_data().to_vec();
        let prev_time = state.last_time();

        let outcome = if step[0] == 0xff {
            state.handle(None, now)
        } else {
            let packet = DataPacket::builder(1, Cid::new([step[0] % 4; 16]))
                .priority(step[1] % 201)
                .sequence(step[2])
                .data(&payload)
                .build();
            state.handle(Some(&packet), now)
        };

        match outcome {
            Outcome::Emitted => {
                assert_ne!(prev_data, payload);
                assert_eq!(state.last_data(), &payload);
                assert_eq!(state.last_sequence(), Some(step[2]));
                assert_eq!(state.last_time(), now);
            }
            Outcome::Unchanged => {
                assert_eq!(prev_data, payload);
                assert_eq!(state.last_data(), &payload);
                assert_eq!(state.last_sequence(), Some(step[2]));
                assert_eq!(state.last_time(), now);
            }
            Outcome::Conflict
            | Outcome::Dropped
            | Outcome::SequenceRejected
            | Outcome::TimedOut
            | Outcome::Idle => {
                // Nothing accepted: merged state untouched
                assert_eq!(state.last_sequence(), prev_sequence);
                assert_eq!(state.last_data(), prev_data.as_slice());
                assert_eq!(state.last_time(), prev_time);
            }
        }

        if outcome == Outcome::TimedOut {
            assert!(now.saturating_duration_since(prev_time) > TIMEOUT);
        }
    }
});
