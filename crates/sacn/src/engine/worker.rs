// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! One serialized worker per active universe.
//!
//! The receive loop never touches universe state directly: it queues a
//! [`Dispatch`] to every active universe's worker, and each worker applies the
//! handling steps in arrival order on its own thread. A slow sink consumer
//! therefore stalls only the worker whose send blocks; its queue is bounded by
//! [`WORKER_QUEUE_CAPACITY`] and further steps are refused until it drains.

use super::metrics::ReceiverMetrics;
use super::sink::{ErrorKind, ReceiveError, Sinks};
use crate::config::WORKER_QUEUE_CAPACITY;
use crate::merge::{Outcome, UniverseState};
use crate::protocol::DataPacket;
use crate::transport::MulticastMembership;
use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One handling step queued for a universe worker.
#[derive(Debug)]
pub struct Dispatch {
    /// Packet for this universe, or `None` if it received nothing this cycle.
    pub packet: Option<DataPacket>,
    /// Time the receive loop took the step.
    pub at: Instant,
}

/// Handle to a running universe worker.
///
/// Dropping the handle closes the queue; the worker finishes what is already
/// queued (unless deactivated) and exits. The thread is never joined.
#[derive(Debug)]
pub struct UniverseWorker {
    universe: u16,
    tx: Sender<Dispatch>,
    active: Arc<AtomicBool>,
    _membership: Option<MulticastMembership>,
}

impl UniverseWorker {
    /// Start the worker thread for `universe`, activated at `now`.
    pub fn spawn(
        universe: u16,
        timeout: Duration,
        now: Instant,
        sinks: Sinks,
        metrics: Arc<ReceiverMetrics>,
        membership: Option<MulticastMembership>,
    ) -> io::Result<Self> {
        let (tx, rx) = channel::bounded(WORKER_QUEUE_CAPACITY);
        let active = Arc::new(AtomicBool::new(true));
        let active_clone = Arc::clone(&active);
        let state = UniverseState::new(universe, timeout, now);

        std::thread::Builder::new()
            .name(format!("sacn-univ-{}", universe))
            .spawn(move || run_worker(state, rx, active_clone, sinks, metrics))?;

        Ok(Self {
            universe,
            tx,
            active,
            _membership: membership,
        })
    }

    /// Queue one handling step without blocking.
    ///
    /// Fails with `Full` while the worker is stalled on a sink, and with
    /// `Disconnected` if the worker thread is gone.
    pub fn send(&self, dispatch: Dispatch) -> Result<(), TrySendError<Dispatch>> {
        self.tx.try_send(dispatch)
    }

    /// Stop the worker: queued steps are discarded.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub fn universe(&self) -> u16 {
        self.universe
    }
}

fn run_worker(
    mut state: UniverseState,
    rx: Receiver<Dispatch>,
    active: Arc<AtomicBool>,
    sinks: Sinks,
    metrics: Arc<ReceiverMetrics>,
) {
    let universe = state.universe();
    log::debug!("[UNIV] worker started universe={}", universe);

    for dispatch in rx.iter() {
        if !active.load(Ordering::Acquire) {
            break;
        }

        let outcome = state.handle(dispatch.packet.as_ref(), dispatch.at);
        match outcome {
            Outcome::Emitted => {
                ReceiverMetrics::incr(&metrics.data_emitted);
                if let Some(packet) = dispatch.packet {
                    log::debug!(
                        "[MERGE] universe={} cid={} seq={} emitted {} slots",
                        universe,
                        packet.cid(),
                        packet.sequence(),
                        packet.data().len()
                    );
                    if sinks.data.send(packet).is_err() {
                        log::debug!("[UNIV] data sink closed universe={}", universe);
                    }
                }
            }
            Outcome::Unchanged => ReceiverMetrics::incr(&metrics.data_unchanged),
            Outcome::Dropped => ReceiverMetrics::incr(&metrics.packets_dropped),
            Outcome::SequenceRejected => {
                ReceiverMetrics::incr(&metrics.sequence_rejected);
                if let Some(packet) = &dispatch.packet {
                    log::debug!(
                        "[MERGE] universe={} cid={} stale seq={}",
                        universe,
                        packet.cid(),
                        packet.sequence()
                    );
                }
            }
            Outcome::Conflict => {
                ReceiverMetrics::incr(&metrics.conflicts);
                log::warn!("[MERGE] universe={} sources exceeded", universe);
                report(&sinks, universe, ErrorKind::SourcesExceeded);
            }
            Outcome::TimedOut => {
                ReceiverMetrics::incr(&metrics.timeouts);
                log::debug!("[MERGE] universe={} timeout", universe);
                report(&sinks, universe, ErrorKind::Timeout);
            }
            Outcome::Idle => {}
        }
    }

    log::debug!("[UNIV] worker exited universe={}", universe);
}

fn report(sinks: &Sinks, universe: u16, kind: ErrorKind) {
    if sinks.errors.send(ReceiveError::new(universe, kind)).is_err() {
        log::debug!("[UNIV] error sink closed universe={}", universe);
    }
}
