// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Active universe registry.
//!
//! Maps each active universe to its worker. Read by the receive loop on every
//! cycle while the public API activates and deactivates universes.

use super::metrics::ReceiverMetrics;
use super::sink::Sinks;
use super::worker::{Dispatch, UniverseWorker};
use crate::config::validate_universe;
use crate::error::{Error, Result};
use crate::protocol::DataPacket;
use crate::transport::MulticastMembership;
use crossbeam::channel::TrySendError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Active universes and their workers.
#[derive(Debug)]
pub struct UniverseRegistry {
    workers: DashMap<u16, UniverseWorker>,
    /// `None` once shut down.
    sinks: Mutex<Option<Sinks>>,
    metrics: Arc<ReceiverMetrics>,
    timeout: Duration,
}

impl UniverseRegistry {
    pub fn new(sinks: Sinks, metrics: Arc<ReceiverMetrics>, timeout: Duration) -> Self {
        Self {
            workers: DashMap::new(),
            sinks: Mutex::new(Some(sinks)),
            metrics,
            timeout,
        }
    }

    /// Activate `universe` at `now`.
    ///
    /// `join` is called only when the universe was not already active, and its
    /// membership lives as long as the worker. Returns `false` if the universe
    /// was already active.
    pub fn activate<F>(&self, universe: u16, now: Instant, join: F) -> Result<bool>
    where
        F: FnOnce() -> Result<Option<MulticastMembership>>,
    {
        validate_universe(universe)?;

        // Held across the insert so a concurrent shutdown cannot miss this worker
        let guard = self.sinks.lock();
        let sinks = guard.as_ref().ok_or(Error::Closed)?;
        match self.workers.entry(universe) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                let membership = join()?;
                let worker = UniverseWorker::spawn(
                    universe,
                    self.timeout,
                    now,
                    sinks.clone(),
                    Arc::clone(&self.metrics),
                    membership,
                )?;
                slot.insert(worker);
                log::info!("[UNIV] activated universe={}", universe);
                Ok(true)
            }
        }
    }

    /// Deactivate `universe`, discarding its state. Returns `false` if it was
    /// not active.
    pub fn deactivate(&self, universe: u16) -> bool {
        match self.workers.remove(&universe) {
            Some((_, worker)) => {
                worker.deactivate();
                log::info!("[UNIV] deactivated universe={}", universe);
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, universe: u16) -> bool {
        self.workers.contains_key(&universe)
    }

    /// Active universes, sorted.
    pub fn active(&self) -> Vec<u16> {
        let mut universes: Vec<u16> = self.workers.iter().map(|entry| *entry.key()).collect();
        universes.sort_unstable();
        universes
    }

    /// Queue one handling step for every active universe.
    ///
    /// The universe `packet` is addressed to receives it; every other active
    /// universe receives an absent step. Returns whether the packet found an
    /// active universe.
    pub fn dispatch(&self, packet: Option<DataPacket>, at: Instant) -> bool {
        let target = packet.as_ref().map(DataPacket::universe);
        let mut packet = packet;

        for worker in self.workers.iter() {
            let step = Dispatch {
                packet: if target == Some(*worker.key()) {
                    packet.take()
                } else {
                    None
                },
                at,
            };
            match worker.send(step) {
                Ok(()) => {}
                // Absent steps are re-evaluated next cycle; only packets are lost
                Err(TrySendError::Full(step)) => {
                    if step.packet.is_some() {
                        ReceiverMetrics::incr(&self.metrics.queue_overflows);
                        log::warn!(
                            "[UNIV] queue full, packet dropped universe={}",
                            worker.universe()
                        );
                    }
                }
                Err(TrySendError::Disconnected(_)) => {
                    log::error!("[UNIV] worker gone universe={}", worker.universe());
                }
            }
        }

        target.is_some() && packet.is_none()
    }

    /// Close the registry: drop every worker queue and the retained sinks.
    ///
    /// Workers finish their queued steps, then release their sink senders so
    /// both sinks disconnect. Further activations fail with [`Error::Closed`].
    pub fn shutdown(&self) {
        let mut sinks = self.sinks.lock();
        if sinks.take().is_some() {
            self.workers.clear();
            log::debug!("[UNIV] registry shut down");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sinks.lock().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WORKER_QUEUE_CAPACITY;
    use crate::engine::sink::{channels, ErrorKind, ReceiveError};
    use crate::protocol::Cid;
    use crossbeam::channel::RecvTimeoutError;

    const TIMEOUT: Duration = Duration::from_millis(2500);
    const WAIT: Duration = Duration::from_secs(2);

    fn no_join() -> Result<Option<MulticastMembership>> {
        Ok(None)
    }

    fn registry() -> (
        UniverseRegistry,
        crossbeam::channel::Receiver<DataPacket>,
        crossbeam::channel::Receiver<ReceiveError>,
    ) {
        let (sinks, data_rx, errors_rx) = channels(16);
        let registry = UniverseRegistry::new(sinks, Arc::new(ReceiverMetrics::new()), TIMEOUT);
        (registry, data_rx, errors_rx)
    }

    #[test]
    fn test_activate_and_deactivate() {
        let (registry, _data, _errors) = registry();
        let now = Instant::now();

        assert!(registry.activate(3, now, no_join).expect("activate"));
        assert!(registry.activate(1, now, no_join).expect("activate"));
        assert!(!registry.activate(3, now, no_join).expect("idempotent"));
        assert_eq!(registry.active(), vec![1, 3]);
        assert!(registry.is_active(3));

        assert!(registry.deactivate(3));
        assert!(!registry.deactivate(3));
        assert_eq!(registry.active(), vec![1]);
    }

    #[test]
    fn test_activate_rejects_out_of_range() {
        let (registry, _data, _errors) = registry();
        let now = Instant::now();
        assert!(matches!(
            registry.activate(0, now, no_join),
            Err(Error::InvalidUniverse(0))
        ));
        assert!(matches!(
            registry.activate(64000, now, no_join),
            Err(Error::InvalidUniverse(64000))
        ));
        assert!(registry.active().is_empty());
    }

    #[test]
    fn test_join_failure_leaves_universe_inactive() {
        let (registry, _data, _errors) = registry();
        let result = registry.activate(5, Instant::now(), || Err(Error::Config("no iface".into())));
        assert!(result.is_err());
        assert!(!registry.is_active(5));
    }

    #[test]
    fn test_join_not_called_when_already_active() {
        let (registry, _data, _errors) = registry();
        let now = Instant::now();
        registry.activate(2, now, no_join).expect("activate");
        let called = registry
            .activate(2, now, || panic!("join must not run twice"))
            .expect("already active");
        assert!(!called);
    }

    #[test]
    fn test_dispatch_routes_packet_and_absent_steps() {
        let (registry, data_rx, errors_rx) = registry();
        let t0 = Instant::now();
        registry.activate(1, t0, no_join).expect("activate");
        registry.activate(2, t0, no_join).expect("activate");

        let packet = DataPacket::builder(1, Cid::new([1; 16]))
            .sequence(1)
            .data(&[42])
            .build();
        assert!(registry.dispatch(Some(packet.clone()), t0 + TIMEOUT * 2));
        assert_eq!(data_rx.recv_timeout(WAIT), Ok(packet));
        // Universe 2 saw an absent step after the timeout
        assert_eq!(
            errors_rx.recv_timeout(WAIT),
            Ok(ReceiveError::new(2, ErrorKind::Timeout))
        );

        let stray = DataPacket::builder(9, Cid::new([1; 16])).build();
        assert!(!registry.dispatch(Some(stray), t0));
        assert!(!registry.dispatch(None, t0));
    }

    #[test]
    fn test_full_queue_drops_packets_and_counts_them() {
        let (sinks, _data_rx, errors_rx) = channels(1);
        let metrics = Arc::new(ReceiverMetrics::new());
        let registry = UniverseRegistry::new(sinks, Arc::clone(&metrics), TIMEOUT);
        let t0 = Instant::now();
        registry.activate(1, t0, no_join).expect("activate");

        // Undrained error sink stalls the worker; absent steps fill its queue
        let silent = t0 + TIMEOUT * 2;
        for _ in 0..WORKER_QUEUE_CAPACITY * 4 {
            registry.dispatch(None, silent);
        }
        assert_eq!(metrics.snapshot().queue_overflows, 0);

        let packet = DataPacket::builder(1, Cid::new([1; 16]))
            .sequence(1)
            .data(&[1])
            .build();
        assert!(registry.dispatch(Some(packet), silent));
        assert_eq!(metrics.snapshot().queue_overflows, 1);

        drop(errors_rx);
        registry.shutdown();
    }

    #[test]
    fn test_shutdown_disconnects_sinks_and_refuses_activation() {
        let (registry, data_rx, errors_rx) = registry();
        registry.activate(1, Instant::now(), no_join).expect("activate");

        registry.shutdown();
        assert!(registry.is_closed());
        assert!(registry.active().is_empty());
        assert_eq!(
            data_rx.recv_timeout(WAIT),
            Err(RecvTimeoutError::Disconnected)
        );
        assert_eq!(
            errors_rx.recv_timeout(WAIT),
            Err(RecvTimeoutError::Disconnected)
        );
        assert!(matches!(
            registry.activate(1, Instant::now(), no_join),
            Err(Error::Closed)
        ));

        // Idempotent
        registry.shutdown();
    }
}
