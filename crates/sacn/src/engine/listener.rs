// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Receive loop thread.
//!
//! ```text
//! recv_with_deadline(timeout)
//!     |- deadline expired -> absent step to every active universe
//!     |- datagram         -> DataPacket::decode()
//!     |                        |- error  -> dropped
//!     |                        |- packet -> packet to its universe, absent to the others
//!     |- socket error     -> loop ends
//! ```
//!
//! On exit the registry is shut down, which disconnects both sinks once the
//! workers have drained, and the datagram source is dropped.

use super::metrics::ReceiverMetrics;
use super::registry::UniverseRegistry;
use crate::config::MAX_PACKET_SIZE;
use crate::protocol::DataPacket;
use crate::transport::DatagramSource;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Handle to the receive loop thread.
#[derive(Debug)]
pub struct Listener {
    handle: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl Listener {
    /// Spawn the receive loop on a thread named `sacn-rx`.
    pub fn spawn<S>(
        source: S,
        registry: Arc<UniverseRegistry>,
        metrics: Arc<ReceiverMetrics>,
        timeout: Duration,
    ) -> io::Result<Self>
    where
        S: DatagramSource + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = Arc::clone(&running);

        let handle = std::thread::Builder::new()
            .name("sacn-rx".to_string())
            .spawn(move || {
                Self::run_loop(source, registry, metrics, running_clone, timeout);
            })?;

        Ok(Self {
            handle: Some(handle),
            running,
        })
    }

    /// Whether the loop is still running.
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Signal the loop and wait for it to exit (at most one read timeout).
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("[RX] receive thread panicked");
            }
        }
    }

    fn run_loop<S: DatagramSource>(
        mut source: S,
        registry: Arc<UniverseRegistry>,
        metrics: Arc<ReceiverMetrics>,
        running: Arc<AtomicBool>,
        timeout: Duration,
    ) {
        log::info!("[RX] receive loop started timeout={:?}", timeout);

        // One spare byte so oversize datagrams are seen as such
        let mut buf = vec![0u8; MAX_PACKET_SIZE + 1];

        while running.load(Ordering::Relaxed) {
            match source.recv_with_deadline(&mut buf, timeout) {
                Ok(None) => {
                    ReceiverMetrics::incr(&metrics.read_timeouts);
                    registry.dispatch(None, Instant::now());
                }
                Ok(Some((len, src))) => {
                    let now = Instant::now();
                    ReceiverMetrics::incr(&metrics.datagrams_received);
                    metrics
                        .bytes_received
                        .fetch_add(len as u64, Ordering::Relaxed);

                    let packet = match DataPacket::decode(&buf[..len]) {
                        Ok(packet) => packet,
                        Err(e) => {
                            ReceiverMetrics::incr(&metrics.datagrams_invalid);
                            log::debug!("[RX] dropped datagram len={} src={}: {}", len, src, e);
                            continue;
                        }
                    };
                    log::trace!(
                        "[RX] packet universe={} cid={} prio={} seq={} src={}",
                        packet.universe(),
                        packet.cid(),
                        packet.priority(),
                        packet.sequence(),
                        src
                    );

                    if !registry.dispatch(Some(packet), now) {
                        ReceiverMetrics::incr(&metrics.packets_unmatched);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::error!("[RX] socket error, stopping receive loop: {}", e);
                    break;
                }
            }
        }

        running.store(false, Ordering::Relaxed);
        registry.shutdown();
        log::info!("[RX] receive loop stopped");
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::sink::{channels, ErrorKind, ReceiveError};
    use crate::protocol::{encode, Cid};
    use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
    use std::net::{Ipv4Addr, SocketAddr};

    const WAIT: Duration = Duration::from_secs(2);

    /// Datagram source fed from a channel; a disconnected feed is a socket error.
    struct ChannelSource {
        feed: Receiver<io::Result<Vec<u8>>>,
    }

    impl DatagramSource for ChannelSource {
        fn recv_with_deadline(
            &mut self,
            buf: &mut [u8],
            timeout: Duration,
        ) -> io::Result<Option<(usize, SocketAddr)>> {
            let bytes = match self.feed.recv_timeout(timeout) {
                Ok(item) => item?,
                Err(RecvTimeoutError::Timeout) => return Ok(None),
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(io::Error::new(io::ErrorKind::BrokenPipe, "feed closed"))
                }
            };
            let len = bytes.len().min(buf.len());
            buf[..len].copy_from_slice(&bytes[..len]);
            Ok(Some((len, SocketAddr::from((Ipv4Addr::LOCALHOST, 5568)))))
        }
    }

    fn start(
        timeout: Duration,
    ) -> (
        Listener,
        Arc<UniverseRegistry>,
        Arc<ReceiverMetrics>,
        Sender<io::Result<Vec<u8>>>,
        Receiver<DataPacket>,
        Receiver<ReceiveError>,
    ) {
        let (sinks, data_rx, errors_rx) = channels(16);
        let metrics = Arc::new(ReceiverMetrics::new());
        let registry = Arc::new(UniverseRegistry::new(sinks, Arc::clone(&metrics), timeout));
        let (feed_tx, feed_rx) = channel::unbounded();
        let listener = Listener::spawn(
            ChannelSource { feed: feed_rx },
            Arc::clone(&registry),
            Arc::clone(&metrics),
            timeout,
        )
        .expect("spawn listener");
        (listener, registry, metrics, feed_tx, data_rx, errors_rx)
    }

    #[test]
    fn test_loop_delivers_and_drops_garbage() {
        let (mut listener, registry, metrics, feed, data_rx, _errors) =
            start(Duration::from_secs(5));
        registry
            .activate(1, Instant::now(), || Ok(None))
            .expect("activate");

        feed.send(Ok(vec![0u8; 40])).expect("feed");
        let packet = DataPacket::builder(1, Cid::new([3; 16]))
            .sequence(1)
            .data(&[7, 7])
            .build();
        feed.send(Ok(encode(&packet))).expect("feed");

        assert_eq!(data_rx.recv_timeout(WAIT), Ok(packet));
        drop(feed);
        listener.stop();
        assert!(!listener.is_running());

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.datagrams_received, 2);
        assert_eq!(snapshot.datagrams_invalid, 1);
    }

    #[test]
    fn test_loop_reports_silence() {
        let (_listener, registry, _metrics, _feed, _data, errors_rx) =
            start(Duration::from_millis(40));
        registry
            .activate(2, Instant::now(), || Ok(None))
            .expect("activate");

        for _ in 0..2 {
            assert_eq!(
                errors_rx.recv_timeout(WAIT),
                Ok(ReceiveError::new(2, ErrorKind::Timeout))
            );
        }
    }

    #[test]
    fn test_socket_error_ends_loop_and_closes_sinks() {
        let (listener, registry, _metrics, feed, data_rx, errors_rx) =
            start(Duration::from_secs(5));
        registry
            .activate(1, Instant::now(), || Ok(None))
            .expect("activate");

        feed.send(Err(io::Error::new(io::ErrorKind::Interrupted, "signal")))
            .expect("feed");
        feed.send(Err(io::Error::new(io::ErrorKind::ConnectionReset, "gone")))
            .expect("feed");

        assert_eq!(
            data_rx.recv_timeout(WAIT),
            Err(RecvTimeoutError::Disconnected)
        );
        assert_eq!(
            errors_rx.recv_timeout(WAIT),
            Err(RecvTimeoutError::Disconnected)
        );
        assert!(registry.is_closed());
        drop(listener);
    }
}
