// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Public receiver handle.

use crate::config::ReceiverConfig;
use crate::engine::{
    channels, Listener, MetricsSnapshot, ReceiveError, ReceiverMetrics, UniverseRegistry,
};
use crate::error::{Error, Result};
use crate::protocol::DataPacket;
use crate::transport::{bind_receiver_socket, DatagramSource, MulticastMembership};
use crossbeam::channel::Receiver;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::Arc;
use std::time::Instant;

/// An sACN receiver: one socket, any number of active universes.
///
/// Merged data arrives on [`data`](Self::data), timeouts and conflicts on
/// [`errors`](Self::errors). Both channels disconnect after [`stop`](Self::stop)
/// once in-flight work has drained.
///
/// Both sinks are bounded and must be drained. A full sink stalls the
/// universes reporting to it, and packets for a stalled universe are dropped
/// once its step queue fills (counted in [`MetricsSnapshot::queue_overflows`]).
///
/// ```no_run
/// use sacn::{ReceiverConfig, ReceiverSocket};
///
/// let receiver = ReceiverSocket::bind(ReceiverConfig::default())?;
/// receiver.activate(1)?;
/// loop {
///     crossbeam::select! {
///         recv(receiver.data()) -> packet => match packet {
///             Ok(packet) => println!("universe {}: {} slots", packet.universe(), packet.data().len()),
///             Err(_) => break,
///         },
///         recv(receiver.errors()) -> err => match err {
///             Ok(err) => eprintln!("{}", err),
///             Err(_) => break,
///         },
///     }
/// }
/// # Ok::<(), sacn::Error>(())
/// ```
#[derive(Debug)]
pub struct ReceiverSocket {
    config: ReceiverConfig,
    registry: Arc<UniverseRegistry>,
    metrics: Arc<ReceiverMetrics>,
    listener: Listener,
    data: Receiver<DataPacket>,
    errors: Receiver<ReceiveError>,
    /// Handle used for group membership (`None` when multicast is off).
    multicast: Option<(Arc<UdpSocket>, Option<Ipv4Addr>)>,
    local_addr: Option<SocketAddr>,
}

impl ReceiverSocket {
    /// Bind the UDP socket described by `config` and start receiving.
    pub fn bind(config: ReceiverConfig) -> Result<Self> {
        config.validate()?;

        let socket = bind_receiver_socket(&config)?;
        let local_addr = socket.local_addr()?;
        let multicast = if config.multicast {
            Some((Arc::new(socket.try_clone()?), config.multicast_interface))
        } else {
            None
        };

        let mut receiver = Self::start(socket, config, multicast)?;
        receiver.local_addr = Some(local_addr);
        Ok(receiver)
    }

    /// Start receiving from an arbitrary datagram source.
    ///
    /// No multicast groups are joined; `config.multicast` is ignored.
    pub fn with_source<S>(source: S, config: ReceiverConfig) -> Result<Self>
    where
        S: DatagramSource + 'static,
    {
        config.validate()?;
        Self::start(source, config, None)
    }

    fn start<S>(
        source: S,
        config: ReceiverConfig,
        multicast: Option<(Arc<UdpSocket>, Option<Ipv4Addr>)>,
    ) -> Result<Self>
    where
        S: DatagramSource + 'static,
    {
        let (sinks, data, errors) = channels(config.sink_capacity);
        let metrics = Arc::new(ReceiverMetrics::new());
        let registry = Arc::new(UniverseRegistry::new(
            sinks,
            Arc::clone(&metrics),
            config.timeout,
        ));
        let listener = Listener::spawn(
            source,
            Arc::clone(&registry),
            Arc::clone(&metrics),
            config.timeout,
        )?;

        Ok(Self {
            config,
            registry,
            metrics,
            listener,
            data,
            errors,
            multicast,
            local_addr: None,
        })
    }

    /// Start merging `universe` and join its multicast group.
    ///
    /// Activating an already active universe is a no-op.
    pub fn activate(&self, universe: u16) -> Result<()> {
        let multicast = self.multicast.as_ref();
        self.registry.activate(universe, Instant::now(), || {
            multicast
                .map(|(socket, iface)| {
                    MulticastMembership::join(Arc::clone(socket), universe, *iface)
                })
                .transpose()
        })?;
        Ok(())
    }

    /// Stop merging `universe`, leave its group and discard its state.
    pub fn deactivate(&self, universe: u16) -> Result<()> {
        if self.registry.is_closed() {
            return Err(Error::Closed);
        }
        self.registry.deactivate(universe);
        Ok(())
    }

    pub fn is_active(&self, universe: u16) -> bool {
        self.registry.is_active(universe)
    }

    /// Active universes, sorted.
    pub fn active_universes(&self) -> Vec<u16> {
        self.registry.active()
    }

    /// Data sink: one packet per change of a universe's merged data.
    pub fn data(&self) -> &Receiver<DataPacket> {
        &self.data
    }

    /// Error sink: timeouts and source conflicts.
    pub fn errors(&self) -> &Receiver<ReceiveError> {
        &self.errors
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Bound address, if this receiver owns a UDP socket.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn config(&self) -> &ReceiverConfig {
        &self.config
    }

    /// Whether the receive loop is still running.
    pub fn is_running(&self) -> bool {
        self.listener.is_running()
    }

    /// Stop the receive loop and close the socket. Idempotent.
    ///
    /// Blocks for at most one read timeout.
    pub fn stop(&mut self) {
        self.listener.stop();
        self.registry.shutdown();
        self.multicast = None;
    }
}

impl Drop for ReceiverSocket {
    fn drop(&mut self) {
        self.stop();
    }
}
