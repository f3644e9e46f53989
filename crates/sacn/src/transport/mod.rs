// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Datagram sources for the receive loop.
//!
//! The receive loop only needs one blocking read bounded by a timeout. Real
//! receivers use a UDP socket bound by [`udp::bind_receiver_socket`]; tests can
//! plug in any scripted [`DatagramSource`].

pub mod multicast;
pub mod udp;

pub use multicast::{universe_multicast_addr, MulticastMembership};
pub use udp::bind_receiver_socket;

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

/// A blocking source of datagrams.
pub trait DatagramSource: Send {
    /// Read one datagram into `buf`, waiting at most `timeout`.
    ///
    /// Returns `Ok(None)` when nothing arrived before the deadline. Any other
    /// error is treated as fatal by the receive loop, except
    /// [`io::ErrorKind::Interrupted`].
    fn recv_with_deadline(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> io::Result<Option<(usize, SocketAddr)>>;
}

impl DatagramSource for UdpSocket {
    fn recv_with_deadline(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> io::Result<Option<(usize, SocketAddr)>> {
        self.set_read_timeout(Some(timeout))?;
        match self.recv_from(buf) {
            Ok(received) => Ok(Some(received)),
            // Unix reports an expired read timeout as WouldBlock, Windows as TimedOut
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

impl<S: DatagramSource + ?Sized> DatagramSource for Box<S> {
    fn recv_with_deadline(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> io::Result<Option<(usize, SocketAddr)>> {
        (**self).recv_with_deadline(buf, timeout)
    }
}
