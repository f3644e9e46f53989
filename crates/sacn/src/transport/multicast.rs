// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-universe multicast group membership (E1.31 Sec.9.3.1).
//!
//! Universe `n` is sent to `239.255.<n >> 8>.<n & 0xff>`. A membership joins
//! its group on creation and leaves it when dropped.

use crate::error::{Error, Result};
use std::io;
use std::net::{Ipv4Addr, UdpSocket};
use std::sync::Arc;

/// Linux EADDRINUSE: the group is already joined on this interface.
const EADDRINUSE: i32 = 98;

/// Multicast group carrying `universe`.
#[inline]
pub fn universe_multicast_addr(universe: u16) -> Ipv4Addr {
    let [hi, lo] = universe.to_be_bytes();
    Ipv4Addr::new(239, 255, hi, lo)
}

/// Membership of the receive socket in one universe's group.
#[derive(Debug)]
pub struct MulticastMembership {
    socket: Arc<UdpSocket>,
    universe: u16,
    group: Ipv4Addr,
    interface: Ipv4Addr,
}

impl MulticastMembership {
    /// Join the group of `universe` on `interface` (`None` lets the OS choose).
    pub fn join(socket: Arc<UdpSocket>, universe: u16, interface: Option<Ipv4Addr>) -> Result<Self> {
        let group = universe_multicast_addr(universe);
        let interface = interface.unwrap_or(Ipv4Addr::UNSPECIFIED);

        match socket.join_multicast_v4(&group, &interface) {
            Ok(()) => {
                log::debug!("[MCAST] joined {} on {} universe={}", group, interface, universe);
            }
            Err(e) if e.raw_os_error() == Some(EADDRINUSE) => {
                log::debug!("[MCAST] {} on {} already joined, skipping", group, interface);
            }
            Err(source) => {
                return Err(Error::MulticastJoin {
                    universe,
                    group,
                    source,
                })
            }
        }

        Ok(Self {
            socket,
            universe,
            group,
            interface,
        })
    }

    pub fn universe(&self) -> u16 {
        self.universe
    }

    pub fn group(&self) -> Ipv4Addr {
        self.group
    }

    fn leave(&self) -> io::Result<()> {
        self.socket.leave_multicast_v4(&self.group, &self.interface)
    }
}

impl Drop for MulticastMembership {
    fn drop(&mut self) {
        match self.leave() {
            Ok(()) => log::debug!("[MCAST] left {} universe={}", self.group, self.universe),
            Err(e) => log::debug!("[MCAST] leave {} failed (non-fatal): {}", self.group, e),
        }
    }
}
