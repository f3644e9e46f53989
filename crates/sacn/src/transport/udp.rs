// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use crate::config::ReceiverConfig;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::UdpSocket;

/// Create the receive socket described by `config`.
///
/// `SO_REUSEADDR` is set so several receivers on one host can share the ACN
/// port; multicast groups are joined later, per activated universe.
pub fn bind_receiver_socket(config: &ReceiverConfig) -> io::Result<UdpSocket> {
    let domain = Domain::for_address(config.bind_addr);
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&config.bind_addr.into())?;

    let socket: UdpSocket = socket.into();
    log::debug!(
        "[RX] socket bound addr={} multicast={}",
        socket.local_addr()?,
        config.multicast
    );
    Ok(socket)
}
