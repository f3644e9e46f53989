// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Data packet construction and encoding.
//!
//! The receiver never transmits; this exists to build decoder fixtures and to
//! feed scripted datagram sources in tests.

use super::packet::{Cid, DataPacket};
use super::{
    ACN_PACKET_IDENTIFIER, ADDRESS_TYPE_DATA_TYPE, DATA_OFFSET, DMP_OFFSET, FRAMING_OFFSET,
    POSTAMBLE_SIZE, PREAMBLE_SIZE, ROOT_OFFSET, SOURCE_NAME_LEN, VECTOR_DMP_SET_PROPERTY,
    VECTOR_E131_DATA_PACKET, VECTOR_ROOT_E131_DATA,
};

/// Default priority of E1.31 sources.
pub const DEFAULT_PRIORITY: u8 = 100;

/// Builder for [`DataPacket`].
///
/// ```
/// use sacn::protocol::{encode, Cid, DataPacket};
///
/// let packet = DataPacket::builder(1, Cid::new([7; 16]))
///     .priority(120)
///     .sequence(9)
///     .data(&[255, 0, 128])
///     .build();
/// let wire = encode(&packet);
/// assert_eq!(DataPacket::decode(&wire), Ok(packet));
/// ```
#[derive(Debug, Clone)]
pub struct DataPacketBuilder {
    packet: DataPacket,
}

impl DataPacket {
    /// Start building a packet for `universe` sent by `cid`.
    pub fn builder(universe: u16, cid: Cid) -> DataPacketBuilder {
        DataPacketBuilder {
            packet: DataPacket {
                cid,
                source_name: String::new(),
                priority: DEFAULT_PRIORITY,
                sync_address: 0,
                sequence: 0,
                options: 0,
                universe,
                start_code: 0,
                data: Vec::new(),
            },
        }
    }
}

impl DataPacketBuilder {
    /// Set the source name (truncated to 63 bytes on the wire).
    pub fn source_name(mut self, name: impl Into<String>) -> Self {
        self.packet.source_name = name.into();
        self
    }

    /// Set the priority.
    pub fn priority(mut self, priority: u8) -> Self {
        self.packet.priority = priority;
        self
    }

    /// Set the sequence number.
    pub fn sequence(mut self, sequence: u8) -> Self {
        self.packet.sequence = sequence;
        self
    }

    /// Set the synchronization address.
    pub fn sync_address(mut self, sync_address: u16) -> Self {
        self.packet.sync_address = sync_address;
        self
    }

    /// Set the raw options byte.
    pub fn options(mut self, options: u8) -> Self {
        self.packet.options = options;
        self
    }

    /// Set the START code.
    pub fn start_code(mut self, start_code: u8) -> Self {
        self.packet.start_code = start_code;
        self
    }

    /// Set the DMX slots (at most 512 are kept).
    pub fn data(mut self, data: &[u8]) -> Self {
        let len = data.len().min(512);
        self.packet.data = data[..len].to_vec();
        self
    }

    /// Finish the packet.
    pub fn build(self) -> DataPacket {
        self.packet
    }
}

/// Encode `packet` into its wire representation.
pub fn encode(packet: &DataPacket) -> Vec<u8> {
    let total = DATA_OFFSET + packet.data.len();
    let mut buf = vec![0u8; total];

    // Root layer
    buf[0..2].copy_from_slice(&PREAMBLE_SIZE.to_be_bytes());
    buf[2..4].copy_from_slice(&POSTAMBLE_SIZE.to_be_bytes());
    buf[4..16].copy_from_slice(&ACN_PACKET_IDENTIFIER);
    write_flags_and_length(&mut buf, ROOT_OFFSET, total - ROOT_OFFSET);
    buf[ROOT_OFFSET + 2..ROOT_OFFSET + 6].copy_from_slice(&VECTOR_ROOT_E131_DATA.to_be_bytes());
    buf[ROOT_OFFSET + 6..ROOT_OFFSET + 22].copy_from_slice(packet.cid.as_bytes());

    // Framing layer
    write_flags_and_length(&mut buf, FRAMING_OFFSET, total - FRAMING_OFFSET);
    buf[FRAMING_OFFSET + 2..FRAMING_OFFSET + 6]
        .copy_from_slice(&VECTOR_E131_DATA_PACKET.to_be_bytes());
    let name = packet.source_name.as_bytes();
    let name_len = name.len().min(SOURCE_NAME_LEN - 1);
    let name_start = FRAMING_OFFSET + 6;
    buf[name_start..name_start + name_len].copy_from_slice(&name[..name_len]);
    buf[FRAMING_OFFSET + 70] = packet.priority;
    buf[FRAMING_OFFSET + 71..FRAMING_OFFSET + 73]
        .copy_from_slice(&packet.sync_address.to_be_bytes());
    buf[FRAMING_OFFSET + 73] = packet.sequence;
    buf[FRAMING_OFFSET + 74] = packet.options;
    buf[FRAMING_OFFSET + 75..FRAMING_OFFSET + 77].copy_from_slice(&packet.universe.to_be_bytes());

    // DMP layer
    write_flags_and_length(&mut buf, DMP_OFFSET, total - DMP_OFFSET);
    buf[DMP_OFFSET + 2] = VECTOR_DMP_SET_PROPERTY;
    buf[DMP_OFFSET + 3] = ADDRESS_TYPE_DATA_TYPE;
    buf[DMP_OFFSET + 4..DMP_OFFSET + 6].copy_from_slice(&0u16.to_be_bytes());
    buf[DMP_OFFSET + 6..DMP_OFFSET + 8].copy_from_slice(&1u16.to_be_bytes());
    let count = (packet.data.len() + 1) as u16;
    buf[DMP_OFFSET + 8..DMP_OFFSET + 10].copy_from_slice(&count.to_be_bytes());
    buf[DATA_OFFSET - 1] = packet.start_code;
    buf[DATA_OFFSET..].copy_from_slice(&packet.data);

    buf
}

fn write_flags_and_length(buf: &mut [u8], offset: usize, length: usize) {
    let field = 0x7000 | (length as u16 & 0x0fff);
    buf[offset..offset + 2].copy_from_slice(&field.to_be_bytes());
}
