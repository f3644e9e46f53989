// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! E1.31 wire format (ANSI E1.31-2018 Sec.4-7).
//!
//! Only data packets (root vector `VECTOR_ROOT_E131_DATA`) are understood;
//! synchronization and discovery packets are rejected by the decoder.

/// Data packet encoder used to build fixtures.
pub mod builder;
/// Data packet decoder and accessors.
pub mod packet;

pub use builder::{encode, DataPacketBuilder};
pub use packet::{Cid, DataPacket, DecodeError, CID_LEN};

/// Root layer preamble size field.
pub const PREAMBLE_SIZE: u16 = 0x0010;
/// Root layer postamble size field.
pub const POSTAMBLE_SIZE: u16 = 0x0000;
/// ACN packet identifier ("ASC-E1.17" padded with NULs).
pub const ACN_PACKET_IDENTIFIER: [u8; 12] = *b"ASC-E1.17\0\0\0";

/// High nibble of every PDU flags-and-length field.
pub const PDU_FLAGS: u8 = 0x7;

/// Root layer vector for E1.31 data packets.
pub const VECTOR_ROOT_E131_DATA: u32 = 0x0000_0004;
/// Framing layer vector for E1.31 data packets.
pub const VECTOR_E131_DATA_PACKET: u32 = 0x0000_0002;
/// DMP vector: set property.
pub const VECTOR_DMP_SET_PROPERTY: u8 = 0x02;
/// DMP address type and data type.
pub const ADDRESS_TYPE_DATA_TYPE: u8 = 0xa1;

/// Offset of the root layer flags-and-length field.
pub const ROOT_OFFSET: usize = 16;
/// Offset of the framing layer.
pub const FRAMING_OFFSET: usize = 38;
/// Offset of the DMP layer.
pub const DMP_OFFSET: usize = 115;
/// Offset of the first DMX slot (after the START code).
pub const DATA_OFFSET: usize = 126;
/// Smallest valid data packet: headers plus START code.
pub const MIN_PACKET_SIZE: usize = DATA_OFFSET;

/// Source name field length.
pub const SOURCE_NAME_LEN: usize = 64;
/// START code plus 512 slots.
pub const MAX_PROPERTY_VALUE_COUNT: u16 = 513;

/// START code of null (DMX level) data.
pub const DMX_START_CODE: u8 = 0x00;

/// Options bit 7.
pub const OPTION_PREVIEW_DATA: u8 = 0x80;
/// Options bit 6.
pub const OPTION_STREAM_TERMINATED: u8 = 0x40;
/// Options bit 5.
pub const OPTION_FORCE_SYNCHRONIZATION: u8 = 0x20;
