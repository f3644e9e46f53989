// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! E1.31 data packet decoding.
//!
//! A data packet is three nested PDUs with fixed offsets:
//!
//! ```text
//! 0     Root layer     preamble, ACN packet identifier, vector=0x04, CID
//! 38    Framing layer  vector=0x02, source name, priority, sync, sequence, options, universe
//! 115   DMP layer      vector=0x02, address type 0xa1, first=0, increment=1, count
//! 125   START code + up to 512 slots
//! ```

use super::{
    ACN_PACKET_IDENTIFIER, ADDRESS_TYPE_DATA_TYPE, DATA_OFFSET, DMP_OFFSET, FRAMING_OFFSET,
    MAX_PROPERTY_VALUE_COUNT, MIN_PACKET_SIZE, OPTION_FORCE_SYNCHRONIZATION, OPTION_PREVIEW_DATA,
    OPTION_STREAM_TERMINATED, PDU_FLAGS, POSTAMBLE_SIZE, PREAMBLE_SIZE, ROOT_OFFSET,
    SOURCE_NAME_LEN, VECTOR_DMP_SET_PROPERTY, VECTOR_E131_DATA_PACKET, VECTOR_ROOT_E131_DATA,
};
use crate::config::MAX_PACKET_SIZE;
use std::fmt;
use thiserror::Error;

/// Length of a component identifier.
pub const CID_LEN: usize = 16;

/// Component identifier of a source (a UUID on the wire).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Cid([u8; CID_LEN]);

impl Cid {
    /// Wrap raw CID bytes.
    pub const fn new(bytes: [u8; CID_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw CID bytes.
    pub const fn as_bytes(&self) -> &[u8; CID_LEN] {
        &self.0
    }
}

impl From<[u8; CID_LEN]> for Cid {
    fn from(bytes: [u8; CID_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 8-4-4-4-12 UUID layout
        for (i, byte) in self.0.iter().enumerate() {
            if matches!(i, 4 | 6 | 8 | 10) {
                f.write_str("-")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cid({})", self)
    }
}

/// Reasons a datagram is not a valid E1.31 data packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("datagram too short: {len} bytes")]
    Truncated { len: usize },

    #[error("datagram too long: {len} bytes")]
    TooLong { len: usize },

    #[error("invalid preamble/postamble")]
    InvalidPreamble,

    #[error("ACN packet identifier mismatch")]
    InvalidPacketIdentifier,

    #[error("invalid PDU flags {flags:#x} in {layer} layer")]
    InvalidFlags { layer: &'static str, flags: u8 },

    #[error("unsupported root vector {0:#010x}")]
    UnsupportedRootVector(u32),

    #[error("unsupported framing vector {0:#010x}")]
    UnsupportedFramingVector(u32),

    #[error("invalid DMP vector {0:#04x}")]
    InvalidDmpVector(u8),

    #[error("invalid DMP address/data type {0:#04x}")]
    InvalidAddressType(u8),

    #[error("invalid DMP addressing (first={first}, increment={increment})")]
    InvalidAddressing { first: u16, increment: u16 },

    #[error("property value count {count} does not fit a {len}-byte datagram")]
    InvalidPropertyCount { count: u16, len: usize },
}

/// A decoded E1.31 data packet.
///
/// The DMX payload is copied out of the receive buffer, so a packet can outlive
/// the datagram it was decoded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPacket {
    pub(super) cid: Cid,
    pub(super) source_name: String,
    pub(super) priority: u8,
    pub(super) sync_address: u16,
    pub(super) sequence: u8,
    pub(super) options: u8,
    pub(super) universe: u16,
    pub(super) start_code: u8,
    pub(super) data: Vec<u8>,
}

impl DataPacket {
    /// Decode a raw datagram.
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        let len = buf.len();
        if len < MIN_PACKET_SIZE {
            return Err(DecodeError::Truncated { len });
        }
        if len > MAX_PACKET_SIZE {
            return Err(DecodeError::TooLong { len });
        }

        // Root layer
        if read_u16(buf, 0) != PREAMBLE_SIZE || read_u16(buf, 2) != POSTAMBLE_SIZE {
            return Err(DecodeError::InvalidPreamble);
        }
        if buf[4..16] != ACN_PACKET_IDENTIFIER {
            return Err(DecodeError::InvalidPacketIdentifier);
        }
        check_flags(buf, ROOT_OFFSET, "root")?;
        let root_vector = read_u32(buf, ROOT_OFFSET + 2);
        if root_vector != VECTOR_ROOT_E131_DATA {
            return Err(DecodeError::UnsupportedRootVector(root_vector));
        }
        let mut cid = [0u8; CID_LEN];
        cid.copy_from_slice(&buf[ROOT_OFFSET + 6..ROOT_OFFSET + 6 + CID_LEN]);

        // Framing layer
        check_flags(buf, FRAMING_OFFSET, "framing")?;
        let framing_vector = read_u32(buf, FRAMING_OFFSET + 2);
        if framing_vector != VECTOR_E131_DATA_PACKET {
            return Err(DecodeError::UnsupportedFramingVector(framing_vector));
        }
        let name_start = FRAMING_OFFSET + 6;
        let source_name = parse_source_name(&buf[name_start..name_start + SOURCE_NAME_LEN]);
        let priority = buf[FRAMING_OFFSET + 70];
        let sync_address = read_u16(buf, FRAMING_OFFSET + 71);
        let sequence = buf[FRAMING_OFFSET + 73];
        let options = buf[FRAMING_OFFSET + 74];
        let universe = read_u16(buf, FRAMING_OFFSET + 75);

        // DMP layer
        check_flags(buf, DMP_OFFSET, "dmp")?;
        let dmp_vector = buf[DMP_OFFSET + 2];
        if dmp_vector != VECTOR_DMP_SET_PROPERTY {
            return Err(DecodeError::InvalidDmpVector(dmp_vector));
        }
        let address_type = buf[DMP_OFFSET + 3];
        if address_type != ADDRESS_TYPE_DATA_TYPE {
            return Err(DecodeError::InvalidAddressType(address_type));
        }
        let first = read_u16(buf, DMP_OFFSET + 4);
        let increment = read_u16(buf, DMP_OFFSET + 6);
        if first != 0 || increment != 1 {
            return Err(DecodeError::InvalidAddressing { first, increment });
        }
        let count = read_u16(buf, DMP_OFFSET + 8);
        let values_end = DATA_OFFSET - 1 + count as usize;
        if count == 0 || count > MAX_PROPERTY_VALUE_COUNT || values_end > len {
            return Err(DecodeError::InvalidPropertyCount { count, len });
        }

        Ok(Self {
            cid: Cid(cid),
            source_name,
            priority,
            sync_address,
            sequence,
            options,
            universe,
            start_code: buf[DATA_OFFSET - 1],
            data: buf[DATA_OFFSET..values_end].to_vec(),
        })
    }

    /// Universe this packet is addressed to.
    #[inline]
    pub fn universe(&self) -> u16 {
        self.universe
    }

    /// CID of the transmitting source.
    #[inline]
    pub fn cid(&self) -> Cid {
        self.cid
    }

    /// Sending priority (0-200 by convention, compared as a raw ordinal).
    #[inline]
    pub fn priority(&self) -> u8 {
        self.priority
    }

    /// Per-universe sequence number.
    #[inline]
    pub fn sequence(&self) -> u8 {
        self.sequence
    }

    /// DMX slots following the START code.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// User-assigned source name.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Synchronization universe (0 = unsynchronized).
    pub fn sync_address(&self) -> u16 {
        self.sync_address
    }

    /// Raw options byte.
    pub fn options(&self) -> u8 {
        self.options
    }

    /// DMX START code (0x00 for dimmer data).
    pub fn start_code(&self) -> u8 {
        self.start_code
    }

    /// Preview data flag: the data is meant for visualisers, not live output.
    pub fn is_preview(&self) -> bool {
        self.options & OPTION_PREVIEW_DATA != 0
    }

    /// Stream terminated flag: the source is leaving this universe.
    pub fn is_stream_terminated(&self) -> bool {
        self.options & OPTION_STREAM_TERMINATED != 0
    }

    /// Force synchronization flag.
    pub fn is_force_synchronization(&self) -> bool {
        self.options & OPTION_FORCE_SYNCHRONIZATION != 0
    }
}

#[inline]
fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

#[inline]
fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

fn check_flags(buf: &[u8], offset: usize, layer: &'static str) -> Result<(), DecodeError> {
    let flags = buf[offset] >> 4;
    if flags == PDU_FLAGS {
        Ok(())
    } else {
        Err(DecodeError::InvalidFlags { layer, flags })
    }
}

fn parse_source_name(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::builder::encode;

    const CID: Cid = Cid::new([
        0x5c, 0x1e, 0x8d, 0x2f, 0x00, 0x11, 0x4a, 0x9b, 0x80, 0x01, 0xde, 0xad, 0xbe, 0xef, 0x00,
        0x42,
    ]);

    fn fixture() -> Vec<u8> {
        let packet = DataPacket::builder(7, CID)
            .source_name("console")
            .priority(150)
            .sequence(42)
            .data(&[1, 2, 3, 4])
            .build();
        encode(&packet)
    }

    #[test]
    fn test_decode_fixture() {
        let buf = fixture();
        assert_eq!(buf.len(), DATA_OFFSET + 4);

        let packet = DataPacket::decode(&buf).expect("fixture decodes");
        assert_eq!(packet.universe(), 7);
        assert_eq!(packet.cid(), CID);
        assert_eq!(packet.priority(), 150);
        assert_eq!(packet.sequence(), 42);
        assert_eq!(packet.data(), &[1, 2, 3, 4]);
        assert_eq!(packet.source_name(), "console");
        assert_eq!(packet.start_code(), 0);
        assert!(!packet.is_preview());
    }

    #[test]
    fn test_decode_full_universe() {
        let slots: Vec<u8> = (0..512).map(|i| (i % 256) as u8).collect();
        let buf = encode(&DataPacket::builder(1, CID).data(&slots).build());
        assert_eq!(buf.len(), MAX_PACKET_SIZE);
        let packet = DataPacket::decode(&buf).expect("full universe decodes");
        assert_eq!(packet.data().len(), 512);
        assert_eq!(packet.data()[300], (300 % 256) as u8);
    }

    #[test]
    fn test_decode_options_flags() {
        let packet = DataPacket::builder(1, CID)
            .options(OPTION_PREVIEW_DATA | OPTION_STREAM_TERMINATED)
            .data(&[0])
            .build();
        let decoded = DataPacket::decode(&encode(&packet)).expect("decodes");
        assert!(decoded.is_preview());
        assert!(decoded.is_stream_terminated());
        assert!(!decoded.is_force_synchronization());
    }

    #[test]
    fn test_decode_rejects_truncated() {
        let buf = fixture();
        assert_eq!(
            DataPacket::decode(&buf[..100]),
            Err(DecodeError::Truncated { len: 100 })
        );
        assert_eq!(
            DataPacket::decode(&[]),
            Err(DecodeError::Truncated { len: 0 })
        );
    }

    #[test]
    fn test_decode_rejects_oversize() {
        let mut buf = fixture();
        buf.resize(MAX_PACKET_SIZE + 1, 0);
        assert_eq!(
            DataPacket::decode(&buf),
            Err(DecodeError::TooLong {
                len: MAX_PACKET_SIZE + 1
            })
        );
    }

    #[test]
    fn test_decode_rejects_bad_root_fields() {
        let mut buf = fixture();
        buf[1] = 0x11;
        assert_eq!(DataPacket::decode(&buf), Err(DecodeError::InvalidPreamble));

        let mut buf = fixture();
        buf[4] = b'X';
        assert_eq!(
            DataPacket::decode(&buf),
            Err(DecodeError::InvalidPacketIdentifier)
        );

        let mut buf = fixture();
        buf[ROOT_OFFSET] &= 0x0f;
        assert_eq!(
            DataPacket::decode(&buf),
            Err(DecodeError::InvalidFlags {
                layer: "root",
                flags: 0
            })
        );

        // Extended (sync/discovery) root vector
        let mut buf = fixture();
        buf[ROOT_OFFSET + 5] = 0x08;
        assert_eq!(
            DataPacket::decode(&buf),
            Err(DecodeError::UnsupportedRootVector(0x08))
        );
    }

    #[test]
    fn test_decode_rejects_bad_framing_and_dmp() {
        let mut buf = fixture();
        buf[FRAMING_OFFSET + 5] = 0x01;
        assert_eq!(
            DataPacket::decode(&buf),
            Err(DecodeError::UnsupportedFramingVector(0x01))
        );

        let mut buf = fixture();
        buf[DMP_OFFSET + 2] = 0x01;
        assert_eq!(DataPacket::decode(&buf), Err(DecodeError::InvalidDmpVector(0x01)));

        let mut buf = fixture();
        buf[DMP_OFFSET + 3] = 0xa2;
        assert_eq!(
            DataPacket::decode(&buf),
            Err(DecodeError::InvalidAddressType(0xa2))
        );

        let mut buf = fixture();
        buf[DMP_OFFSET + 7] = 2;
        assert_eq!(
            DataPacket::decode(&buf),
            Err(DecodeError::InvalidAddressing {
                first: 0,
                increment: 2
            })
        );
    }

    #[test]
    fn test_decode_rejects_property_count_overrun() {
        let mut buf = fixture();
        // 4 slots + start code = 5; claim 6
        buf[DMP_OFFSET + 9] = 6;
        let len = buf.len();
        assert_eq!(
            DataPacket::decode(&buf),
            Err(DecodeError::InvalidPropertyCount { count: 6, len })
        );

        buf[DMP_OFFSET + 9] = 0;
        assert_eq!(
            DataPacket::decode(&buf),
            Err(DecodeError::InvalidPropertyCount { count: 0, len })
        );
    }

    #[test]
    fn test_decode_random_garbage_never_panics() {
        let mut rng = fastrand::Rng::with_seed(0x5acd);
        let template = fixture();
        for _ in 0..2000 {
            let mut buf = template.clone();
            let len = rng.usize(0..=buf.len());
            buf.truncate(len);
            for _ in 0..rng.usize(0..8) {
                if !buf.is_empty() {
                    let idx = rng.usize(0..buf.len());
                    buf[idx] = rng.u8(..);
                }
            }
            let _ = DataPacket::decode(&buf);
        }
    }

    #[test]
    fn test_cid_display() {
        assert_eq!(CID.to_string(), "5c1e8d2f-0011-4a9b-8001-deadbeef0042");
        assert_eq!(
            format!("{:?}", CID),
            "Cid(5c1e8d2f-0011-4a9b-8001-deadbeef0042)"
        );
    }

    #[test]
    fn test_source_name_trimmed_at_nul() {
        assert_eq!(parse_source_name(b"desk\0\0garbage"), "desk");
        assert_eq!(parse_source_name(&[0u8; 4]), "");
        assert_eq!(parse_source_name(b"full"), "full");
    }
}
