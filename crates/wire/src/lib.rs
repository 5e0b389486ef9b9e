#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `wire` is the on-wire codec for the RU reliable-UDP transfer protocol: a
//! fixed 20-octet header followed by an opaque payload. It exposes exactly
//! two pure operations, [`Packet::encode`] and [`Packet::decode`], so that
//! every failure mode of the byte layout is observable and testable in
//! isolation from the sender/receiver state machines that use it.
//!
//! # Design
//!
//! All multi-octet integer fields are big-endian. The header carries a
//! two-octet magic (`b"RU"`), a one-octet version, a one-octet [`PacketType`]
//! discriminant, `seq`/`total` as `u32`, `length`/`window` as `u16`, and a
//! `u32` CRC-32 checksum computed by [`checksums::crc32`]. Encoding a DATA
//! packet fills in the checksum automatically; encoding any other packet
//! type always writes a zero checksum field, matching the wire contract that
//! the field is mandatory for DATA and unused otherwise.
//!
//! # Invariants
//!
//! - `Packet::decode(&packet.encode())` round-trips for every well-formed
//!   packet (`payload.len() <= u16::MAX as usize`).
//! - [`Packet::decode`] never validates the payload checksum; that is the
//!   receiver's responsibility once it has located a session, since an
//!   unmatched checksum is itself meaningful protocol behavior (see
//!   `core`'s receiver dispatch).
//!
//! # Errors
//!
//! [`CodecError`] enumerates the three ways a byte slice can fail to decode:
//! too short to contain a header, a bad magic/version stamp, or a payload
//! shorter than the declared `length`.
//!
//! # Examples
//!
//! ```
//! use wire::{Packet, PacketType};
//!
//! let packet = Packet::data(7, 10, 8, b"hello".to_vec());
//! let bytes = packet.encode();
//! let decoded = Packet::decode(&bytes).unwrap();
//! assert_eq!(decoded.seq, 7);
//! assert_eq!(decoded.packet_type, PacketType::Data);
//! ```
//!
//! # See also
//!
//! - [`checksums`] for the CRC-32 primitive used on DATA payloads.

use std::fmt;

/// Size in octets of the fixed packet header.
pub const HEADER_LEN: usize = 20;

const MAGIC: [u8; 2] = [0x52, 0x55];
const VERSION: u8 = 1;

/// The seven datagram kinds exchanged by the protocol.
///
/// Discriminants match the wire encoding exactly (`HANDSHAKE` = 0 through
/// `ERROR` = 6); do not renumber without bumping [`VERSION`](crate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    /// Sender-to-receiver session setup request.
    Handshake = 0,
    /// Receiver-to-sender session setup acknowledgment.
    HandshakeAck = 1,
    /// Sender-to-receiver payload chunk.
    Data = 2,
    /// Receiver-to-sender cumulative acknowledgment.
    Ack = 3,
    /// Sender-to-receiver teardown request.
    Fin = 4,
    /// Receiver-to-sender teardown acknowledgment.
    FinAck = 5,
    /// Diagnostic-only notification in either direction.
    Error = 6,
}

impl PacketType {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Handshake),
            1 => Some(Self::HandshakeAck),
            2 => Some(Self::Data),
            3 => Some(Self::Ack),
            4 => Some(Self::Fin),
            5 => Some(Self::FinAck),
            6 => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Handshake => "HANDSHAKE",
            Self::HandshakeAck => "HANDSHAKE_ACK",
            Self::Data => "DATA",
            Self::Ack => "ACK",
            Self::Fin => "FIN",
            Self::FinAck => "FIN_ACK",
            Self::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// A single decoded (or about-to-be-encoded) datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// The datagram kind.
    pub packet_type: PacketType,
    /// Sequence number (meaning depends on `packet_type`: chunk index for
    /// DATA, last-in-order index for ACK, unused for control packets).
    pub seq: u32,
    /// Total packet count of the transfer, as negotiated at handshake time.
    pub total: u32,
    /// Window size hint; advisory, carried by HANDSHAKE/HANDSHAKE_ACK/DATA.
    pub window: u16,
    /// Payload bytes. Empty for ACK/FIN/FIN_ACK; text for
    /// HANDSHAKE/ERROR; chunk bytes for DATA.
    pub payload: Vec<u8>,
}

impl Packet {
    /// Builds a DATA packet; the checksum is computed at [`encode`](Self::encode) time.
    #[must_use]
    pub fn data(seq: u32, total: u32, window: u16, payload: Vec<u8>) -> Self {
        Self {
            packet_type: PacketType::Data,
            seq,
            total,
            window,
            payload,
        }
    }

    /// Builds a control packet (anything other than DATA) with no payload.
    #[must_use]
    pub fn control(packet_type: PacketType, seq: u32, total: u32, window: u16) -> Self {
        Self {
            packet_type,
            seq,
            total,
            window,
            payload: Vec::new(),
        }
    }

    /// Builds a control packet carrying a text payload (HANDSHAKE, ERROR).
    #[must_use]
    pub fn control_with_payload(
        packet_type: PacketType,
        seq: u32,
        total: u32,
        window: u16,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            packet_type,
            seq,
            total,
            window,
            payload,
        }
    }

    /// Serializes this packet to its on-wire byte representation.
    ///
    /// For a DATA packet, the checksum field is computed from `payload` via
    /// [`checksums::crc32`]. For every other packet type the checksum field
    /// is written as zero, per the wire contract.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let length = self.payload.len() as u16;
        let checksum = if self.packet_type == PacketType::Data {
            checksums::crc32(&self.payload)
        } else {
            0
        };

        let mut bytes = Vec::with_capacity(HEADER_LEN + self.payload.len());
        bytes.extend_from_slice(&MAGIC);
        bytes.push(VERSION);
        bytes.push(self.packet_type as u8);
        bytes.extend_from_slice(&self.seq.to_be_bytes());
        bytes.extend_from_slice(&self.total.to_be_bytes());
        bytes.extend_from_slice(&length.to_be_bytes());
        bytes.extend_from_slice(&self.window.to_be_bytes());
        bytes.extend_from_slice(&checksum.to_be_bytes());
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    /// Parses an on-wire datagram.
    ///
    /// Trailing octets beyond the declared `length` are ignored, not an
    /// error. The checksum is decoded verbatim but never compared here;
    /// callers that care about DATA integrity must check it themselves
    /// (see [`Packet::checksum_valid`]).
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::ShortHeader`] if `bytes` is shorter than
    /// [`HEADER_LEN`], [`CodecError::BadMagic`] if the magic or version octets
    /// do not match, and [`CodecError::TruncatedPayload`] if the declared
    /// `length` exceeds the remaining bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() < HEADER_LEN {
            return Err(CodecError::ShortHeader { len: bytes.len() });
        }
        if bytes[0] != MAGIC[0] || bytes[1] != MAGIC[1] || bytes[2] != VERSION {
            return Err(CodecError::BadMagic);
        }
        let packet_type = PacketType::from_u8(bytes[3]).ok_or(CodecError::BadMagic)?;
        let seq = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let total = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        let length = u16::from_be_bytes([bytes[12], bytes[13]]) as usize;
        let window = u16::from_be_bytes([bytes[14], bytes[15]]);
        // The checksum field is intentionally not read here: decode() never
        // validates it (see `checksum_field` for callers that need it).

        let available = bytes.len() - HEADER_LEN;
        if length > available {
            return Err(CodecError::TruncatedPayload {
                declared: length,
                available,
            });
        }
        let payload = bytes[HEADER_LEN..HEADER_LEN + length].to_vec();

        Ok(Self {
            packet_type,
            seq,
            total,
            window,
            payload,
        })
    }

    /// Recomputes and compares the CRC-32 of `payload` against `checksum`.
    ///
    /// Only meaningful for DATA packets decoded from the wire; callers
    /// should decode the on-wire checksum alongside the payload if they need
    /// this check (see `core`'s receiver dispatch, which keeps the raw
    /// bytes rather than re-deriving the checksum from [`Packet`] alone).
    #[must_use]
    pub fn checksum_valid(payload: &[u8], checksum: u32) -> bool {
        checksums::crc32(payload) == checksum
    }

    /// Extracts the checksum field directly from an encoded datagram,
    /// without fully decoding it. Used by the receiver to validate DATA
    /// integrity without re-deriving the checksum from the decoded struct
    /// (which does not retain the on-wire checksum field).
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::ShortHeader`] under the same condition as
    /// [`Packet::decode`].
    pub fn checksum_field(bytes: &[u8]) -> Result<u32, CodecError> {
        if bytes.len() < HEADER_LEN {
            return Err(CodecError::ShortHeader { len: bytes.len() });
        }
        Ok(u32::from_be_bytes([
            bytes[16], bytes[17], bytes[18], bytes[19],
        ]))
    }
}

/// Reasons [`Packet::decode`] can reject a byte slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Fewer than [`HEADER_LEN`] bytes were available.
    #[error("datagram too short for a header: {len} byte(s), need at least {HEADER_LEN}")]
    ShortHeader {
        /// Number of bytes actually present.
        len: usize,
    },
    /// The magic, version, or type octets did not match an expected value.
    #[error("bad magic, version, or packet type in header")]
    BadMagic,
    /// The header's declared payload `length` exceeded the bytes available.
    #[error("declared payload length {declared} exceeds {available} available byte(s)")]
    TruncatedPayload {
        /// The `length` field read from the header.
        declared: usize,
        /// Bytes actually remaining after the header.
        available: usize,
    },
}
