#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `checksums` provides the CRC-32 integrity check used by the RU
//! reliable-UDP transfer protocol's wire codec. Every DATA datagram carries
//! a checksum of its payload; the receiver recomputes it on arrival and
//! drops any datagram whose bytes do not match (see `wire::Packet` and the
//! receiver state machine in `core`).
//!
//! # Design
//!
//! [`crc32`] implements the IEEE 802.3 polynomial (`0xEDB88320`, reflected,
//! init/xor `0xFFFFFFFF`) over a table-driven byte-at-a-time loop. The table
//! is computed once behind a `std::sync::OnceLock` rather than checked in as
//! a 1 KiB constant, trading a few dozen cycles on first use for a smaller
//! source file.
//!
//! # Invariants
//!
//! - `crc32(&[])` is always `0`.
//! - `crc32` is deterministic: calling it twice on the same bytes yields the
//!   same result.
//!
//! # Examples
//!
//! ```
//! use checksums::crc32;
//!
//! assert_eq!(crc32(b""), 0);
//! assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
//! ```
//!
//! # See also
//!
//! - [`wire`] for the packet header that carries this checksum on the wire.

use std::sync::OnceLock;

const POLY: u32 = 0xEDB8_8320;

fn table() -> &'static [u32; 256] {
    static TABLE: OnceLock<[u32; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut bit = 0;
            while bit < 8 {
                crc = if crc & 1 != 0 {
                    (crc >> 1) ^ POLY
                } else {
                    crc >> 1
                };
                bit += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    })
}

/// Computes the IEEE 802.3 CRC-32 of `data`.
///
/// This is the checksum algorithm upstream rsync and most datagram
/// protocols use: init/xor `0xFFFFFFFF`, reflected input and output,
/// polynomial `0xEDB88320`.
///
/// # Examples
///
/// ```
/// use checksums::crc32;
///
/// assert_eq!(crc32(b""), 0);
/// assert_eq!(crc32(b"a"), 0xE8B7_BE43);
/// ```
#[must_use]
pub fn crc32(data: &[u8]) -> u32 {
    let table = table();
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ table[index];
    }
    crc ^ 0xFFFF_FFFF
}
