//! CRC-16 frame check sequence for GDL-90 messages.
//!
//! CCITT polynomial: x^16 + x^12 + x^5 + 1
//! Generator: 0x1021, initial value 0, no reflection, no final XOR.
//!
//! The CRC covers the message ID and payload (before escaping) and is
//! transmitted LSB first, directly before the closing flag byte.

use crate::types::{Gdl90Error, Result};

const GENERATOR: u16 = 0x1021;

// ---------------------------------------------------------------------------
// CRC lookup table (compile-time)
// ---------------------------------------------------------------------------

const fn build_crc_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ GENERATOR;
            } else {
                crc <<= 1;
            }
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static CRC_TABLE: [u16; 256] = build_crc_table();

// ---------------------------------------------------------------------------
// Core CRC functions
// ---------------------------------------------------------------------------

/// Raw CRC-16 register value over `data`.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0u16;
    for &byte in data {
        crc = CRC_TABLE[(crc >> 8) as usize] ^ (crc << 8) ^ byte as u16;
    }
    crc
}

/// Compute the two check bytes for a message body, in wire order (LSB first).
pub fn crc_compute(data: &[u8]) -> [u8; 2] {
    crc16(data).to_le_bytes()
}

/// Recompute the CRC of `data` and compare against `crc_bytes`.
///
/// Fails if `crc_bytes` is not exactly 2 bytes.
pub fn crc_check(data: &[u8], crc_bytes: &[u8]) -> Result<bool> {
    let expected: [u8; 2] = crc_bytes
        .try_into()
        .map_err(|_| Gdl90Error::InvalidCrcLength(crc_bytes.len()))?;
    Ok(crc_compute(data) == expected)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
