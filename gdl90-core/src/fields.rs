//! Bit-level field packing shared by the encoder and decoder.
//!
//! Multi-byte integers are big-endian unless the caller asks otherwise.
//! Quantizers clamp domain values to the field width; only the raw packing
//! helpers fail on out-of-range input.

use crate::types::{Gdl90Error, Result};

/// Degrees per LSB of a 24-bit latitude/longitude.
pub const LAT_LON_RESOLUTION: f64 = 180.0 / (1u32 << 23) as f64;
const LAT_LON_SCALE: f64 = (1u32 << 23) as f64 / 180.0;

/// Degrees per LSB of an 8-bit track/heading.
pub const TRACK_RESOLUTION: f64 = 360.0 / 256.0;

/// Horizontal velocity "no data" code.
pub const H_VELOCITY_UNKNOWN: u16 = 0xFFF;
/// Vertical velocity "no data" code.
pub const V_VELOCITY_UNKNOWN: u16 = 0x800;
const V_VELOCITY_MAX_FPM: i32 = 32_576;

// ---------------------------------------------------------------------------
// Integer packing
// ---------------------------------------------------------------------------

/// Pack an unsigned 24-bit value MSB first.
pub fn pack_u24(value: i64) -> Result<[u8; 3]> {
    if !(0..=0xFF_FFFF).contains(&value) {
        return Err(Gdl90Error::EncodeValueOutOfRange {
            field: "24-bit unsigned",
            value,
        });
    }
    let v = value as u32;
    Ok([(v >> 16) as u8, (v >> 8) as u8, v as u8])
}

/// Read a 24-bit unsigned value from the first three bytes.
pub(crate) fn unsigned24(data: &[u8], little_endian: bool) -> u32 {
    let (b0, b1, b2) = if little_endian {
        (data[2], data[1], data[0])
    } else {
        (data[0], data[1], data[2])
    };
    (b0 as u32) << 16 | (b1 as u32) << 8 | b2 as u32
}

/// Read a 24-bit two's complement value from the first three bytes.
pub(crate) fn signed24(data: &[u8], little_endian: bool) -> i32 {
    let v = unsigned24(data, little_endian) as i32;
    if v > 0x7F_FFFF {
        v - 0x100_0000
    } else {
        v
    }
}

/// Read a 16-bit unsigned value from the first two bytes.
pub(crate) fn unsigned16(data: &[u8], little_endian: bool) -> u16 {
    let bytes = [data[0], data[1]];
    if little_endian {
        u16::from_le_bytes(bytes)
    } else {
        u16::from_be_bytes(bytes)
    }
}

/// Read a 16-bit two's complement value from the first two bytes.
pub(crate) fn signed16(data: &[u8], little_endian: bool) -> i16 {
    unsigned16(data, little_endian) as i16
}

// ---------------------------------------------------------------------------
// Geocoordinates
// ---------------------------------------------------------------------------

fn degrees_to_fixed(degrees: f64, limit: f64) -> u32 {
    let clamped = degrees.clamp(-limit, limit);
    // +180 would land on 0x800000, which reads back as -180
    let scaled = ((clamped * LAT_LON_SCALE) as i32).min(0x7F_FFFF);
    (scaled as u32) & 0xFF_FFFF
}

/// Latitude in degrees to 24-bit two's complement, clamped to ±90.
pub fn make_latitude(degrees: f64) -> u32 {
    degrees_to_fixed(degrees, 90.0)
}

/// Longitude in degrees to 24-bit two's complement, clamped to ±180.
///
/// +180 packs as 0x7FFFFF, one LSB short, so it keeps its sign.
pub fn make_longitude(degrees: f64) -> u32 {
    degrees_to_fixed(degrees, 180.0)
}

/// 24-bit two's complement to degrees.
pub(crate) fn fixed_to_degrees(data: &[u8]) -> f64 {
    signed24(data, false) as f64 * LAT_LON_RESOLUTION
}

// ---------------------------------------------------------------------------
// Report fields
// ---------------------------------------------------------------------------

/// Pressure altitude to the 12-bit report code (25 ft steps, -1000 ft offset).
pub fn quantize_altitude(altitude_ft: i32) -> u16 {
    let code = ((altitude_ft as f64 + 1000.0) / 25.0).round();
    code.clamp(0.0, 0xFFE as f64) as u16
}

pub fn altitude_from_code(code: u16) -> i32 {
    code as i32 * 25 - 1000
}

/// Horizontal velocity in knots to the 12-bit code.
pub fn quantize_h_velocity(knots: Option<i32>) -> u16 {
    match knots {
        None => H_VELOCITY_UNKNOWN,
        Some(kt) => kt.clamp(0, 0xFFE) as u16,
    }
}

pub fn h_velocity_from_code(code: u16) -> Option<i32> {
    match code {
        H_VELOCITY_UNKNOWN => None,
        c => Some(c as i32),
    }
}

/// Vertical velocity in fpm to the 12-bit two's complement code (64 fpm steps).
pub fn quantize_v_velocity(fpm: Option<i32>) -> u16 {
    match fpm {
        None => V_VELOCITY_UNKNOWN,
        Some(v) if v > V_VELOCITY_MAX_FPM => 0x1FE,
        Some(v) if v < -V_VELOCITY_MAX_FPM => 0xE02,
        Some(v) => ((v / 64) as u16) & 0xFFF,
    }
}

/// Decode the 12-bit vertical velocity code.
///
/// Codes 0x1FF-0x7FF and 0x801-0xE01 are unassigned and read as zero.
pub fn v_velocity_from_code(code: u16) -> Option<i32> {
    let code = code & 0xFFF;
    match code {
        V_VELOCITY_UNKNOWN => None,
        0x1FF..=0x7FF | 0x801..=0xE01 => Some(0),
        c if c > 0x7FF => Some((c as i32 - 0x1000) * 64),
        c => Some(c as i32 * 64),
    }
}

/// Track/heading in degrees to one byte.
pub fn quantize_track(degrees: f64) -> u8 {
    let steps = (degrees / TRACK_RESOLUTION).round() as i64;
    steps.rem_euclid(256) as u8
}

pub fn track_from_code(code: u8) -> f64 {
    code as f64 * TRACK_RESOLUTION
}

/// Geometric altitude to 16-bit two's complement, 5 ft steps.
pub fn quantize_geo_altitude(altitude_ft: i32) -> u16 {
    let steps = (altitude_ft / 5).clamp(i16::MIN as i32, i16::MAX as i32);
    steps as i16 as u16
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Right-pad with spaces (or truncate) to exactly `N` ASCII bytes.
///
/// Non-ASCII characters are replaced with spaces.
pub fn pad_ascii<const N: usize>(text: &str) -> [u8; N] {
    let mut out = [b' '; N];
    for (slot, c) in out.iter_mut().zip(text.chars()) {
        *slot = if c.is_ascii() { c as u8 } else { b' ' };
    }
    out
}

/// Read a fixed-width ASCII field, dropping trailing spaces and NULs.
pub fn trim_ascii(data: &[u8]) -> String {
    let text: String = data
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { ' ' })
        .collect();
    text.trim_end_matches([' ', '\0']).to_string()
}

/// Seconds since 0000Z for the current system time.
pub fn utc_seconds_of_day() -> u32 {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    (secs % 86_400) as u32
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
