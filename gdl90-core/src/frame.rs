//! GDL-90 frame layer: byte stuffing, flag delimiting, CRC attach/verify.
//!
//! On the wire a frame is:
//!
//! ```text
//! 0x7E | escape(msg_id, payload..., crc_lsb, crc_msb) | 0x7E
//! ```
//!
//! Any 0x7D or 0x7E inside the frame is sent as 0x7D followed by the byte
//! XOR 0x20.

use crate::crc;
use crate::types::{Gdl90Error, Result};

/// Frame delimiter.
pub const FLAG_BYTE: u8 = 0x7E;
/// Escape prefix.
pub const CONTROL_ESCAPE: u8 = 0x7D;
const ESCAPE_XOR: u8 = 0x20;

/// Smallest unescaped frame body accepted: message ID, at least two payload
/// bytes, and the 2-byte CRC.
pub const MIN_FRAME_LEN: usize = 5;

/// Escape 0x7D and 0x7E bytes.
pub fn escape(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 4);
    for &b in payload {
        if b == FLAG_BYTE || b == CONTROL_ESCAPE {
            out.push(CONTROL_ESCAPE);
            out.push(b ^ ESCAPE_XOR);
        } else {
            out.push(b);
        }
    }
    out
}

/// Undo [`escape`].
///
/// A 0x7D with nothing after it is kept as-is.
pub fn unescape(framed: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(framed.len());
    let mut iter = framed.iter();
    while let Some(&b) = iter.next() {
        if b == CONTROL_ESCAPE {
            match iter.next() {
                Some(&next) => out.push(next ^ ESCAPE_XOR),
                None => out.push(b),
            }
        } else {
            out.push(b);
        }
    }
    out
}

/// Append the CRC to `body`, escape, and wrap in flag bytes.
pub fn prepare_frame(body: &[u8]) -> Vec<u8> {
    let mut msg = Vec::with_capacity(body.len() + 2);
    msg.extend_from_slice(body);
    msg.extend_from_slice(&crc::crc_compute(body));

    let escaped = escape(&msg);
    let mut out = Vec::with_capacity(escaped.len() + 2);
    out.push(FLAG_BYTE);
    out.extend_from_slice(&escaped);
    out.push(FLAG_BYTE);
    out
}

/// Unescape a frame body (flags already stripped), verify its CRC, and
/// return the message bytes without the CRC.
pub fn open_frame(escaped_body: &[u8]) -> Result<Vec<u8>> {
    let mut raw = unescape(escaped_body);
    if raw.len() < MIN_FRAME_LEN {
        return Err(Gdl90Error::FrameTooShort(raw.len()));
    }

    let crc_at = raw.len() - 2;
    let received = u16::from_le_bytes([raw[crc_at], raw[crc_at + 1]]);
    raw.truncate(crc_at);

    let computed = crc::crc16(&raw);
    if computed != received {
        return Err(Gdl90Error::CrcMismatch {
            msg_id: raw[0],
            expected: computed,
            actual: received,
        });
    }
    Ok(raw)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
