//! UAT uplink payload decoding.
//!
//! A 424-byte uplink application data block is a sequence of I-Frames:
//!
//! ```text
//! length:9 | reserved:3 | type:4 | data[length]
//! ```
//!
//! Each I-Frame carries an APDU whose header holds an 11-bit product ID and
//! the product time. Text products (METAR, TAF, NOTAM, ...) are DLAC encoded:
//! 6-bit characters packed four to every three bytes.

use serde::Serialize;

use crate::types::UplinkDataMsg;

/// Product IDs whose APDU payload is DLAC text.
pub const TEXT_PRODUCT_IDS: &[u16] = &[8, 11, 12, 13, 413];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IFrame {
    pub frame_type: u8,
    pub data: Vec<u8>,
}

/// Application protocol data unit carried in an I-Frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Apdu {
    pub product_id: u16,
    pub hours: u8,
    pub minutes: u8,
    pub data: Vec<u8>,
}

/// One I-Frame of an uplink with its APDU and, for text products, the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UatProduct {
    pub frame_type: u8,
    pub apdu: Option<Apdu>,
    pub text: Option<String>,
}

impl UatProduct {
    pub fn product_id(&self) -> Option<u16> {
        self.apdu.as_ref().map(|a| a.product_id)
    }
}

// ---------------------------------------------------------------------------
// DLAC
// ---------------------------------------------------------------------------

const DLAC_ETX: u8 = 0;
const DLAC_TAB: u8 = 28;
const DLAC_RS: u8 = 29;
const DLAC_CRLF: u8 = 30;

fn push_dlac_char(out: &mut String, code: u8) {
    match code {
        1..=26 => out.push((b'A' + code - 1) as char),
        // 27 is NUL and 31 is change-cipher; neither prints
        27 | 31 => {}
        DLAC_TAB => out.push('\t'),
        DLAC_RS => out.push('\u{1e}'),
        DLAC_CRLF => out.push_str("\r\n"),
        // 32-63 map straight onto ASCII space through '?'
        _ => out.push(code as char),
    }
}

/// Decode DLAC 6-bit text.
///
/// Stops at end of input or at the ETX character.
pub fn dlac_decode(data: &[u8]) -> String {
    let mut out = String::new();
    let mut n = 0;
    let mut m = 0;

    while n < data.len() {
        let code = match m % 4 {
            0 => data[n] >> 2,
            1 => {
                if n + 1 >= data.len() {
                    break;
                }
                n += 1;
                ((data[n - 1] & 0x03) << 4) | (data[n] >> 4)
            }
            2 => {
                if n + 1 >= data.len() {
                    break;
                }
                n += 1;
                ((data[n - 1] & 0x0F) << 2) | (data[n] >> 6)
            }
            _ => {
                n += 1;
                data[n - 1] & 0x3F
            }
        };
        if code == DLAC_ETX {
            break;
        }
        push_dlac_char(&mut out, code);
        m += 1;
    }
    out
}

// ---------------------------------------------------------------------------
// I-Frames and APDUs
// ---------------------------------------------------------------------------

/// Split an uplink data block into I-Frames.
///
/// Stops at a zero length/type pair (the rest of the block is padding) or
/// when fewer than two bytes remain. A frame claiming more bytes than the
/// block holds is clipped.
pub fn extract_iframes(data: &[u8]) -> Vec<IFrame> {
    let mut frames = Vec::new();
    let mut n = 0;

    while n + 2 <= data.len() {
        let (b0, b1) = (data[n], data[n + 1]);
        if b0 == 0 && b1 == 0 {
            break;
        }

        let len = ((b0 as usize) << 1) | ((b1 & 0x80) >> 7) as usize;
        n += 2;
        let end = (n + len).min(data.len());
        frames.push(IFrame {
            frame_type: b1 & 0x0F,
            data: data[n..end].to_vec(),
        });
        n = end;
    }
    frames
}

/// Parse the APDU header at the start of an I-Frame. `None` under 4 bytes.
pub fn extract_apdu(iframe_data: &[u8]) -> Option<Apdu> {
    let &[b0, b1, b2, b3, ..] = iframe_data else {
        return None;
    };
    Some(Apdu {
        product_id: ((b0 as u16 & 0x1F) << 6) | (b1 >> 2) as u16,
        hours: (b2 & 0x7C) >> 2,
        minutes: ((b2 & 0x03) << 4) | (b3 >> 4),
        data: iframe_data[4..].to_vec(),
    })
}

/// Break an uplink message into its products, decoding text products.
pub fn decode_uplink(msg: &UplinkDataMsg) -> Vec<UatProduct> {
    extract_iframes(&msg.data)
        .into_iter()
        .map(|frame| {
            let apdu = extract_apdu(&frame.data);
            let text = apdu
                .as_ref()
                .filter(|a| TEXT_PRODUCT_IDS.contains(&a.product_id))
                .map(|a| dlac_decode(&a.data));
            UatProduct {
                frame_type: frame.frame_type,
                apdu,
                text,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
