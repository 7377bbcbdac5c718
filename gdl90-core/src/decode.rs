//! Decode unescaped, CRC-checked GDL-90 payloads into typed messages.
//!
//! Supported message IDs:
//! - 0x00: Heartbeat
//! - 0x07: UAT uplink data
//! - 0x0A / 0x14: Ownship and traffic reports
//! - 0x0B: Ownship geometric altitude
//! - 0x1D: SX heartbeat
//! - 0x65: GPS time (12 or 21 bytes) or ForeFlight ID (39 bytes)
//! - 0xCC: Stratux heartbeat
//!
//! The payload passed in starts with the message ID and excludes the CRC.

use crate::fields;
use crate::types::*;

type DecodeFn = fn(&[u8]) -> Result<Message>;

/// Message ID to decoder dispatch.
const DECODERS: &[(u8, DecodeFn)] = &[
    (MSG_HEARTBEAT, decode_heartbeat),
    (MSG_UPLINK_DATA, decode_uplink_data),
    (MSG_OWNSHIP_REPORT, decode_ownship_report),
    (MSG_OWNSHIP_GEO_ALTITUDE, decode_geo_altitude),
    (MSG_TRAFFIC_REPORT, decode_traffic_report),
    (MSG_SX_HEARTBEAT, decode_sx_heartbeat),
    (MSG_VENDOR_101, decode_vendor_101),
    (MSG_STRATUX_HEARTBEAT, decode_stratux_heartbeat),
];

/// Decode a payload by its leading message ID.
pub fn decode(payload: &[u8]) -> Result<Message> {
    let msg_id = *payload.first().ok_or(Gdl90Error::FrameTooShort(0))?;
    let decoder = DECODERS
        .iter()
        .find(|(id, _)| *id == msg_id)
        .map(|(_, f)| *f)
        .ok_or(Gdl90Error::UnknownMessageId(msg_id))?;
    decoder(payload)
}

/// Check the payload length against the accepted lengths in [`MSG_TABLE`].
fn expect_table_len(payload: &[u8], msg_id: u8) -> Result<()> {
    let lengths = table_lengths(msg_id);
    if lengths.is_empty() || lengths.contains(&payload.len()) {
        return Ok(());
    }
    Err(malformed(
        payload,
        format!("expected {lengths:?} bytes, got {}", payload.len()),
    ))
}

fn table_lengths(msg_id: u8) -> &'static [usize] {
    msg_info(msg_id).map(|info| info.lengths).unwrap_or_default()
}

fn expect_len(payload: &[u8], len: usize) -> Result<()> {
    if payload.len() != len {
        return Err(malformed(
            payload,
            format!("expected {len} bytes, got {}", payload.len()),
        ));
    }
    Ok(())
}

fn expect_id(payload: &[u8], msg_id: u8) -> Result<()> {
    if payload.first() != Some(&msg_id) {
        return Err(malformed(
            payload,
            format!("expected message id {msg_id:#04x}"),
        ));
    }
    Ok(())
}

fn malformed(payload: &[u8], reason: String) -> Gdl90Error {
    Gdl90Error::MalformedField {
        msg_id: payload.first().copied().unwrap_or_default(),
        reason,
    }
}

// ---------------------------------------------------------------------------
// Heartbeat and uplink
// ---------------------------------------------------------------------------

pub fn decode_heartbeat(p: &[u8]) -> Result<Message> {
    expect_table_len(p, MSG_HEARTBEAT)?;
    expect_id(p, MSG_HEARTBEAT)?;

    let mut timestamp = fields::unsigned16(&p[3..5], true) as u32;
    if p[2] & 0x80 != 0 {
        timestamp += 1 << 16;
    }

    Ok(Message::Heartbeat(HeartbeatMsg {
        status1: p[1],
        status2: p[2],
        timestamp,
        uplink_count: p[5] >> 3,
        basic_long_count: ((p[5] as u16 & 0x03) << 8) | p[6] as u16,
    }))
}

pub fn decode_uplink_data(p: &[u8]) -> Result<Message> {
    expect_table_len(p, MSG_UPLINK_DATA)?;
    expect_id(p, MSG_UPLINK_DATA)?;

    let mut header = [0u8; 8];
    header.copy_from_slice(&p[4..12]);

    Ok(Message::UplinkData(UplinkDataMsg {
        time_of_reception: fields::unsigned24(&p[1..4], true),
        header,
        data: p[12..].to_vec(),
    }))
}

// ---------------------------------------------------------------------------
// Position reports
// ---------------------------------------------------------------------------

pub fn decode_ownship_report(p: &[u8]) -> Result<Message> {
    decode_position_report(p, MSG_OWNSHIP_REPORT).map(Message::OwnshipReport)
}

pub fn decode_traffic_report(p: &[u8]) -> Result<Message> {
    decode_position_report(p, MSG_TRAFFIC_REPORT).map(Message::TrafficReport)
}

/// Shared 28-byte report layout.
///
/// An all-space call sign decodes to "-".
fn decode_position_report(p: &[u8], msg_id: u8) -> Result<PositionReport> {
    expect_table_len(p, msg_id)?;
    expect_id(p, msg_id)?;

    let altitude_code = ((p[11] as u16) << 4) | (p[12] >> 4) as u16;
    let h_code = ((p[14] as u16) << 4) | (p[15] >> 4) as u16;
    let v_code = (((p[15] & 0x0F) as u16) << 8) | p[16] as u16;

    let mut call_sign = fields::trim_ascii(&p[19..27]);
    if call_sign.is_empty() {
        call_sign = "-".into();
    }

    Ok(PositionReport {
        status: p[1] >> 4,
        address_type: p[1] & 0x0F,
        address: fields::unsigned24(&p[2..5], false),
        latitude: fields::fixed_to_degrees(&p[5..8]),
        longitude: fields::fixed_to_degrees(&p[8..11]),
        altitude_ft: fields::altitude_from_code(altitude_code),
        misc: p[12] & 0x0F,
        nic: p[13] >> 4,
        nac_p: p[13] & 0x0F,
        h_velocity_kt: fields::h_velocity_from_code(h_code),
        v_velocity_fpm: fields::v_velocity_from_code(v_code),
        track_heading: fields::track_from_code(p[17]),
        emitter_category: p[18],
        call_sign,
        code: p[27] >> 4,
    })
}

pub fn decode_geo_altitude(p: &[u8]) -> Result<Message> {
    expect_table_len(p, MSG_OWNSHIP_GEO_ALTITUDE)?;
    expect_id(p, MSG_OWNSHIP_GEO_ALTITUDE)?;

    Ok(Message::OwnshipGeometricAltitude(GeoAltitudeMsg {
        altitude_ft: fields::signed16(&p[1..3], false) as i32 * 5,
        vertical_metrics: fields::unsigned16(&p[3..5], false),
    }))
}

// ---------------------------------------------------------------------------
// Vendor messages
// ---------------------------------------------------------------------------

/// ID 101 is shared by two vendors and told apart by length.
pub fn decode_vendor_101(p: &[u8]) -> Result<Message> {
    expect_id(p, MSG_VENDOR_101)?;
    let unsupported = Gdl90Error::UnsupportedLayout {
        msg_id: MSG_VENDOR_101,
        len: p.len(),
    };
    if !table_lengths(MSG_VENDOR_101).contains(&p.len()) {
        return Err(unsupported);
    }
    match p.len() {
        12 | 21 => decode_gps_time(p).map(Message::GpsTime),
        39 if p[1] == 0 => decode_foreflight_id(p).map(Message::ForeFlightId),
        _ => Err(unsupported),
    }
}

fn decode_gps_time(p: &[u8]) -> Result<GpsTimeMsg> {
    let (hour, minute) = (p[7], p[8]);
    if hour > 23 || minute > 59 {
        return Err(Gdl90Error::InvalidTimeField { hour, minute });
    }

    Ok(GpsTimeMsg {
        firmware_version: p[1],
        quality: GpsQuality::from_ascii(p[3]),
        count: fields::unsigned24(&p[4..7], true),
        hour,
        minute,
        hardware_version: p[11],
    })
}

fn decode_foreflight_id(p: &[u8]) -> Result<ForeFlightIdMsg> {
    let serial_bytes = &p[3..11];
    let serial = if serial_bytes.iter().all(|&b| b == 0xFF) {
        None
    } else {
        Some(fields::trim_ascii(serial_bytes))
    };

    Ok(ForeFlightIdMsg {
        version: p[2],
        serial,
        short_name: fields::trim_ascii(&p[11..19]),
        long_name: fields::trim_ascii(&p[19..35]),
        capabilities: u32::from_be_bytes([p[35], p[36], p[37], p[38]]),
    })
}

pub fn decode_stratux_heartbeat(p: &[u8]) -> Result<Message> {
    expect_table_len(p, MSG_STRATUX_HEARTBEAT)?;
    expect_id(p, MSG_STRATUX_HEARTBEAT)?;

    Ok(Message::StratuxHeartbeat(StratuxHeartbeatMsg {
        status: p[1] & 0x03,
        version: p[1] >> 2,
    }))
}

/// Variable length: 30 bytes plus 6 per tower.
pub fn decode_sx_heartbeat(p: &[u8]) -> Result<Message> {
    expect_id(p, MSG_SX_HEARTBEAT)?;
    if p.len() < 30 {
        return Err(malformed(
            p,
            format!("expected at least 30 bytes, got {}", p.len()),
        ));
    }
    if p[1..5] != [b'S', b'X', 1, 1] {
        return Err(malformed(p, "bad SX signature".into()));
    }
    let tower_count = p[29] as usize;
    expect_len(p, 30 + tower_count * 6)?;

    let u16_at = |i: usize| fields::unsigned16(&p[i..i + 2], false);
    let u32_at = |i: usize| u32::from_be_bytes([p[i], p[i + 1], p[i + 2], p[i + 3]]);

    let towers = p[30..]
        .chunks_exact(6)
        .map(|t| {
            (
                fields::fixed_to_degrees(&t[0..3]),
                fields::fixed_to_degrees(&t[3..6]),
            )
        })
        .collect();

    Ok(Message::SxHeartbeat(SxHeartbeatMsg {
        firmware_version: u32_at(5),
        hardware_version: u32_at(9),
        status1: u16_at(13),
        status2: u16_at(15),
        sats_locked: p[17],
        sats_connected: p[18],
        num_978: u16_at(19),
        num_1090: u16_at(21),
        rate_978: u16_at(23),
        rate_1090: u16_at(25),
        cpu_temp: u16_at(27),
        towers,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
