//! Encode typed messages into ready-to-send GDL-90 frames.
//!
//! Every function returns the full frame, flags included. Domain values
//! (altitude, velocity, lat/lon, merit) are clamped to their field widths;
//! only raw packing of an oversize address fails.

use crate::fields::{self, pack_u24};
use crate::frame::prepare_frame;
use crate::types::*;

/// ID 0: Heartbeat.
///
/// Timestamp bit 16 is carried in bit 7 of status byte 2; the low 16 bits
/// go out little-endian.
pub fn encode_heartbeat(msg: &HeartbeatMsg) -> Vec<u8> {
    let ts = msg.timestamp & 0x1FFFF;
    let ts_bit16 = ((ts >> 16) & 1) as u8;
    let status2 = (msg.status2 & 0x7F) | (ts_bit16 << 7);

    let counts = ((msg.uplink_count as u16 & 0x1F) << 11) | (msg.basic_long_count & 0x3FF);

    let mut body = vec![MSG_HEARTBEAT, msg.status1, status2];
    body.extend_from_slice(&(ts as u16).to_le_bytes());
    body.extend_from_slice(&counts.to_be_bytes());
    prepare_frame(&body)
}

/// ID 10: Ownship report.
pub fn encode_ownship_report(report: &PositionReport) -> Result<Vec<u8>> {
    encode_position_report(MSG_OWNSHIP_REPORT, report)
}

/// ID 20: Traffic report.
pub fn encode_traffic_report(report: &PositionReport) -> Result<Vec<u8>> {
    encode_position_report(MSG_TRAFFIC_REPORT, report)
}

fn encode_position_report(msg_id: u8, r: &PositionReport) -> Result<Vec<u8>> {
    let mut body = Vec::with_capacity(28);
    body.push(msg_id);
    body.push(((r.status & 0x0F) << 4) | (r.address_type & 0x0F));
    body.extend_from_slice(&pack_u24(r.address as i64)?);
    body.extend_from_slice(&pack_u24(fields::make_latitude(r.latitude) as i64)?);
    body.extend_from_slice(&pack_u24(fields::make_longitude(r.longitude) as i64)?);

    // altitude is bits 15-4, misc is bits 3-0
    let altitude = fields::quantize_altitude(r.altitude_ft);
    body.push((altitude >> 4) as u8);
    body.push((((altitude & 0x0F) as u8) << 4) | (r.misc & 0x0F));

    body.push(((r.nic & 0x0F) << 4) | (r.nac_p & 0x0F));

    // hh hv vv
    let h = fields::quantize_h_velocity(r.h_velocity_kt);
    let v = fields::quantize_v_velocity(r.v_velocity_fpm);
    body.push((h >> 4) as u8);
    body.push((((h & 0x0F) as u8) << 4) | ((v >> 8) & 0x0F) as u8);
    body.push((v & 0xFF) as u8);

    body.push(fields::quantize_track(r.track_heading));
    body.push(r.emitter_category);
    body.extend_from_slice(&fields::pad_ascii::<8>(&r.call_sign));

    // code is the top nibble, bottom nibble is spare
    body.push((r.code & 0x0F) << 4);

    Ok(prepare_frame(&body))
}

/// ID 11: Ownship geometric altitude.
pub fn encode_geo_altitude(msg: &GeoAltitudeMsg) -> Vec<u8> {
    let mut body = vec![MSG_OWNSHIP_GEO_ALTITUDE];
    body.extend_from_slice(&fields::quantize_geo_altitude(msg.altitude_ft).to_be_bytes());
    body.extend_from_slice(&msg.vertical_metrics.to_be_bytes());
    prepare_frame(&body)
}

/// ID 101: GPS time (12-byte layout).
pub fn encode_gps_time(msg: &GpsTimeMsg) -> Vec<u8> {
    let count = (msg.count & 0xFF_FFFF).to_le_bytes();
    let body = [
        MSG_VENDOR_101,
        msg.firmware_version,
        0, // debug data
        msg.quality.to_ascii(),
        count[0],
        count[1],
        count[2],
        msg.hour,
        msg.minute,
        0,
        0, // debug data
        msg.hardware_version,
    ];
    prepare_frame(&body)
}

/// ID 101 sub-id 0: ForeFlight device identification.
pub fn encode_foreflight_id(msg: &ForeFlightIdMsg) -> Vec<u8> {
    let mut body = Vec::with_capacity(39);
    body.push(MSG_VENDOR_101);
    body.push(0); // sub-id
    body.push(msg.version);
    match &msg.serial {
        Some(sn) => body.extend_from_slice(&fields::pad_ascii::<8>(sn)),
        None => body.extend_from_slice(&[0xFF; 8]),
    }
    body.extend_from_slice(&fields::pad_ascii::<8>(&msg.short_name));
    body.extend_from_slice(&fields::pad_ascii::<16>(&msg.long_name));
    body.extend_from_slice(&msg.capabilities.to_be_bytes());
    prepare_frame(&body)
}

/// ID 204: Stratux heartbeat.
pub fn encode_stratux_heartbeat(msg: &StratuxHeartbeatMsg) -> Vec<u8> {
    let data = ((msg.version & 0x3F) << 2) | (msg.status & 0x03);
    prepare_frame(&[MSG_STRATUX_HEARTBEAT, data])
}

/// ID 29: SX heartbeat.
///
/// At most 255 towers are sent.
pub fn encode_sx_heartbeat(msg: &SxHeartbeatMsg) -> Result<Vec<u8>> {
    let towers = &msg.towers[..msg.towers.len().min(u8::MAX as usize)];

    let mut body = Vec::with_capacity(30 + towers.len() * 6);
    body.extend_from_slice(&[MSG_SX_HEARTBEAT, b'S', b'X', 1, 1]);
    body.extend_from_slice(&msg.firmware_version.to_be_bytes());
    body.extend_from_slice(&msg.hardware_version.to_be_bytes());
    body.extend_from_slice(&msg.status1.to_be_bytes());
    body.extend_from_slice(&msg.status2.to_be_bytes());
    body.push(msg.sats_locked);
    body.push(msg.sats_connected);
    for v in [
        msg.num_978,
        msg.num_1090,
        msg.rate_978,
        msg.rate_1090,
        msg.cpu_temp,
    ] {
        body.extend_from_slice(&v.to_be_bytes());
    }
    body.push(towers.len() as u8);
    for &(lat, lon) in towers {
        body.extend_from_slice(&pack_u24(fields::make_latitude(lat) as i64)?);
        body.extend_from_slice(&pack_u24(fields::make_longitude(lon) as i64)?);
    }
    Ok(prepare_frame(&body))
}

/// Heartbeat stamped with the current UTC time of day.
pub fn heartbeat_now(status1: u8, status2: u8) -> HeartbeatMsg {
    HeartbeatMsg {
        status1,
        status2,
        timestamp: fields::utc_seconds_of_day(),
        ..HeartbeatMsg::default()
    }
}

/// GPS time message stamped with the current UTC hour and minute.
pub fn gps_time_now(quality: GpsQuality, count: u32) -> GpsTimeMsg {
    let secs = fields::utc_seconds_of_day();
    GpsTimeMsg {
        quality,
        count,
        hour: (secs / 3600) as u8,
        minute: ((secs % 3600) / 60) as u8,
        ..GpsTimeMsg::default()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn heartbeat(status1: u8, status2: u8, timestamp: u32, basic_long_count: u16) -> HeartbeatMsg {
        HeartbeatMsg {
            status1,
            status2,
            timestamp,
            uplink_count: 0,
            basic_long_count,
        }
    }

    #[test]
    fn test_heartbeat_vectors() {
        let samples: &[(HeartbeatMsg, &[u8])] = &[
            (
                heartbeat(0x81, 0x01, 3600, 1),
                &[0x7E, 0x00, 0x81, 0x01, 0x10, 0x0E, 0x00, 0x01, 0x00, 0x7D, 0x5E, 0x7E],
            ),
            (
                heartbeat(0x81, 0x01, 32400, 2),
                &[0x7E, 0x00, 0x81, 0x01, 0x90, 0x7D, 0x5E, 0x00, 0x02, 0x0C, 0x1B, 0x7E],
            ),
            (
                heartbeat(0x81, 0x01, 0x12233, 3),
                &[0x7E, 0x00, 0x81, 0x81, 0x33, 0x22, 0x00, 0x03, 0x03, 0xF3, 0x7E],
            ),
            (
                heartbeat(0x81, 0x01, 86399, 4),
                &[0x7E, 0x00, 0x81, 0x81, 0x7F, 0x51, 0x00, 0x04, 0x51, 0xF5, 0x7E],
            ),
        ];
        for (msg, expected) in samples {
            assert_eq!(encode_heartbeat(msg), *expected, "heartbeat ts={}", msg.timestamp);
        }
    }

    #[test]
    fn test_heartbeat_counts_packing() {
        let msg = HeartbeatMsg {
            uplink_count: 0x1F,
            basic_long_count: 0x3FF,
            ..HeartbeatMsg::default()
        };
        let frame = encode_heartbeat(&msg);
        assert_eq!(&frame[6..8], &[0xFB, 0xFF]);
    }

    #[test]
    fn test_stratux_heartbeat() {
        let frame = encode_stratux_heartbeat(&StratuxHeartbeatMsg::default());
        assert_eq!(frame, vec![0x7E, 0xCC, 0x06, 0x06, 0xCC, 0x7E]);
    }

    #[test]
    fn test_ownship_report() {
        let report = PositionReport {
            latitude: 30.209548473358154,
            longitude: -98.25480937957764,
            altitude_ft: 3300,
            nic: 8,
            nac_p: 8,
            h_velocity_kt: Some(545),
            v_velocity_fpm: Some(1408),
            track_heading: 258.75,
            call_sign: "N12345".into(),
            ..PositionReport::default()
        };
        let expected = [
            0x7E, 0x0A, 0x00, 0x00, 0x00, 0x00, 0x15, 0x7B, 0x7B, 0xBA, 0x21, 0x42, 0x0A, 0xC9,
            0x88, 0x22, 0x10, 0x16, 0xB8, 0x01, 0x4E, 0x31, 0x32, 0x33, 0x34, 0x35, 0x20, 0x20,
            0x00, 0x3D, 0x8C, 0x7E,
        ];
        assert_eq!(encode_ownship_report(&report).unwrap(), expected);
    }

    #[test]
    fn test_traffic_reports() {
        let samples: &[(u32, f64, f64, i32, i32, f64, &str, [u8; 32])] = &[
            (
                0xE1F24F,
                30.52377462387085,
                -98.53493928909302,
                4900,
                310,
                195.46875,
                "BNDT0",
                [
                    0x7E, 0x14, 0x00, 0xE1, 0xF2, 0x4F, 0x15, 0xB4, 0xAF, 0xB9, 0xEE, 0x43, 0x0E,
                    0xC9, 0x88, 0x13, 0x60, 0x00, 0x8B, 0x01, 0x42, 0x4E, 0x44, 0x54, 0x30, 0x20,
                    0x20, 0x20, 0x00, 0x41, 0xA5, 0x7E,
                ],
            ),
            (
                0xB33B89,
                30.597481727600098,
                -98.50058555603027,
                4050,
                300,
                213.75,
                "BNDT1",
                [
                    0x7E, 0x14, 0x00, 0xB3, 0x3B, 0x89, 0x15, 0xC2, 0x1A, 0xB9, 0xF4, 0x84, 0x0C,
                    0xA9, 0x88, 0x12, 0xC0, 0x00, 0x98, 0x01, 0x42, 0x4E, 0x44, 0x54, 0x31, 0x20,
                    0x20, 0x20, 0x00, 0xB7, 0x89, 0x7E,
                ],
            ),
        ];
        for &(address, lat, lon, alt, speed, track, cs, expected) in samples {
            let report = PositionReport {
                address,
                latitude: lat,
                longitude: lon,
                altitude_ft: alt,
                nic: 8,
                nac_p: 8,
                h_velocity_kt: Some(speed),
                v_velocity_fpm: Some(0),
                track_heading: track,
                call_sign: cs.into(),
                ..PositionReport::default()
            };
            assert_eq!(encode_traffic_report(&report).unwrap(), expected, "{cs}");
        }
    }

    #[test]
    fn test_report_unknown_velocities() {
        let frame = encode_traffic_report(&PositionReport::default()).unwrap();
        // hh hv vv at body offsets 14-16, +1 for the leading flag
        assert_eq!(&frame[15..18], &[0xFF, 0xF8, 0x00]);
    }

    #[test]
    fn test_report_address_out_of_range() {
        let report = PositionReport {
            address: 0x1_000_000,
            ..PositionReport::default()
        };
        assert!(matches!(
            encode_ownship_report(&report),
            Err(Gdl90Error::EncodeValueOutOfRange { .. })
        ));
    }

    #[test]
    fn test_report_call_sign_truncated() {
        let report = PositionReport {
            call_sign: "ABCDEFGHIJK".into(),
            ..PositionReport::default()
        };
        let frame = encode_ownship_report(&report).unwrap();
        assert_eq!(&frame[20..28], b"ABCDEFGH");
    }

    #[test]
    fn test_geo_altitude() {
        let frame = encode_geo_altitude(&GeoAltitudeMsg::new(525, Some(50), false));
        assert_eq!(frame, vec![0x7E, 0x0B, 0x00, 0x69, 0x00, 0x32, 0x4C, 0x0D, 0x7E]);
    }

    #[test]
    fn test_geo_altitude_warning_negative() {
        let frame = encode_geo_altitude(&GeoAltitudeMsg::new(-100, None, true));
        assert_eq!(&frame[1..6], &[0x0B, 0xFF, 0xEC, 0xFF, 0xFF]);
    }

    #[test]
    fn test_gps_time() {
        let msg = GpsTimeMsg {
            count: 5,
            hour: 13,
            minute: 45,
            ..GpsTimeMsg::default()
        };
        let frame = encode_gps_time(&msg);
        assert_eq!(
            frame,
            vec![
                0x7E, 0x65, 0x2A, 0x00, 0x32, 0x05, 0x00, 0x00, 0x0D, 0x2D, 0x00, 0x00, 0x04,
                0x83, 0x89, 0x7E
            ]
        );
    }

    #[test]
    fn test_foreflight_id_layout() {
        let frame = encode_foreflight_id(&ForeFlightIdMsg::default());
        let body = crate::frame::open_frame(&frame[1..frame.len() - 1]).unwrap();
        assert_eq!(body.len(), 39);
        assert_eq!(&body[..3], &[0x65, 0x00, 0x01]);
        assert_eq!(&body[3..11], &[0xFF; 8]);
        assert_eq!(&body[11..19], b"Stratux ");
        assert_eq!(&body[19..35], b"gdl90-encoder   ");
        assert_eq!(&body[35..], &[0, 0, 0, 1]);
    }

    #[test]
    fn test_sx_heartbeat_layout() {
        let msg = SxHeartbeatMsg {
            num_978: 12,
            towers: vec![(30.0, -98.0), (31.5, -97.25)],
            ..SxHeartbeatMsg::default()
        };
        let frame = encode_sx_heartbeat(&msg).unwrap();
        let body = crate::frame::open_frame(&frame[1..frame.len() - 1]).unwrap();
        assert_eq!(body.len(), 30 + 12);
        assert_eq!(&body[..5], &[0x1D, b'S', b'X', 1, 1]);
        assert_eq!(&body[5..9], &[0, 0, 0, 0x11]);
        assert_eq!(&body[19..21], &[0, 12]);
        assert_eq!(body[29], 2);
    }

    #[test]
    fn test_gps_time_now_in_range() {
        let msg = gps_time_now(GpsQuality::Gps, 0);
        assert!(msg.hour < 24);
        assert!(msg.minute < 60);
    }
}
