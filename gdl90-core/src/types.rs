//! Shared types, error enum, and decoded message types for gdl90-core.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// All errors produced by gdl90-core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Gdl90Error {
    #[error("frame too short: {0} bytes after unescaping")]
    FrameTooShort(usize),
    #[error("CRC must be exactly 2 bytes, got {0}")]
    InvalidCrcLength(usize),
    #[error("CRC mismatch on message {msg_id:#04x}: expected {expected:04X}, got {actual:04X}")]
    CrcMismatch { msg_id: u8, expected: u16, actual: u16 },
    #[error("unrecognized message id: {0:#04x}")]
    UnknownMessageId(u8),
    #[error("unsupported layout for message {msg_id:#04x}: {len} bytes")]
    UnsupportedLayout { msg_id: u8, len: usize },
    #[error("malformed message {msg_id:#04x}: {reason}")]
    MalformedField { msg_id: u8, reason: String },
    #[error("invalid time field: {hour:02}:{minute:02}")]
    InvalidTimeField { hour: u8, minute: u8 },
    #[error("value {value} out of range for {field}")]
    EncodeValueOutOfRange { field: &'static str, value: i64 },
}

impl Serialize for Gdl90Error {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub type Result<T> = std::result::Result<T, Gdl90Error>;

// ---------------------------------------------------------------------------
// Message ID metadata
// ---------------------------------------------------------------------------

pub const MSG_HEARTBEAT: u8 = 0x00;
pub const MSG_UPLINK_DATA: u8 = 0x07;
pub const MSG_OWNSHIP_REPORT: u8 = 0x0A;
pub const MSG_OWNSHIP_GEO_ALTITUDE: u8 = 0x0B;
pub const MSG_TRAFFIC_REPORT: u8 = 0x14;
pub const MSG_SX_HEARTBEAT: u8 = 0x1D;
/// Vendor message 101: GPS time (Skyradar) or ForeFlight ID, told apart by length.
pub const MSG_VENDOR_101: u8 = 0x65;
pub const MSG_STRATUX_HEARTBEAT: u8 = 0xCC;

/// Metadata for a message ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsgInfo {
    pub name: &'static str,
    /// Accepted payload lengths (message ID byte included). Empty means variable.
    pub lengths: &'static [usize],
}

/// Known message ID table.
pub const MSG_TABLE: &[(u8, MsgInfo)] = &[
    (
        MSG_HEARTBEAT,
        MsgInfo {
            name: "Heartbeat",
            lengths: &[7],
        },
    ),
    (
        MSG_UPLINK_DATA,
        MsgInfo {
            name: "Uplink data",
            lengths: &[436],
        },
    ),
    (
        MSG_OWNSHIP_REPORT,
        MsgInfo {
            name: "Ownship report",
            lengths: &[28],
        },
    ),
    (
        MSG_OWNSHIP_GEO_ALTITUDE,
        MsgInfo {
            name: "Ownship geometric altitude",
            lengths: &[5],
        },
    ),
    (
        MSG_TRAFFIC_REPORT,
        MsgInfo {
            name: "Traffic report",
            lengths: &[28],
        },
    ),
    (
        MSG_SX_HEARTBEAT,
        MsgInfo {
            name: "SX heartbeat",
            lengths: &[],
        },
    ),
    (
        MSG_VENDOR_101,
        MsgInfo {
            name: "GPS time / ForeFlight ID",
            lengths: &[12, 21, 39],
        },
    ),
    (
        MSG_STRATUX_HEARTBEAT,
        MsgInfo {
            name: "Stratux heartbeat",
            lengths: &[2],
        },
    ),
];

/// Look up message metadata. Returns `None` for unrecognized IDs.
pub fn msg_info(msg_id: u8) -> Option<&'static MsgInfo> {
    MSG_TABLE
        .iter()
        .find(|(id, _)| *id == msg_id)
        .map(|(_, info)| info)
}

// ---------------------------------------------------------------------------
// Address helpers
// ---------------------------------------------------------------------------

/// 24-bit participant address (ICAO or self-assigned), held in the low bits.
pub type Address = u32;

/// Format an address as a 6-char uppercase hex string.
pub fn address_to_string(address: Address) -> String {
    format!("{:06X}", address & 0xFF_FFFF)
}

/// Parse a 6-char hex string into an address.
pub fn address_from_hex(hex: &str) -> Option<Address> {
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

// ---------------------------------------------------------------------------
// Decoded message types
// ---------------------------------------------------------------------------

/// ID 0: Heartbeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeartbeatMsg {
    pub status1: u8,
    /// Raw status byte 2; bit 7 carries timestamp bit 16 on the wire.
    pub status2: u8,
    /// Seconds since 0000Z, 17 bits.
    pub timestamp: u32,
    /// Uplink messages received in the last second, 5 bits.
    pub uplink_count: u8,
    /// Basic and long messages received in the last second, 10 bits.
    pub basic_long_count: u16,
}

impl Default for HeartbeatMsg {
    fn default() -> Self {
        HeartbeatMsg {
            status1: 0x81,
            status2: 0x01,
            timestamp: 0,
            uplink_count: 0,
            basic_long_count: 0,
        }
    }
}

impl HeartbeatMsg {
    pub fn gps_position_valid(&self) -> bool {
        self.status1 & 0x80 != 0
    }

    pub fn uat_initialized(&self) -> bool {
        self.status1 & 0x01 != 0
    }

    pub fn utc_ok(&self) -> bool {
        self.status2 & 0x01 != 0
    }
}

/// ID 7: UAT uplink payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UplinkDataMsg {
    /// 24-bit time of reception, 80 ns units.
    pub time_of_reception: u32,
    pub header: [u8; 8],
    /// 424-byte application data block.
    pub data: Vec<u8>,
}

/// ID 10 (ownship) and ID 20 (traffic) share this layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionReport {
    /// Traffic alert status, 4 bits.
    pub status: u8,
    pub address_type: u8,
    pub address: Address,
    /// Degrees, positive north.
    pub latitude: f64,
    /// Degrees, positive east.
    pub longitude: f64,
    /// Pressure altitude in feet, 25 ft resolution.
    pub altitude_ft: i32,
    pub misc: u8,
    /// Navigation Integrity Category.
    pub nic: u8,
    /// Navigation Accuracy Category for position.
    pub nac_p: u8,
    /// Knots. `None` when the unit reports no velocity.
    pub h_velocity_kt: Option<i32>,
    /// Feet per minute, 64 fpm resolution. `None` when not available.
    pub v_velocity_fpm: Option<i32>,
    /// Track or heading in degrees, 360/256 resolution.
    pub track_heading: f64,
    pub emitter_category: u8,
    pub call_sign: String,
    /// Emergency/priority code, 4 bits.
    pub code: u8,
}

impl Default for PositionReport {
    fn default() -> Self {
        PositionReport {
            status: 0,
            address_type: 0,
            address: 0,
            latitude: 0.0,
            longitude: 0.0,
            altitude_ft: 0,
            misc: 9,
            nic: 11,
            nac_p: 11,
            h_velocity_kt: None,
            v_velocity_fpm: None,
            track_heading: 0.0,
            emitter_category: 1,
            call_sign: String::new(),
            code: 0,
        }
    }
}

impl PositionReport {
    /// True when an ownship report carries a usable position.
    ///
    /// Ownship sends 0,0 with NIC 0 or 1 when it has no fix.
    pub fn ownship_has_position(&self) -> bool {
        !(self.is_null_island() && self.nic <= 1)
    }

    /// True when a traffic report carries a usable position.
    ///
    /// Traffic with no position is 0,0 with NIC 0; NIC 1 is still a fix.
    pub fn traffic_has_position(&self) -> bool {
        !(self.is_null_island() && self.nic == 0)
    }

    fn is_null_island(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }

    pub fn address_hex(&self) -> String {
        address_to_string(self.address)
    }
}

/// ID 11: Ownship geometric (GNSS) altitude.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeoAltitudeMsg {
    /// Feet, 5 ft resolution.
    pub altitude_ft: i32,
    /// Vertical warning flag (bit 15) and figure of merit (bits 14-0).
    pub vertical_metrics: u16,
}

impl Default for GeoAltitudeMsg {
    fn default() -> Self {
        GeoAltitudeMsg::new(0, Some(50), false)
    }
}

impl GeoAltitudeMsg {
    /// Build from altitude, vertical figure of merit (meters) and warning flag.
    ///
    /// Merit `None` packs to 0x7FFF; values above 32766 saturate at 0x7FFE.
    pub fn new(altitude_ft: i32, merit: Option<u16>, warning: bool) -> Self {
        let merit = match merit {
            None => 0x7FFF,
            Some(m) => m.min(0x7FFE),
        };
        let warn_bit = if warning { 0x8000 } else { 0 };
        GeoAltitudeMsg {
            altitude_ft,
            vertical_metrics: warn_bit | merit,
        }
    }

    pub fn vertical_warning(&self) -> bool {
        self.vertical_metrics & 0x8000 != 0
    }

    /// Vertical figure of merit in meters; `None` when not available.
    pub fn figure_of_merit(&self) -> Option<u16> {
        match self.vertical_metrics & 0x7FFF {
            0x7FFF => None,
            m => Some(m),
        }
    }
}

/// GPS fix quality carried as an ASCII digit in GPS time messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GpsQuality {
    NoFix,
    Gps,
    Waas,
}

impl GpsQuality {
    pub fn from_ascii(b: u8) -> Self {
        match b {
            b'1' => GpsQuality::Gps,
            b'2' => GpsQuality::Waas,
            _ => GpsQuality::NoFix,
        }
    }

    pub fn to_ascii(self) -> u8 {
        match self {
            GpsQuality::NoFix => b'0',
            GpsQuality::Gps => b'1',
            GpsQuality::Waas => b'2',
        }
    }
}

/// ID 101 (12 or 21 bytes): GPS time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GpsTimeMsg {
    pub firmware_version: u8,
    pub quality: GpsQuality,
    /// 24-bit message counter.
    pub count: u32,
    pub hour: u8,
    pub minute: u8,
    pub hardware_version: u8,
}

impl Default for GpsTimeMsg {
    fn default() -> Self {
        GpsTimeMsg {
            firmware_version: 0x2A,
            quality: GpsQuality::Waas,
            count: 0,
            hour: 0,
            minute: 0,
            hardware_version: 4,
        }
    }
}

impl GpsTimeMsg {
    /// `Some(true)` for a WAAS fix, `Some(false)` for a plain fix, `None` without a fix.
    pub fn waas(&self) -> Option<bool> {
        match self.quality {
            GpsQuality::NoFix => None,
            GpsQuality::Gps => Some(false),
            GpsQuality::Waas => Some(true),
        }
    }
}

/// ID 101 (39 bytes, sub-id 0): ForeFlight device identification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeFlightIdMsg {
    pub version: u8,
    /// Device serial number; `None` when sent as all 0xFF.
    pub serial: Option<String>,
    pub short_name: String,
    pub long_name: String,
    pub capabilities: u32,
}

impl Default for ForeFlightIdMsg {
    fn default() -> Self {
        ForeFlightIdMsg {
            version: 1,
            serial: None,
            short_name: "Stratux".into(),
            long_name: "gdl90-encoder".into(),
            capabilities: 1,
        }
    }
}

/// ID 204: Stratux heartbeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StratuxHeartbeatMsg {
    /// Bit 1 = GPS valid, bit 0 = AHRS valid.
    pub status: u8,
    /// Protocol version, 6 bits.
    pub version: u8,
}

impl Default for StratuxHeartbeatMsg {
    fn default() -> Self {
        StratuxHeartbeatMsg {
            status: 0x02,
            version: 1,
        }
    }
}

/// ID 29: SX (Hiltonsoftware) heartbeat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SxHeartbeatMsg {
    pub firmware_version: u32,
    pub hardware_version: u32,
    pub status1: u16,
    pub status2: u16,
    pub sats_locked: u8,
    pub sats_connected: u8,
    pub num_978: u16,
    pub num_1090: u16,
    pub rate_978: u16,
    pub rate_1090: u16,
    pub cpu_temp: u16,
    /// Ground towers heard, as (latitude, longitude) in degrees.
    pub towers: Vec<(f64, f64)>,
}

impl Default for SxHeartbeatMsg {
    fn default() -> Self {
        SxHeartbeatMsg {
            firmware_version: 0x0011,
            hardware_version: 0x0001,
            status1: 0x02,
            status2: 0x01,
            sats_locked: 0,
            sats_connected: 0,
            num_978: 0,
            num_1090: 0,
            rate_978: 0,
            rate_1090: 0,
            cpu_temp: 0,
            towers: Vec::new(),
        }
    }
}

/// Frame with a valid CRC whose message ID or layout is not decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownMsg {
    pub msg_id: u8,
    pub data: Vec<u8>,
}

/// Frame that failed CRC or field validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidMsg {
    pub msg_id: Option<u8>,
    pub error: Gdl90Error,
}

/// Union type for all decoded messages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Message {
    Heartbeat(HeartbeatMsg),
    UplinkData(UplinkDataMsg),
    OwnshipReport(PositionReport),
    OwnshipGeometricAltitude(GeoAltitudeMsg),
    TrafficReport(PositionReport),
    GpsTime(GpsTimeMsg),
    ForeFlightId(ForeFlightIdMsg),
    StratuxHeartbeat(StratuxHeartbeatMsg),
    SxHeartbeat(SxHeartbeatMsg),
    Unknown(UnknownMsg),
    Invalid(InvalidMsg),
}

impl Message {
    /// Message ID byte this record was decoded from.
    pub fn msg_id(&self) -> Option<u8> {
        match self {
            Message::Heartbeat(_) => Some(MSG_HEARTBEAT),
            Message::UplinkData(_) => Some(MSG_UPLINK_DATA),
            Message::OwnshipReport(_) => Some(MSG_OWNSHIP_REPORT),
            Message::OwnshipGeometricAltitude(_) => Some(MSG_OWNSHIP_GEO_ALTITUDE),
            Message::TrafficReport(_) => Some(MSG_TRAFFIC_REPORT),
            Message::GpsTime(_) | Message::ForeFlightId(_) => Some(MSG_VENDOR_101),
            Message::StratuxHeartbeat(_) => Some(MSG_STRATUX_HEARTBEAT),
            Message::SxHeartbeat(_) => Some(MSG_SX_HEARTBEAT),
            Message::Unknown(m) => Some(m.msg_id),
            Message::Invalid(m) => m.msg_id,
        }
    }

    /// Position validity for reports, using the rule for the report kind.
    /// `None` for messages that carry no position.
    pub fn has_position(&self) -> Option<bool> {
        match self {
            Message::OwnshipReport(r) => Some(r.ownship_has_position()),
            Message::TrafficReport(r) => Some(r.traffic_has_position()),
            _ => None,
        }
    }

    /// True for `Unknown` and `Invalid`.
    pub fn is_undecodable(&self) -> bool {
        matches!(self, Message::Unknown(_) | Message::Invalid(_))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_roundtrip() {
        let addr = address_from_hex("BEEF01").unwrap();
        assert_eq!(addr, 0xBEEF01);
        assert_eq!(address_to_string(addr), "BEEF01");
        assert_eq!(address_to_string(0x0000AB), "0000AB");
    }

    #[test]
    fn test_address_from_hex_rejects() {
        assert!(address_from_hex("BEEF").is_none());
        assert!(address_from_hex("ZZZZZZ").is_none());
    }

    #[test]
    fn test_msg_info() {
        assert_eq!(msg_info(0x0A).unwrap().name, "Ownship report");
        assert_eq!(msg_info(0x07).unwrap().lengths, &[436]);
        assert!(msg_info(0x42).is_none());
    }

    #[test]
    fn test_geo_altitude_metrics() {
        let m = GeoAltitudeMsg::new(525, Some(50), false);
        assert_eq!(m.vertical_metrics, 0x0032);
        assert_eq!(m.figure_of_merit(), Some(50));
        assert!(!m.vertical_warning());

        let m = GeoAltitudeMsg::new(0, None, true);
        assert_eq!(m.vertical_metrics, 0xFFFF);
        assert_eq!(m.figure_of_merit(), None);
        assert!(m.vertical_warning());

        assert_eq!(GeoAltitudeMsg::new(0, Some(40000), false).vertical_metrics, 0x7FFE);
    }

    #[test]
    fn test_gps_quality_ascii() {
        assert_eq!(GpsQuality::from_ascii(b'2'), GpsQuality::Waas);
        assert_eq!(GpsQuality::from_ascii(b'1'), GpsQuality::Gps);
        assert_eq!(GpsQuality::from_ascii(b'0'), GpsQuality::NoFix);
        assert_eq!(GpsQuality::from_ascii(0xFF), GpsQuality::NoFix);
        assert_eq!(GpsQuality::Waas.to_ascii(), b'2');
    }

    #[test]
    fn test_gps_time_waas() {
        let mut m = GpsTimeMsg::default();
        assert_eq!(m.waas(), Some(true));
        m.quality = GpsQuality::Gps;
        assert_eq!(m.waas(), Some(false));
        m.quality = GpsQuality::NoFix;
        assert_eq!(m.waas(), None);
    }

    #[test]
    fn test_heartbeat_status_bits() {
        let hb = HeartbeatMsg::default();
        assert!(hb.gps_position_valid());
        assert!(hb.uat_initialized());
        assert!(hb.utc_ok());
    }

    #[test]
    fn test_position_report_has_position() {
        let r = PositionReport {
            nic: 0,
            ..PositionReport::default()
        };
        assert!(!r.ownship_has_position());
        assert!(!r.traffic_has_position());
        let r = PositionReport {
            latitude: 33.39,
            ..r
        };
        assert!(r.ownship_has_position());
        assert!(r.traffic_has_position());
    }

    #[test]
    fn test_has_position_nic_1_depends_on_kind() {
        let r = PositionReport {
            nic: 1,
            ..PositionReport::default()
        };
        assert_eq!(Message::OwnshipReport(r.clone()).has_position(), Some(false));
        assert_eq!(Message::TrafficReport(r).has_position(), Some(true));
        assert_eq!(Message::Heartbeat(HeartbeatMsg::default()).has_position(), None);
    }

    #[test]
    fn test_message_msg_id() {
        let m = Message::Heartbeat(HeartbeatMsg::default());
        assert_eq!(m.msg_id(), Some(0x00));
        let m = Message::GpsTime(GpsTimeMsg::default());
        assert_eq!(m.msg_id(), Some(0x65));
        let m = Message::Invalid(InvalidMsg {
            msg_id: None,
            error: Gdl90Error::FrameTooShort(2),
        });
        assert_eq!(m.msg_id(), None);
        assert!(m.is_undecodable());
    }

    #[test]
    fn test_message_serializes_tagged() {
        let m = Message::StratuxHeartbeat(StratuxHeartbeatMsg::default());
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["type"], "StratuxHeartbeat");
        assert_eq!(json["version"], 1);
    }

    #[test]
    fn test_error_serializes_as_string() {
        let m = Message::Invalid(InvalidMsg {
            msg_id: Some(0x0A),
            error: Gdl90Error::FrameTooShort(3),
        });
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["error"], "frame too short: 3 bytes after unescaping");
    }
}
