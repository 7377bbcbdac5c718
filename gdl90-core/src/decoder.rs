//! Streaming GDL-90 decoder.
//!
//! Accepts arbitrary byte chunks (serial reads, UDP datagrams, file blocks),
//! finds flag-delimited frames, checks their CRC and yields typed messages.
//! Framing errors never escape: short frames are counted and skipped, CRC
//! failures come back as [`Message::Invalid`].
//!
//! Pure state machine with no I/O. Not thread-safe; wrap it in a lock if
//! several readers share one instance.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, trace};

use crate::config::DecoderConfig;
use crate::decode::decode;
use crate::frame::{self, FLAG_BYTE};
use crate::types::*;

const SECONDS_PER_DAY: u32 = 86_400;

/// Frame alignment of the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncState {
    Unsynchronized,
    Synchronized,
}

/// CRC outcome counts for one message ID.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MsgCounts {
    pub good: u64,
    pub bad: u64,
}

/// Running decoder counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecoderStats {
    /// Frames extracted between flag bytes, short ones included.
    pub total_frames: u64,
    pub resync_count: u64,
    pub short_frames: u64,
    /// Frames with a valid CRC that failed field validation.
    pub decode_errors: u64,
    /// Times the buffer was dropped for exceeding `max_buffer_len`.
    pub overflows: u64,
    pub per_type: BTreeMap<u8, MsgCounts>,
}

impl DecoderStats {
    pub fn counts(&self, msg_id: u8) -> MsgCounts {
        self.per_type.get(&msg_id).copied().unwrap_or_default()
    }

    fn entry(&mut self, msg_id: u8) -> &mut MsgCounts {
        self.per_type.entry(msg_id).or_default()
    }
}

/// Time of day and altitude carried forward from heartbeats, GPS time and
/// geometric altitude messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClockState {
    /// Seconds since 0000Z.
    pub seconds_of_day: u32,
    /// False until the first GPS time message sets the clock.
    pub gps_time_received: bool,
    /// Last geometric altitude seen.
    pub altitude_ft: Option<i32>,
    /// Heartbeats since `altitude_ft` was updated.
    pub altitude_age: u32,
}

/// Stream decoder state.
#[derive(Debug)]
pub struct Decoder {
    buffer: Vec<u8>,
    sync: SyncState,
    stats: DecoderStats,
    clock: ClockState,
    config: DecoderConfig,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Decoder {
            buffer: Vec::new(),
            sync: SyncState::Unsynchronized,
            stats: DecoderStats::default(),
            clock: ClockState::default(),
            config,
        }
    }

    /// Append raw input and return every message completed by it.
    pub fn add_bytes(&mut self, data: &[u8]) -> Vec<Message> {
        self.buffer.extend_from_slice(data);
        let mut out = Vec::new();
        self.parse_messages(&mut out);
        out
    }

    /// Realign the buffer on a flag byte.
    ///
    /// Returns true once the buffer starts at a frame boundary. With fewer
    /// than two bytes buffered there is not enough to judge and the buffer is
    /// left alone.
    pub fn resynchronize(&mut self) -> bool {
        let mut start = 0;
        let synced = self.resync_from(&mut start);
        self.buffer.drain(..start);
        synced
    }

    /// Resync on `buffer[*start..]`, advancing `start` past discarded bytes
    /// instead of shifting the buffer.
    fn resync_from(&mut self, start: &mut usize) -> bool {
        self.stats.resync_count += 1;
        self.sync = SyncState::Unsynchronized;
        let begin = *start;

        let synced = loop {
            let rest = &self.buffer[*start..];
            if rest.len() < 2 {
                break false;
            }
            if rest[0] == FLAG_BYTE && rest[1] == FLAG_BYTE {
                // End flag of one frame followed by the start flag of the next
                *start += 1;
                break true;
            }
            if rest[0] == FLAG_BYTE {
                break true;
            }
            *start += rest
                .iter()
                .position(|&b| b == FLAG_BYTE)
                .unwrap_or(rest.len());
        };

        if synced {
            self.sync = SyncState::Synchronized;
        }
        debug!(discarded = *start - begin, synced, "resynchronize");
        synced
    }

    pub fn is_synchronized(&self) -> bool {
        self.sync == SyncState::Synchronized
    }

    /// Bytes waiting for a closing flag.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn stats(&self) -> &DecoderStats {
        &self.stats
    }

    pub fn clock(&self) -> &ClockState {
        &self.clock
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Drop buffered input, counters and clock state. Config is kept.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.sync = SyncState::Unsynchronized;
        self.stats = DecoderStats::default();
        self.clock = ClockState::default();
    }

    /// Geometric altitude while it is fresh, otherwise `report_altitude_ft`.
    pub fn preferred_altitude(&self, report_altitude_ft: i32) -> i32 {
        match self.clock.altitude_ft {
            Some(alt) if self.clock.altitude_age < self.config.altitude_max_age => alt,
            _ => report_altitude_ft,
        }
    }

    // -----------------------------------------------------------------------
    // Frame extraction
    // -----------------------------------------------------------------------

    /// Extract every complete frame, then drop the consumed prefix once.
    fn parse_messages(&mut self, out: &mut Vec<Message>) {
        let mut start = 0;

        if self.is_synchronized() || self.resync_from(&mut start) {
            while self.buffer.len() - start >= 2 {
                if self.buffer[start] != FLAG_BYTE {
                    if !self.resync_from(&mut start) {
                        break;
                    }
                    continue;
                }

                let Some(offset) = self.buffer[start + 1..]
                    .iter()
                    .position(|&b| b == FLAG_BYTE)
                else {
                    break;
                };
                let end = start + 1 + offset;
                let body = self.buffer[start + 1..end].to_vec();
                start = end + 1;
                self.handle_frame(&body, out);
            }
        }

        self.buffer.drain(..start);
        self.check_overflow();
    }

    fn check_overflow(&mut self) {
        if self.buffer.len() > self.config.max_buffer_len {
            debug!(
                len = self.buffer.len(),
                max = self.config.max_buffer_len,
                "buffer overflow, dropping input"
            );
            self.buffer.clear();
            self.sync = SyncState::Unsynchronized;
            self.stats.overflows += 1;
        }
    }

    fn handle_frame(&mut self, escaped_body: &[u8], out: &mut Vec<Message>) {
        self.stats.total_frames += 1;
        trace!(len = escaped_body.len(), "frame extracted");

        let payload = match frame::open_frame(escaped_body) {
            Ok(p) => p,
            Err(Gdl90Error::FrameTooShort(len)) => {
                trace!(len, "short frame skipped");
                self.stats.short_frames += 1;
                return;
            }
            Err(err) => {
                let msg_id = match err {
                    Gdl90Error::CrcMismatch { msg_id, .. } => Some(msg_id),
                    _ => escaped_body.first().copied(),
                };
                if let Some(id) = msg_id {
                    self.stats.entry(id).bad += 1;
                }
                trace!(msg_id, error = %err, "CRC mismatch");
                out.push(Message::Invalid(InvalidMsg { msg_id, error: err }));
                return;
            }
        };

        let msg_id = payload[0];
        self.stats.entry(msg_id).good += 1;

        let msg = match decode(&payload) {
            Ok(msg) => msg,
            Err(Gdl90Error::UnknownMessageId(_)) | Err(Gdl90Error::UnsupportedLayout { .. }) => {
                trace!(msg_id, len = payload.len(), "unknown message");
                Message::Unknown(UnknownMsg {
                    msg_id,
                    data: payload,
                })
            }
            Err(err) => {
                trace!(msg_id, len = payload.len(), error = %err, "decode failed");
                self.stats.decode_errors += 1;
                Message::Invalid(InvalidMsg {
                    msg_id: Some(msg_id),
                    error: err,
                })
            }
        };

        self.track_clock(&msg);
        out.push(msg);
    }

    // -----------------------------------------------------------------------
    // Clock tracking
    // -----------------------------------------------------------------------

    fn track_clock(&mut self, msg: &Message) {
        match msg {
            Message::Heartbeat(_) => {
                self.clock.seconds_of_day = (self.clock.seconds_of_day
                    + self.config.heartbeat_interval_secs)
                    % SECONDS_PER_DAY;
                self.clock.altitude_age = self.clock.altitude_age.saturating_add(1);
            }
            Message::GpsTime(t) => {
                let secs = t.hour as u32 * 3600 + t.minute as u32 * 60;
                if !self.clock.gps_time_received {
                    self.clock.gps_time_received = true;
                    self.clock.seconds_of_day = secs;
                } else if secs > self.clock.seconds_of_day {
                    // Correct a slipped clock, never move it back
                    self.clock.seconds_of_day = secs;
                }
            }
            Message::OwnshipGeometricAltitude(a) => {
                self.clock.altitude_ft = Some(a.altitude_ft);
                self.clock.altitude_age = 0;
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
