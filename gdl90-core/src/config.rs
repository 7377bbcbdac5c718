//! Stream decoder settings.
//!
//! The core reads no files or environment variables. Callers deserialize
//! [`DecoderConfig`] from whatever source they own; missing keys take their
//! defaults.

use serde::{Deserialize, Serialize};

/// Tunables for [`crate::Decoder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Bytes buffered while waiting for a closing flag before the buffer is dropped.
    pub max_buffer_len: usize,
    /// Seconds the tracked clock advances per heartbeat.
    pub heartbeat_interval_secs: u32,
    /// Heartbeats a geometric altitude stays preferred over the report altitude.
    pub altitude_max_age: u32,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig {
            max_buffer_len: 4096,
            heartbeat_interval_secs: 1,
            altitude_max_age: 5,
        }
    }
}
