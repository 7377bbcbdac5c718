//! gdl90-core: GDL-90 encode/decode library.
//!
//! No async, no I/O. Covers the CRC and byte-stuffed framing, one encoder
//! per message type, payload decoding into typed messages, a resynchronizing
//! stream decoder, and UAT uplink text products.

pub mod config;
pub mod crc;
pub mod decode;
pub mod decoder;
pub mod encode;
pub mod fields;
pub mod frame;
pub mod types;
pub mod uat;

// Re-export commonly used types at crate root
pub use config::DecoderConfig;
pub use decode::decode;
pub use decoder::{ClockState, Decoder, DecoderStats, MsgCounts, SyncState};
pub use encode::*;
pub use frame::{escape, open_frame, prepare_frame, unescape};
pub use types::*;
pub use uat::{decode_uplink, UatProduct};
