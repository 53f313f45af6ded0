//! Error types
//!
//! Only enqueue rejections and configuration problems surface to the local
//! caller. Receive-side faults (overflow, checksum mismatch) are answered
//! with diagnostic messages to the peer and never appear here.

use core::fmt;

/// Reasons a message could not be queued for transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EnqueueError {
    /// Transmit queue already holds its maximum number of messages
    QueueFull,
    /// Message plus checksum and terminators does not fit a slot
    MessageTooLarge,
}

impl fmt::Display for EnqueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnqueueError::QueueFull => f.write_str("transmit queue full"),
            EnqueueError::MessageTooLarge => f.write_str("message too large for slot"),
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Diagnostic text longer than the notice capacity
    NoticeTooLong,
    /// Diagnostic text contains the terminator pair and would split on the wire
    NoticeContainsTerminator,
    /// Output buffer too small for the serialized config
    Serialize,
    /// Stored config bytes could not be decoded
    Deserialize,
    /// TOML text could not be parsed
    TomlParse,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoticeTooLong => f.write_str("diagnostic notice too long"),
            ConfigError::NoticeContainsTerminator => {
                f.write_str("diagnostic notice contains the terminator pair")
            }
            ConfigError::Serialize => f.write_str("config serialization failed"),
            ConfigError::Deserialize => f.write_str("config deserialization failed"),
            ConfigError::TomlParse => f.write_str("invalid TOML config"),
        }
    }
}
