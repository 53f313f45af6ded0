//! Engine configuration
//!
//! Buffer and queue capacities are const generics on [`Engine`]; everything
//! else lives here and can be persisted with postcard or loaded from TOML.
//!
//! Example TOML:
//! ```toml
//! overflow_notice = "!rx buffer full!"
//! bad_checksum_notice = "!rx badchecksum!"
//! diagnostic_prefix = 33
//!
//! [format]
//! checksum = true
//! terminator = [13, 10]
//!
//! [serial]
//! baudrate = 115200
//! ```
//!
//! [`Engine`]: crate::Engine

use heapless::String;
use tickwire_hal::SerialConfig;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default terminator pair (CR LF)
pub const DEFAULT_TERMINATOR: [u8; 2] = *b"\r\n";

/// Maximum diagnostic notice length
pub const MAX_NOTICE_LEN: usize = 32;

/// Sent back when a frame overflows the receive buffer
pub const DEFAULT_OVERFLOW_NOTICE: &str = "!rx buffer full!";

/// Sent back when a frame fails checksum verification
pub const DEFAULT_BAD_CHECKSUM_NOTICE: &str = "!rx badchecksum!";

/// Marks echoed payloads and checksum reports as diagnostics
pub const DEFAULT_DIAGNOSTIC_PREFIX: u8 = b'!';

/// On-wire framing parameters shared by both directions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FrameFormat {
    /// Append / verify a checksum byte before the terminators
    pub checksum: bool,
    /// Terminator pair (A, B), must arrive consecutively
    pub terminator: [u8; 2],
}

impl Default for FrameFormat {
    fn default() -> Self {
        Self {
            checksum: false,
            terminator: DEFAULT_TERMINATOR,
        }
    }
}

impl FrameFormat {
    /// Bytes added to every payload on the wire
    pub const fn overhead(&self) -> usize {
        if self.checksum {
            3
        } else {
            2
        }
    }

    /// On-wire length of a payload of `payload_len` bytes
    pub const fn encoded_len(&self, payload_len: usize) -> usize {
        payload_len + self.overhead()
    }

    /// Largest payload that fits a slot of `capacity` bytes
    pub const fn max_payload(&self, capacity: usize) -> usize {
        capacity.saturating_sub(self.overhead())
    }

    /// Whether `bytes` contains the terminator pair
    pub fn contains_terminator(&self, bytes: &[u8]) -> bool {
        bytes.windows(2).any(|w| w == self.terminator)
    }
}

/// Runtime configuration for an [`Engine`](crate::Engine)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Framing parameters
    pub format: FrameFormat,
    /// Line settings handed to the transport
    pub serial: SerialConfig,
    /// Diagnostic sent on receive buffer overflow
    pub overflow_notice: String<MAX_NOTICE_LEN>,
    /// Diagnostic sent on checksum mismatch
    pub bad_checksum_notice: String<MAX_NOTICE_LEN>,
    /// First byte of echoed payloads and checksum reports
    pub diagnostic_prefix: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            format: FrameFormat::default(),
            serial: SerialConfig::default(),
            overflow_notice: notice(DEFAULT_OVERFLOW_NOTICE),
            bad_checksum_notice: notice(DEFAULT_BAD_CHECKSUM_NOTICE),
            diagnostic_prefix: DEFAULT_DIAGNOSTIC_PREFIX,
        }
    }
}

/// Copy a default notice; the defaults always fit
fn notice(text: &str) -> String<MAX_NOTICE_LEN> {
    let mut s = String::new();
    let _ = s.push_str(text);
    s
}

fn try_notice(text: &str) -> Result<String<MAX_NOTICE_LEN>, ConfigError> {
    let mut s = String::new();
    s.push_str(text).map_err(|_| ConfigError::NoticeTooLong)?;
    Ok(s)
}

impl EngineConfig {
    /// Default configuration (CR LF, no checksum, 115200 8N1)
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the checksum byte
    pub fn with_checksum(mut self, checksum: bool) -> Self {
        self.format.checksum = checksum;
        self
    }

    /// Use a different terminator pair
    pub fn with_terminator(mut self, terminator: [u8; 2]) -> Self {
        self.format.terminator = terminator;
        self
    }

    /// Use different line settings
    pub fn with_serial(mut self, serial: SerialConfig) -> Self {
        self.serial = serial;
        self
    }

    /// Replace the overflow diagnostic
    pub fn with_overflow_notice(mut self, text: &str) -> Result<Self, ConfigError> {
        self.overflow_notice = try_notice(text)?;
        Ok(self)
    }

    /// Replace the bad-checksum diagnostic
    pub fn with_bad_checksum_notice(mut self, text: &str) -> Result<Self, ConfigError> {
        self.bad_checksum_notice = try_notice(text)?;
        Ok(self)
    }

    /// Check the config is usable on the wire
    pub fn validate(&self) -> Result<(), ConfigError> {
        let notices = [
            self.overflow_notice.as_bytes(),
            self.bad_checksum_notice.as_bytes(),
        ];
        if notices
            .iter()
            .any(|text| self.format.contains_terminator(text))
        {
            return Err(ConfigError::NoticeContainsTerminator);
        }
        Ok(())
    }

    /// Serialize into `buf` with postcard, returning the used prefix
    #[cfg(feature = "serde")]
    pub fn to_postcard<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], ConfigError> {
        postcard::to_slice(self, buf).map_err(|_| ConfigError::Serialize)
    }

    /// Decode and validate a postcard-serialized config
    #[cfg(feature = "serde")]
    pub fn from_postcard(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Deserialize)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML config; omitted keys keep their defaults
    #[cfg(feature = "toml")]
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input).map_err(|_| ConfigError::TomlParse)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(!config.format.checksum);
        assert_eq!(config.format.terminator, *b"\r\n");
        assert_eq!(config.overflow_notice.as_str(), "!rx buffer full!");
        assert_eq!(config.bad_checksum_notice.as_str(), "!rx badchecksum!");
        assert_eq!(config.diagnostic_prefix, b'!');
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_overhead() {
        let plain = FrameFormat::default();
        assert_eq!(plain.overhead(), 2);
        assert_eq!(plain.encoded_len(4), 6);
        assert_eq!(plain.max_payload(64), 62);

        let summed = FrameFormat {
            checksum: true,
            ..FrameFormat::default()
        };
        assert_eq!(summed.overhead(), 3);
        assert_eq!(summed.max_payload(64), 61);
        assert_eq!(summed.max_payload(2), 0);
    }

    #[test]
    fn test_contains_terminator() {
        let format = FrameFormat::default();
        assert!(format.contains_terminator(b"ab\r\ncd"));
        assert!(!format.contains_terminator(b"ab\n\rcd"));
        assert!(!format.contains_terminator(b"\r"));
    }

    #[test]
    fn test_notice_too_long() {
        let long = "0123456789012345678901234567890123456789";
        assert_eq!(
            EngineConfig::new().with_overflow_notice(long),
            Err(ConfigError::NoticeTooLong)
        );
    }

    #[test]
    fn test_notice_with_terminator_rejected() {
        let config = EngineConfig::new()
            .with_bad_checksum_notice("bad\r\nsum")
            .unwrap();
        assert_eq!(config.validate(), Err(ConfigError::NoticeContainsTerminator));

        // Same text is fine once the terminator changes
        let config = config.with_terminator([0x03, 0x04]);
        assert_eq!(config.validate(), Ok(()));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_postcard_roundtrip() {
        let config = EngineConfig::new()
            .with_checksum(true)
            .with_terminator([0x17, 0x04])
            .with_serial(SerialConfig::with_baudrate(9600))
            .with_overflow_notice("overflow")
            .unwrap();

        let mut buf = [0u8; 128];
        let used = config.to_postcard(&mut buf).unwrap().len();
        let decoded = EngineConfig::from_postcard(&buf[..used]).unwrap();
        assert_eq!(decoded, config);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_postcard_buffer_too_small() {
        let mut buf = [0u8; 4];
        assert_eq!(
            EngineConfig::default().to_postcard(&mut buf),
            Err(ConfigError::Serialize)
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_postcard_garbage() {
        assert_eq!(
            EngineConfig::from_postcard(&[0xFF, 0xFF]),
            Err(ConfigError::Deserialize)
        );
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_from_toml() {
        let config = EngineConfig::from_toml(
            r#"
            bad_checksum_notice = "?sum"

            [format]
            checksum = true
            terminator = [3, 4]

            [serial]
            baudrate = 9600
            "#,
        )
        .unwrap();

        assert!(config.format.checksum);
        assert_eq!(config.format.terminator, [3, 4]);
        assert_eq!(config.serial.baudrate, 9600);
        assert_eq!(config.bad_checksum_notice.as_str(), "?sum");
        // Omitted keys fall back to defaults
        assert_eq!(config.overflow_notice.as_str(), DEFAULT_OVERFLOW_NOTICE);
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_from_toml_invalid() {
        assert_eq!(
            EngineConfig::from_toml("format = ["),
            Err(ConfigError::TomlParse)
        );
    }
}
