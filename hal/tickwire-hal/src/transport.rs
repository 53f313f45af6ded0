//! Non-blocking byte transport
//!
//! The engine never waits on a transport. Each tick it asks whether a byte
//! can be read or written and only then moves a single byte.

use crate::serial::SerialConfig;

/// Byte-oriented serial transport
///
/// Implementations must not block in any of these methods. `read_byte` is
/// only called after `bytes_available` reported at least one byte, and
/// `write_byte` only after `write_ready` returned `true`.
pub trait Transport {
    /// Error type for transport operations
    type Error;

    /// Apply line settings before the first tick
    ///
    /// Transports whose line settings are fixed elsewhere keep the default
    /// no-op.
    fn configure(&mut self, config: &SerialConfig) -> Result<(), Self::Error> {
        let _ = config;
        Ok(())
    }

    /// Number of received bytes waiting to be read
    fn bytes_available(&mut self) -> Result<usize, Self::Error>;

    /// Read one received byte
    fn read_byte(&mut self) -> Result<u8, Self::Error>;

    /// Whether at least one byte can be written without blocking
    fn write_ready(&mut self) -> Result<bool, Self::Error>;

    /// Write one byte
    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn configure(&mut self, config: &SerialConfig) -> Result<(), Self::Error> {
        T::configure(self, config)
    }

    fn bytes_available(&mut self) -> Result<usize, Self::Error> {
        T::bytes_available(self)
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        T::read_byte(self)
    }

    fn write_ready(&mut self) -> Result<bool, Self::Error> {
        T::write_ready(self)
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        T::write_byte(self, byte)
    }
}
