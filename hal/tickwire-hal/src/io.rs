//! `embedded-io` adapter
//!
//! Wraps any device implementing the blocking `embedded-io` traits plus the
//! readiness traits, e.g. a buffered UART from an embassy HAL. Readiness is
//! always checked by the engine first, so the single-byte reads and writes
//! never wait.

use embedded_io::{Read, ReadReady, Write, WriteReady};

use crate::transport::Transport;

/// Errors from the `embedded-io` adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoTransportError<E> {
    /// Underlying device error
    Io(E),
    /// Device reported ready but returned no data
    EndOfStream,
    /// Device reported ready but accepted no data
    WriteZero,
}

impl<E> From<E> for IoTransportError<E> {
    fn from(e: E) -> Self {
        IoTransportError::Io(e)
    }
}

/// Transport over an `embedded-io` device
#[derive(Debug)]
pub struct IoTransport<T> {
    inner: T,
}

impl<T> IoTransport<T> {
    /// Wrap a device
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Borrow the wrapped device
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the wrapped device
    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Unwrap the device
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> Transport for IoTransport<T>
where
    T: Read + ReadReady + Write + WriteReady,
{
    type Error = IoTransportError<T::Error>;

    /// `embedded-io` only exposes "ready or not", so this is 0 or 1
    fn bytes_available(&mut self) -> Result<usize, Self::Error> {
        Ok(usize::from(self.inner.read_ready()?))
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        let mut buf = [0u8; 1];
        match self.inner.read(&mut buf)? {
            0 => Err(IoTransportError::EndOfStream),
            _ => Ok(buf[0]),
        }
    }

    fn write_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.inner.write_ready()?)
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        match self.inner.write(&[byte])? {
            0 => Err(IoTransportError::WriteZero),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_io::ErrorType;
    use heapless::{Deque, Vec};

    /// Fake UART with a receive FIFO and a transmit log
    struct FakeUart {
        rx: Deque<u8, 8>,
        tx: Vec<u8, 8>,
        tx_ready: bool,
    }

    impl FakeUart {
        fn new(rx: &[u8]) -> Self {
            let mut fifo = Deque::new();
            for &b in rx {
                fifo.push_back(b).unwrap();
            }
            Self {
                rx: fifo,
                tx: Vec::new(),
                tx_ready: true,
            }
        }
    }

    impl ErrorType for FakeUart {
        type Error = Infallible;
    }

    impl Read for FakeUart {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let mut n = 0;
            while n < buf.len() {
                match self.rx.pop_front() {
                    Some(b) => {
                        buf[n] = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            Ok(n)
        }
    }

    impl ReadReady for FakeUart {
        fn read_ready(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.rx.is_empty())
        }
    }

    impl Write for FakeUart {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            let mut n = 0;
            for &b in buf {
                if self.tx.push(b).is_err() {
                    break;
                }
                n += 1;
            }
            Ok(n)
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    impl WriteReady for FakeUart {
        fn write_ready(&mut self) -> Result<bool, Self::Error> {
            Ok(self.tx_ready && !self.tx.is_full())
        }
    }

    #[test]
    fn test_reads_one_byte_at_a_time() {
        let mut transport = IoTransport::new(FakeUart::new(b"ab"));

        assert_eq!(transport.bytes_available(), Ok(1));
        assert_eq!(transport.read_byte(), Ok(b'a'));
        assert_eq!(transport.read_byte(), Ok(b'b'));
        assert_eq!(transport.bytes_available(), Ok(0));
        assert_eq!(transport.read_byte(), Err(IoTransportError::EndOfStream));
    }

    #[test]
    fn test_write_ready_follows_device() {
        let mut transport = IoTransport::new(FakeUart::new(&[]));
        assert_eq!(transport.write_ready(), Ok(true));

        transport.write_byte(0x42).unwrap();
        assert_eq!(transport.inner().tx.as_slice(), &[0x42]);

        transport.inner_mut().tx_ready = false;
        assert_eq!(transport.write_ready(), Ok(false));
    }

    #[test]
    fn test_write_to_full_device_reports_write_zero() {
        let mut transport = IoTransport::new(FakeUart::new(&[]));
        for b in 0..8 {
            transport.write_byte(b).unwrap();
        }
        assert_eq!(transport.write_byte(8), Err(IoTransportError::WriteZero));
        assert_eq!(transport.into_inner().tx.len(), 8);
    }
}
