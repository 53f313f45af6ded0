//! In-memory transport
//!
//! Two fixed-size FIFOs standing in for a UART: bytes pushed with
//! [`MemoryTransport::feed`] are what the engine reads, bytes the engine
//! writes collect in the transmit FIFO. Used for host-side simulation and
//! for wiring two engines back to back.

use heapless::{Deque, Vec};

use crate::serial::SerialConfig;
use crate::transport::Transport;

/// In-memory transport errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MemoryError {
    /// Read attempted with nothing received
    Empty,
    /// FIFO has no room left
    Full,
}

/// FIFO-backed transport holding up to `N` bytes in each direction
#[derive(Debug, Clone)]
pub struct MemoryTransport<const N: usize> {
    rx: Deque<u8, N>,
    tx: Deque<u8, N>,
    writable: bool,
    serial: Option<SerialConfig>,
}

impl<const N: usize> Default for MemoryTransport<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MemoryTransport<N> {
    /// Create an empty transport that accepts writes
    pub fn new() -> Self {
        Self {
            rx: Deque::new(),
            tx: Deque::new(),
            writable: true,
            serial: None,
        }
    }

    /// Queue bytes for the engine to receive
    pub fn feed(&mut self, bytes: &[u8]) -> Result<(), MemoryError> {
        for &byte in bytes {
            self.rx.push_back(byte).map_err(|_| MemoryError::Full)?;
        }
        Ok(())
    }

    /// Gate write capacity, simulating a busy line when `false`
    pub fn set_writable(&mut self, writable: bool) {
        self.writable = writable;
    }

    /// Bytes still waiting to be read by the engine
    pub fn rx_len(&self) -> usize {
        self.rx.len()
    }

    /// Bytes written by the engine and not yet taken
    pub fn tx_len(&self) -> usize {
        self.tx.len()
    }

    /// Take the oldest written byte
    pub fn pop_tx(&mut self) -> Option<u8> {
        self.tx.pop_front()
    }

    /// Take everything written so far, oldest first
    pub fn take_tx(&mut self) -> Vec<u8, N> {
        let mut out = Vec::new();
        while let Some(byte) = self.tx.pop_front() {
            // Cannot fail: both hold at most N bytes
            let _ = out.push(byte);
        }
        out
    }

    /// Move written bytes into another transport's receive FIFO
    ///
    /// Stops when the peer is full; remaining bytes stay queued here.
    /// Returns how many bytes moved.
    pub fn transfer_to<const M: usize>(&mut self, peer: &mut MemoryTransport<M>) -> usize {
        let mut moved = 0;
        while !peer.rx.is_full() {
            match self.tx.pop_front() {
                Some(byte) => {
                    let _ = peer.rx.push_back(byte);
                    moved += 1;
                }
                None => break,
            }
        }
        moved
    }

    /// Line settings applied through [`Transport::configure`], if any
    pub fn serial_config(&self) -> Option<&SerialConfig> {
        self.serial.as_ref()
    }
}

impl<const N: usize> Transport for MemoryTransport<N> {
    type Error = MemoryError;

    fn configure(&mut self, config: &SerialConfig) -> Result<(), Self::Error> {
        self.serial = Some(*config);
        Ok(())
    }

    fn bytes_available(&mut self) -> Result<usize, Self::Error> {
        Ok(self.rx.len())
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        self.rx.pop_front().ok_or(MemoryError::Empty)
    }

    fn write_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.writable && !self.tx.is_full())
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.tx.push_back(byte).map_err(|_| MemoryError::Full)
    }
}
