//! Receive framer
//!
//! Accumulates inbound bytes one at a time until the terminator pair shows
//! up, then hands back the frame contents. There is no start byte and no
//! length field: a frame is everything received since the previous frame
//! ended, overflow, or reset.

use crate::checksum::checksum;
use crate::config::FrameFormat;

/// Outcome of feeding a byte that ended a frame or filled the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxEvent<'a> {
    /// Frame complete and (if enabled) checksum verified
    Message(&'a [u8]),
    /// Frame complete but the checksum byte does not match the payload
    ChecksumMismatch {
        /// Payload as received
        payload: &'a [u8],
        /// Checksum byte on the wire
        received: u8,
        /// Checksum computed over `payload`
        computed: u8,
    },
    /// Buffer filled without a terminator pair; contents discarded
    Overflow,
}

/// Byte-at-a-time frame accumulator with `BUF` bytes of storage
#[derive(Debug, Clone)]
pub struct RxFramer<const BUF: usize> {
    buf: [u8; BUF],
    len: usize,
    format: FrameFormat,
}

impl<const BUF: usize> RxFramer<BUF> {
    const CAPACITY_OK: () = assert!(BUF >= 3, "receive buffer must hold checksum and terminators");

    /// Create an empty framer
    pub fn new(format: FrameFormat) -> Self {
        let () = Self::CAPACITY_OK;
        Self {
            buf: [0; BUF],
            len: 0,
            format,
        }
    }

    /// Framing parameters in use
    pub fn format(&self) -> &FrameFormat {
        &self.format
    }

    /// Bytes of the current partial frame
    pub fn buffered(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Number of bytes of the current partial frame
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no partial frame is pending
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop any partial frame
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// Feed a single received byte
    ///
    /// Returns `None` while a frame is still in progress. Any returned
    /// event leaves the accumulator empty; slices in the event borrow the
    /// old contents until the next call.
    pub fn feed(&mut self, byte: u8) -> Option<RxEvent<'_>> {
        self.buf[self.len] = byte;
        self.len += 1;
        let end = self.len;

        let [term_a, term_b] = self.format.terminator;
        if end >= 2 && byte == term_b && self.buf[end - 2] == term_a {
            self.len = 0;
            return Some(self.complete(end - 2));
        }

        if end >= BUF {
            self.len = 0;
            return Some(RxEvent::Overflow);
        }

        None
    }

    /// Classify a frame whose body (everything before terminator A) is
    /// `buf[..body_len]`
    fn complete(&self, body_len: usize) -> RxEvent<'_> {
        let body = &self.buf[..body_len];

        // A bare terminator pair carries no checksum byte to verify
        if !self.format.checksum || body.is_empty() {
            return RxEvent::Message(body);
        }

        let (payload, received) = body.split_at(body_len - 1);
        let received = received[0];
        let computed = checksum(payload);
        if received == computed {
            RxEvent::Message(payload)
        } else {
            RxEvent::ChecksumMismatch {
                payload,
                received,
                computed,
            }
        }
    }
}
