//! Transmit queue scheduler
//!
//! Outbound messages are copied into `QUEUE` pre-allocated slots of `BUF`
//! bytes each. Slots are handed out round-robin by a write cursor that is
//! independent of FIFO order; a ring of slot indices keeps departure order.
//! Because removal is strictly FIFO, the slot under the write cursor is
//! always free whenever the queue is not full.
//!
//! Each [`TxQueue::poll`] writes at most one byte of the head message:
//! payload bytes first, then the checksum (if enabled), then terminator A
//! and terminator B.

use heapless::{Deque, Vec};
use tickwire_hal::Transport;

use crate::checksum::checksum;
use crate::config::FrameFormat;
use crate::error::EnqueueError;

/// Progress through the head message's on-wire encoding
///
/// `(0, 0)` means the head has not started transmitting yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxCursor {
    /// Index of the next byte to send
    pub index: usize,
    /// Total on-wire length of the head message
    pub total: usize,
    /// Checksum of the head payload, fixed when transmission starts
    checksum: u8,
}

/// Result of one scheduler tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxStatus {
    /// Nothing queued
    Idle,
    /// Message pending but the transport has no write capacity
    Waiting,
    /// One byte written, message still in progress
    Sent,
    /// Final byte written; the head message left the queue
    Completed,
}

/// Bounded FIFO of outbound messages
#[derive(Debug, Clone)]
pub struct TxQueue<const BUF: usize, const QUEUE: usize> {
    slots: [Vec<u8, BUF>; QUEUE],
    order: Deque<usize, QUEUE>,
    next_slot: usize,
    cursor: TxCursor,
    format: FrameFormat,
}

impl<const BUF: usize, const QUEUE: usize> TxQueue<BUF, QUEUE> {
    const CAPACITY_OK: () = assert!(QUEUE >= 1, "transmit queue needs at least one slot");

    /// Create an empty queue
    pub fn new(format: FrameFormat) -> Self {
        let () = Self::CAPACITY_OK;
        Self {
            slots: core::array::from_fn(|_| Vec::new()),
            order: Deque::new(),
            next_slot: 0,
            cursor: TxCursor::default(),
            format,
        }
    }

    /// Copy a message into the next free slot
    pub fn enqueue(&mut self, message: &[u8]) -> Result<(), EnqueueError> {
        if self.order.is_full() {
            return Err(EnqueueError::QueueFull);
        }
        if self.format.encoded_len(message.len()) > BUF {
            return Err(EnqueueError::MessageTooLarge);
        }

        let slot = &mut self.slots[self.next_slot];
        slot.clear();
        slot.extend_from_slice(message)
            .map_err(|_| EnqueueError::MessageTooLarge)?;
        self.order
            .push_back(self.next_slot)
            .map_err(|_| EnqueueError::QueueFull)?;

        self.next_slot = (self.next_slot + 1) % QUEUE;
        Ok(())
    }

    /// Write at most one byte of the head message
    ///
    /// A transport error leaves the cursor where it was, so the same byte
    /// is retried on the next call.
    pub fn poll<T: Transport>(&mut self, transport: &mut T) -> Result<TxStatus, T::Error> {
        let Some(&slot) = self.order.front() else {
            return Ok(TxStatus::Idle);
        };
        let payload = self.slots[slot].as_slice();

        if self.cursor.total == 0 {
            self.cursor = TxCursor {
                index: 0,
                total: self.format.encoded_len(payload.len()),
                checksum: if self.format.checksum {
                    checksum(payload)
                } else {
                    0
                },
            };
        }

        if !transport.write_ready()? {
            return Ok(TxStatus::Waiting);
        }

        let byte = self.wire_byte(payload, self.cursor.index);
        transport.write_byte(byte)?;
        self.cursor.index += 1;

        if self.cursor.index < self.cursor.total {
            return Ok(TxStatus::Sent);
        }

        self.order.pop_front();
        self.cursor = TxCursor::default();
        Ok(TxStatus::Completed)
    }

    /// Byte at `index` of the encoding of `payload`
    fn wire_byte(&self, payload: &[u8], index: usize) -> u8 {
        if let Some(&byte) = payload.get(index) {
            return byte;
        }
        let [term_a, term_b] = self.format.terminator;
        match (self.format.checksum, index - payload.len()) {
            (true, 0) => self.cursor.checksum,
            (true, 1) | (false, 0) => term_a,
            _ => term_b,
        }
    }

    /// Drop every pending message, including a partially sent head
    pub fn clear(&mut self) {
        self.order.clear();
        self.cursor = TxCursor::default();
    }

    /// Pending messages, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.order.iter().map(move |&slot| self.slots[slot].as_slice())
    }

    /// Number of pending messages
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether another enqueue would fail with `QueueFull`
    pub fn is_full(&self) -> bool {
        self.order.is_full()
    }

    /// Maximum number of pending messages
    pub const fn capacity(&self) -> usize {
        QUEUE
    }

    /// Largest payload accepted by [`enqueue`](Self::enqueue)
    pub const fn max_payload(&self) -> usize {
        self.format.max_payload(BUF)
    }

    /// Progress through the head message
    pub fn cursor(&self) -> TxCursor {
        self.cursor
    }

    /// Framing parameters in use
    pub fn format(&self) -> &FrameFormat {
        &self.format
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickwire_hal::MemoryTransport;

    fn plain() -> FrameFormat {
        FrameFormat::default()
    }

    fn summed() -> FrameFormat {
        FrameFormat {
            checksum: true,
            ..FrameFormat::default()
        }
    }

    /// Poll until the queue drains, returning everything written
    fn drain<const BUF: usize, const QUEUE: usize>(
        queue: &mut TxQueue<BUF, QUEUE>,
        transport: &mut MemoryTransport<256>,
    ) -> Vec<u8, 256> {
        while queue.poll(transport).unwrap() != TxStatus::Idle {}
        transport.take_tx()
    }

    #[test]
    fn test_ping_on_wire() {
        let mut queue = TxQueue::<64, 4>::new(plain());
        let mut transport = MemoryTransport::<256>::new();
        queue.enqueue(b"PING").unwrap();

        assert_eq!(drain(&mut queue, &mut transport).as_slice(), b"PING\r\n");
    }

    #[test]
    fn test_ok_with_checksum_on_wire() {
        let mut queue = TxQueue::<64, 4>::new(summed());
        let mut transport = MemoryTransport::<256>::new();
        queue.enqueue(b"OK").unwrap();

        assert_eq!(
            drain(&mut queue, &mut transport).as_slice(),
            &[b'O', b'K', 154, b'\r', b'\n']
        );
    }

    #[test]
    fn test_one_byte_per_poll() {
        let mut queue = TxQueue::<64, 4>::new(summed());
        let mut transport = MemoryTransport::<256>::new();
        queue.enqueue(b"abc").unwrap();

        for expected in 1..6 {
            assert_eq!(queue.poll(&mut transport), Ok(TxStatus::Sent));
            assert_eq!(transport.tx_len(), expected);
            assert_eq!(queue.cursor().index, expected);
            assert_eq!(queue.cursor().total, 6);
        }
        assert_eq!(queue.poll(&mut transport), Ok(TxStatus::Completed));
        assert_eq!(transport.tx_len(), 6);
        assert_eq!(queue.cursor(), TxCursor::default());
        assert_eq!(queue.poll(&mut transport), Ok(TxStatus::Idle));
    }

    #[test]
    fn test_waits_without_write_capacity() {
        let mut queue = TxQueue::<64, 4>::new(plain());
        let mut transport = MemoryTransport::<256>::new();
        queue.enqueue(b"x").unwrap();
        transport.set_writable(false);

        for _ in 0..5 {
            assert_eq!(queue.poll(&mut transport), Ok(TxStatus::Waiting));
        }
        assert_eq!(transport.tx_len(), 0);
        assert_eq!(queue.cursor().index, 0);
        assert_eq!(queue.cursor().total, 3);

        transport.set_writable(true);
        assert_eq!(drain(&mut queue, &mut transport).as_slice(), b"x\r\n");
    }

    #[test]
    fn test_queue_full() {
        let mut queue = TxQueue::<64, 4>::new(plain());
        for msg in [b"a", b"b", b"c", b"d"] {
            queue.enqueue(msg).unwrap();
        }

        assert_eq!(queue.enqueue(b"e"), Err(EnqueueError::QueueFull));
        assert_eq!(queue.len(), 4);
        assert_eq!(queue.len(), queue.capacity());
        assert!(queue.is_full());
    }

    #[test]
    fn test_message_too_large() {
        let mut queue = TxQueue::<8, 4>::new(plain());
        queue.enqueue(b"first").unwrap();

        // 6 + 2 fits exactly, 7 + 2 does not
        queue.enqueue(&[b'y'; 6]).unwrap();
        assert_eq!(queue.enqueue(&[b'z'; 7]), Err(EnqueueError::MessageTooLarge));
        assert_eq!(queue.len(), 2);

        let mut summed = TxQueue::<8, 4>::new(summed());
        assert!(summed.format().checksum);
        assert_eq!(summed.max_payload(), 5);
        assert_eq!(summed.enqueue(&[b'y'; 6]), Err(EnqueueError::MessageTooLarge));
        assert!(summed.is_empty());
    }

    #[test]
    fn test_fifo_order_and_slot_reuse() {
        let mut queue = TxQueue::<16, 2>::new(plain());
        let mut transport = MemoryTransport::<256>::new();

        queue.enqueue(b"one").unwrap();
        queue.enqueue(b"two").unwrap();
        assert_eq!(drain(&mut queue, &mut transport).as_slice(), b"one\r\ntwo\r\n");

        // Cycle through the slots several times
        for round in 0u8..5 {
            queue.enqueue(&[b'a' + round]).unwrap();
            queue.enqueue(&[b'A' + round]).unwrap();
            let wire = drain(&mut queue, &mut transport);
            assert_eq!(wire.as_slice(), &[b'a' + round, b'\r', b'\n', b'A' + round, b'\r', b'\n']);
        }
    }

    #[test]
    fn test_enqueue_while_head_in_flight() {
        let mut queue = TxQueue::<16, 2>::new(plain());
        let mut transport = MemoryTransport::<256>::new();

        queue.enqueue(b"head").unwrap();
        queue.poll(&mut transport).unwrap();
        queue.poll(&mut transport).unwrap();
        queue.enqueue(b"tail").unwrap();

        assert!(queue.iter().eq([&b"head"[..], &b"tail"[..]]));
        assert_eq!(queue.enqueue(b"more"), Err(EnqueueError::QueueFull));

        assert_eq!(drain(&mut queue, &mut transport).as_slice(), b"head\r\ntail\r\n");
    }

    #[test]
    fn test_empty_message() {
        let mut queue = TxQueue::<4, 1>::new(summed());
        let mut transport = MemoryTransport::<256>::new();
        queue.enqueue(b"").unwrap();

        assert_eq!(drain(&mut queue, &mut transport).as_slice(), &[0, b'\r', b'\n']);
    }

    #[test]
    fn test_clear_drops_partial_head() {
        let mut queue = TxQueue::<16, 2>::new(plain());
        let mut transport = MemoryTransport::<256>::new();
        queue.enqueue(b"abc").unwrap();
        queue.poll(&mut transport).unwrap();

        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.cursor(), TxCursor::default());

        queue.enqueue(b"z").unwrap();
        transport.take_tx();
        assert_eq!(drain(&mut queue, &mut transport).as_slice(), b"z\r\n");
    }
}
