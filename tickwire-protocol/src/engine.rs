//! Service-tick engine
//!
//! [`Engine`] owns the receive framer, the single-slot mailbox and the
//! transmit queue. The application calls [`Engine::service`] from its main
//! loop; each call reads at most one byte, then writes at most one byte,
//! and returns.
//!
//! # Mailbox
//!
//! Only the most recently validated message is kept. A consumer must call
//! [`Engine::take_message`] (or read [`Engine::message`]) before the next
//! frame completes, otherwise the earlier message is lost. The handler sees
//! every message, but only for the duration of its call.
//!
//! # Example
//!
//! ```
//! use tickwire_hal::MemoryTransport;
//! use tickwire_protocol::{Engine, EngineConfig};
//!
//! let mut transport = MemoryTransport::<64>::new();
//! let mut engine: Engine = Engine::new(EngineConfig::default()).unwrap();
//!
//! engine.send(b"PING").unwrap();
//! transport.feed(b"PONG\r\n").unwrap();
//!
//! let mut ready = false;
//! for _ in 0..6 {
//!     ready |= engine.service(&mut transport);
//! }
//!
//! assert!(ready);
//! assert_eq!(engine.take_message().unwrap().as_slice(), b"PONG");
//! assert_eq!(transport.take_tx().as_slice(), b"PING\r\n");
//! ```

use core::fmt::Write as _;

use heapless::{String, Vec};
use tickwire_hal::Transport;

use crate::config::EngineConfig;
use crate::error::{ConfigError, EnqueueError};
use crate::framer::{RxEvent, RxFramer};
use crate::queue::{TxQueue, TxStatus};
use crate::stats::{bump, EngineStats};

/// Default bytes per message slot
pub const DEFAULT_BUFFER_SIZE: usize = 64;

/// Default number of queued outbound messages
pub const DEFAULT_QUEUE_SIZE: usize = 4;

/// Receives each validated message
///
/// Called synchronously from [`Engine::service`]. The slice is the mailbox
/// contents and is only valid for the call; copy it to keep it.
pub trait MessageHandler {
    /// Handle one received message
    fn on_message(&mut self, message: &[u8]);
}

impl<F> MessageHandler for F
where
    F: FnMut(&[u8]),
{
    fn on_message(&mut self, message: &[u8]) {
        self(message)
    }
}

/// Handler that ignores messages; poll the mailbox instead
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHandler;

impl MessageHandler for NoHandler {
    fn on_message(&mut self, _message: &[u8]) {}
}

/// Non-blocking framing engine
///
/// - `H`: message handler
/// - `BUF`: bytes per message slot, shared by receive and transmit
/// - `QUEUE`: maximum pending outbound messages
#[derive(Debug)]
pub struct Engine<
    H = NoHandler,
    const BUF: usize = DEFAULT_BUFFER_SIZE,
    const QUEUE: usize = DEFAULT_QUEUE_SIZE,
> {
    config: EngineConfig,
    framer: RxFramer<BUF>,
    queue: TxQueue<BUF, QUEUE>,
    mailbox: Vec<u8, BUF>,
    /// A message arrived since the last `take_message`
    fresh: bool,
    handler: H,
    stats: EngineStats,
}

impl<const BUF: usize, const QUEUE: usize> Engine<NoHandler, BUF, QUEUE> {
    /// Create an engine with no handler
    ///
    /// Rejects a config whose diagnostics would carry the terminator pair.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate().inspect_err(|e| {
            warn!("tickwire: rejected config: {}", e);
        })?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: EngineConfig) -> Self {
        Self {
            framer: RxFramer::new(config.format),
            queue: TxQueue::new(config.format),
            mailbox: Vec::new(),
            fresh: false,
            handler: NoHandler,
            stats: EngineStats::default(),
            config,
        }
    }
}

impl<const BUF: usize, const QUEUE: usize> Default for Engine<NoHandler, BUF, QUEUE> {
    fn default() -> Self {
        // Built-in notices never contain the default terminator
        Self::with_config(EngineConfig::default())
    }
}

impl<H: MessageHandler, const BUF: usize, const QUEUE: usize> Engine<H, BUF, QUEUE> {
    /// Attach a handler, keeping all other state
    pub fn with_handler<G: MessageHandler>(self, handler: G) -> Engine<G, BUF, QUEUE> {
        Engine {
            config: self.config,
            framer: self.framer,
            queue: self.queue,
            mailbox: self.mailbox,
            fresh: self.fresh,
            handler,
            stats: self.stats,
        }
    }

    /// Swap in a handler of the same type, returning the old one
    pub fn set_handler(&mut self, handler: H) -> H {
        core::mem::replace(&mut self.handler, handler)
    }

    /// The current handler
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// The current handler, mutably
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Apply the configured line settings to the transport
    ///
    /// Call once before the first [`service`](Self::service).
    pub fn begin<T: Transport>(&mut self, transport: &mut T) -> Result<(), T::Error> {
        debug!(
            "tickwire: starting at {} baud, checksum={}",
            self.config.serial.baudrate,
            self.config.format.checksum
        );
        transport.configure(&self.config.serial)
    }

    /// Run one tick: receive at most one byte, then send at most one byte
    ///
    /// Returns `true` when this tick completed a validated message.
    pub fn service<T: Transport>(&mut self, transport: &mut T) -> bool {
        let received = self.receive(transport);
        self.transmit(transport);
        received
    }

    fn receive<T: Transport>(&mut self, transport: &mut T) -> bool {
        match transport.bytes_available() {
            Ok(0) => return false,
            Ok(_) => {}
            Err(_) => {
                bump(&mut self.stats.transport_errors);
                warn!("rx: availability query failed");
                return false;
            }
        }

        let byte = match transport.read_byte() {
            Ok(byte) => byte,
            Err(_) => {
                bump(&mut self.stats.transport_errors);
                warn!("rx: read failed");
                return false;
            }
        };

        let Some(event) = self.framer.feed(byte) else {
            return false;
        };

        match event {
            RxEvent::Message(payload) => {
                self.mailbox.clear();
                // Framer and mailbox share the same capacity
                let _ = self.mailbox.extend_from_slice(payload);
                self.fresh = true;
                bump(&mut self.stats.frames_received);
                trace!("rx: {} byte message", payload.len());

                self.handler.on_message(&self.mailbox);
                true
            }
            RxEvent::ChecksumMismatch {
                payload,
                received,
                computed,
            } => {
                bump(&mut self.stats.checksum_errors);
                warn!(
                    "rx: checksum mismatch, got {} expected {}",
                    received,
                    computed
                );

                let prefix = self.config.diagnostic_prefix;
                let echo = echo::<BUF>(prefix, payload, self.queue.max_payload());
                let sum = checksum_report(prefix, received);
                for diagnostic in [
                    self.config.bad_checksum_notice.as_bytes(),
                    echo.as_slice(),
                    sum.as_slice(),
                ] {
                    report(&mut self.queue, &mut self.stats, diagnostic);
                }
                false
            }
            RxEvent::Overflow => {
                bump(&mut self.stats.overflows);
                warn!("rx: buffer overflow, {} bytes discarded", BUF);

                report(
                    &mut self.queue,
                    &mut self.stats,
                    self.config.overflow_notice.as_bytes(),
                );
                false
            }
        }
    }

    fn transmit<T: Transport>(&mut self, transport: &mut T) {
        match self.queue.poll(transport) {
            Ok(TxStatus::Completed) => {
                bump(&mut self.stats.messages_sent);
                trace!("tx: message sent, {} pending", self.queue.len());
            }
            Ok(_) => {}
            Err(_) => {
                bump(&mut self.stats.transport_errors);
                warn!("tx: write failed, will retry");
            }
        }
    }

    /// Queue a message for transmission
    pub fn send(&mut self, message: &[u8]) -> Result<(), EnqueueError> {
        self.queue.enqueue(message).inspect_err(|e| {
            debug!("tx: rejected {} byte message: {}", message.len(), e);
        })
    }

    /// Queue a text message for transmission
    pub fn send_str(&mut self, message: &str) -> Result<(), EnqueueError> {
        self.send(message.as_bytes())
    }

    /// Contents of the mailbox (most recent validated message)
    ///
    /// Empty until the first message arrives. Does not clear the
    /// fresh-message flag.
    pub fn message(&self) -> &[u8] {
        &self.mailbox
    }

    /// Whether a message arrived since the last [`take_message`](Self::take_message)
    pub fn has_message(&self) -> bool {
        self.fresh
    }

    /// Copy out the mailbox if a message arrived since the last call
    pub fn take_message(&mut self) -> Option<Vec<u8, BUF>> {
        if !self.fresh {
            return None;
        }
        self.fresh = false;
        Some(self.mailbox.clone())
    }

    /// Number of messages waiting to be sent (including one in flight)
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Pending outbound messages, oldest first
    pub fn outbound(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.queue.iter()
    }

    /// Bytes of a partially received frame
    pub fn rx_pending(&self) -> usize {
        self.framer.len()
    }

    /// Nothing to send and no partial frame buffered
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.framer.is_empty()
    }

    /// Largest message [`send`](Self::send) accepts
    pub fn max_message_len(&self) -> usize {
        self.queue.max_payload()
    }

    /// Drop partial input, queued output and the mailbox
    pub fn reset(&mut self) {
        self.framer.reset();
        self.queue.clear();
        self.mailbox.clear();
        self.fresh = false;
    }

    /// Configuration in use
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Counters since creation or the last [`reset_stats`](Self::reset_stats)
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Zero all counters
    pub fn reset_stats(&mut self) {
        self.stats = EngineStats::default();
    }
}

/// Queue a diagnostic; if it does not fit it is dropped and counted
fn report<const BUF: usize, const QUEUE: usize>(
    queue: &mut TxQueue<BUF, QUEUE>,
    stats: &mut EngineStats,
    message: &[u8],
) {
    if let Err(e) = queue.enqueue(message) {
        bump(&mut stats.diagnostics_dropped);
        debug!("diagnostic dropped: {}", e);
    }
}

/// Prefixed copy of a rejected payload, cut to `room` bytes
fn echo<const BUF: usize>(prefix: u8, payload: &[u8], room: usize) -> Vec<u8, BUF> {
    let mut out = Vec::new();
    let _ = out.push(prefix);
    let keep = payload.len().min(room.saturating_sub(1));
    let _ = out.extend_from_slice(&payload[..keep]);
    out
}

/// Received checksum as text, e.g. `!got [155]`
fn checksum_report(prefix: u8, received: u8) -> Vec<u8, 16> {
    let mut text: String<15> = String::new();
    let _ = write!(text, "got [{}]", received);

    let mut out = Vec::new();
    let _ = out.push(prefix);
    let _ = out.extend_from_slice(text.as_bytes());
    out
}
