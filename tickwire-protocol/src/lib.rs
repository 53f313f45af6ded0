//! Tickwire message framing engine
//!
//! Exchanges discrete, length-bounded messages over a byte stream without
//! ever blocking the caller. Each call to [`Engine::service`] moves at most
//! one byte in and one byte out, then returns.
//!
//! # Wire Format
//!
//! ```text
//! ┌──────────────┬────────────┬────────┬────────┐
//! │ PAYLOAD      │ CHECKSUM   │ TERM_A │ TERM_B │
//! │ 0–(BUF-3)B   │ 1B, opt.   │ 1B     │ 1B     │
//! └──────────────┴────────────┴────────┴────────┘
//! ```
//!
//! The checksum is the wrapping 8-bit sum of the payload. Both ends must
//! agree on whether it is present. The default terminator pair is CR LF.
//!
//! # Error Reporting
//!
//! Corrupt or oversized inbound frames are never reported to the local
//! application. The engine resets its receive buffer and queues diagnostic
//! messages back to the peer instead.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod checksum;
pub mod config;
pub mod engine;
pub mod error;
pub mod framer;
pub mod queue;
pub mod shared;
pub mod stats;

pub use checksum::checksum;
pub use config::{EngineConfig, FrameFormat, DEFAULT_TERMINATOR};
pub use engine::{Engine, MessageHandler, NoHandler, DEFAULT_BUFFER_SIZE, DEFAULT_QUEUE_SIZE};
pub use error::{ConfigError, EnqueueError};
pub use framer::{RxEvent, RxFramer};
pub use queue::{TxCursor, TxQueue, TxStatus};
pub use shared::SharedEngine;
pub use stats::EngineStats;

pub use tickwire_hal::{SerialConfig, Transport};
