//! Tickwire Hardware Abstraction Layer
//!
//! This crate defines the byte transport the framing engine drives. A
//! transport only has to answer two readiness questions and move single
//! bytes, so anything from a buffered UART to an in-memory queue can sit
//! underneath the engine.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  tickwire-protocol (engine)             │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  tickwire-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  IoTransport  │       │MemoryTransport│
//! │ (embedded-io) │       │  (host/test)  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`transport::Transport`] - Non-blocking byte source/sink

#![no_std]
#![deny(unsafe_code)]

pub mod io;
pub mod memory;
pub mod serial;
pub mod transport;

pub use io::IoTransport;
pub use memory::{MemoryError, MemoryTransport};
pub use serial::{DataBits, Parity, SerialConfig, StopBits};
pub use transport::Transport;
