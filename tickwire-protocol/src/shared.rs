//! Engine shared between contexts
//!
//! Wraps an [`Engine`] in an embassy-sync blocking mutex so one context can
//! run the service loop while others queue messages or poll the mailbox.
//! The raw mutex type picks the locking strategy, e.g.
//! `CriticalSectionRawMutex` when an interrupt handler sends.
//!
//! Calls must not nest: a handler that calls back into the same
//! `SharedEngine` from inside [`SharedEngine::service`] panics on the
//! inner borrow.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Vec;
use tickwire_hal::Transport;

use crate::engine::{Engine, MessageHandler, NoHandler, DEFAULT_BUFFER_SIZE, DEFAULT_QUEUE_SIZE};
use crate::error::EnqueueError;
use crate::stats::EngineStats;

/// [`Engine`] behind a blocking mutex
pub struct SharedEngine<
    M: RawMutex,
    H = NoHandler,
    const BUF: usize = DEFAULT_BUFFER_SIZE,
    const QUEUE: usize = DEFAULT_QUEUE_SIZE,
> {
    inner: Mutex<M, RefCell<Engine<H, BUF, QUEUE>>>,
}

impl<M, H, const BUF: usize, const QUEUE: usize> SharedEngine<M, H, BUF, QUEUE>
where
    M: RawMutex,
    H: MessageHandler,
{
    /// Take ownership of an engine
    pub fn new(engine: Engine<H, BUF, QUEUE>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(engine)),
        }
    }

    /// Run `f` with exclusive access to the engine
    pub fn lock<R>(&self, f: impl FnOnce(&mut Engine<H, BUF, QUEUE>) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// See [`Engine::service`]
    pub fn service<T: Transport>(&self, transport: &mut T) -> bool {
        self.lock(|engine| engine.service(transport))
    }

    /// See [`Engine::send`]
    pub fn send(&self, message: &[u8]) -> Result<(), EnqueueError> {
        self.lock(|engine| engine.send(message))
    }

    /// See [`Engine::take_message`]
    pub fn take_message(&self) -> Option<Vec<u8, BUF>> {
        self.lock(|engine| engine.take_message())
    }

    /// See [`Engine::pending`]
    pub fn pending(&self) -> usize {
        self.lock(|engine| engine.pending())
    }

    /// See [`Engine::stats`]
    pub fn stats(&self) -> EngineStats {
        self.lock(|engine| engine.stats())
    }

    /// Release the engine
    pub fn into_inner(self) -> Engine<H, BUF, QUEUE> {
        self.inner.into_inner().into_inner()
    }
}
