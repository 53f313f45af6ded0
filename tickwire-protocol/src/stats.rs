//! Engine counters
//!
//! Receive faults never reach the application as errors, so these counters
//! are the only local record of them.

/// Running totals since creation or the last reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineStats {
    /// Frames accepted into the mailbox
    pub frames_received: u32,
    /// Frames rejected for a bad checksum
    pub checksum_errors: u32,
    /// Receive buffer overflows
    pub overflows: u32,
    /// Diagnostics that could not be queued
    pub diagnostics_dropped: u32,
    /// Messages fully written to the transport
    pub messages_sent: u32,
    /// Failed transport reads, writes, or readiness queries
    pub transport_errors: u32,
}

impl EngineStats {
    /// Total receive-side faults
    pub fn rx_faults(&self) -> u32 {
        self.checksum_errors.saturating_add(self.overflows)
    }
}

/// Saturating counter bump
pub(crate) fn bump(counter: &mut u32) {
    *counter = counter.saturating_add(1);
}
