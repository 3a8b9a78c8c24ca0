//! Harness error type.

use thiserror::Error;
use tlsprobe_crypto::RngError;
use tlsprobe_io::{IdleReason, TransportError, WaitError};

/// Errors surfaced by the test driver.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// RNG seeding or generation failed
    #[error("rng error: {0}")]
    Rng(#[from] RngError),

    /// Transport failed with something waiting cannot fix
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The waiting machinery failed
    #[error("wait error: {0}")]
    Wait(#[from] WaitError),

    /// Deadline passed while waiting; a protocol-level timeout
    #[error("timed out waiting ({reason:?})")]
    Timeout {
        /// What the driver was waiting for
        reason: IdleReason,
    },

    /// Peer closed before the expected bytes arrived or were accepted
    #[error("peer closed the connection")]
    Closed,

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl HarnessError {
    /// Returns true if the error is a timeout the caller may treat as a
    /// protocol event (e.g. retransmit) rather than a harness failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
