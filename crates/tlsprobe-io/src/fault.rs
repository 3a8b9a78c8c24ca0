//! Retry-forcing transport wrapper.
//!
//! [`DelayedIo`] wraps a [`Transport`] and makes every new logical read or
//! write observe exactly one "operation incomplete" outcome before the real
//! transfer is attempted. Protocol engines that claim to support
//! non-blocking I/O get their retry path exercised on every record instead
//! of only when the network happens to stall.
//!
//! # State per direction
//!
//! ```text
//!            forced WantRead/WantWrite
//!   Armed ─────────────────────────────► Spent
//!     ▲                                    │ delegated call
//!     │   Ok(n) (incl. short and EOF)      │
//!     └─────── or hard error ──────────────┤
//!                                          │ WouldBlock
//!                                   Spent ◄┘
//! ```
//!
//! Read and write are tracked independently. Any forward progress re-arms a
//! direction, so a short transfer counts as a completed operation. A pending
//! socket error is reported instead of the forced outcome and leaves the
//! direction armed.

use std::{future::Future, io};

use tokio::io::Interest;

use crate::{
    idle::Readiness,
    transport::{Direction, Transport, TransportError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Slot {
    #[default]
    Armed,
    Spent,
}

/// Per-direction "already forced" flags for one wrapped endpoint.
#[derive(Debug, Clone, Default)]
pub struct FaultCounter {
    read: Slot,
    write: Slot,
    forced_reads: u64,
    forced_writes: u64,
}

impl FaultCounter {
    /// Both directions armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the next call in `direction` will be forced to retry.
    pub fn is_armed(&self, direction: Direction) -> bool {
        self.slot(direction) == Slot::Armed
    }

    /// Record that a retry was forced in `direction`.
    pub fn mark_forced(&mut self, direction: Direction) {
        *self.slot_mut(direction) = Slot::Spent;
        match direction {
            Direction::Read => self.forced_reads += 1,
            Direction::Write => self.forced_writes += 1,
        }
    }

    /// Record the outcome of a delegated call.
    ///
    /// A would-block outcome keeps the current operation pending. Anything
    /// else ends it and re-arms the direction.
    pub fn record<T>(&mut self, direction: Direction, outcome: &Result<T, TransportError>) {
        let pending = matches!(outcome, Err(e) if e.is_would_block());
        if !pending {
            *self.slot_mut(direction) = Slot::Armed;
        }
    }

    /// Number of retries forced so far in `direction`.
    pub fn forced(&self, direction: Direction) -> u64 {
        match direction {
            Direction::Read => self.forced_reads,
            Direction::Write => self.forced_writes,
        }
    }

    /// Re-arm both directions and clear the counts.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn slot(&self, direction: Direction) -> Slot {
        match direction {
            Direction::Read => self.read,
            Direction::Write => self.write,
        }
    }

    fn slot_mut(&mut self, direction: Direction) -> &mut Slot {
        match direction {
            Direction::Read => &mut self.read,
            Direction::Write => &mut self.write,
        }
    }
}

/// Transport wrapper that forces one retry per logical operation.
#[derive(Debug)]
pub struct DelayedIo<T> {
    inner: T,
    faults: FaultCounter,
}

impl<T> DelayedIo<T> {
    /// Wrap `inner` with both directions armed.
    pub fn new(inner: T) -> Self {
        Self { inner, faults: FaultCounter::new() }
    }

    /// Fault state for inspection.
    pub fn faults(&self) -> &FaultCounter {
        &self.faults
    }

    /// Re-arm both directions, e.g. between test cases sharing a socket.
    pub fn reset_faults(&mut self) {
        self.faults.reset();
    }

    /// The wrapped transport.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// The wrapped transport, bypassing fault injection.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Unwrap, discarding fault state.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Transport> DelayedIo<T> {
    fn intercept<F>(&mut self, direction: Direction, op: F) -> Result<usize, TransportError>
    where
        F: FnOnce(&mut T) -> Result<usize, TransportError>,
    {
        if self.faults.is_armed(direction) {
            // Hard errors are never masked by the injected retry
            self.inner.take_error()?;

            self.faults.mark_forced(direction);
            tracing::trace!(?direction, forced = self.faults.forced(direction), "forcing retry");
            return Err(direction.would_block());
        }

        let outcome = op(&mut self.inner);
        self.faults.record(direction, &outcome);
        outcome
    }
}

impl<T: Transport> Transport for DelayedIo<T> {
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        self.intercept(Direction::Read, |inner| inner.recv(buf))
    }

    fn send(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        self.intercept(Direction::Write, |inner| inner.send(buf))
    }

    fn take_error(&mut self) -> Result<(), TransportError> {
        self.inner.take_error()
    }
}

impl<T: Readiness> Readiness for DelayedIo<T> {
    fn wait_ready(&self, interest: Interest) -> impl Future<Output = io::Result<()>> {
        self.inner.wait_ready(interest)
    }
}
