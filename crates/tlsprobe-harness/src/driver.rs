//! Per-peer test driver.
//!
//! [`TestDriver`] is the aggregate a test program owns for each simulated
//! peer: its RNG, its transport (optionally retry-forcing), its
//! retransmission timer and a borrow of the shared [`Idler`]. The protocol
//! engine is handed references into it instead of a shared global context.
//!
//! The retry helpers implement the driver side of the "would block"
//! contract. What happens on a would-block depends on [`IoMode`]:
//!
//! - `Blocking`: a retry forced by the wrapper is retried at once. A stall
//!   coming from the socket itself is waited on, bounded by the read
//!   timeout.
//! - `EventDriven`: every would-block goes through the idler, bounded by the
//!   retransmission timer's final deadline or else the read timeout.
//!
//! An elapsed deadline surfaces as [`HarnessError::Timeout`]. Retry policy
//! beyond that belongs to the caller.

use std::{future::Future, io, time::Duration};

use tlsprobe_crypto::RngContext;
use tlsprobe_io::{
    DelayTimer, DelayedIo, Direction, IdleOutcome, IdleReason, Idler, Readiness, TimerStatus,
    Transport, TransportError, WaitRequest,
};
use tokio::{io::Interest, time::Instant};

use crate::{
    clock::TimeSource,
    config::{HarnessConfig, IoMode},
    error::HarnessError,
};

/// A transport used directly or through the retry-forcing wrapper.
#[derive(Debug)]
pub enum PeerIo<T> {
    /// Calls go straight to the transport
    Direct(T),
    /// Every operation observes one forced retry first
    Delayed(DelayedIo<T>),
}

impl<T> PeerIo<T> {
    /// Wrap `transport` if `delay` is set.
    pub fn new(transport: T, delay: bool) -> Self {
        if delay { Self::Delayed(DelayedIo::new(transport)) } else { Self::Direct(transport) }
    }

    /// Retries forced so far in `direction`. Always 0 when direct.
    pub fn forced(&self, direction: Direction) -> u64 {
        match self {
            Self::Direct(_) => 0,
            Self::Delayed(io) => io.faults().forced(direction),
        }
    }

    /// The underlying transport.
    pub fn get_ref(&self) -> &T {
        match self {
            Self::Direct(t) => t,
            Self::Delayed(io) => io.get_ref(),
        }
    }

    /// The underlying transport, bypassing fault injection.
    pub fn get_mut(&mut self) -> &mut T {
        match self {
            Self::Direct(t) => t,
            Self::Delayed(io) => io.get_mut(),
        }
    }
}

impl<T: Transport> Transport for PeerIo<T> {
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match self {
            Self::Direct(t) => t.recv(buf),
            Self::Delayed(io) => io.recv(buf),
        }
    }

    fn send(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        match self {
            Self::Direct(t) => t.send(buf),
            Self::Delayed(io) => io.send(buf),
        }
    }

    fn take_error(&mut self) -> Result<(), TransportError> {
        match self {
            Self::Direct(t) => t.take_error(),
            Self::Delayed(io) => io.take_error(),
        }
    }
}

impl<T: Readiness> Readiness for PeerIo<T> {
    fn wait_ready(&self, interest: Interest) -> impl Future<Output = io::Result<()>> {
        let inner = match self {
            Self::Direct(t) => t,
            Self::Delayed(io) => io.get_ref(),
        };
        inner.wait_ready(interest)
    }
}

/// RNG, transport, timer and idler for one simulated peer.
#[derive(Debug)]
pub struct TestDriver<'a, T> {
    idler: &'a Idler,
    rng: RngContext,
    io: PeerIo<T>,
    timer: DelayTimer,
    clock: TimeSource,
    io_mode: IoMode,
    hs_timeout: (Duration, Duration),
    read_timeout: Option<Duration>,
}

impl<'a, T: Transport + Readiness> TestDriver<'a, T> {
    /// Validate `config`, seed the peer's RNG and wrap `transport`.
    ///
    /// Sockets must already be registered with `idler`.
    pub fn new(config: &HarnessConfig, transport: T, idler: &'a Idler) -> Result<Self, HarnessError> {
        config.validate()?;

        let mut rng = RngContext::new(config.drbg);
        rng.seed(config.reproducible, &config.personalization)?;

        tracing::debug!(
            io_mode = %config.io_mode,
            delay_io = config.delay_io,
            fixed_time = config.fixed_time,
            "test driver ready"
        );

        Ok(Self {
            idler,
            rng,
            io: PeerIo::new(transport, config.delay_io),
            timer: DelayTimer::new(),
            clock: if config.fixed_time { TimeSource::fixed() } else { TimeSource::System },
            io_mode: config.io_mode,
            hs_timeout: (config.hs_timeout_min, config.hs_timeout_max),
            read_timeout: config.read_timeout,
        })
    }

    /// The peer's RNG, for use as the engine's randomness callback.
    pub fn rng(&mut self) -> &mut RngContext {
        &mut self.rng
    }

    /// Fill `out` from the peer's RNG.
    pub fn random(&mut self, out: &mut [u8]) -> Result<(), HarnessError> {
        Ok(self.rng.generate(out)?)
    }

    /// The peer's transport.
    pub fn transport(&self) -> &PeerIo<T> {
        &self.io
    }

    /// The peer's transport, for use as the engine's I/O callbacks.
    pub fn transport_mut(&mut self) -> &mut PeerIo<T> {
        &mut self.io
    }

    /// The shared idler.
    pub fn idler(&self) -> &'a Idler {
        self.idler
    }

    /// Seconds since the Unix epoch, fixed in fixed-time mode.
    pub fn unix_time(&self) -> u64 {
        self.clock.unix_time()
    }

    /// Configured DTLS handshake timeout bounds as `(min, max)`.
    pub fn handshake_timeout(&self) -> (Duration, Duration) {
        self.hs_timeout
    }

    /// Arm the retransmission timer on the idler's clock. A zero `fin`
    /// cancels.
    pub fn set_timer(&mut self, intermediate: Duration, fin: Duration) {
        self.timer.set(self.idler.now(), intermediate, fin);
    }

    /// Stage the retransmission timer has reached.
    pub fn timer_status(&self) -> TimerStatus {
        self.timer.status(self.idler.now())
    }

    /// The retransmission timer.
    pub fn timer(&self) -> &DelayTimer {
        &self.timer
    }

    /// Wait for the transport or the retransmission timer, whichever is
    /// first. This is the event-driven idle callback.
    pub fn idle(&self, reason: IdleReason) -> Result<IdleOutcome, HarnessError> {
        Ok(self.idler.idle(&self.io, Some(&self.timer), reason)?)
    }

    /// Receive at least one byte, retrying per the I/O mode. `Ok(0)` is an
    /// orderly close.
    pub fn recv_retrying(&mut self, buf: &mut [u8]) -> Result<usize, HarnessError> {
        self.retry(Direction::Read, |io| io.recv(buf))
    }

    /// Send all of `data`, retrying per the I/O mode.
    pub fn send_all(&mut self, data: &[u8]) -> Result<(), HarnessError> {
        let mut sent = 0;
        while sent < data.len() {
            let n = self.retry(Direction::Write, |io| io.send(&data[sent..]))?;
            if n == 0 {
                return Err(HarnessError::Closed);
            }
            sent += n;
        }
        Ok(())
    }

    /// Fill `buf` completely, retrying per the I/O mode.
    pub fn recv_exact(&mut self, buf: &mut [u8]) -> Result<(), HarnessError> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.retry(Direction::Read, |io| io.recv(&mut buf[filled..]))?;
            if n == 0 {
                return Err(HarnessError::Closed);
            }
            filled += n;
        }
        Ok(())
    }

    fn retry<F>(&mut self, direction: Direction, mut op: F) -> Result<usize, HarnessError>
    where
        F: FnMut(&mut PeerIo<T>) -> Result<usize, TransportError>,
    {
        // One bound for the whole operation, fixed at its first real wait
        let mut bound: Option<Option<Instant>> = None;

        loop {
            let forced_before = self.io.forced(direction);
            let err = match op(&mut self.io) {
                Ok(n) => return Ok(n),
                Err(e) => e,
            };
            let Some(reason) = IdleReason::for_error(&err) else {
                return Err(err.into());
            };

            let injected = self.io.forced(direction) > forced_before;
            if injected && self.io_mode == IoMode::Blocking {
                continue;
            }

            let deadline = *bound.get_or_insert_with(|| self.deadline());
            match self.idler.wait(&self.io, WaitRequest { reason, deadline })? {
                IdleOutcome::TransportReady => {},
                IdleOutcome::DeadlineElapsed => {
                    tracing::debug!(?reason, "wait deadline elapsed");
                    return Err(HarnessError::Timeout { reason });
                },
            }
        }
    }

    fn deadline(&self) -> Option<Instant> {
        let timer = match self.io_mode {
            IoMode::EventDriven => self.timer.deadline(),
            IoMode::Blocking => None,
        };
        timer.or_else(|| self.read_timeout.map(|t| self.idler.now() + t))
    }
}
