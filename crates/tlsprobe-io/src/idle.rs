//! Blocking wait for transport readiness or a retransmission deadline.
//!
//! Protocol engines in event-driven mode return "would block" instead of
//! waiting. The test driver then calls [`Idler::idle`], which parks the
//! thread until the transport can make progress in the awaited direction or
//! the engine's [`DelayTimer`] reaches its final deadline.
//!
//! The idler owns a single-threaded tokio runtime and drives each wait with
//! `block_on`. No tasks outlive a call. When readiness and the deadline land
//! on the same instant the deadline wins, so a timer expiring at T never
//! loses to a transport that only becomes ready at T.

use std::{future::Future, io};

use thiserror::Error;
use tokio::{io::Interest, runtime::Runtime, time::Instant};

use crate::{timer::DelayTimer, transport::TransportError};

/// What the caller is blocked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdleReason {
    /// More data to read
    WantRead,
    /// Room to write
    WantWrite,
    /// Whichever comes first
    Either,
}

impl IdleReason {
    /// Readiness interest to register for this reason.
    pub fn interest(self) -> Interest {
        match self {
            Self::WantRead => Interest::READABLE,
            Self::WantWrite => Interest::WRITABLE,
            Self::Either => Interest::READABLE.add(Interest::WRITABLE),
        }
    }

    /// Reason matching a "retry later" transport outcome.
    ///
    /// Returns `None` for errors that waiting cannot fix.
    pub fn for_error(err: &TransportError) -> Option<Self> {
        match err {
            TransportError::WantRead => Some(Self::WantRead),
            TransportError::WantWrite => Some(Self::WantWrite),
            TransportError::ConnectionReset | TransportError::Io(_) => None,
        }
    }
}

/// One wait: a reason plus an optional deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitRequest {
    /// What to wait for
    pub reason: IdleReason,
    /// When to give up. `None` waits until the transport is ready.
    pub deadline: Option<Instant>,
}

impl WaitRequest {
    /// Wait without a deadline.
    pub fn new(reason: IdleReason) -> Self {
        Self { reason, deadline: None }
    }

    /// Give up at `deadline`.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Take the deadline from a retransmission timer. A missing or
    /// cancelled timer imposes none.
    pub fn from_timer(reason: IdleReason, timer: Option<&DelayTimer>) -> Self {
        Self { reason, deadline: timer.and_then(DelayTimer::deadline) }
    }
}

/// Why a wait returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleOutcome {
    /// The transport can make progress; retry the blocked operation
    TransportReady,
    /// The deadline passed first; a protocol timeout, not a harness failure
    DeadlineElapsed,
}

/// Failures of the waiting machinery itself.
#[derive(Debug, Error)]
pub enum WaitError {
    /// Runtime could not be built
    #[error("failed to build wait runtime: {0}")]
    Runtime(#[source] io::Error),

    /// Socket could not be registered for readiness
    #[error("failed to register transport: {0}")]
    Register(#[source] io::Error),

    /// Readiness polling failed
    #[error("readiness poll failed: {0}")]
    Poll(#[source] io::Error),
}

/// A transport the idler can wait on.
pub trait Readiness {
    /// Resolve once the transport is ready for `interest`.
    ///
    /// Must be polled from inside the idler's runtime.
    fn wait_ready(&self, interest: Interest) -> impl Future<Output = io::Result<()>>;
}

impl Readiness for tokio::net::TcpStream {
    async fn wait_ready(&self, interest: Interest) -> io::Result<()> {
        self.ready(interest).await.map(|_| ())
    }
}

impl Readiness for tokio::net::UdpSocket {
    async fn wait_ready(&self, interest: Interest) -> io::Result<()> {
        self.ready(interest).await.map(|_| ())
    }
}

/// Owns the runtime that every wait runs on.
#[derive(Debug)]
pub struct Idler {
    runtime: Runtime,
}

impl Idler {
    /// Build an idler with I/O and timers enabled.
    pub fn new() -> Result<Self, WaitError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .enable_time()
            .build()
            .map_err(WaitError::Runtime)?;
        Ok(Self { runtime })
    }

    /// Use a caller-built current-thread runtime, e.g. one with paused time.
    pub fn from_runtime(runtime: Runtime) -> Self {
        Self { runtime }
    }

    /// Current time on the idler's clock.
    ///
    /// Arm [`DelayTimer`]s with this so deadlines and waits share a clock.
    pub fn now(&self) -> Instant {
        let _guard = self.runtime.enter();
        Instant::now()
    }

    /// Move a connected std TCP stream onto the idler's reactor.
    pub fn register_tcp(
        &self,
        stream: std::net::TcpStream,
    ) -> Result<tokio::net::TcpStream, WaitError> {
        stream.set_nonblocking(true).map_err(WaitError::Register)?;
        let _guard = self.runtime.enter();
        tokio::net::TcpStream::from_std(stream).map_err(WaitError::Register)
    }

    /// Move a std UDP socket onto the idler's reactor.
    pub fn register_udp(
        &self,
        socket: std::net::UdpSocket,
    ) -> Result<tokio::net::UdpSocket, WaitError> {
        socket.set_nonblocking(true).map_err(WaitError::Register)?;
        let _guard = self.runtime.enter();
        tokio::net::UdpSocket::from_std(socket).map_err(WaitError::Register)
    }

    /// Block until `transport` is ready for `reason` or `timer` expires.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a tokio runtime, e.g. a `#[tokio::test]`
    /// body. Test programs drive the idler from a plain thread.
    pub fn idle<T: Readiness>(
        &self,
        transport: &T,
        timer: Option<&DelayTimer>,
        reason: IdleReason,
    ) -> Result<IdleOutcome, WaitError> {
        self.wait(transport, WaitRequest::from_timer(reason, timer))
    }

    /// Block until `transport` is ready or the request's deadline passes.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a tokio runtime, as
    /// [`Runtime::block_on`] does.
    pub fn wait<T: Readiness>(
        &self,
        transport: &T,
        request: WaitRequest,
    ) -> Result<IdleOutcome, WaitError> {
        let interest = request.reason.interest();

        let outcome = self.runtime.block_on(async {
            match request.deadline {
                Some(deadline) => tokio::select! {
                    biased;
                    () = tokio::time::sleep_until(deadline) => Ok(IdleOutcome::DeadlineElapsed),
                    ready = transport.wait_ready(interest) => {
                        ready.map(|()| IdleOutcome::TransportReady)
                    },
                },
                None => transport.wait_ready(interest).await.map(|()| IdleOutcome::TransportReady),
            }
        });

        match &outcome {
            Ok(outcome) => tracing::trace!(reason = ?request.reason, ?outcome, "idle returned"),
            Err(e) => tracing::debug!(reason = ?request.reason, error = %e, "readiness poll failed"),
        }
        outcome.map_err(WaitError::Poll)
    }
}
