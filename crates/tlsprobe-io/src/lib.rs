//! Transport shims for driving TLS/DTLS engines through their retry paths.
//!
//! - [`Transport`]: the read/write callbacks a protocol engine consumes,
//!   implemented for std and tokio sockets.
//! - [`DelayedIo`]: forces one "would block" outcome per logical read or
//!   write before delegating.
//! - [`Idler`]: blocks until a transport is ready or a [`DelayTimer`]
//!   reaches its final deadline, and says which happened.
//!
//! ```text
//! engine ──recv/send──► DelayedIo ──► socket
//!    │ WantRead/WantWrite
//!    ▼
//! driver ──idle(socket, timer, reason)──► Idler
//!    ▲                                      │
//!    └──── TransportReady | DeadlineElapsed ◄┘
//! ```
//!
//! Everything here is single-threaded and synchronous from the caller's
//! point of view. The only suspension point is [`Idler::wait`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod fault;
pub mod idle;
pub mod scripted;
pub mod timer;
pub mod transport;

pub use fault::{DelayedIo, FaultCounter};
pub use idle::{IdleOutcome, IdleReason, Idler, Readiness, WaitError, WaitRequest};
pub use scripted::ScriptedTransport;
pub use timer::{DelayTimer, TimerStatus};
pub use transport::{Direction, Transport, TransportError};
