//! Test-driver support for TLS/DTLS test programs.
//!
//! A test program builds one [`Idler`](tlsprobe_io::Idler), registers its
//! sockets with it, and creates a [`TestDriver`] per simulated peer from a
//! [`HarnessConfig`]. The driver owns the peer's RNG, transport and
//! retransmission timer, and offers the retry loops that turn the engine's
//! "would block" outcomes into waits.
//!
//! # Components
//!
//! - [`config`]: per-peer settings with test-program defaults
//! - [`driver`]: the per-peer aggregate and its retry loops
//! - [`clock`]: wall clock or fixed time for certificate checks
//! - [`trust`]: pass-through trust-anchor candidates
//! - [`logging`]: `tracing` subscriber setup

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod clock;
pub mod config;
pub mod driver;
pub mod error;
pub mod logging;
pub mod trust;

pub use clock::{FIXED_UNIX_TIME, TimeSource};
pub use config::{HarnessConfig, IoMode};
pub use driver::{PeerIo, TestDriver};
pub use error::HarnessError;
pub use trust::{StaticTrustAnchors, TrustAnchorSource};
