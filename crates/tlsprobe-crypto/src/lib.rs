//! Seedable randomness for TLS/DTLS test programs.
//!
//! Test drivers construct one [`RngContext`] per simulated peer, seed it
//! once, and hand it to the protocol engine wherever randomness is needed.
//! In reproducible mode the entropy input is replaced by a fixed seed, so a
//! failing run can be replayed bit for bit.
//!
//! ```text
//! EntropySource (OS or fixed seed)
//!        │
//!        ▼
//! DRBG (CTR_DRBG/AES-256 or HMAC_DRBG/SHA-512) ◄── personalization
//!        │
//!        ▼
//! RngContext::generate → protocol engine
//! ```
//!
//! The crate also carries the exported-keys records (EAP-TLS, DTLS-SRTP)
//! that the engine fills in and the harness relays.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod context;
pub mod drbg;
pub mod entropy;
pub mod error;
pub mod keys;

pub use context::{RandomSource, RngContext};
pub use drbg::{CtrDrbg, DrbgKind, HmacDrbg, MAX_REQUEST, RESEED_INTERVAL};
pub use entropy::{EntropySource, FixedEntropy, OsEntropy, REPRODUCIBLE_SEED};
pub use error::RngError;
pub use keys::{
    EapKeyMaterial, ExportedKeys, HELLO_RANDOM_LEN, KeyPurpose, MASTER_SECRET_LEN, RANDBYTES_LEN,
    SRTP_MAX_KEY_MATERIAL_LEN, SrtpKeyMaterial, TlsPrf,
};
