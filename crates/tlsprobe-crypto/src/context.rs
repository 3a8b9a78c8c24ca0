//! Seedable RNG context handed to protocol engines as their randomness
//! callback target.
//!
//! # Lifecycle
//!
//! ```text
//! ┌───────┐  seed()   ┌────────┐  generate()*
//! │ Empty │──────────>│ Seeded │─────────────┐
//! └───────┘           └────────┘<────────────┘
//!     ^                    │
//!     └──── free() ────────┘
//! ```
//!
//! Seeding twice without `free()` and generating while empty are both
//! rejected.

use std::fmt;

use crate::{
    drbg::{Drbg, DrbgKind},
    entropy::{EntropySource, FixedEntropy, OsEntropy},
    error::RngError,
};

/// Randomness callback consumed by protocol engines.
///
/// Calls on one source must be serialized; `&mut self` enforces that.
pub trait RandomSource {
    /// Fill `out` with random bytes.
    fn fill_random(&mut self, out: &mut [u8]) -> Result<(), RngError>;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn fill_random(&mut self, out: &mut [u8]) -> Result<(), RngError> {
        (**self).fill_random(out)
    }
}

enum RngState {
    Empty,
    Seeded { entropy: Box<dyn EntropySource>, drbg: Drbg },
}

/// An entropy source plus exactly one DRBG.
///
/// The DRBG kind is fixed at construction. One context per simulated peer
/// keeps sequences independent.
pub struct RngContext {
    kind: DrbgKind,
    state: RngState,
}

impl RngContext {
    /// Create an empty context. Holds no resources until seeded.
    pub fn new(kind: DrbgKind) -> Self {
        Self { kind, state: RngState::Empty }
    }

    /// DRBG mechanism this context seeds.
    pub fn kind(&self) -> DrbgKind {
        self.kind
    }

    /// Whether [`seed`](Self::seed) has succeeded since construction or the
    /// last [`free`](Self::free).
    pub fn is_seeded(&self) -> bool {
        matches!(self.state, RngState::Seeded { .. })
    }

    /// Seed the DRBG.
    ///
    /// With `reproducible` unset, seed material comes from the OS. With it
    /// set, a fixed seed stands in for live entropy, so the same
    /// `personalization` yields the same output on every run.
    ///
    /// # Errors
    ///
    /// - `RngError::AlreadySeeded` if seeded without an intervening `free()`
    /// - `RngError::PersonalizationTooLong` if the DRBG rejects the string
    /// - `RngError::Entropy` if the entropy source fails
    pub fn seed(&mut self, reproducible: bool, personalization: &[u8]) -> Result<(), RngError> {
        let entropy: Box<dyn EntropySource> =
            if reproducible { Box::new(FixedEntropy::new()) } else { Box::new(OsEntropy) };

        self.seed_with(entropy, personalization)?;
        tracing::debug!(
            kind = %self.kind,
            reproducible,
            personalization_len = personalization.len(),
            "RNG seeded"
        );
        Ok(())
    }

    /// Seed the DRBG from a caller-supplied entropy source.
    ///
    /// The source is kept for reseeding.
    pub fn seed_with(
        &mut self,
        mut entropy: Box<dyn EntropySource>,
        personalization: &[u8],
    ) -> Result<(), RngError> {
        if self.is_seeded() {
            return Err(RngError::AlreadySeeded);
        }

        let drbg = Drbg::instantiate(self.kind, entropy.as_mut(), personalization)?;
        self.state = RngState::Seeded { entropy, drbg };
        Ok(())
    }

    /// Fill `out` with pseudorandom bytes.
    ///
    /// # Errors
    ///
    /// - `RngError::NotSeeded` before seeding, for every length including
    ///   zero
    /// - `RngError::Entropy` if a due reseed cannot draw entropy
    pub fn generate(&mut self, out: &mut [u8]) -> Result<(), RngError> {
        let RngState::Seeded { entropy, drbg } = &mut self.state else {
            return Err(RngError::NotSeeded);
        };
        drbg.generate(entropy.as_mut(), out)
    }

    /// Release the DRBG and entropy source. DRBG state is zeroized.
    ///
    /// Safe on a context that was never seeded. The context may be seeded
    /// again afterwards.
    pub fn free(&mut self) {
        if self.is_seeded() {
            tracing::debug!(kind = %self.kind, "RNG freed");
        }
        self.state = RngState::Empty;
    }
}

impl Default for RngContext {
    fn default() -> Self {
        Self::new(DrbgKind::default())
    }
}

impl fmt::Debug for RngContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RngContext")
            .field("kind", &self.kind)
            .field("seeded", &self.is_seeded())
            .finish_non_exhaustive()
    }
}

impl RandomSource for RngContext {
    fn fill_random(&mut self, out: &mut [u8]) -> Result<(), RngError> {
        self.generate(out)
    }
}
