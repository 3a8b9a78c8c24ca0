//! Deterministic random bit generators (NIST SP 800-90A).
//!
//! Two interchangeable mechanisms:
//! - CTR_DRBG over AES-256 with the block cipher derivation function
//! - HMAC_DRBG over HMAC-SHA-512
//!
//! The mechanisms themselves are pure: callers hand in entropy input and get
//! deterministic output. [`Drbg`] adds the policy on top (drawing entropy,
//! splitting large requests, reseeding after [`RESEED_INTERVAL`] requests).

mod ctr_drbg;
mod hmac_drbg;

use std::{fmt, str::FromStr};

pub use ctr_drbg::CtrDrbg;
pub use hmac_drbg::HmacDrbg;
use zeroize::Zeroize;

use crate::{entropy::EntropySource, error::RngError};

/// Number of generate requests between reseeds.
pub const RESEED_INTERVAL: u64 = 10_000;

/// Largest output served by a single DRBG request.
///
/// Longer outputs are split into consecutive requests.
pub const MAX_REQUEST: usize = 1024;

/// DRBG mechanism backing an RNG context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrbgKind {
    /// CTR_DRBG with AES-256
    #[default]
    Ctr,
    /// HMAC_DRBG with SHA-512
    Hmac,
}

impl fmt::Display for DrbgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ctr => f.write_str("ctr"),
            Self::Hmac => f.write_str("hmac"),
        }
    }
}

impl FromStr for DrbgKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ctr" | "ctr_drbg" => Ok(Self::Ctr),
            "hmac" | "hmac_drbg" => Ok(Self::Hmac),
            other => Err(format!("unknown DRBG kind: {other}")),
        }
    }
}

/// A seeded DRBG of either kind.
pub(crate) enum Drbg {
    Ctr(CtrDrbg),
    Hmac(HmacDrbg),
}

impl Drbg {
    /// Draw seed material from `entropy` and instantiate a DRBG of `kind`.
    pub(crate) fn instantiate(
        kind: DrbgKind,
        entropy: &mut dyn EntropySource,
        personalization: &[u8],
    ) -> Result<Self, RngError> {
        match kind {
            DrbgKind::Ctr => {
                let mut seed = [0u8; CtrDrbg::ENTROPY_LEN];
                entropy.fill(&mut seed)?;
                let drbg = CtrDrbg::instantiate(&seed, personalization);
                seed.zeroize();
                drbg.map(Self::Ctr)
            },
            DrbgKind::Hmac => {
                let mut seed = [0u8; HmacDrbg::ENTROPY_LEN + HmacDrbg::NONCE_LEN];
                entropy.fill(&mut seed)?;
                let drbg = HmacDrbg::instantiate(&seed, personalization);
                seed.zeroize();
                drbg.map(Self::Hmac)
            },
        }
    }

    /// Fill `out`, reseeding from `entropy` whenever the interval is reached.
    pub(crate) fn generate(
        &mut self,
        entropy: &mut dyn EntropySource,
        out: &mut [u8],
    ) -> Result<(), RngError> {
        for chunk in out.chunks_mut(MAX_REQUEST) {
            if self.needs_reseed() {
                self.reseed(entropy)?;
            }
            match self {
                Self::Ctr(drbg) => drbg.generate(chunk),
                Self::Hmac(drbg) => drbg.generate(chunk),
            }
        }
        Ok(())
    }

    fn needs_reseed(&self) -> bool {
        match self {
            Self::Ctr(drbg) => drbg.reseed_counter() > RESEED_INTERVAL,
            Self::Hmac(drbg) => drbg.reseed_counter() > RESEED_INTERVAL,
        }
    }

    fn reseed(&mut self, entropy: &mut dyn EntropySource) -> Result<(), RngError> {
        match self {
            Self::Ctr(drbg) => {
                let mut seed = [0u8; CtrDrbg::ENTROPY_LEN];
                entropy.fill(&mut seed)?;
                drbg.reseed(&seed);
                seed.zeroize();
            },
            Self::Hmac(drbg) => {
                let mut seed = [0u8; HmacDrbg::ENTROPY_LEN];
                entropy.fill(&mut seed)?;
                drbg.reseed(&seed);
                seed.zeroize();
            },
        }
        tracing::debug!("DRBG reseeded after {RESEED_INTERVAL} requests");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::FixedEntropy;

    /// Counts how many bytes were pulled from the wrapped source.
    struct CountingEntropy {
        inner: FixedEntropy,
        pulls: usize,
    }

    impl EntropySource for CountingEntropy {
        fn fill(&mut self, buf: &mut [u8]) -> Result<(), RngError> {
            self.pulls += 1;
            self.inner.fill(buf)
        }
    }

    #[test]
    fn kind_parses_and_displays() {
        assert_eq!("ctr".parse::<DrbgKind>(), Ok(DrbgKind::Ctr));
        assert_eq!("HMAC_DRBG".parse::<DrbgKind>(), Ok(DrbgKind::Hmac));
        assert!("hash".parse::<DrbgKind>().is_err());

        assert_eq!(DrbgKind::Hmac.to_string(), "hmac");
    }

    #[test]
    fn reseeds_after_interval() {
        for kind in [DrbgKind::Ctr, DrbgKind::Hmac] {
            let mut entropy = CountingEntropy { inner: FixedEntropy::new(), pulls: 0 };
            let mut drbg = Drbg::instantiate(kind, &mut entropy, b"reseed").expect("instantiate");
            assert_eq!(entropy.pulls, 1);

            let mut out = [0u8; 1];
            for _ in 0..RESEED_INTERVAL {
                drbg.generate(&mut entropy, &mut out).expect("generate");
            }
            assert_eq!(entropy.pulls, 1, "{kind}: no reseed within the interval");

            drbg.generate(&mut entropy, &mut out).expect("generate");
            assert_eq!(entropy.pulls, 2, "{kind}: reseed once the interval is exhausted");
        }
    }

    #[test]
    fn large_requests_are_split() {
        let mut entropy = FixedEntropy::new();
        let mut drbg = Drbg::instantiate(DrbgKind::Hmac, &mut entropy, b"").expect("instantiate");

        let mut out = vec![0u8; MAX_REQUEST * 3 + 7];
        drbg.generate(&mut entropy, &mut out).expect("generate");

        let Drbg::Hmac(inner) = &drbg else { unreachable!("instantiated as HMAC") };
        // One instantiate plus four requests
        assert_eq!(inner.reseed_counter(), 5);
    }

    #[test]
    fn entropy_failure_fails_instantiate() {
        struct Starved;
        impl EntropySource for Starved {
            fn fill(&mut self, _buf: &mut [u8]) -> Result<(), RngError> {
                Err(RngError::Entropy { reason: "starved".to_string() })
            }
        }

        for kind in [DrbgKind::Ctr, DrbgKind::Hmac] {
            let result = Drbg::instantiate(kind, &mut Starved, b"");
            assert!(matches!(result, Err(RngError::Entropy { .. })));
        }
    }
}
