//! HMAC_DRBG with HMAC-SHA-512.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::Zeroize;

use crate::error::RngError;

type HmacSha512 = Hmac<Sha512>;

const OUT_LEN: usize = 64;

/// HMAC_DRBG state (key, value, reseed counter).
///
/// Key and value are zeroized on drop.
pub struct HmacDrbg {
    key: [u8; OUT_LEN],
    v: [u8; OUT_LEN],
    reseed_counter: u64,
}

impl HmacDrbg {
    /// Entropy input drawn at instantiation and at every reseed (256-bit
    /// security strength).
    pub const ENTROPY_LEN: usize = 32;

    /// Nonce drawn alongside the entropy input at instantiation.
    pub const NONCE_LEN: usize = 16;

    /// Longest personalization string accepted.
    pub const MAX_PERSONALIZATION: usize = 256;

    /// Instantiate from explicit entropy input (entropy followed by nonce)
    /// and personalization.
    pub fn instantiate(entropy_input: &[u8], personalization: &[u8]) -> Result<Self, RngError> {
        if personalization.len() > Self::MAX_PERSONALIZATION {
            return Err(RngError::PersonalizationTooLong {
                max: Self::MAX_PERSONALIZATION,
                actual: personalization.len(),
            });
        }

        let mut drbg = Self { key: [0x00; OUT_LEN], v: [0x01; OUT_LEN], reseed_counter: 1 };

        let mut seed_material = Vec::with_capacity(entropy_input.len() + personalization.len());
        seed_material.extend_from_slice(entropy_input);
        seed_material.extend_from_slice(personalization);
        drbg.update(&seed_material);
        seed_material.zeroize();

        Ok(drbg)
    }

    /// Mix fresh entropy input into the state and reset the reseed counter.
    pub fn reseed(&mut self, entropy_input: &[u8]) {
        self.update(entropy_input);
        self.reseed_counter = 1;
    }

    /// Fill `out` with the next output bytes.
    ///
    /// The reseed interval is not enforced here; see
    /// [`reseed_counter`](Self::reseed_counter).
    pub fn generate(&mut self, out: &mut [u8]) {
        for chunk in out.chunks_mut(OUT_LEN) {
            self.v = hmac(&self.key, &[&self.v]);
            chunk.copy_from_slice(&self.v[..chunk.len()]);
        }

        self.update(&[]);
        self.reseed_counter = self.reseed_counter.saturating_add(1);
    }

    /// Requests served since the last (re)seed, plus one.
    pub fn reseed_counter(&self) -> u64 {
        self.reseed_counter
    }

    fn update(&mut self, provided: &[u8]) {
        self.key = hmac(&self.key, &[&self.v, &[0x00], provided]);
        self.v = hmac(&self.key, &[&self.v]);

        if provided.is_empty() {
            return;
        }

        self.key = hmac(&self.key, &[&self.v, &[0x01], provided]);
        self.v = hmac(&self.key, &[&self.v]);
    }
}

impl Drop for HmacDrbg {
    fn drop(&mut self) {
        self.key.zeroize();
        self.v.zeroize();
    }
}

fn hmac(key: &[u8], parts: &[&[u8]]) -> [u8; OUT_LEN] {
    let Ok(mut mac) = HmacSha512::new_from_slice(key) else {
        unreachable!("HMAC-SHA512 accepts any key size");
    };
    for part in parts {
        mac.update(part);
    }
    let result = mac.finalize().into_bytes();

    let mut out = [0u8; OUT_LEN];
    out.copy_from_slice(&result);
    out
}
