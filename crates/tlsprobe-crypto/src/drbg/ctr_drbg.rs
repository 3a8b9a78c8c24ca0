//! CTR_DRBG with AES-256 and the block cipher derivation function.

use aes::{
    Aes256,
    cipher::{BlockEncrypt, KeyInit, generic_array::GenericArray},
};
use zeroize::Zeroize;

use crate::error::RngError;

const KEY_LEN: usize = 32;
const BLOCK_LEN: usize = 16;
const SEED_LEN: usize = KEY_LEN + BLOCK_LEN;

/// Upper bound on entropy input plus personalization fed to the
/// derivation function at instantiation.
const MAX_SEED_INPUT: usize = 384;

/// CTR_DRBG state (key, counter block, reseed counter).
///
/// Key and counter are zeroized on drop.
pub struct CtrDrbg {
    key: [u8; KEY_LEN],
    v: [u8; BLOCK_LEN],
    reseed_counter: u64,
}

impl CtrDrbg {
    /// Entropy input drawn at instantiation and at every reseed.
    pub const ENTROPY_LEN: usize = 48;

    /// Longest personalization string accepted alongside a full entropy
    /// input.
    pub const MAX_PERSONALIZATION: usize = MAX_SEED_INPUT - Self::ENTROPY_LEN;

    /// Instantiate from explicit entropy input and personalization.
    pub fn instantiate(entropy_input: &[u8], personalization: &[u8]) -> Result<Self, RngError> {
        let max = MAX_SEED_INPUT.saturating_sub(entropy_input.len());
        if personalization.len() > max {
            return Err(RngError::PersonalizationTooLong { max, actual: personalization.len() });
        }

        let mut seed_input = Vec::with_capacity(entropy_input.len() + personalization.len());
        seed_input.extend_from_slice(entropy_input);
        seed_input.extend_from_slice(personalization);

        let mut seed_material = derive(&seed_input);
        seed_input.zeroize();

        let mut drbg = Self { key: [0u8; KEY_LEN], v: [0u8; BLOCK_LEN], reseed_counter: 1 };
        drbg.update(&seed_material);
        seed_material.zeroize();

        Ok(drbg)
    }

    /// Mix fresh entropy input into the state and reset the reseed counter.
    pub fn reseed(&mut self, entropy_input: &[u8]) {
        let mut seed_material = derive(entropy_input);
        self.update(&seed_material);
        seed_material.zeroize();
        self.reseed_counter = 1;
    }

    /// Fill `out` with the next output bytes.
    ///
    /// The reseed interval is not enforced here; see
    /// [`reseed_counter`](Self::reseed_counter).
    pub fn generate(&mut self, out: &mut [u8]) {
        let cipher = cipher(&self.key);
        for chunk in out.chunks_mut(BLOCK_LEN) {
            increment(&mut self.v);
            let block = encrypt(&cipher, &self.v);
            chunk.copy_from_slice(&block[..chunk.len()]);
        }

        self.update(&[0u8; SEED_LEN]);
        self.reseed_counter = self.reseed_counter.saturating_add(1);
    }

    /// Requests served since the last (re)seed, plus one.
    pub fn reseed_counter(&self) -> u64 {
        self.reseed_counter
    }

    fn update(&mut self, provided: &[u8; SEED_LEN]) {
        let cipher = cipher(&self.key);
        let mut temp = [0u8; SEED_LEN];
        for chunk in temp.chunks_exact_mut(BLOCK_LEN) {
            increment(&mut self.v);
            chunk.copy_from_slice(&encrypt(&cipher, &self.v));
        }

        for (t, p) in temp.iter_mut().zip(provided) {
            *t ^= p;
        }

        self.key.copy_from_slice(&temp[..KEY_LEN]);
        self.v.copy_from_slice(&temp[KEY_LEN..]);
        temp.zeroize();
    }
}

impl Drop for CtrDrbg {
    fn drop(&mut self) {
        self.key.zeroize();
        self.v.zeroize();
    }
}

fn cipher(key: &[u8; KEY_LEN]) -> Aes256 {
    Aes256::new(GenericArray::from_slice(key))
}

fn encrypt(cipher: &Aes256, block: &[u8; BLOCK_LEN]) -> [u8; BLOCK_LEN] {
    let mut buf = GenericArray::clone_from_slice(block);
    cipher.encrypt_block(&mut buf);

    let mut out = [0u8; BLOCK_LEN];
    out.copy_from_slice(&buf);
    out
}

/// Big-endian increment of the 128-bit counter block.
fn increment(v: &mut [u8; BLOCK_LEN]) {
    *v = u128::from_be_bytes(*v).wrapping_add(1).to_be_bytes();
}

/// Block_Cipher_df producing `SEED_LEN` bytes.
fn derive(input: &[u8]) -> [u8; SEED_LEN] {
    // S = L || N || input || 0x80, zero-padded to a whole block
    let mut s = Vec::with_capacity(8 + input.len() + BLOCK_LEN);
    s.extend_from_slice(&(input.len() as u32).to_be_bytes());
    s.extend_from_slice(&(SEED_LEN as u32).to_be_bytes());
    s.extend_from_slice(input);
    s.push(0x80);
    while !s.len().is_multiple_of(BLOCK_LEN) {
        s.push(0);
    }

    let df_key: [u8; KEY_LEN] = std::array::from_fn(|i| i as u8);
    let df_cipher = cipher(&df_key);

    let mut temp = [0u8; SEED_LEN];
    for (i, chunk) in temp.chunks_exact_mut(BLOCK_LEN).enumerate() {
        let mut iv = [0u8; BLOCK_LEN];
        iv[..4].copy_from_slice(&(i as u32).to_be_bytes());
        chunk.copy_from_slice(&bcc(&df_cipher, &iv, &s));
    }
    s.zeroize();

    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&temp[..KEY_LEN]);
    let mut x = [0u8; BLOCK_LEN];
    x.copy_from_slice(&temp[KEY_LEN..]);
    temp.zeroize();

    let out_cipher = cipher(&key);
    let mut out = [0u8; SEED_LEN];
    for chunk in out.chunks_exact_mut(BLOCK_LEN) {
        x = encrypt(&out_cipher, &x);
        chunk.copy_from_slice(&x);
    }

    key.zeroize();
    x.zeroize();
    out
}

/// CBC-MAC over `iv || data` with a zero chaining value.
fn bcc(cipher: &Aes256, iv: &[u8; BLOCK_LEN], data: &[u8]) -> [u8; BLOCK_LEN] {
    let mut chain = encrypt(cipher, iv);
    for block in data.chunks_exact(BLOCK_LEN) {
        for (c, b) in chain.iter_mut().zip(block) {
            *c ^= b;
        }
        chain = encrypt(cipher, &chain);
    }
    chain
}
