//! Exported key material relayed from the protocol engine.
//!
//! The engine derives these values; the harness only stores them and
//! reports them so external tooling (EAP-TLS or DTLS-SRTP checkers) can
//! recompute the keying material.

use std::{fmt, marker::PhantomData};

use zeroize::Zeroize;

/// Length of a TLS master secret.
pub const MASTER_SECRET_LEN: usize = 48;

/// Length of one hello random (client or server).
pub const HELLO_RANDOM_LEN: usize = 32;

/// Length of the concatenated client and server randoms.
pub const RANDBYTES_LEN: usize = 2 * HELLO_RANDOM_LEN;

/// Upper bound on DTLS-SRTP keying material: a 16-byte AES-128 key and a
/// 14-byte salt for each of the sender and receiver contexts.
pub const SRTP_MAX_KEY_MATERIAL_LEN: usize = 60;

/// PRF family the engine used to derive the master secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TlsPrf {
    /// No PRF negotiated
    #[default]
    None,
    /// SSL 3.0
    Ssl3,
    /// TLS 1.0 / 1.1 (MD5 + SHA-1)
    Tls1,
    /// TLS 1.2 with SHA-256
    Sha256,
    /// TLS 1.2 with SHA-384
    Sha384,
}

/// What exported keys are for. Selects the exporter label.
pub trait KeyPurpose {
    /// Label passed to the TLS exporter.
    const LABEL: &'static str;
}

/// EAP-TLS key export.
#[derive(Debug)]
pub enum Eap {}

/// DTLS-SRTP key export.
#[derive(Debug)]
pub enum Srtp {}

impl KeyPurpose for Eap {
    const LABEL: &'static str = "client EAP encryption";
}

impl KeyPurpose for Srtp {
    const LABEL: &'static str = "EXTRACTOR-dtls_srtp";
}

/// Master secret, hello randoms and PRF tag captured from a handshake.
///
/// Zeroized on drop. `Debug` redacts the secret.
pub struct ExportedKeys<P: KeyPurpose> {
    master_secret: [u8; MASTER_SECRET_LEN],
    randbytes: [u8; RANDBYTES_LEN],
    prf: TlsPrf,
    _purpose: PhantomData<P>,
}

/// Key material for EAP-TLS.
pub type EapKeyMaterial = ExportedKeys<Eap>;

/// Key material for DTLS-SRTP.
pub type SrtpKeyMaterial = ExportedKeys<Srtp>;

impl<P: KeyPurpose> ExportedKeys<P> {
    /// Build from a master secret and the already-concatenated randoms.
    pub fn new(
        master_secret: [u8; MASTER_SECRET_LEN],
        randbytes: [u8; RANDBYTES_LEN],
        prf: TlsPrf,
    ) -> Self {
        Self { master_secret, randbytes, prf, _purpose: PhantomData }
    }

    /// Capture keys as the engine's export hook delivers them: client random
    /// first, then server random.
    pub fn capture(
        master_secret: &[u8; MASTER_SECRET_LEN],
        client_random: &[u8; HELLO_RANDOM_LEN],
        server_random: &[u8; HELLO_RANDOM_LEN],
        prf: TlsPrf,
    ) -> Self {
        let mut randbytes = [0u8; RANDBYTES_LEN];
        randbytes[..HELLO_RANDOM_LEN].copy_from_slice(client_random);
        randbytes[HELLO_RANDOM_LEN..].copy_from_slice(server_random);
        Self::new(*master_secret, randbytes, prf)
    }

    /// The 48-byte master secret.
    pub fn master_secret(&self) -> &[u8; MASTER_SECRET_LEN] {
        &self.master_secret
    }

    /// Client random followed by server random.
    pub fn randbytes(&self) -> &[u8; RANDBYTES_LEN] {
        &self.randbytes
    }

    /// Client hello random.
    pub fn client_random(&self) -> &[u8] {
        &self.randbytes[..HELLO_RANDOM_LEN]
    }

    /// Server hello random.
    pub fn server_random(&self) -> &[u8] {
        &self.randbytes[HELLO_RANDOM_LEN..]
    }

    /// PRF family tag.
    pub fn prf(&self) -> TlsPrf {
        self.prf
    }

    /// Exporter label for this purpose.
    pub fn label(&self) -> &'static str {
        P::LABEL
    }

    /// Hex dump for external reporting.
    pub fn hex_report(&self) -> String {
        format!(
            "label: {}\nprf: {:?}\nmaster secret: {}\nrandom: {}",
            P::LABEL,
            self.prf,
            hex::encode(self.master_secret),
            hex::encode(self.randbytes),
        )
    }
}

impl<P: KeyPurpose> Clone for ExportedKeys<P> {
    fn clone(&self) -> Self {
        Self::new(self.master_secret, self.randbytes, self.prf)
    }
}

impl<P: KeyPurpose> PartialEq for ExportedKeys<P> {
    fn eq(&self, other: &Self) -> bool {
        self.master_secret == other.master_secret
            && self.randbytes == other.randbytes
            && self.prf == other.prf
    }
}

impl<P: KeyPurpose> Eq for ExportedKeys<P> {}

impl<P: KeyPurpose> fmt::Debug for ExportedKeys<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportedKeys")
            .field("label", &P::LABEL)
            .field("master_secret", &"<redacted>")
            .field("randbytes", &hex::encode(self.randbytes))
            .field("prf", &self.prf)
            .finish()
    }
}

impl<P: KeyPurpose> Drop for ExportedKeys<P> {
    fn drop(&mut self) {
        self.master_secret.zeroize();
        self.randbytes.zeroize();
    }
}
