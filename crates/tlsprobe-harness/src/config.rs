//! Test-program configuration.

use std::{fmt, str::FromStr, time::Duration};

use tlsprobe_crypto::DrbgKind;

use crate::error::HarnessError;

/// Lower bound of the DTLS handshake retransmission timeout.
pub const DEFAULT_HS_TIMEOUT_MIN: Duration = Duration::from_secs(1);

/// Upper bound of the DTLS handshake retransmission timeout.
pub const DEFAULT_HS_TIMEOUT_MAX: Duration = Duration::from_secs(60);

/// How the driver reacts to "would block".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IoMode {
    /// Injected retries are retried at once; only a genuinely stalled
    /// transport is waited on, bounded by the read timeout
    #[default]
    Blocking,
    /// Every "would block" goes through the idler, bounded by the
    /// retransmission timer or the read timeout
    EventDriven,
}

impl fmt::Display for IoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocking => f.write_str("blocking"),
            Self::EventDriven => f.write_str("event"),
        }
    }
}

impl FromStr for IoMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blocking" | "block" => Ok(Self::Blocking),
            "event" | "event-driven" | "nbio" => Ok(Self::EventDriven),
            other => Err(format!("unknown I/O mode: {other}")),
        }
    }
}

/// Harness configuration for one simulated peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// DRBG mechanism for the peer's RNG
    pub drbg: DrbgKind,
    /// Seed from the fixed seed instead of OS entropy
    pub reproducible: bool,
    /// Personalization string mixed into the DRBG
    pub personalization: Vec<u8>,
    /// Retry behavior on "would block"
    pub io_mode: IoMode,
    /// Wrap the transport so every operation is retried once
    pub delay_io: bool,
    /// Report a constant Unix time instead of the wall clock
    pub fixed_time: bool,
    /// Minimum DTLS handshake retransmission timeout
    pub hs_timeout_min: Duration,
    /// Maximum DTLS handshake retransmission timeout
    pub hs_timeout_max: Duration,
    /// Bound on a single stalled read or write. `None` waits forever.
    pub read_timeout: Option<Duration>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            drbg: DrbgKind::default(),
            reproducible: false,
            personalization: Vec::new(),
            io_mode: IoMode::default(),
            delay_io: false,
            fixed_time: false,
            hs_timeout_min: DEFAULT_HS_TIMEOUT_MIN,
            hs_timeout_max: DEFAULT_HS_TIMEOUT_MAX,
            read_timeout: None,
        }
    }
}

impl HarnessConfig {
    /// Reject inconsistent settings before any resource is acquired.
    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.hs_timeout_min.is_zero() {
            return Err(HarnessError::Config("handshake timeout minimum must be non-zero".into()));
        }
        if self.hs_timeout_min > self.hs_timeout_max {
            return Err(HarnessError::Config(format!(
                "handshake timeout minimum {:?} exceeds maximum {:?}",
                self.hs_timeout_min, self.hs_timeout_max
            )));
        }
        if self.read_timeout.is_some_and(|t| t.is_zero()) {
            return Err(HarnessError::Config("read timeout must be non-zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = HarnessConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.hs_timeout_min, Duration::from_secs(1));
        assert_eq!(config.hs_timeout_max, Duration::from_secs(60));
        assert_eq!(config.io_mode, IoMode::Blocking);
    }

    #[test]
    fn inverted_handshake_bounds_rejected() {
        let config = HarnessConfig {
            hs_timeout_min: Duration::from_secs(10),
            hs_timeout_max: Duration::from_secs(5),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(HarnessError::Config(_))));
    }

    #[test]
    fn zero_timeouts_rejected() {
        let config = HarnessConfig { hs_timeout_min: Duration::ZERO, ..Default::default() };
        assert!(config.validate().is_err());

        let config = HarnessConfig { read_timeout: Some(Duration::ZERO), ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn io_mode_parses() {
        assert_eq!("nbio".parse::<IoMode>(), Ok(IoMode::EventDriven));
        assert_eq!("Blocking".parse::<IoMode>(), Ok(IoMode::Blocking));
        assert!("poll".parse::<IoMode>().is_err());
        assert_eq!(IoMode::EventDriven.to_string().parse::<IoMode>(), Ok(IoMode::EventDriven));
    }
}
