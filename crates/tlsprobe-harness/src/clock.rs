//! Wall-clock source for certificate validity checks.
//!
//! Reproducible runs pin the time so that certificate expiry cannot make a
//! replayed run diverge.

use std::time::{SystemTime, UNIX_EPOCH};

/// Unix time reported in fixed-time mode (2019-12-17 23:24:32 UTC).
pub const FIXED_UNIX_TIME: u64 = 0x5DF9_63B0;

/// Where Unix time comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeSource {
    /// The system clock
    #[default]
    System,
    /// A constant
    Fixed(u64),
}

impl TimeSource {
    /// Fixed at [`FIXED_UNIX_TIME`].
    pub fn fixed() -> Self {
        Self::Fixed(FIXED_UNIX_TIME)
    }

    /// Seconds since the Unix epoch.
    ///
    /// A system clock set before the epoch reads as 0.
    pub fn unix_time(&self) -> u64 {
        match self {
            Self::Fixed(secs) => *secs,
            Self::System => {
                #[allow(clippy::disallowed_methods)]
                let now = SystemTime::now();
                now.duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_time_is_constant() {
        let clock = TimeSource::fixed();
        assert_eq!(clock.unix_time(), 1_576_625_072);
        assert_eq!(clock.unix_time(), clock.unix_time());
    }

    #[test]
    fn system_time_is_after_fixed_time() {
        assert!(TimeSource::System.unix_time() > FIXED_UNIX_TIME);
    }
}
