//! Error types for RNG contexts.

use thiserror::Error;

/// Errors from seeding or drawing from an [`crate::RngContext`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RngError {
    /// Entropy source could not deliver bytes (OS RNG failure, starvation)
    #[error("entropy source failed: {reason}")]
    Entropy {
        /// Description from the entropy source
        reason: String,
    },

    /// Personalization string exceeds what the DRBG accepts as seed input
    #[error("personalization too long: {actual} bytes, at most {max} allowed")]
    PersonalizationTooLong {
        /// Maximum accepted length for the selected DRBG
        max: usize,
        /// Length that was supplied
        actual: usize,
    },

    /// Generate was called on a context that was never seeded
    #[error("RNG context used before seeding")]
    NotSeeded,

    /// Seed was called twice without an intervening teardown
    #[error("RNG context already seeded")]
    AlreadySeeded,
}

impl RngError {
    /// Returns true if the error is a lifecycle misuse by the caller rather
    /// than a resource failure.
    ///
    /// Misuse errors are deterministic: retrying the same call sequence
    /// fails the same way.
    pub fn is_misuse(&self) -> bool {
        matches!(self, Self::NotSeeded | Self::AlreadySeeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_errors_are_misuse() {
        assert!(RngError::NotSeeded.is_misuse());
        assert!(RngError::AlreadySeeded.is_misuse());
    }

    #[test]
    fn resource_errors_are_not_misuse() {
        assert!(!RngError::Entropy { reason: "starved".to_string() }.is_misuse());
        assert!(!RngError::PersonalizationTooLong { max: 10, actual: 11 }.is_misuse());
    }

    #[test]
    fn error_display() {
        let err = RngError::PersonalizationTooLong { max: 336, actual: 400 };
        assert_eq!(err.to_string(), "personalization too long: 400 bytes, at most 336 allowed");

        assert_eq!(RngError::NotSeeded.to_string(), "RNG context used before seeding");
    }
}
