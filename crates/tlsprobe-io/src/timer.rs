//! Two-stage delay timer for DTLS retransmission.
//!
//! The protocol engine arms the timer with an intermediate and a final
//! delay. Polling reports which stage has elapsed. A final delay of zero
//! cancels the timer. Time is always passed in, so the same type serves
//! tokio's (possibly paused) clock and simulated clocks in tests.

use std::{ops::Add, time::Duration};

/// What [`DelayTimer::status`] observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    /// Not armed
    Cancelled,
    /// Armed, neither delay elapsed
    Running,
    /// Intermediate delay elapsed, final delay not yet
    IntermediateElapsed,
    /// Final delay elapsed
    Expired,
}

impl TimerStatus {
    /// Whether the final deadline has passed.
    pub fn is_expired(self) -> bool {
        self == Self::Expired
    }
}

#[derive(Debug, Clone, Copy)]
struct Deadlines<I> {
    intermediate: I,
    fin: I,
}

/// Intermediate/final delay timer.
#[derive(Debug, Clone, Copy)]
pub struct DelayTimer<I = tokio::time::Instant> {
    armed: Option<Deadlines<I>>,
}

impl<I> Default for DelayTimer<I> {
    fn default() -> Self {
        Self { armed: None }
    }
}

impl<I> DelayTimer<I>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    /// Cancelled timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm relative to `now`. A zero `fin` cancels.
    pub fn set(&mut self, now: I, intermediate: Duration, fin: Duration) {
        if fin.is_zero() {
            self.armed = None;
            return;
        }
        self.armed = Some(Deadlines { intermediate: now + intermediate, fin: now + fin });
    }

    /// Disarm.
    pub fn cancel(&mut self) {
        self.armed = None;
    }

    /// Stage reached at `now`.
    pub fn status(&self, now: I) -> TimerStatus {
        match self.armed {
            None => TimerStatus::Cancelled,
            Some(d) if now >= d.fin => TimerStatus::Expired,
            Some(d) if now >= d.intermediate => TimerStatus::IntermediateElapsed,
            Some(_) => TimerStatus::Running,
        }
    }

    /// Final deadline, if armed.
    pub fn deadline(&self) -> Option<I> {
        self.armed.map(|d| d.fin)
    }

    /// Whether the timer is armed.
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Millisecond clock for tests.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    struct Ms(u64);

    impl Add<Duration> for Ms {
        type Output = Ms;

        fn add(self, rhs: Duration) -> Ms {
            Ms(self.0 + rhs.as_millis() as u64)
        }
    }

    #[test]
    fn stages_in_order() {
        let mut timer = DelayTimer::new();
        timer.set(Ms(1000), Duration::from_millis(250), Duration::from_millis(1000));

        assert_eq!(timer.status(Ms(1000)), TimerStatus::Running);
        assert_eq!(timer.status(Ms(1249)), TimerStatus::Running);
        assert_eq!(timer.status(Ms(1250)), TimerStatus::IntermediateElapsed);
        assert_eq!(timer.status(Ms(1999)), TimerStatus::IntermediateElapsed);
        assert_eq!(timer.status(Ms(2000)), TimerStatus::Expired);
        assert_eq!(timer.deadline(), Some(Ms(2000)));
    }

    #[test]
    fn zero_final_delay_cancels() {
        let mut timer = DelayTimer::new();
        timer.set(Ms(0), Duration::from_millis(10), Duration::from_millis(40));
        assert!(timer.is_armed());

        timer.set(Ms(5), Duration::from_millis(10), Duration::ZERO);
        assert!(!timer.is_armed());
        assert_eq!(timer.status(Ms(100)), TimerStatus::Cancelled);
        assert_eq!(timer.deadline(), None);
    }

    #[test]
    fn rearming_replaces_deadlines() {
        let mut timer = DelayTimer::new();
        timer.set(Ms(0), Duration::from_millis(10), Duration::from_millis(40));
        timer.set(Ms(30), Duration::from_millis(10), Duration::from_millis(40));

        assert_eq!(timer.status(Ms(40)), TimerStatus::IntermediateElapsed);
        assert!(!timer.status(Ms(69)).is_expired());
        assert!(timer.status(Ms(70)).is_expired());
    }

    #[test]
    fn cancel_disarms() {
        let mut timer = DelayTimer::new();
        timer.set(Ms(0), Duration::ZERO, Duration::from_millis(1));
        timer.cancel();
        assert_eq!(timer.status(Ms(10)), TimerStatus::Cancelled);
    }

    #[test]
    fn works_with_tokio_instant() {
        let now = tokio::time::Instant::now();
        let mut timer: DelayTimer = DelayTimer::new();
        timer.set(now, Duration::from_millis(100), Duration::from_millis(200));
        assert_eq!(timer.status(now), TimerStatus::Running);
        assert_eq!(timer.deadline(), Some(now + Duration::from_millis(200)));
    }
}
