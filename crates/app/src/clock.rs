//! Clock

use std::fmt::Debug;

use jiff::Timestamp;

/// Source of the timestamps written by the services.
pub trait Clock: Debug + Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(Timestamp);

impl FixedClock {
    #[must_use]
    pub const fn new(at: Timestamp) -> Self {
        Self(at)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_always_returns_the_same_instant() {
        let at: Timestamp = "2026-01-01T00:00:00Z".parse().expect("valid timestamp");
        let clock = FixedClock::new(at);

        assert_eq!(clock.now(), at);
        assert_eq!(clock.now(), clock.now());
    }
}
