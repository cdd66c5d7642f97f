use time::{Date, OffsetDateTime};

use crate::model::TimeStamp;

/// Source of "now". Injected so ids, `createdAt` and date buckets are
/// deterministic under test.
pub trait Clock {
    fn now(&self) -> TimeStamp;

    /// Calendar date of `now()` in the clock's own offset.
    fn today(&self) -> Date {
        self.now().date()
    }
}

/// Wall clock in the local offset, falling back to UTC when the offset
/// cannot be determined (e.g. multi-threaded processes on some Unixes).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimeStamp {
        OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub TimeStamp);

impl Clock for FixedClock {
    fn now(&self) -> TimeStamp {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> TimeStamp {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn fixed_clock_today_uses_its_offset() {
        let clock = FixedClock(datetime!(2025-01-10 23:30 -05:00));
        assert_eq!(clock.today(), date!(2025 - 01 - 10));
    }
}
