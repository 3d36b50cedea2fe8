use chrono::{DateTime, Local, Timelike, Utc};

use crate::models::TimeOfDay;

/// Source of "now" for expiry checks and time-of-day bucketing
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Hour of the day used to bucket requests that omit a time of day
    fn local_hour(&self) -> u32 {
        self.now().with_timezone(&Local).hour()
    }

    fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay::from_hour(self.local_hour())
    }
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to one instant, bucketed in UTC
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }

    fn local_hour(&self) -> u32 {
        self.0.hour()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock_buckets_in_utc() {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 13, 30, 0).unwrap());
        assert_eq!(clock.local_hour(), 13);
        assert_eq!(clock.time_of_day(), TimeOfDay::Afternoon);
    }

    #[test]
    fn test_fixed_clock_late_night() {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 23, 5, 0).unwrap());
        assert_eq!(clock.time_of_day(), TimeOfDay::Night);
    }
}
