//! Wall-clock access for the date-driven booking queries.

use chrono::{DateTime, Duration, NaiveTime, SecondsFormat, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// UTC midnight of `at`'s day.
pub fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// 23:59:59.999 UTC of `at`'s day.
pub fn end_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(at) + Duration::days(1) - Duration::milliseconds(1)
}

/// `2024-05-03T00:00:00.000Z`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn day_bounds() {
        let at = Utc.with_ymd_and_hms(2024, 5, 3, 14, 25, 7).unwrap();
        assert_eq!(format_timestamp(start_of_day(at)), "2024-05-03T00:00:00.000Z");
        assert_eq!(format_timestamp(end_of_day(at)), "2024-05-03T23:59:59.999Z");
    }
}
