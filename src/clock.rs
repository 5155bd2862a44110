//! Business clock.
//!
//! "Today" is always a calendar day in one fixed IANA timezone. The engine asks
//! the clock on every call and never caches the answer, so two requests
//! straddling local midnight are judged independently.

use crate::domain::BusinessDate;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::sync::Mutex;

/// Default business timezone.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Ho_Chi_Minh;

pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Timezone used to derive business dates.
    fn timezone(&self) -> Tz;

    /// Today's calendar day in the business timezone.
    fn business_today(&self) -> BusinessDate {
        business_date_at(self.now(), self.timezone())
    }
}

/// Convert an instant to the business calendar day.
pub fn business_date_at(instant: DateTime<Utc>, tz: Tz) -> BusinessDate {
    BusinessDate::new(instant.with_timezone(&tz).date_naive())
}

/// Wall-clock backed [`Clock`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEZONE)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn timezone(&self) -> Tz {
        self.tz
    }
}

/// Manually driven [`Clock`] for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
    tz: Tz,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>, tz: Tz) -> Self {
        Self {
            now: Mutex::new(now),
            tz,
        }
    }

    /// Clock pinned to local noon of `date` in `tz`.
    pub fn at_local_noon(date: BusinessDate, tz: Tz) -> Self {
        use chrono::TimeZone;
        let local = date
            .as_naive()
            .and_hms_opt(12, 0, 0)
            .and_then(|naive| tz.from_local_datetime(&naive).single())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);
        Self::new(local, tz)
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.lock();
        *guard += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }

    fn timezone(&self) -> Tz {
        self.tz
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_business_date_uses_local_day() {
        // 2026-10-19 18:30 UTC is already 2026-10-20 01:30 in Ho Chi Minh City.
        let instant = Utc.with_ymd_and_hms(2026, 10, 19, 18, 30, 0).unwrap();
        let date = business_date_at(instant, DEFAULT_TIMEZONE);
        assert_eq!(date.to_string(), "2026-10-20");

        let date = business_date_at(instant, chrono_tz::UTC);
        assert_eq!(date.to_string(), "2026-10-19");
    }

    #[test]
    fn test_fixed_clock_crosses_midnight() {
        let today = BusinessDate::from_ymd(2026, 10, 19).unwrap();
        let clock = FixedClock::at_local_noon(today, DEFAULT_TIMEZONE);
        assert_eq!(clock.business_today(), today);

        clock.advance(Duration::hours(12));
        assert_eq!(clock.business_today(), today.succ().unwrap());
    }
}
