use chrono::{DateTime, NaiveDate, Utc};

/// Source of "now" for date fallbacks and week-boundary checks.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar day of `now()`, time-of-day stripped.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to a single instant. Used by tests and by the CLI `--date` flag.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Midnight UTC of the given calendar day.
    pub fn at_day(day: NaiveDate) -> Self {
        FixedClock(day.and_time(chrono::NaiveTime::MIN).and_utc())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
