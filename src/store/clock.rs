use chrono::{DateTime, Local, NaiveDate};

/// Source of "now" for the store: creation timestamps and the reset date.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    /// Local calendar date
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// The machine's wall clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}
