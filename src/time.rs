use chrono::{Local, NaiveDate};

/// Clock abstracts access to the current date so report windows stay deterministic in tests.
pub trait Clock {
    /// Returns the calendar date expiry windows are measured from.
    fn today(&self) -> NaiveDate;
}

/// Real clock backed by the local calendar date.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to a single date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
