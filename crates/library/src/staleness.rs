use time::{Date, Duration, OffsetDateTime};

/// When a stored record is old enough to fetch again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Staleness {
    pub max_age_days: u32,
}

impl Default for Staleness {
    fn default() -> Self {
        Self { max_age_days: 30 }
    }
}

impl Staleness {
    pub fn new(max_age_days: u32) -> Self {
        Self { max_age_days }
    }

    /// A record never fetched is stale; otherwise it is stale once
    /// `max_age_days` whole days have passed since `last`.
    pub fn is_stale(&self, last: Option<Date>, today: Date) -> bool {
        match last {
            None => true,
            Some(_) if self.max_age_days == 0 => true,
            Some(last) => (today - last).whole_days() >= i64::from(self.max_age_days),
        }
    }

    /// The earliest date that still counts as fresh on `today`: a record is
    /// stale iff it was last updated before this date.
    pub fn fresh_since(&self, today: Date) -> Date {
        today.saturating_add(Duration::days(1 - i64::from(self.max_age_days)))
    }

    pub fn fresh_since_today(&self) -> Date {
        self.fresh_since(today())
    }
}

pub(crate) fn today() -> Date {
    OffsetDateTime::now_utc().date()
}
