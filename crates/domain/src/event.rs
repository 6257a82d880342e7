use crate::shared::entity::{Entity, ID};
use chrono::{TimeZone, Utc};
use chrono_tz::Tz;

const MILLIS_PER_HOUR: f64 = 1000.0 * 60.0 * 60.0;

/// An `Event` hosted by a `Club`
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: ID,
    pub title: String,
    /// Start of the `Event` as a unix timestamp in millis
    pub start_ts: i64,
    /// The `Club` organizing this `Event`
    pub club_id: Option<ID>,
}

impl Event {
    pub fn new(title: impl Into<String>, start_ts: i64, club_id: Option<ID>) -> Self {
        Self {
            id: Default::default(),
            title: title.into(),
            start_ts,
            club_id,
        }
    }

    /// The instant a reminder sent `hours_before` the start of this `Event` should fire.
    pub fn reminder_fire_at(&self, hours_before: f64) -> i64 {
        self.start_ts - (hours_before * MILLIS_PER_HOUR).round() as i64
    }

    /// Human readable start time of the `Event` in the given timezone
    pub fn formatted_start(&self, tz: &Tz) -> String {
        match Utc.timestamp_millis_opt(self.start_ts).single() {
            Some(start) => start
                .with_timezone(tz)
                .format("%a, %e %b %Y %H:%M %Z")
                .to_string(),
            None => self.start_ts.to_string(),
        }
    }
}

impl Entity for Event {
    fn id(&self) -> &ID {
        &self.id
    }
}
