//! Pure view-model logic for the billboard listing: filter composition,
//! date sorting and the this-week / upcoming partition.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};

use crate::models::{EventType, EventView};

/// Three independent optional predicates combined with AND semantics.
/// An empty filter returns the collection unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub event_type: Option<EventType>,
    pub province: Option<String>,
    pub city: Option<String>,
}

impl EventFilter {
    pub fn is_empty(&self) -> bool {
        self.event_type.is_none() && self.province.is_none() && self.city.is_none()
    }

    pub fn matches(&self, event: &EventView) -> bool {
        if let Some(t) = self.event_type {
            if event.event.event_type != t {
                return false;
            }
        }
        if let Some(p) = &self.province {
            if &event.event.province != p {
                return false;
            }
        }
        if let Some(c) = &self.city {
            if &event.event.city != c {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, events: &[EventView]) -> Vec<EventView> {
        events.iter().filter(|e| self.matches(e)).cloned().collect()
    }
}

/// Sort events ascending by date. Stable, so equal dates keep their
/// relative order from the fetch.
pub fn sort_by_date(events: &mut [EventView]) {
    events.sort_by_key(|e| e.event.date);
}

/// Calendar-week bounds containing `today`: Monday 00:00:00 through
/// Sunday 23:59:59 inclusive.
pub fn week_bounds(today: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let days_from_monday = today.weekday().num_days_from_monday() as i64;
    let monday = (today.date_naive() - Duration::days(days_from_monday))
        .and_time(NaiveTime::MIN)
        .and_utc();
    let sunday_end = (monday.date_naive() + Duration::days(6))
        .and_time(NaiveTime::from_hms_opt(23, 59, 59).expect("valid time"))
        .and_utc();
    (monday, sunday_end)
}

/// Split an ascending-by-date collection into (this week, later).
/// Events before this week's Monday fall in neither bucket.
pub fn partition_week(
    events: &[EventView],
    today: DateTime<Utc>,
) -> (Vec<EventView>, Vec<EventView>) {
    let (monday, sunday_end) = week_bounds(today);

    let this_week = events
        .iter()
        .filter(|e| e.event.date >= monday && e.event.date <= sunday_end)
        .cloned()
        .collect();

    let upcoming = events
        .iter()
        .filter(|e| e.event.date > sunday_end)
        .cloned()
        .collect();

    (this_week, upcoming)
}
