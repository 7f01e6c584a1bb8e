//! Splits a customer's bookings into upcoming and previous stays.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::lenient;
use crate::sort::{SortFields, SortKey, SortValue, multi_key_sort};

const CHECK_IN_FIELD: &str = "check_in";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingSummary {
    pub order_number: String,
    #[serde(default)]
    pub hotel_name: Option<String>,
    #[serde(default)]
    pub check_in: Option<NaiveDate>,
    #[serde(default)]
    pub check_out: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub lng: Option<f64>,
    #[serde(default)]
    pub img_url: Option<String>,
}

impl BookingSummary {
    /// A stay is over once the day after check-out has started.
    pub fn is_previous(&self, today: NaiveDate) -> bool {
        self.check_out
            .and_then(|check_out| check_out.checked_add_days(Days::new(1)))
            .is_some_and(|day_after| day_after <= today)
    }

    const fn has_stay_dates(&self) -> bool {
        self.check_in.is_some() && self.check_out.is_some()
    }
}

impl SortFields for BookingSummary {
    fn sort_value(&self, field: &str) -> Option<SortValue> {
        match field {
            "check_in" => self.check_in.map(SortValue::from),
            "check_out" => self.check_out.map(SortValue::from),
            "order_number" => Some(self.order_number.as_str().into()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookingTimeline {
    /// Soonest check-in first.
    pub upcoming: Vec<BookingSummary>,
    /// Latest check-in first.
    pub previous: Vec<BookingSummary>,
}

impl BookingTimeline {
    pub fn is_empty(&self) -> bool {
        self.upcoming.is_empty() && self.previous.is_empty()
    }
}

/// Bookings without both dates are left out.
#[instrument(name = "Split Bookings", level = "debug", skip(bookings), fields(num_bookings = bookings.len()))]
pub fn split_bookings(bookings: Vec<BookingSummary>, today: NaiveDate) -> BookingTimeline {
    let (previous, upcoming): (Vec<_>, Vec<_>) = bookings
        .into_iter()
        .filter(BookingSummary::has_stay_dates)
        .partition(|booking| booking.is_previous(today));
    debug!(upcoming = upcoming.len(), previous = previous.len(), "Bookings split");

    BookingTimeline {
        upcoming: multi_key_sort(upcoming, &[SortKey::ascending(CHECK_IN_FIELD)]),
        previous: multi_key_sort(previous, &[SortKey::descending(CHECK_IN_FIELD)]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    fn booking(order: &str, check_in: Option<NaiveDate>, check_out: Option<NaiveDate>) -> BookingSummary {
        BookingSummary {
            order_number: order.to_string(),
            hotel_name: None,
            check_in,
            check_out,
            lat: None,
            lng: None,
            img_url: None,
        }
    }

    fn orders(bookings: &[BookingSummary]) -> Vec<&str> {
        bookings.iter().map(|b| b.order_number.as_str()).collect()
    }

    #[test]
    fn test_check_out_day_is_still_upcoming() {
        let today = date(6, 10);
        let timeline = split_bookings(
            vec![
                booking("yesterday", Some(date(6, 7)), Some(date(6, 9))),
                booking("today", Some(date(6, 8)), Some(date(6, 10))),
            ],
            today,
        );
        assert_eq!(orders(&timeline.previous), vec!["yesterday"]);
        assert_eq!(orders(&timeline.upcoming), vec!["today"]);
    }

    #[test]
    fn test_timeline_ordering() {
        let timeline = split_bookings(
            vec![
                booking("p-old", Some(date(1, 1)), Some(date(1, 3))),
                booking("u-late", Some(date(9, 1)), Some(date(9, 5))),
                booking("p-new", Some(date(3, 1)), Some(date(3, 2))),
                booking("u-soon", Some(date(7, 1)), Some(date(7, 4))),
            ],
            date(6, 1),
        );
        assert_eq!(orders(&timeline.upcoming), vec!["u-soon", "u-late"]);
        assert_eq!(orders(&timeline.previous), vec!["p-new", "p-old"]);
    }

    #[test]
    fn test_bookings_without_dates_are_dropped() {
        let timeline = split_bookings(
            vec![
                booking("no-in", None, Some(date(1, 3))),
                booking("no-out", Some(date(1, 1)), None),
            ],
            date(6, 1),
        );
        assert!(timeline.is_empty());
    }

    #[test]
    fn test_decoding_with_iso_dates() {
        let booking: BookingSummary = serde_json::from_value(serde_json::json!({
            "order_number": "HW-1",
            "check_in": "2024-06-01",
            "check_out": "2024-06-03",
            "lat": "25.1"
        }))
        .unwrap();
        assert_eq!(booking.check_out, Some(date(6, 3)));
        assert_eq!(booking.lat, Some(25.1));
    }
}
