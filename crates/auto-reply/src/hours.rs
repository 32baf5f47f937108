//! Picking today's line out of a provider's weekly opening hours.

use {
    chrono::{DateTime, Datelike, Utc},
    chrono_tz::Tz,
};

/// Shown instead of hours for a place that is closed temporarily.
pub const TEMPORARILY_CLOSED: &str = "Temporarily Closed";

/// Map a Sunday-first weekday (Sunday = 0) to the provider's Monday-first
/// index (Monday = 0, Sunday = 6).
#[must_use]
pub fn provider_day_index(days_from_sunday: u32) -> usize {
    ((days_from_sunday + 6) % 7) as usize
}

/// Today's provider index for a wall-clock instant seen from `tz`.
#[must_use]
pub fn today_index(now: DateTime<Utc>, tz: Tz) -> usize {
    provider_day_index(now.with_timezone(&tz).weekday().num_days_from_sunday())
}

/// Today's line from `weekly`, with the day/time separator turned into a comma:
/// `"Monday: 7:00 AM – 11:00 PM"` becomes `"Monday, 7:00 AM – 11:00 PM"`.
#[must_use]
pub fn todays_line(weekly: &[String], now: DateTime<Utc>, tz: Tz) -> Option<String> {
    weekly
        .get(today_index(now, tz))
        .map(|line| line.replacen(':', ",", 1))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, chrono::TimeZone, chrono_tz::America::New_York, rstest::rstest};

    fn week() -> Vec<String> {
        [
            "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
        ]
        .iter()
        .map(|d| format!("{d}: 7:00 AM – 11:00 PM"))
        .collect()
    }

    #[rstest]
    #[case::sunday(0, 6)]
    #[case::monday(1, 0)]
    #[case::tuesday(2, 1)]
    #[case::friday(5, 4)]
    #[case::saturday(6, 5)]
    fn sunday_first_to_monday_first(#[case] day: u32, #[case] expected: usize) {
        assert_eq!(provider_day_index(day), expected);
    }

    #[test]
    fn every_day_maps_to_a_distinct_index() {
        let mut seen: Vec<usize> = (0..7).map(provider_day_index).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn weekday_follows_eastern_time_not_utc() {
        // 2025-03-03 02:00 UTC is still Sunday evening in New York.
        let now = Utc.with_ymd_and_hms(2025, 3, 3, 2, 0, 0).unwrap();
        assert_eq!(today_index(now, New_York), 6);
        assert_eq!(
            todays_line(&week(), now, New_York).unwrap(),
            "Sunday, 7:00 AM – 11:00 PM"
        );
    }

    #[test]
    fn only_first_colon_becomes_comma() {
        // 2025-03-05 is a Wednesday.
        let now = Utc.with_ymd_and_hms(2025, 3, 5, 15, 0, 0).unwrap();
        assert_eq!(
            todays_line(&week(), now, New_York).unwrap(),
            "Wednesday, 7:00 AM – 11:00 PM"
        );
    }

    #[test]
    fn short_week_yields_none() {
        let now = Utc.with_ymd_and_hms(2025, 3, 2, 15, 0, 0).unwrap();
        assert!(todays_line(&week()[..3], now, New_York).is_none());
    }
}
