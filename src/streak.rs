use crate::models::Streak;
use chrono::{Duration, NaiveDate};

/// Applies one completion event to a habit's streak state.
///
/// Called only when an entry's `completed` is true; a day logged below
/// target neither resets nor advances the streak. Assumes events arrive in
/// non-decreasing date order; backfilled past dates are not reconciled.
pub fn advance(streak: &Streak, day: NaiveDate, yesterday_completed: bool) -> Streak {
    let current = if yesterday_completed {
        streak.current + 1
    } else {
        1
    };

    Streak {
        current,
        longest: streak.longest.max(current),
        last_completed: Some(day),
    }
}

pub fn previous_day(day: NaiveDate) -> NaiveDate {
    day - Duration::days(1)
}
