use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeZone};

use crate::model::state::StoreState;

/// What a reset check did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    /// A new day: `cleared` todos were unchecked and the marker advanced
    Reset { cleared: usize },
    /// Already reset today
    Current,
    /// The stored marker is ahead of today's date (clock moved back). The
    /// marker never moves backward, so nothing happens.
    AheadOfClock { last: NaiveDate },
}

impl ResetOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, ResetOutcome::Reset { .. })
    }
}

/// Clear every `completed` flag once per calendar day.
///
/// Runs when the marker is absent or older than `today`. Calling it again
/// on the same day is a no-op.
pub fn reset_if_due(state: &mut StoreState, today: NaiveDate) -> ResetOutcome {
    match state.last_reset_date {
        Some(last) if last == today => return ResetOutcome::Current,
        Some(last) if last > today => return ResetOutcome::AheadOfClock { last },
        _ => {}
    }

    let mut cleared = 0;
    for todo in &mut state.todos {
        if todo.completed {
            todo.completed = false;
            cleared += 1;
        }
    }
    state.last_reset_date = Some(today);
    ResetOutcome::Reset { cleared }
}

/// Time from `now` until the next local midnight in `now`'s time zone.
///
/// Returns `None` when the next midnight doesn't exist as a local time
/// (a DST gap at 00:00); the poll covers that day.
pub fn until_next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> Option<Duration> {
    let tomorrow = now.date_naive().succ_opt()?;
    let midnight = tomorrow
        .and_hms_opt(0, 0, 0)?
        .and_local_timezone(now.timezone())
        .earliest()?;
    midnight.signed_duration_since(now.clone()).to_std().ok()
}

/// `YYYY-MM-DD`, the format of `lastResetDate`
pub fn date_str(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::group::Group;
    use crate::model::todo::Todo;
    use chrono::{FixedOffset, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn state_with_done_todo(last: Option<NaiveDate>) -> StoreState {
        let mut s = StoreState::seeded(
            Group::new("default".into(), "Daily".into(), "red".into()),
            date(2024, 1, 1),
        );
        s.last_reset_date = last;
        let mut todo = Todo::new("t1".into(), "Stretch".into(), "default".into(), 0);
        todo.completed = true;
        s.todos.push(todo);
        s.todos
            .push(Todo::new("t2".into(), "Read".into(), "default".into(), 0));
        s
    }

    #[test]
    fn new_day_clears_completed() {
        let mut s = state_with_done_todo(Some(date(2024, 1, 1)));
        let outcome = reset_if_due(&mut s, date(2024, 1, 2));
        assert_eq!(outcome, ResetOutcome::Reset { cleared: 1 });
        assert!(s.todos.iter().all(|t| !t.completed));
        assert_eq!(s.last_reset_date, Some(date(2024, 1, 2)));
    }

    #[test]
    fn missing_marker_resets() {
        let mut s = state_with_done_todo(None);
        assert!(reset_if_due(&mut s, date(2024, 5, 5)).changed());
        assert_eq!(s.last_reset_date, Some(date(2024, 5, 5)));
    }

    #[test]
    fn second_check_same_day_is_noop() {
        let mut once = state_with_done_todo(Some(date(2024, 1, 1)));
        reset_if_due(&mut once, date(2024, 1, 2));

        let mut twice = once.clone();
        twice.todos[1].completed = true;
        let snapshot = twice.clone();
        assert_eq!(reset_if_due(&mut twice, date(2024, 1, 2)), ResetOutcome::Current);
        assert_eq!(twice, snapshot);
    }

    #[test]
    fn clock_behind_marker_does_not_move_it_back() {
        let mut s = state_with_done_todo(Some(date(2024, 1, 10)));
        let before = s.clone();
        assert_eq!(
            reset_if_due(&mut s, date(2024, 1, 9)),
            ResetOutcome::AheadOfClock {
                last: date(2024, 1, 10)
            }
        );
        assert_eq!(s, before);
    }

    #[test]
    fn midnight_distance() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 23, 30, 0).unwrap();
        assert_eq!(until_next_midnight(&now), Some(Duration::from_secs(30 * 60)));

        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(
            until_next_midnight(&now),
            Some(Duration::from_secs(24 * 3600))
        );
    }

    #[test]
    fn date_format() {
        assert_eq!(date_str(date(2024, 1, 2)), "2024-01-02");
    }
}
