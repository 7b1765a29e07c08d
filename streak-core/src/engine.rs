//! Daily check-in state machine.
//!
//! `check_in` is a pure function of `(today, state)`; loading and saving the
//! state is the caller's job (see [`crate::tracker`]).

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::date::CalendarDate;

/// Persisted state of a single tracked habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakState {
    /// Consecutive days currently credited.
    pub count: u32,
    /// `None` means never checked in.
    pub last_check_in: Option<CalendarDate>,
}

impl StreakState {
    pub fn new(count: u32, last_check_in: Option<CalendarDate>) -> Self {
        Self {
            count,
            last_check_in,
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.count == 0 && self.last_check_in.is_none()
    }

    pub fn checked_in_on(&self, day: CalendarDate) -> bool {
        self.last_check_in == Some(day)
    }
}

/// How a check-in attempt was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Same calendar day as the last check-in; nothing changed.
    AlreadyCheckedIn,
    /// First ever check-in (or first after an explicit reset).
    Started,
    /// Exactly one day after the last check-in.
    Continued,
    /// Any other gap, including backdated/future clocks.
    Reset,
}

impl Outcome {
    /// Whether the caller needs to persist the returned state.
    pub fn mutates(&self) -> bool {
        !matches!(self, Outcome::AlreadyCheckedIn)
    }
}

/// Result of a single `check_in` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckIn {
    pub state: StreakState,
    pub outcome: Outcome,
}

/// Record a check-in for `today`.
///
/// `today` must be computed once by the caller so a single logical check-in
/// sees a single date.
pub fn check_in(today: CalendarDate, state: StreakState) -> CheckIn {
    let Some(last) = state.last_check_in else {
        debug!(%today, "first check-in");
        return CheckIn {
            state: StreakState::new(1, Some(today)),
            outcome: Outcome::Started,
        };
    };

    if last == today {
        debug!(%today, count = state.count, "already checked in today");
        return CheckIn {
            state,
            outcome: Outcome::AlreadyCheckedIn,
        };
    }

    let gap = last.days_until(today);
    let (count, outcome) = if gap == 1 {
        (state.count.saturating_add(1), Outcome::Continued)
    } else {
        if gap < 0 {
            warn!(%last, %today, "check-in date precedes last check-in; restarting streak");
        }
        (1, Outcome::Reset)
    };

    debug!(%last, %today, gap, previous = state.count, count, ?outcome, "check-in");
    CheckIn {
        state: StreakState::new(count, Some(today)),
        outcome,
    }
}

/// The state of a habit that has never been checked in.
pub fn reset() -> StreakState {
    StreakState::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> CalendarDate {
        CalendarDate::parse(s).unwrap()
    }

    #[test]
    fn test_fresh_state_starts_at_one() {
        let out = check_in(d("2024-01-01"), reset());
        assert_eq!(out.outcome, Outcome::Started);
        assert_eq!(out.state, StreakState::new(1, Some(d("2024-01-01"))));
    }

    #[test]
    fn test_same_day_is_idempotent() {
        let first = check_in(d("2024-01-01"), reset());
        let second = check_in(d("2024-01-01"), first.state);
        assert_eq!(second.outcome, Outcome::AlreadyCheckedIn);
        assert_eq!(second.state, first.state);
        assert!(!second.outcome.mutates());
    }

    #[test]
    fn test_next_day_continues() {
        let state = StreakState::new(9, Some(d("2024-02-28")));
        let out = check_in(d("2024-02-29"), state);
        assert_eq!(out.outcome, Outcome::Continued);
        assert_eq!(out.state.count, 10);
        assert_eq!(out.state.last_check_in, Some(d("2024-02-29")));
    }

    #[test]
    fn test_gap_resets_to_one() {
        let state = StreakState::new(250, Some(d("2024-01-01")));
        let out = check_in(d("2024-01-03"), state);
        assert_eq!(out.outcome, Outcome::Reset);
        assert_eq!(out.state, StreakState::new(1, Some(d("2024-01-03"))));
    }

    #[test]
    fn test_backdated_today_resets() {
        let state = StreakState::new(4, Some(d("2024-01-10")));
        let out = check_in(d("2024-01-09"), state);
        assert_eq!(out.outcome, Outcome::Reset);
        assert_eq!(out.state.count, 1);
        assert_eq!(out.state.last_check_in, Some(d("2024-01-09")));
    }

    #[test]
    fn test_absent_last_ignores_stale_count() {
        // Historical stores may hold a count without a date.
        let out = check_in(d("2024-01-01"), StreakState::new(7, None));
        assert_eq!(out.outcome, Outcome::Started);
        assert_eq!(out.state.count, 1);
    }

    #[test]
    fn test_count_saturates() {
        let state = StreakState::new(u32::MAX, Some(d("2024-01-01")));
        assert_eq!(check_in(d("2024-01-02"), state).state.count, u32::MAX);
    }

    #[test]
    fn test_reset_is_fresh() {
        assert!(reset().is_fresh());
    }
}
