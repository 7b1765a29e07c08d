//! Daily reminder policy + evaluation. Delivery is left to the host.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::date::CalendarDate;
use crate::engine::StreakState;
use crate::error::{Result, StreakError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderPolicy {
    pub enabled: bool,
    /// Local time of day after which a missing check-in is worth a nudge.
    pub remind_at: NaiveTime,
}

impl Default for ReminderPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            remind_at: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderIntent {
    pub title: String,
    pub body: String,
    /// One key per calendar day; senders skip keys they already used.
    pub dedupe_key: String,
}

/// Parse an `HH:MM` time of day.
pub fn parse_remind_at(input: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(input.trim(), "%H:%M").map_err(|_| StreakError::InvalidTime {
        input: input.to_string(),
    })
}

/// Deterministically decide whether a reminder is due right now.
pub fn reminder_due(
    policy: ReminderPolicy,
    today: CalendarDate,
    now: NaiveTime,
    state: &StreakState,
    name: &str,
) -> Option<ReminderIntent> {
    if !policy.enabled || now < policy.remind_at || state.checked_in_on(today) {
        return None;
    }

    // A streak is still alive if yesterday was the last check-in.
    let at_risk = state
        .last_check_in
        .map(|last| last.days_until(today) == 1)
        .unwrap_or(false);

    let body = if at_risk {
        format!(
            "Check in today to keep your {}-day streak going.",
            state.count
        )
    } else {
        "No check-in yet today. A fresh streak starts with one.".to_string()
    };

    Some(ReminderIntent {
        title: format!("Reminder: {name}"),
        body,
        dedupe_key: format!("streak-reminder:{today}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> CalendarDate {
        CalendarDate::parse(s).unwrap()
    }

    fn t(s: &str) -> NaiveTime {
        parse_remind_at(s).unwrap()
    }

    fn enabled() -> ReminderPolicy {
        ReminderPolicy {
            enabled: true,
            remind_at: t("20:00"),
        }
    }

    #[test]
    fn disabled_policy_emits_none() {
        let out = reminder_due(
            ReminderPolicy::default(),
            d("2024-01-02"),
            t("23:00"),
            &StreakState::default(),
            "Gym",
        );
        assert!(out.is_none());
    }

    #[test]
    fn before_remind_at_emits_none() {
        let out = reminder_due(enabled(), d("2024-01-02"), t("19:59"), &StreakState::default(), "Gym");
        assert!(out.is_none());
    }

    #[test]
    fn checked_in_today_emits_none() {
        let state = StreakState::new(3, Some(d("2024-01-02")));
        assert!(reminder_due(enabled(), d("2024-01-02"), t("21:00"), &state, "Gym").is_none());
    }

    #[test]
    fn at_risk_streak_mentions_count() {
        let state = StreakState::new(12, Some(d("2024-01-01")));
        let out = reminder_due(enabled(), d("2024-01-02"), t("20:00"), &state, "Gym").unwrap();
        assert_eq!(out.title, "Reminder: Gym");
        assert!(out.body.contains("12-day"));
        assert_eq!(out.dedupe_key, "streak-reminder:2024-01-02");
    }

    #[test]
    fn rejects_bad_time() {
        assert!(parse_remind_at("8pm").is_err());
        assert!(parse_remind_at("25:00").is_err());
    }
}
