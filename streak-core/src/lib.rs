//! streak-core: daily check-in state machine and milestone progress.

pub mod date;
pub mod engine;
pub mod error;
pub mod milestones;
pub mod preferences;
pub mod reminders;
pub mod store;
pub mod tracker;

pub use date::CalendarDate;
pub use engine::{check_in, reset, CheckIn, Outcome, StreakState};
pub use error::{Result, StreakError};
pub use milestones::{
    check_celebration, next_milestone, progress, Celebration, CelebrationMemory, MilestoneView,
    MILESTONES,
};
pub use preferences::{Preferences, Theme, DEFAULT_NAME};
pub use reminders::{parse_remind_at, reminder_due, ReminderIntent, ReminderPolicy};
pub use store::{KeyValueStore, MemoryStore, StoreWrite};
pub use tracker::{CheckInReport, StatusReport, Tracker};
