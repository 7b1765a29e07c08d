//! Load → transition → persist, over any [`KeyValueStore`].
//!
//! Each call reads persisted state once, computes the new values on local
//! copies, and persists them as a single all-or-nothing batch, so a failed
//! write leaves the previous state intact.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::date::CalendarDate;
use crate::engine::{self, Outcome, StreakState};
use crate::error::Result;
use crate::milestones::{self, CelebrationMemory, MilestoneView};
use crate::preferences::{self, Preferences, Theme};
use crate::store::{self, KeyValueStore};

/// What a check-in did, for the host to render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckInReport {
    pub outcome: Outcome,
    pub state: StreakState,
    pub milestones: MilestoneView,
    /// Milestone reached by this check-in, reported once.
    pub celebrated: Option<u32>,
}

/// Snapshot for status displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub preferences: Preferences,
    pub state: StreakState,
    pub checked_in_today: bool,
    pub milestones: MilestoneView,
    pub last_milestone_shown: u32,
}

pub struct Tracker<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> Tracker<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn check_in(&mut self, today: CalendarDate) -> Result<CheckInReport> {
        let state = store::load_state(&self.store)?;
        let memory = store::load_celebration(&self.store)?;

        let step = engine::check_in(today, state);
        let view = MilestoneView::for_count(step.state.count);
        if !step.outcome.mutates() {
            return Ok(CheckInReport {
                outcome: step.outcome,
                state: step.state,
                milestones: view,
                celebrated: None,
            });
        }

        if step.outcome == Outcome::Reset && state.count > 1 {
            warn!(lost = state.count, "streak broken");
        }

        let celebration = milestones::check_celebration(step.state.count, memory);

        let mut batch = store::state_writes(&step.state);
        if celebration.memory != memory {
            batch.push(store::celebration_write(celebration.memory));
        }
        self.store.apply(&batch)?;

        info!(count = step.state.count, outcome = ?step.outcome, "checked in");
        Ok(CheckInReport {
            outcome: step.outcome,
            state: step.state,
            milestones: view,
            celebrated: celebration.milestone,
        })
    }

    /// Zero the streak and the celebration memory, so every milestone can be
    /// celebrated again on the way back up.
    pub fn reset(&mut self) -> Result<StreakState> {
        let state = engine::reset();
        let mut batch = store::state_writes(&state);
        batch.push(store::celebration_write(CelebrationMemory::default()));
        self.store.apply(&batch)?;
        info!("streak reset");
        Ok(state)
    }

    pub fn status(&self, today: CalendarDate) -> Result<StatusReport> {
        let state = store::load_state(&self.store)?;
        let memory = store::load_celebration(&self.store)?;
        let preferences = store::load_preferences(&self.store)?;
        Ok(StatusReport {
            preferences,
            state,
            checked_in_today: state.checked_in_on(today),
            milestones: MilestoneView::for_count(state.count),
            last_milestone_shown: memory.last_shown(),
        })
    }

    pub fn preferences(&self) -> Result<Preferences> {
        store::load_preferences(&self.store)
    }

    pub fn set_name(&mut self, input: &str) -> Result<String> {
        let name = preferences::normalize_name(input)?;
        store::save_name(&mut self.store, &name)?;
        Ok(name)
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<Theme> {
        store::save_theme(&mut self.store, theme)?;
        Ok(theme)
    }

    pub fn toggle_theme(&mut self) -> Result<Theme> {
        let current = store::load_preferences(&self.store)?.theme;
        self.set_theme(current.toggled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StreakError;
    use crate::store::{keys, MemoryStore, StoreWrite};

    /// Memory store whose next `apply` fails, like a full disk.
    struct FailingStore {
        inner: MemoryStore,
        fail_next: bool,
    }

    impl KeyValueStore for FailingStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn apply(&mut self, batch: &[StoreWrite]) -> Result<()> {
            if std::mem::take(&mut self.fail_next) {
                return Err(StreakError::Store("disk full".to_string()));
            }
            self.inner.apply(batch)
        }
    }

    fn d(s: &str) -> CalendarDate {
        CalendarDate::parse(s).unwrap()
    }

    #[test]
    fn test_first_check_in_celebrates_one() {
        let mut tracker = Tracker::new(MemoryStore::new());
        let r = tracker.check_in(d("2024-01-01")).unwrap();
        assert_eq!(r.outcome, Outcome::Started);
        assert_eq!(r.celebrated, Some(1));
        assert_eq!(r.milestones.next, Some(5));
        assert_eq!(tracker.store().entries()[keys::LAST_MILESTONE], "1");
    }

    #[test]
    fn test_repeat_check_in_writes_nothing() {
        let mut tracker = Tracker::new(MemoryStore::new());
        tracker.check_in(d("2024-01-01")).unwrap();
        let before = tracker.store().clone();

        let r = tracker.check_in(d("2024-01-01")).unwrap();
        assert_eq!(r.outcome, Outcome::AlreadyCheckedIn);
        assert_eq!(r.celebrated, None);
        assert_eq!(tracker.store(), &before);
    }

    #[test]
    fn test_reset_allows_celebrating_again() {
        let mut tracker = Tracker::new(MemoryStore::new());
        assert_eq!(tracker.check_in(d("2024-01-01")).unwrap().celebrated, Some(1));
        tracker.reset().unwrap();

        let entries = tracker.store().entries();
        assert_eq!(entries[keys::COUNT], "0");
        assert_eq!(entries[keys::LAST_MILESTONE], "0");
        assert!(!entries.contains_key(keys::LAST_CHECKED));

        assert_eq!(tracker.check_in(d("2024-01-02")).unwrap().celebrated, Some(1));
    }

    #[test]
    fn test_corrupted_store_is_not_modified() {
        let store = MemoryStore::new().with_entry(keys::COUNT, "-4");
        let mut tracker = Tracker::new(store.clone());
        assert!(tracker.check_in(d("2024-01-01")).is_err());
        assert_eq!(tracker.store(), &store);
    }

    #[test]
    fn test_failed_write_leaves_store_untouched() {
        let before = MemoryStore::new()
            .with_entry(keys::COUNT, "3")
            .with_entry(keys::LAST_CHECKED, "2024-01-01");
        let mut tracker = Tracker::new(FailingStore {
            inner: before.clone(),
            fail_next: true,
        });

        assert!(tracker.check_in(d("2024-01-02")).is_err());
        assert_eq!(tracker.store().inner, before);

        // Retrying the same day credits it exactly once.
        let r = tracker.check_in(d("2024-01-02")).unwrap();
        assert_eq!(r.outcome, Outcome::Continued);
        assert_eq!(r.state.count, 4);
        assert_eq!(
            tracker.check_in(d("2024-01-02")).unwrap().outcome,
            Outcome::AlreadyCheckedIn
        );
    }

    #[test]
    fn test_failed_reset_keeps_streak() {
        let before = MemoryStore::new()
            .with_entry(keys::COUNT, "12")
            .with_entry(keys::LAST_CHECKED, "2024-01-01")
            .with_entry(keys::LAST_MILESTONE, "10");
        let mut tracker = Tracker::new(FailingStore {
            inner: before.clone(),
            fail_next: true,
        });
        assert!(tracker.reset().is_err());
        assert_eq!(tracker.store().inner, before);
    }

    #[test]
    fn test_status() {
        let mut tracker = Tracker::new(MemoryStore::new());
        tracker.set_name("  Reading ").unwrap();
        tracker.check_in(d("2024-01-01")).unwrap();

        let s = tracker.status(d("2024-01-01")).unwrap();
        assert_eq!(s.preferences.name, "Reading");
        assert!(s.checked_in_today);
        assert_eq!(s.last_milestone_shown, 1);

        assert!(!tracker.status(d("2024-01-02")).unwrap().checked_in_today);
    }

    #[test]
    fn test_theme_toggle_persists() {
        let mut tracker = Tracker::new(MemoryStore::new());
        assert_eq!(tracker.toggle_theme().unwrap(), Theme::Dark);
        assert_eq!(tracker.preferences().unwrap().theme, Theme::Dark);
        assert_eq!(tracker.toggle_theme().unwrap(), Theme::Light);
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut tracker = Tracker::new(MemoryStore::new());
        assert!(tracker.set_name(" ").is_err());
        assert!(!tracker.store().entries().contains_key(keys::NAME));
    }
}
