//! Logical key/value storage contract.
//!
//! The core never owns a storage medium. Hosts implement [`KeyValueStore`]
//! (a JSON file for the CLI, [`MemoryStore`] in tests) and the typed
//! `load_*`/`save_*` helpers here translate between that flat string map and
//! the core's state types.

use std::collections::BTreeMap;

use tracing::warn;

use crate::date::CalendarDate;
use crate::engine::StreakState;
use crate::error::{Result, StreakError};
use crate::milestones::CelebrationMemory;
use crate::preferences::{Preferences, Theme};

/// Storage keys, shared with any other host reading the same store.
pub mod keys {
    pub const COUNT: &str = "streak_count";
    pub const LAST_CHECKED: &str = "streak_last_checked";
    pub const LAST_MILESTONE: &str = "last_milestone_shown";
    pub const NAME: &str = "streak_name";
    pub const THEME: &str = "theme";
}

/// One pending change to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWrite {
    Set { key: String, value: String },
    Remove { key: String },
}

impl StoreWrite {
    pub fn set(key: &str, value: impl Into<String>) -> Self {
        StoreWrite::Set {
            key: key.to_string(),
            value: value.into(),
        }
    }

    pub fn remove(key: &str) -> Self {
        StoreWrite::Remove {
            key: key.to_string(),
        }
    }
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Apply every write or none of them.
    fn apply(&mut self, batch: &[StoreWrite]) -> Result<()>;

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(&[StoreWrite::set(key, value)])
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.apply(&[StoreWrite::remove(key)])
    }
}

/// Apply a batch to a plain map. Infallible; callers that persist the map
/// run this on a copy and swap it in once the copy is durable.
pub fn apply_to_map(entries: &mut BTreeMap<String, String>, batch: &[StoreWrite]) {
    for write in batch {
        match write {
            StoreWrite::Set { key, value } => {
                entries.insert(key.clone(), value.clone());
            }
            StoreWrite::Remove { key } => {
                entries.remove(key);
            }
        }
    }
}

/// Volatile store backed by a sorted map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn apply(&mut self, batch: &[StoreWrite]) -> Result<()> {
        apply_to_map(&mut self.entries, batch);
        Ok(())
    }
}

/// Read a key, treating an empty string the same as a missing key.
fn get_non_empty<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Result<Option<String>> {
    Ok(store
        .get(key)?
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

/// Decode a persisted non-negative counter: ASCII digits only. Anything
/// else (signs, fractions, exponents) is corruption and is rejected rather
/// than clamped.
pub fn parse_count(key: &str, raw: &str) -> Result<u32> {
    let corrupted = || {
        warn!(key, value = raw, "corrupted counter in store");
        StreakError::NegativeOrNonIntegerCount {
            key: key.to_string(),
            value: raw.to_string(),
        }
    };
    let digits = raw.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(corrupted());
    }
    digits.parse::<u32>().map_err(|_| corrupted())
}

fn load_count<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Result<u32> {
    match get_non_empty(store, key)? {
        Some(raw) => parse_count(key, &raw),
        None => Ok(0),
    }
}

pub fn load_state<S: KeyValueStore + ?Sized>(store: &S) -> Result<StreakState> {
    let count = load_count(store, keys::COUNT)?;
    let last_check_in = get_non_empty(store, keys::LAST_CHECKED)?
        .map(|raw| CalendarDate::parse(&raw))
        .transpose()?;
    Ok(StreakState::new(count, last_check_in))
}

/// Writes persisting `state`; the date is removed when absent.
pub fn state_writes(state: &StreakState) -> Vec<StoreWrite> {
    vec![
        StoreWrite::set(keys::COUNT, state.count.to_string()),
        match state.last_check_in {
            Some(day) => StoreWrite::set(keys::LAST_CHECKED, day.to_string()),
            None => StoreWrite::remove(keys::LAST_CHECKED),
        },
    ]
}

pub fn save_state<S: KeyValueStore + ?Sized>(store: &mut S, state: &StreakState) -> Result<()> {
    store.apply(&state_writes(state))
}

pub fn load_celebration<S: KeyValueStore + ?Sized>(store: &S) -> Result<CelebrationMemory> {
    load_count(store, keys::LAST_MILESTONE).map(CelebrationMemory)
}

pub fn celebration_write(memory: CelebrationMemory) -> StoreWrite {
    StoreWrite::set(keys::LAST_MILESTONE, memory.0.to_string())
}

pub fn save_celebration<S: KeyValueStore + ?Sized>(
    store: &mut S,
    memory: CelebrationMemory,
) -> Result<()> {
    store.apply(&[celebration_write(memory)])
}

/// Load display preferences. An unknown theme value falls back to light
/// since it only affects presentation.
pub fn load_preferences<S: KeyValueStore + ?Sized>(store: &S) -> Result<Preferences> {
    let mut prefs = Preferences::default();
    if let Some(name) = get_non_empty(store, keys::NAME)? {
        prefs.name = name;
    }
    if let Some(raw) = get_non_empty(store, keys::THEME)? {
        prefs.theme = raw.parse::<Theme>().unwrap_or_else(|_| {
            warn!(value = %raw, "unknown theme in store; using light");
            Theme::Light
        });
    }
    Ok(prefs)
}

pub fn save_name<S: KeyValueStore + ?Sized>(store: &mut S, name: &str) -> Result<()> {
    store.set(keys::NAME, name)
}

pub fn save_theme<S: KeyValueStore + ?Sized>(store: &mut S, theme: Theme) -> Result<()> {
    store.set(keys::THEME, theme.as_str())
}
