use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use streak_core::{parse_remind_at, ReminderPolicy};

use crate::state::ensure_streak_home;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub reminders: RemindersSection,
    #[serde(default)]
    pub display: DisplaySection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemindersSection {
    pub enabled: bool,
    /// Local time, HH:MM.
    pub remind_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySection {
    /// Width of the text progress bar, in characters.
    pub progress_width: usize,
}

impl Default for RemindersSection {
    fn default() -> Self {
        Self {
            enabled: false,
            remind_at: "20:00".to_string(),
        }
    }
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self { progress_width: 28 }
    }
}

impl Config {
    pub fn reminder_policy(&self) -> Result<ReminderPolicy> {
        let remind_at = parse_remind_at(&self.reminders.remind_at)
            .context("config.toml [reminders].remind_at")?;
        Ok(ReminderPolicy {
            enabled: self.reminders.enabled,
            remind_at,
        })
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_streak_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config() -> Result<()> {
    let cfg = load_config()?;
    println!("# {}", config_path()?.display());
    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
    Ok(())
}
