use anyhow::{Context, Result};
use chrono::{Local, NaiveTime};
use clap::{Parser, Subcommand};
use streak_core::{reminder_due, CalendarDate, StreakError, Theme, Tracker};
use tracing_subscriber::EnvFilter;

mod config;
mod render;
mod state;

use state::FileStore;

#[derive(Parser, Debug)]
#[command(
    name = "streak",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("STREAK_BUILD_SHA"), ")"),
    about = "Daily habit streak tracker"
)]
struct Cli {
    /// Treat this date (YYYY-MM-DD) as today instead of the local date
    #[arg(long, global = true)]
    today: Option<String>,

    /// Log transitions to stderr (same as RUST_LOG=debug)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record today's check-in
    CheckIn,

    /// Show the current streak and milestone progress
    Status {
        /// Emit JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Reset the streak to zero (milestones can be celebrated again)
    Reset,

    /// Show or set the tracker name
    Name {
        /// New name; omit to print the current one
        name: Option<String>,
    },

    /// Show, set (light|dark), or toggle the theme
    Theme {
        /// light, dark, or toggle; omit to print the current theme
        value: Option<String>,
    },

    /// Print a reminder if one is due (for cron / schedulers)
    Remind {
        /// Treat this local time (HH:MM) as now
        #[arg(long)]
        now: Option<String>,
    },

    /// Configuration file commands
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write ~/.streak/config.toml with defaults (never overwrites)
    Init,

    /// Print the effective configuration
    Show,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Computed once so every step of this invocation agrees on the date.
    let today = match cli.today.as_deref() {
        Some(raw) => CalendarDate::parse(raw).context("--today")?,
        None => CalendarDate::today_local(),
    };

    match cli.command {
        Command::CheckIn => check_in(today)?,
        Command::Status { json } => status(today, json)?,
        Command::Reset => {
            let mut tracker = Tracker::new(FileStore::open_or_discard(&state::store_path()?)?);
            tracker.reset()?;
            println!("Reset done.");
        }
        Command::Name { name } => {
            let mut tracker = open_tracker()?;
            match name {
                Some(name) => {
                    let saved = tracker.set_name(&name)?;
                    println!("Name saved ✅ ({saved})");
                }
                None => println!("{}", tracker.preferences()?.name),
            }
        }
        Command::Theme { value } => {
            let mut tracker = open_tracker()?;
            let theme = match value.as_deref() {
                None => tracker.preferences()?.theme,
                Some("toggle") => tracker.toggle_theme()?,
                Some(raw) => tracker.set_theme(raw.parse::<Theme>()?)?,
            };
            println!("{} {}", theme.icon(), theme);
        }
        Command::Remind { now } => remind(today, now)?,
        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config()?,
        },
    }

    Ok(())
}

fn open_tracker() -> Result<Tracker<FileStore>> {
    Ok(Tracker::new(FileStore::open_default()?))
}

/// Point at `streak reset` only when the stored values themselves are bad.
fn explain(err: StreakError) -> anyhow::Error {
    match err {
        StreakError::MalformedDate { .. } | StreakError::NegativeOrNonIntegerCount { .. } => {
            anyhow::Error::new(err)
                .context("stored streak is unreadable; run `streak reset` to start over")
        }
        other => other.into(),
    }
}

fn check_in(today: CalendarDate) -> Result<()> {
    let cfg = config::load_config()?;
    let mut tracker = open_tracker()?;
    let report = tracker.check_in(today).map_err(explain)?;

    println!("{}", render::outcome_message(report.outcome));
    println!("Streak: {}", report.state.count);
    println!(
        "{}",
        render::progress_bar(report.milestones.progress, cfg.display.progress_width)
    );
    println!("{}", render::milestone_line(&report.milestones));
    if let Some(m) = report.celebrated {
        println!("{}", render::celebration_line(m));
    }
    Ok(())
}

fn status(today: CalendarDate, json: bool) -> Result<()> {
    let cfg = config::load_config()?;
    let tracker = open_tracker()?;
    let s = tracker.status(today).map_err(explain)?;

    if json {
        let out = serde_json::json!({
            "today": today,
            "name": s.preferences.name,
            "theme": s.preferences.theme,
            "count": s.state.count,
            "last_check_in": s.state.last_check_in,
            "checked_in_today": s.checked_in_today,
            "next_milestone": s.milestones.next,
            "progress": s.milestones.progress,
            "last_milestone_shown": s.last_milestone_shown,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{} {}", s.preferences.theme.icon(), s.preferences.name);
    println!("Streak: {}", s.state.count);
    println!("{}", render::last_checked(s.state.last_check_in));
    if s.checked_in_today {
        println!("Checked in ✅");
    } else {
        println!("Not checked in today");
    }
    println!(
        "{}",
        render::progress_bar(s.milestones.progress, cfg.display.progress_width)
    );
    println!("{}", render::milestone_line(&s.milestones));
    Ok(())
}

fn remind(today: CalendarDate, now: Option<String>) -> Result<()> {
    let cfg = config::load_config()?;
    let policy = cfg.reminder_policy()?;
    let now = match now.as_deref() {
        Some(raw) => streak_core::parse_remind_at(raw).context("--now")?,
        None => current_local_time(),
    };

    let tracker = open_tracker()?;
    let status = tracker.status(today).map_err(explain)?;

    match reminder_due(policy, today, now, &status.state, &status.preferences.name) {
        Some(intent) => {
            tracing::info!(dedupe_key = %intent.dedupe_key, "reminder due");
            println!("{}\n{}", intent.title, intent.body);
        }
        None => println!("No reminder due."),
    }
    Ok(())
}

fn current_local_time() -> NaiveTime {
    Local::now().time()
}
