//! Text rendering for terminal output.

use streak_core::{CalendarDate, MilestoneView, Outcome};

pub fn outcome_message(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::AlreadyCheckedIn => "Already checked in today ✅",
        Outcome::Started => "Started! Nice 👏",
        Outcome::Continued => "Kept the streak going 🔥",
        Outcome::Reset => "Missed a day — reset to 1 💪",
    }
}

pub fn celebration_line(milestone: u32) -> String {
    let unit = if milestone == 1 { "day" } else { "days" };
    format!("🎉 Milestone reached: {milestone} {unit}!")
}

pub fn last_checked(last: Option<CalendarDate>) -> String {
    match last {
        Some(day) => format!("Last checked: {}", day.pretty()),
        None => "Last checked: never".to_string(),
    }
}

pub fn progress_bar(progress: f64, width: usize) -> String {
    let width = width.max(1);
    let filled = ((progress.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!(
        "[{}{}] {:>3.0}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        progress * 100.0
    )
}

pub fn milestone_line(view: &MilestoneView) -> String {
    match (view.next, view.remaining()) {
        (Some(next), Some(left)) => {
            let unit = if left == 1 { "day" } else { "days" };
            // The bar is already full for the last segment.
            if view.progress >= 1.0 {
                format!("Final stretch: {next} ({left} {unit} to go)")
            } else {
                format!("Next milestone: {next} ({left} {unit} to go)")
            }
        }
        _ => "All milestones reached 🏆".to_string(),
    }
}
