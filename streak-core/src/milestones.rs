//! Milestone thresholds, progress toward the next one, and exactly-once
//! celebration.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Celebration thresholds, strictly ascending.
pub const MILESTONES: [u32; 8] = [1, 5, 10, 30, 50, 100, 500, 1000];

/// Highest milestone already celebrated.
///
/// Only grows, except when explicitly reset alongside the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CelebrationMemory(pub u32);

impl CelebrationMemory {
    pub fn last_shown(&self) -> u32 {
        self.0
    }
}

/// Smallest milestone strictly greater than `count`.
pub fn next_milestone(count: u32) -> Option<u32> {
    MILESTONES.iter().copied().find(|&m| m > count)
}

/// Largest milestone at or below `count`.
pub fn previous_milestone(count: u32) -> Option<u32> {
    MILESTONES.iter().rev().copied().find(|&m| m <= count)
}

pub fn is_milestone(count: u32) -> bool {
    MILESTONES.binary_search(&count).is_ok()
}

/// Progress in `[0, 1]` on an evenly segmented bar.
///
/// Segment `i` runs from the previous milestone (or 0) up to `MILESTONES[i]`,
/// and every segment gets the same width `1 / (len - 1)` no matter how far
/// apart its thresholds are. Past the last threshold the bar is full.
pub fn progress(count: u32) -> f64 {
    let Some(next) = next_milestone(count) else {
        return 1.0;
    };
    let prev = previous_milestone(count).unwrap_or(0);
    let segment = MILESTONES.iter().position(|&m| m == next).unwrap_or(0);

    let span = next.saturating_sub(prev).max(1);
    let within = (f64::from(count - prev) / f64::from(span)).clamp(0.0, 1.0);
    let segments = (MILESTONES.len() - 1) as f64;

    ((segment as f64 + within) / segments).clamp(0.0, 1.0)
}

/// Outcome of a celebration check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Celebration {
    pub memory: CelebrationMemory,
    /// Milestone to celebrate now, if any.
    pub milestone: Option<u32>,
}

/// Decide whether reaching `new_count` should be celebrated.
///
/// Fires only when `new_count` is itself a milestone above what was already
/// shown, so re-rendering the same count never celebrates twice.
pub fn check_celebration(new_count: u32, memory: CelebrationMemory) -> Celebration {
    if is_milestone(new_count) && new_count > memory.0 {
        debug!(milestone = new_count, previous = memory.0, "milestone reached");
        return Celebration {
            memory: CelebrationMemory(new_count),
            milestone: Some(new_count),
        };
    }
    Celebration {
        memory,
        milestone: None,
    }
}

/// Everything a renderer needs to draw milestone progress for a count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MilestoneView {
    pub count: u32,
    pub previous: Option<u32>,
    pub next: Option<u32>,
    pub progress: f64,
}

impl MilestoneView {
    pub fn for_count(count: u32) -> Self {
        Self {
            count,
            previous: previous_milestone(count),
            next: next_milestone(count),
            progress: progress(count),
        }
    }

    /// Days still needed to reach the next milestone.
    pub fn remaining(&self) -> Option<u32> {
        self.next.map(|n| n - self.count)
    }
}
