//! Normalized statistics types.
//!
//! These are what the HTTP API serves. Every field is always present;
//! values the upstream did not report are zero or empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::calendar::SubmissionCalendar;

/// Point-in-time statistics for one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub user_info: UserInfo,
    pub contest_info: ContestInfo,
    pub calendar: CalendarInfo,
    /// When the snapshot was fetched from upstream.
    pub last_updated: DateTime<Utc>,
}

/// Solved and total problem counts per difficulty tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub total_solved: u64,
    pub total_questions: u64,
    pub easy_solved: u64,
    pub total_easy: u64,
    pub medium_solved: u64,
    pub total_medium: u64,
    pub hard_solved: u64,
    pub total_hard: u64,
    /// Global profile ranking, 0 when unranked.
    pub ranking: u64,
    pub badges: Vec<Badge>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: String,
    pub display_name: String,
    /// Icon URL or path as reported upstream.
    pub icon: String,
    pub category: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestInfo {
    pub rating: f64,
    pub top_percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarInfo {
    pub submission_calendar: SubmissionCalendar,
    pub total_active_days: u32,
    pub streak: u32,
    pub active_years: Vec<i32>,
}

/// Difficulty tiers as named by LeetCode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    All,
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "All" => Some(Difficulty::All),
            "Easy" => Some(Difficulty::Easy),
            "Medium" => Some(Difficulty::Medium),
            "Hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::All => "All",
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

/// Progress bar data for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierProgress {
    pub difficulty: Difficulty,
    pub solved: u64,
    pub total: u64,
    pub percentage: f64,
}

impl TierProgress {
    pub fn new(difficulty: Difficulty, solved: u64, total: u64) -> Self {
        let percentage = if total > 0 {
            solved as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        Self {
            difficulty,
            solved,
            total,
            percentage,
        }
    }
}

impl UserInfo {
    /// Solved/total for a tier.
    pub fn counts(&self, difficulty: Difficulty) -> (u64, u64) {
        match difficulty {
            Difficulty::All => (self.total_solved, self.total_questions),
            Difficulty::Easy => (self.easy_solved, self.total_easy),
            Difficulty::Medium => (self.medium_solved, self.total_medium),
            Difficulty::Hard => (self.hard_solved, self.total_hard),
        }
    }
}

impl StatsSnapshot {
    /// Progress for the overall count and each tier, in display order.
    pub fn progress(&self) -> Vec<TierProgress> {
        [
            Difficulty::All,
            Difficulty::Easy,
            Difficulty::Medium,
            Difficulty::Hard,
        ]
        .into_iter()
        .map(|d| {
            let (solved, total) = self.user_info.counts(d);
            TierProgress::new(d, solved, total)
        })
        .collect()
    }
}
