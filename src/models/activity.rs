use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::dates::DateKey;

/// The three activity streams that feed the heatmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivitySource {
    #[serde(rename = "github")]
    GitHub,
    #[serde(rename = "leetcode")]
    LeetCode,
    Productivity,
}

impl ActivitySource {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivitySource::GitHub => "github",
            ActivitySource::LeetCode => "leetcode",
            ActivitySource::Productivity => "productivity",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ActivitySource::GitHub => "GitHub",
            ActivitySource::LeetCode => "LeetCode",
            ActivitySource::Productivity => "Productivity",
        }
    }
}

impl fmt::Display for ActivitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One day's count from a single source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPoint {
    pub date: String,
    pub count: u64,
}

impl ActivityPoint {
    pub fn new(date: impl Into<String>, count: u64) -> Self {
        Self {
            date: date.into(),
            count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedActivityPoint {
    pub date: DateKey,
    pub github_count: u64,
    pub leetcode_count: u64,
    pub productivity_score: u64,
    pub total_activity: u64,
}

impl CombinedActivityPoint {
    pub fn new(date: DateKey, github_count: u64, leetcode_count: u64, productivity_score: u64) -> Self {
        Self {
            date,
            github_count,
            leetcode_count,
            productivity_score,
            total_activity: github_count
                .saturating_add(leetcode_count)
                .saturating_add(productivity_score),
        }
    }

    pub fn empty(date: DateKey) -> Self {
        Self::new(date, 0, 0, 0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestDay {
    pub date: Option<DateKey>,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapStats {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_contributions: u64,
    pub average_per_day: f64,
    pub best_day: BestDay,
    /// Percentage of entry days with any journal content.
    pub productivity_rate: f64,
    /// Percentage of entry days with both schedule images.
    pub schedule_adherence: f64,
}
