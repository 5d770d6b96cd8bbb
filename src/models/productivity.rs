use serde::{Deserialize, Serialize};

use crate::utils::dates::DateKey;

/// Completion snapshot of a single entry, used as the productivity activity signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityRecord {
    pub date: DateKey,
    pub has_reflection: bool,
    pub has_expected_schedule: bool,
    pub has_actual_schedule: bool,
    /// Share of the three journal fields that are filled in, 0.0 to 1.0.
    pub completion_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityMetrics {
    pub productivity_rate: f64,
    pub schedule_adherence: f64,
    pub reflection_rate: f64,
    pub total_productive_days: usize,
}
