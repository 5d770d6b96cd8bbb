use serde::{Deserialize, Serialize};

use crate::utils::dates::DateKey;

/// One journal day as stored in the entry store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRecord {
    pub date: DateKey,
    pub reflection_text: String,
    pub expected_schedule_image_url: String,
    pub actual_schedule_image_url: String,
    pub created_at: String,
    pub updated_at: String,
}

impl EntryRecord {
    pub fn has_reflection(&self) -> bool {
        !self.reflection_text.is_empty()
    }

    pub fn has_schedule_image(&self) -> bool {
        !self.expected_schedule_image_url.is_empty() || !self.actual_schedule_image_url.is_empty()
    }

    /// A flame day has a reflection and at least one schedule image.
    pub fn is_flame_day(&self) -> bool {
        self.has_reflection() && self.has_schedule_image()
    }
}

/// Partial update for an entry. Absent fields keep their stored value; new entries
/// start with empty strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryUpsertInput {
    pub date: String,
    #[serde(default)]
    pub reflection_text: Option<String>,
    #[serde(default)]
    pub expected_schedule_image_url: Option<String>,
    #[serde(default)]
    pub actual_schedule_image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalStreak {
    pub streak: u32,
    pub flame_dates: Vec<DateKey>,
}

/// Entry with the derived fields shown in journal listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryOverview {
    #[serde(flatten)]
    pub entry: EntryRecord,
    /// 1-based position of this entry among all journal days.
    pub day_x: i64,
    pub has_reflection: bool,
    pub has_expected_schedule: bool,
    pub has_actual_schedule: bool,
}

impl EntryOverview {
    pub fn new(entry: EntryRecord, day_x: i64) -> Self {
        Self {
            has_reflection: entry.has_reflection(),
            has_expected_schedule: !entry.expected_schedule_image_url.is_empty(),
            has_actual_schedule: !entry.actual_schedule_image_url.is_empty(),
            entry,
            day_x,
        }
    }
}

/// Journal completion counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryStatus {
    pub total: i64,
    pub with_reflection: i64,
    pub with_expected_schedule: i64,
    pub with_actual_schedule: i64,
    pub has_today_entry: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDates {
    pub dates: Vec<DateKey>,
}
