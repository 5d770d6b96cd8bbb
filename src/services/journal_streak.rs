use std::collections::BTreeSet;

use crate::models::entry::{EntryRecord, JournalStreak};
use crate::utils::dates::DateKey;

/// Flame-day streak over journal entries.
///
/// A flame day has a reflection and at least one schedule image. The streak ends at
/// `today` when today is a flame day, otherwise at yesterday; anything older breaks it.
/// Entries dated after `today` are ignored.
pub fn calculate_journal_streak(entries: &[EntryRecord], today: DateKey) -> JournalStreak {
    let flame_days: BTreeSet<DateKey> = entries
        .iter()
        .filter(|entry| entry.date <= today && entry.is_flame_day())
        .map(|entry| entry.date)
        .collect();

    let anchor = if flame_days.contains(&today) {
        Some(today)
    } else {
        today.previous().filter(|yesterday| flame_days.contains(yesterday))
    };

    let mut streak = 0;
    let mut cursor = anchor;
    while let Some(date) = cursor.filter(|date| flame_days.contains(date)) {
        streak += 1;
        cursor = date.previous();
    }

    JournalStreak {
        streak,
        flame_dates: flame_days.into_iter().collect(),
    }
}
