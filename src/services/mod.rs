pub mod cache_key;
pub mod cache_service;
pub mod combiner;
pub mod contribution_client;
pub mod entry_service;
pub mod heatmap_service;
pub mod journal_streak;
pub mod productivity_service;
pub mod streak_calculator;
pub mod transformers;
