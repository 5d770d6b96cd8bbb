pub mod activity;
pub mod entry;
pub mod heatmap;
pub mod productivity;
pub mod settings;
