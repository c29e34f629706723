//! Core domain types and logic.

pub mod daily_bar;
pub mod series_reader;
pub mod day_series;
pub mod aligner;
pub mod window;
pub mod window_store;
pub mod regime;
pub mod classifier;
pub mod engine;
pub mod daily_feed;
pub mod config_validation;
pub mod error;
