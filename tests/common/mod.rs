#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use regime_engine::domain::daily_bar::DailyBar;
use regime_engine::domain::day_series::DaySeries;
use regime_engine::domain::error::RegimeError;
use regime_engine::domain::regime::RegimeRecord;
use regime_engine::ports::regime_sink::RegimeSink;
use regime_engine::ports::series_port::SeriesPort;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Keeps every appended record in memory.
#[derive(Default)]
pub struct VecSink {
    pub records: Vec<RegimeRecord>,
}

impl RegimeSink for VecSink {
    fn append(&mut self, record: &RegimeRecord) -> Result<(), RegimeError> {
        self.records.push(*record);
        Ok(())
    }
}

/// Serves prepared series by path.
pub struct MockSeriesPort {
    pub series: HashMap<PathBuf, Vec<DailyBar>>,
}

impl MockSeriesPort {
    pub fn new() -> Self {
        Self {
            series: HashMap::new(),
        }
    }

    pub fn with_series(mut self, path: &str, bars: Vec<DailyBar>) -> Self {
        self.series.insert(PathBuf::from(path), bars);
        self
    }
}

impl SeriesPort for MockSeriesPort {
    fn load_series(&self, path: &Path) -> Result<DaySeries, RegimeError> {
        match self.series.get(path) {
            Some(bars) => Ok(DaySeries::from_bars(path.display().to_string(), bars.clone())),
            None => Err(RegimeError::SeriesRead {
                source_name: path.display().to_string(),
                reason: "not found".into(),
            }),
        }
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Day `n` counted from 2024-01-01 (day 1).
pub fn day(n: i64) -> NaiveDate {
    date("2024-01-01") + Duration::days(n - 1)
}

pub fn make_bar(date: NaiveDate, close: f64, dispersion: f64, trend: f64) -> DailyBar {
    DailyBar {
        date,
        open: close,
        high: close,
        low: close,
        close,
        volume: 1_000.0,
        dispersion: Some(dispersion),
        trend: Some(trend),
    }
}

/// Consecutive days starting at day 1, one bar per close.
pub fn bars_from_closes(closes: &[f64]) -> Vec<DailyBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_bar(day(i as i64 + 1), close, 1.0, 10.0))
        .collect()
}

/// Bars on the given day numbers with a close that wanders deterministically.
pub fn bars_on_days(days: &[i64], seed: f64) -> Vec<DailyBar> {
    days.iter()
        .map(|&n| {
            let x = n as f64;
            let close = 100.0 + seed * (x * 0.7).sin() + 0.3 * x;
            make_bar(day(n), close, 1.0 + 0.1 * (x * 1.3).cos().abs(), 20.0 + (x * 0.4).sin() * 10.0)
        })
        .collect()
}

pub fn series(name: &str, bars: Vec<DailyBar>) -> DaySeries {
    DaySeries::from_bars(name, bars)
}
