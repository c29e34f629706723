//! Day series ingestion: header sniffing, column mapping and row parsing.
//!
//! The reader is fed one already-split record at a time. The first record
//! decides the layout: if it contains a known header token it is mapped to
//! column positions, otherwise the default column order applies and the
//! record is treated as data. A row whose date does not parse is skipped and
//! counted; a bad numeric field becomes 0.0 and never fails the row.

use crate::domain::daily_bar::DailyBar;
use crate::domain::day_series::DaySeries;
use crate::domain::error::RegimeError;
use chrono::NaiveDate;
use std::collections::HashMap;

const HEADER_TOKENS: [&str; 5] = ["date", "open", "close", "atr", "adx"];

/// Tried in order, first match wins.
const DATE_FORMATS: [&str; 4] = ["%d-%m-%y", "%Y-%m-%d", "%d/%m/%y", "%d-%b-%y"];

const DATE_NAMES: &[&str] = &["date", "day", "timestamp"];
const OPEN_NAMES: &[&str] = &["open", "o"];
const HIGH_NAMES: &[&str] = &["high", "h"];
const LOW_NAMES: &[&str] = &["low", "l"];
const CLOSE_NAMES: &[&str] = &["close", "c", "adj close", "adj_close"];
const VOLUME_NAMES: &[&str] = &["volume", "vol", "v"];
const DISPERSION_NAMES: &[&str] = &["atr", "atr14", "atr%", "atr_percent", "avg true range"];
const TREND_NAMES: &[&str] = &["adx", "adx14", "average directional index"];

/// Parse/skip counters exposed for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub parsed: usize,
    pub skipped: usize,
    pub duplicates: usize,
}

/// Column positions for each bar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: usize,
    pub open: usize,
    pub high: usize,
    pub low: usize,
    pub close: usize,
    pub volume: usize,
    pub dispersion: Option<usize>,
    pub trend: Option<usize>,
}

impl Default for ColumnMap {
    /// date, open, high, low, close, volume, dispersion, trend
    fn default() -> Self {
        Self {
            date: 0,
            open: 1,
            high: 2,
            low: 3,
            close: 4,
            volume: 5,
            dispersion: Some(6),
            trend: Some(7),
        }
    }
}

impl ColumnMap {
    /// Map header names through the synonym lists. Price and volume columns
    /// missing from the header keep their default position; missing indicator
    /// columns stay unmapped.
    pub fn from_header<S: AsRef<str>>(header: &[S]) -> Self {
        let positions: HashMap<String, usize> = header
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_ref().trim().to_lowercase(), i))
            .collect();
        let find = |names: &[&str]| names.iter().find_map(|n| positions.get(*n).copied());

        let def = Self::default();
        Self {
            date: find(DATE_NAMES).unwrap_or(def.date),
            open: find(OPEN_NAMES).unwrap_or(def.open),
            high: find(HIGH_NAMES).unwrap_or(def.high),
            low: find(LOW_NAMES).unwrap_or(def.low),
            close: find(CLOSE_NAMES).unwrap_or(def.close),
            volume: find(VOLUME_NAMES).unwrap_or(def.volume),
            dispersion: find(DISPERSION_NAMES),
            trend: find(TREND_NAMES),
        }
    }
}

/// True when any field of the first record contains a known header token.
pub fn looks_like_header<S: AsRef<str>>(fields: &[S]) -> bool {
    fields.iter().any(|f| {
        let lower = f.as_ref().to_lowercase();
        HEADER_TOKENS.iter().any(|t| lower.contains(t))
    })
}

pub fn parse_date_flexible(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

fn field<S: AsRef<str>>(fields: &[S], index: usize) -> &str {
    fields.get(index).map(|f| f.as_ref().trim()).unwrap_or("")
}

fn number<S: AsRef<str>>(fields: &[S], index: usize) -> f64 {
    field(fields, index).parse().unwrap_or(0.0)
}

/// Accumulates records into a [`DaySeries`].
#[derive(Debug)]
pub struct SeriesReader {
    source_name: String,
    columns: Option<ColumnMap>,
    bars: Vec<DailyBar>,
    stats: ReadStats,
    records_seen: usize,
}

impl SeriesReader {
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            columns: None,
            bars: Vec::new(),
            stats: ReadStats::default(),
            records_seen: 0,
        }
    }

    pub fn columns(&self) -> Option<ColumnMap> {
        self.columns
    }

    pub fn stats(&self) -> ReadStats {
        self.stats
    }

    pub fn push_record<S: AsRef<str>>(&mut self, fields: &[S]) {
        self.records_seen += 1;
        if fields.iter().all(|f| f.as_ref().trim().is_empty()) {
            return;
        }

        let columns = match self.columns {
            Some(columns) => columns,
            None if looks_like_header(fields) => {
                self.columns = Some(ColumnMap::from_header(fields));
                return;
            }
            None => *self.columns.insert(ColumnMap::default()),
        };

        let Some(date) = parse_date_flexible(field(fields, columns.date)) else {
            self.stats.skipped += 1;
            return;
        };

        self.bars.push(DailyBar {
            date,
            open: number(fields, columns.open),
            high: number(fields, columns.high),
            low: number(fields, columns.low),
            close: number(fields, columns.close),
            volume: number(fields, columns.volume),
            dispersion: columns.dispersion.map(|i| number(fields, i)),
            trend: columns.trend.map(|i| number(fields, i)),
        });
        self.stats.parsed += 1;
    }

    /// Count a record the splitter could not decode.
    pub fn skip_record(&mut self) {
        self.records_seen += 1;
        self.stats.skipped += 1;
    }

    /// Sort by date and hand over the series. Fails when the source was empty
    /// or nothing parsed.
    pub fn finish(self) -> Result<DaySeries, RegimeError> {
        if self.records_seen == 0 {
            return Err(RegimeError::EmptySource {
                source_name: self.source_name,
            });
        }
        if self.bars.is_empty() {
            return Err(RegimeError::NoUsableRows {
                source_name: self.source_name,
                skipped: self.stats.skipped,
            });
        }
        Ok(DaySeries::assemble(self.source_name, self.bars, self.stats))
    }
}
