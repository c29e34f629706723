//! Ascending day series with a forward-only cursor.

use crate::domain::aligner::DayCursor;
use crate::domain::daily_bar::DailyBar;
use crate::domain::series_reader::ReadStats;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone)]
pub struct DaySeries {
    name: String,
    bars: Vec<DailyBar>,
    cursor: usize,
    stats: ReadStats,
}

impl DaySeries {
    /// Sort by date and drop repeated dates, keeping the first row read.
    pub(crate) fn assemble(name: String, mut bars: Vec<DailyBar>, mut stats: ReadStats) -> Self {
        bars.sort_by_key(|b| b.date);
        let before = bars.len();
        bars.dedup_by_key(|b| b.date);
        stats.duplicates += before - bars.len();
        if stats.duplicates > 0 {
            tracing::warn!(
                series = %name,
                duplicates = stats.duplicates,
                "dropped rows with repeated dates"
            );
        }
        Self {
            name,
            bars,
            cursor: 0,
            stats,
        }
    }

    pub fn from_bars(name: impl Into<String>, bars: Vec<DailyBar>) -> Self {
        let stats = ReadStats {
            parsed: bars.len(),
            ..ReadStats::default()
        };
        Self::assemble(name.into(), bars, stats)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bars(&self) -> &[DailyBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn stats(&self) -> ReadStats {
        self.stats
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Number of rows popped since the start (or the last rewind).
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Pop every remaining row dated strictly before `date`, in order.
    pub fn take_before(&mut self, date: NaiveDate) -> &[DailyBar] {
        let start = self.cursor;
        let end = start + self.bars[start..].partition_point(|b| b.date < date);
        self.cursor = end;
        &self.bars[start..end]
    }

    pub fn info(&self) -> String {
        self.to_string()
    }
}

impl DayCursor for DaySeries {
    fn peek_next_date(&self) -> Option<NaiveDate> {
        self.bars.get(self.cursor).map(|b| b.date)
    }

    fn pop_next(&mut self) -> Option<DailyBar> {
        let bar = self.bars.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(bar)
    }
}

impl fmt::Display for DaySeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
        write!(
            f,
            "{}: rows={}, first={}, last={}, parsed={}, skipped={}, duplicates={}, idx={}",
            self.name,
            self.bars.len(),
            show(self.first_date()),
            show(self.last_date()),
            self.stats.parsed,
            self.stats.skipped,
            self.stats.duplicates,
            self.cursor
        )
    }
}
