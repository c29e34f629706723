//! Temporal alignment of one or two day series.
//!
//! Two access modes:
//! - [`MergeJoin`]: two-pointer traversal of an asset and a benchmark series,
//!   always advancing the earlier-dated cursor, pairing rows on equal dates.
//!   Stops as soon as either cursor is exhausted.
//! - [`warm_start`]: pop every row of a single series dated strictly before a
//!   target day, for populating windows in one batch.

use crate::domain::daily_bar::DailyBar;
use crate::domain::day_series::DaySeries;
use chrono::NaiveDate;
use std::cmp::Ordering;

/// Forward-only cursor over an ascending series.
pub trait DayCursor {
    fn peek_next_date(&self) -> Option<NaiveDate>;
    fn pop_next(&mut self) -> Option<DailyBar>;
}

/// Cursor over a borrowed, already ascending slice.
#[derive(Debug, Clone)]
pub struct SliceCursor<'a> {
    bars: &'a [DailyBar],
    idx: usize,
}

impl<'a> SliceCursor<'a> {
    pub fn new(bars: &'a [DailyBar]) -> Self {
        Self { bars, idx: 0 }
    }

    pub fn position(&self) -> usize {
        self.idx
    }

    /// Rows not yet popped.
    pub fn remaining(&self) -> &'a [DailyBar] {
        &self.bars[self.idx..]
    }
}

impl DayCursor for SliceCursor<'_> {
    fn peek_next_date(&self) -> Option<NaiveDate> {
        self.bars.get(self.idx).map(|b| b.date)
    }

    fn pop_next(&mut self) -> Option<DailyBar> {
        let bar = self.bars.get(self.idx).copied()?;
        self.idx += 1;
        Some(bar)
    }
}

/// One advance of a [`MergeJoin`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Asset row dated before the benchmark's next row.
    AssetOnly(DailyBar),
    /// Benchmark row dated before the asset's next row.
    BenchmarkOnly(DailyBar),
    /// Both series trade on this date.
    Matched { asset: DailyBar, benchmark: DailyBar },
}

impl Step {
    pub fn date(&self) -> NaiveDate {
        match self {
            Step::AssetOnly(bar) | Step::BenchmarkOnly(bar) => bar.date,
            Step::Matched { asset, .. } => asset.date,
        }
    }
}

pub struct MergeJoin<'a, A: DayCursor, B: DayCursor> {
    asset: &'a mut A,
    benchmark: &'a mut B,
}

impl<'a, A: DayCursor, B: DayCursor> MergeJoin<'a, A, B> {
    pub fn new(asset: &'a mut A, benchmark: &'a mut B) -> Self {
        Self { asset, benchmark }
    }
}

impl<A: DayCursor, B: DayCursor> Iterator for MergeJoin<'_, A, B> {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        let a = self.asset.peek_next_date()?;
        let b = self.benchmark.peek_next_date()?;
        match a.cmp(&b) {
            Ordering::Less => self.asset.pop_next().map(Step::AssetOnly),
            Ordering::Greater => self.benchmark.pop_next().map(Step::BenchmarkOnly),
            Ordering::Equal => {
                let asset = self.asset.pop_next()?;
                let benchmark = self.benchmark.pop_next()?;
                Some(Step::Matched { asset, benchmark })
            }
        }
    }
}

/// Rows of `series` strictly before `target`.
///
/// `fresh` tells whether the caller has absorbed nothing from this cursor yet.
/// A fresh caller must see the series from its first row, so a cursor that
/// was already advanced elsewhere is rewound before scanning. A non-fresh
/// caller continues from where its previous scan stopped.
pub fn warm_start(series: &mut DaySeries, target: NaiveDate, fresh: bool) -> &[DailyBar] {
    if fresh && series.position() > 0 {
        tracing::debug!(
            series = %series.name(),
            position = series.position(),
            "rewinding advanced cursor before warm-start"
        );
        series.rewind();
    }
    series.take_before(target)
}
