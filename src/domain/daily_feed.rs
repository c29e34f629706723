//! Incremental, once-per-day regime feed for a live or intraday consumer.
//!
//! The first request warm-starts the windows from every row before the
//! requested day; later requests only absorb the rows that arrived in between.
//! Each new day is classified, recorded to the sink, and cached, so asking for
//! the same day again returns the cached answer without writing a second row.

use crate::domain::aligner::{MergeJoin, SliceCursor, Step, warm_start};
use crate::domain::day_series::DaySeries;
use crate::domain::engine::RegimeEngine;
use crate::domain::error::RegimeError;
use crate::domain::regime::{Regime, RegimeRecord};
use crate::ports::regime_sink::RegimeSink;
use chrono::NaiveDate;
use tracing::debug;

pub struct DailyRegimeFeed<S: RegimeSink> {
    engine: RegimeEngine,
    asset: DaySeries,
    benchmark: Option<DaySeries>,
    sink: S,
    last: Option<(NaiveDate, Option<Regime>)>,
}

impl<S: RegimeSink> DailyRegimeFeed<S> {
    pub fn new(engine: RegimeEngine, asset: DaySeries, benchmark: Option<DaySeries>, sink: S) -> Self {
        Self {
            engine,
            asset,
            benchmark,
            sink,
            last: None,
        }
    }

    pub fn engine(&self) -> &RegimeEngine {
        &self.engine
    }

    pub fn asset(&self) -> &DaySeries {
        &self.asset
    }

    /// Last day served and its regime.
    pub fn last(&self) -> Option<(NaiveDate, Option<Regime>)> {
        self.last
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Absorb every not-yet-absorbed row dated strictly before `target`.
    ///
    /// On a fresh engine the series are scanned from their first row, even
    /// if their cursors were advanced by some earlier reader. With a
    /// benchmark, the two batches are merged by date exactly like a batch
    /// replay; rows left over once one batch runs out feed their own side only.
    pub fn warm_start(&mut self, target: NaiveDate) {
        let fresh = self.engine.absorbed_rows() == 0;
        let asset_rows = warm_start(&mut self.asset, target, fresh);

        let Some(benchmark) = self.benchmark.as_mut() else {
            for bar in asset_rows {
                self.engine.absorb_asset(bar);
            }
            debug!(%target, rows = asset_rows.len(), "warm-start absorbed asset rows");
            return;
        };

        let bench_rows = warm_start(benchmark, target, fresh);
        let mut asset_cursor = SliceCursor::new(asset_rows);
        let mut bench_cursor = SliceCursor::new(bench_rows);
        for step in MergeJoin::new(&mut asset_cursor, &mut bench_cursor) {
            self.engine.absorb_step(&step);
        }
        for bar in asset_cursor.remaining() {
            self.engine.absorb_step(&Step::AssetOnly(*bar));
        }
        for bar in bench_cursor.remaining() {
            self.engine.absorb_step(&Step::BenchmarkOnly(*bar));
        }
        debug!(
            %target,
            asset_rows = asset_rows.len(),
            benchmark_rows = bench_rows.len(),
            "warm-start absorbed paired rows"
        );
    }

    /// Regime for `date` from history strictly before it, recorded once.
    pub fn on_day(&mut self, date: NaiveDate) -> Result<Option<Regime>, RegimeError> {
        if let Some((last, regime)) = self.last {
            if last == date {
                return Ok(regime);
            }
            if date < last {
                return Err(RegimeError::OutOfOrderDay { date, last });
            }
        }

        self.warm_start(date);
        let regime = self.engine.classify();
        self.engine
            .record(&mut self.sink, &RegimeRecord::new(date, regime))?;
        self.last = Some((date, regime));
        Ok(regime)
    }
}
