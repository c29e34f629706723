//! Regime engine: window state, causal emission and batch replay.
//!
//! A classification for day D is always computed before any of D's values
//! are absorbed, so it only ever sees strictly earlier days.

use crate::domain::aligner::{DayCursor, MergeJoin, Step};
use crate::domain::classifier::RegimeClassifier;
use crate::domain::daily_bar::{DailyBar, daily_return};
use crate::domain::day_series::DaySeries;
use crate::domain::error::RegimeError;
use crate::domain::regime::{Regime, RegimeRecord};
use crate::domain::window_store::{WindowKind, WindowStore};
use crate::ports::regime_sink::RegimeSink;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// What to do when the ledger rejects a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedgerFailurePolicy {
    /// Propagate the error and stop the run.
    #[default]
    Fail,
    /// Log a warning naming the day and keep going.
    Warn,
}

/// Full-history result: every emitted day with its regime (or `None`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegimeHistory {
    days: BTreeMap<NaiveDate, Option<Regime>>,
}

impl RegimeHistory {
    /// `None` if the day was never emitted, `Some(None)` for a sentinel day.
    pub fn get(&self, date: NaiveDate) -> Option<Option<Regime>> {
        self.days.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Option<Regime>)> + '_ {
        self.days.iter().map(|(d, r)| (*d, *r))
    }

    pub fn sentinel_days(&self) -> usize {
        self.days.values().filter(|r| r.is_none()).count()
    }

    pub fn counts(&self) -> BTreeMap<Regime, usize> {
        let mut counts = BTreeMap::new();
        for regime in self.days.values().flatten() {
            *counts.entry(*regime).or_insert(0) += 1;
        }
        counts
    }

    fn insert(&mut self, date: NaiveDate, regime: Option<Regime>) {
        self.days.insert(date, regime);
    }
}

#[derive(Debug, Clone)]
pub struct RegimeEngine {
    classifier: RegimeClassifier,
    windows: WindowStore,
    prev_asset_close: Option<f64>,
    prev_benchmark_close: Option<f64>,
    absorbed: usize,
    ledger_policy: LedgerFailurePolicy,
}

impl RegimeEngine {
    pub fn new(classifier: RegimeClassifier) -> Self {
        Self {
            windows: WindowStore::new(classifier.window),
            classifier,
            prev_asset_close: None,
            prev_benchmark_close: None,
            absorbed: 0,
            ledger_policy: LedgerFailurePolicy::default(),
        }
    }

    pub fn with_ledger_policy(mut self, policy: LedgerFailurePolicy) -> Self {
        self.ledger_policy = policy;
        self
    }

    pub fn classifier(&self) -> &RegimeClassifier {
        &self.classifier
    }

    pub fn windows(&self) -> &WindowStore {
        &self.windows
    }

    /// Rows absorbed since construction or the last reset.
    pub fn absorbed_rows(&self) -> usize {
        self.absorbed
    }

    pub fn classify(&self) -> Option<Regime> {
        self.classifier.classify(&self.windows)
    }

    pub fn reset(&mut self) {
        self.windows.clear();
        self.prev_asset_close = None;
        self.prev_benchmark_close = None;
        self.absorbed = 0;
    }

    /// Push an asset day into the price, return and indicator windows.
    /// Returns the day's return when one is defined.
    pub fn absorb_asset(&mut self, bar: &DailyBar) -> Option<f64> {
        let ret = daily_return(self.prev_asset_close, bar);
        self.windows.push(WindowKind::Price, bar.close);
        if let Some(r) = ret {
            self.windows.push(WindowKind::Return, r);
        }
        if let Some(d) = bar.dispersion {
            self.windows.push(WindowKind::Dispersion, d);
        }
        if let Some(t) = bar.trend {
            self.windows.push(WindowKind::Trend, t);
        }
        self.prev_asset_close = Some(bar.close);
        self.absorbed += 1;
        ret
    }

    /// Track the benchmark close; returns the benchmark's return when defined.
    pub fn absorb_benchmark(&mut self, bar: &DailyBar) -> Option<f64> {
        let ret = daily_return(self.prev_benchmark_close, bar);
        self.prev_benchmark_close = Some(bar.close);
        self.absorbed += 1;
        ret
    }

    /// A day both series traded: asset windows plus one correlation pair.
    pub fn absorb_matched(&mut self, asset: &DailyBar, benchmark: &DailyBar) {
        let asset_ret = self.absorb_asset(asset);
        let bench_ret = self.absorb_benchmark(benchmark);
        if let (Some(a), Some(b)) = (asset_ret, bench_ret) {
            self.windows.push_correlation_pair(a, b);
        }
    }

    pub fn absorb_step(&mut self, step: &Step) {
        match step {
            Step::AssetOnly(bar) => {
                self.absorb_asset(bar);
            }
            Step::BenchmarkOnly(bar) => {
                self.absorb_benchmark(bar);
            }
            Step::Matched { asset, benchmark } => self.absorb_matched(asset, benchmark),
        }
    }

    /// Write `record` to `sink` under the configured failure policy.
    pub fn record<S: RegimeSink + ?Sized>(
        &self,
        sink: &mut S,
        record: &RegimeRecord,
    ) -> Result<(), RegimeError> {
        let (c, t, v) = record.bits();
        debug!(
            date = %record.date,
            code = record.code(),
            c,
            t,
            v,
            "regime at start of day"
        );
        match sink.append(record) {
            Ok(()) => Ok(()),
            Err(err) => match self.ledger_policy {
                LedgerFailurePolicy::Fail => Err(err),
                LedgerFailurePolicy::Warn => {
                    warn!(date = %record.date, error = %err, "regime ledger append failed");
                    Ok(())
                }
            },
        }
    }

    /// Merge-join `asset` with `benchmark` and emit one record per matched day.
    ///
    /// Unmatched days only feed the windows. Stops when either series runs out.
    pub fn replay_paired<A, B, S>(
        &mut self,
        asset: &mut A,
        benchmark: &mut B,
        sink: &mut S,
    ) -> Result<RegimeHistory, RegimeError>
    where
        A: DayCursor,
        B: DayCursor,
        S: RegimeSink + ?Sized,
    {
        let mut history = RegimeHistory::default();
        for step in MergeJoin::new(asset, benchmark) {
            if let Step::Matched { asset: today, .. } = &step {
                let regime = self.classify();
                self.record(sink, &RegimeRecord::new(today.date, regime))?;
                history.insert(today.date, regime);
            }
            self.absorb_step(&step);
        }
        info!(
            days = history.len(),
            sentinel = history.sentinel_days(),
            "paired replay finished"
        );
        Ok(history)
    }

    /// Emit one record per asset day, with no correlation pairing.
    pub fn replay_single<S>(
        &mut self,
        asset: &mut DaySeries,
        sink: &mut S,
    ) -> Result<RegimeHistory, RegimeError>
    where
        S: RegimeSink + ?Sized,
    {
        let mut history = RegimeHistory::default();
        while let Some(bar) = asset.pop_next() {
            let regime = self.classify();
            self.record(sink, &RegimeRecord::new(bar.date, regime))?;
            history.insert(bar.date, regime);
            self.absorb_asset(&bar);
        }
        info!(
            series = %asset.name(),
            days = history.len(),
            sentinel = history.sentinel_days(),
            "single-series replay finished"
        );
        Ok(history)
    }
}
