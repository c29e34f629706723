//! Regime classification over the current window contents.
//!
//! Three independent bits:
//! - V (volatility): [`VolatilityRule`]
//! - T (trend): [`TrendRule`]
//! - C (correlation): |pearson(asset returns, benchmark returns)| > threshold,
//!   0 when either correlation window is short or has no variance.
//!
//! Comparisons are strict: a value equal to its threshold yields 0.

use crate::domain::regime::Regime;
use crate::domain::window::pearson;
use crate::domain::window_store::{WindowKind, WindowStore};

pub const DEFAULT_WINDOW: usize = 10;
pub const DEFAULT_DISPERSION_MULTIPLIER: f64 = 1.30;
pub const DEFAULT_TREND_THRESHOLD: f64 = 25.0;
pub const DEFAULT_CORRELATION_THRESHOLD: f64 = 0.50;
pub const DEFAULT_RETURN_STDDEV_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VolatilityRule {
    /// Latest dispersion reading > multiplier * median of the dispersion window.
    DispersionVsMedian { multiplier: f64 },
    /// Population std-dev of the return window > threshold.
    ReturnStdDev { threshold: f64 },
}

impl VolatilityRule {
    fn window(&self) -> WindowKind {
        match self {
            VolatilityRule::DispersionVsMedian { .. } => WindowKind::Dispersion,
            VolatilityRule::ReturnStdDev { .. } => WindowKind::Return,
        }
    }

    fn is_volatile(&self, windows: &WindowStore) -> bool {
        match *self {
            VolatilityRule::DispersionVsMedian { multiplier } => {
                let w = windows.window(WindowKind::Dispersion);
                match (w.latest(), w.median()) {
                    (Some(latest), Some(median)) => latest > multiplier * median,
                    _ => false,
                }
            }
            VolatilityRule::ReturnStdDev { threshold } => windows
                .window(WindowKind::Return)
                .std_dev()
                .is_some_and(|sd| sd > threshold),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrendRule {
    /// Latest trend-indicator reading > threshold.
    IndicatorAbove { threshold: f64 },
    /// Latest close > arithmetic mean of the price window.
    PriceAboveMean,
}

impl TrendRule {
    fn window(&self) -> WindowKind {
        match self {
            TrendRule::IndicatorAbove { .. } => WindowKind::Trend,
            TrendRule::PriceAboveMean => WindowKind::Price,
        }
    }

    fn is_trending(&self, windows: &WindowStore) -> bool {
        match *self {
            TrendRule::IndicatorAbove { threshold } => windows
                .window(WindowKind::Trend)
                .latest()
                .is_some_and(|v| v > threshold),
            TrendRule::PriceAboveMean => {
                let w = windows.window(WindowKind::Price);
                match (w.latest(), w.mean()) {
                    (Some(latest), Some(mean)) => latest > mean,
                    _ => false,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimeClassifier {
    pub window: usize,
    pub volatility: VolatilityRule,
    pub trend: TrendRule,
    pub correlation_threshold: f64,
}

impl Default for RegimeClassifier {
    /// Ten-day windows, dispersion x1.30 vs median, trend indicator > 25, |rho| > 0.5.
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            volatility: VolatilityRule::DispersionVsMedian {
                multiplier: DEFAULT_DISPERSION_MULTIPLIER,
            },
            trend: TrendRule::IndicatorAbove {
                threshold: DEFAULT_TREND_THRESHOLD,
            },
            correlation_threshold: DEFAULT_CORRELATION_THRESHOLD,
        }
    }
}

impl RegimeClassifier {
    /// Windows that must be full before a classification is attempted.
    pub fn required_windows(&self) -> [WindowKind; 2] {
        [self.volatility.window(), self.trend.window()]
    }

    pub fn is_ready(&self, windows: &WindowStore) -> bool {
        windows.is_ready(&self.required_windows())
    }

    /// `None` until every required window is full; never a partial answer.
    pub fn classify(&self, windows: &WindowStore) -> Option<Regime> {
        if !self.is_ready(windows) {
            return None;
        }
        let volatile = self.volatility.is_volatile(windows);
        let trending = self.trend.is_trending(windows);
        let correlated = self.is_correlated(windows);
        Some(Regime::from_bits(correlated, trending, volatile))
    }

    fn is_correlated(&self, windows: &WindowStore) -> bool {
        if !windows.is_ready(&[WindowKind::AssetCorrelation, WindowKind::BenchmarkCorrelation]) {
            return false;
        }
        let asset = windows.window(WindowKind::AssetCorrelation).to_vec();
        let bench = windows.window(WindowKind::BenchmarkCorrelation).to_vec();
        pearson(&asset, &bench).is_some_and(|rho| rho.abs() > self.correlation_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(store: &mut WindowStore, kind: WindowKind, values: &[f64]) {
        for &v in values {
            store.push(kind, v);
        }
    }

    fn indicator_store(dispersion: &[f64], trend: &[f64]) -> WindowStore {
        let mut store = WindowStore::new(10);
        fill(&mut store, WindowKind::Dispersion, dispersion);
        fill(&mut store, WindowKind::Trend, trend);
        store
    }

    #[test]
    fn not_ready_yields_none() {
        let store = indicator_store(&[1.0; 9], &[10.0; 10]);
        assert_eq!(RegimeClassifier::default().classify(&store), None);
    }

    #[test]
    fn constant_indicators_are_calm_and_sideways() {
        let store = indicator_store(&[1.0; 10], &[10.0; 10]);
        assert_eq!(
            RegimeClassifier::default().classify(&store),
            Some(Regime::CalmSidewaysUncorrelated)
        );
    }

    #[test]
    fn dispersion_spike_is_volatile() {
        let mut dispersion = [1.0; 10];
        dispersion[9] = 2.0;
        let store = indicator_store(&dispersion, &[30.0; 10]);
        assert_eq!(
            RegimeClassifier::default().classify(&store),
            Some(Regime::VolatileTrendingUncorrelated)
        );
    }

    #[test]
    fn threshold_equality_is_not_trending() {
        let store = indicator_store(&[1.0; 10], &[25.0; 10]);
        let regime = RegimeClassifier::default().classify(&store).unwrap();
        assert!(!regime.trending());
    }

    #[test]
    fn correlated_returns_set_c() {
        let mut store = indicator_store(&[1.0; 10], &[10.0; 10]);
        for i in 0..10 {
            let r = (i as f64 - 4.5) / 100.0;
            store.push_correlation_pair(r, 2.0 * r + 0.001);
        }
        assert_eq!(
            RegimeClassifier::default().classify(&store),
            Some(Regime::CalmSidewaysCorrelated)
        );
    }

    #[test]
    fn anti_correlated_returns_also_set_c() {
        let mut store = indicator_store(&[1.0; 10], &[10.0; 10]);
        for i in 0..10 {
            let r = i as f64 / 100.0;
            store.push_correlation_pair(r, -r);
        }
        let regime = RegimeClassifier::default().classify(&store).unwrap();
        assert!(regime.correlated());
    }

    #[test]
    fn flat_benchmark_is_uncorrelated() {
        let mut store = indicator_store(&[1.0; 10], &[10.0; 10]);
        for i in 0..10 {
            store.push_correlation_pair(i as f64 / 100.0, 0.0);
        }
        let regime = RegimeClassifier::default().classify(&store).unwrap();
        assert!(!regime.correlated());
    }

    #[test]
    fn flat_benchmark_stays_uncorrelated_at_zero_threshold() {
        let mut store = indicator_store(&[1.0; 10], &[10.0; 10]);
        for i in 0..10 {
            store.push_correlation_pair(i as f64 / 100.0, 0.0);
        }
        let classifier = RegimeClassifier {
            correlation_threshold: 0.0,
            ..RegimeClassifier::default()
        };
        let regime = classifier.classify(&store).unwrap();
        assert!(!regime.correlated());
    }

    #[test]
    fn short_correlation_windows_are_uncorrelated() {
        let mut store = indicator_store(&[1.0; 10], &[10.0; 10]);
        for i in 0..9 {
            let r = i as f64 / 100.0;
            store.push_correlation_pair(r, r);
        }
        let regime = RegimeClassifier::default().classify(&store).unwrap();
        assert!(!regime.correlated());
    }

    fn price_rules() -> RegimeClassifier {
        RegimeClassifier {
            window: 5,
            volatility: VolatilityRule::ReturnStdDev { threshold: 0.01 },
            trend: TrendRule::PriceAboveMean,
            correlation_threshold: 0.5,
        }
    }

    #[test]
    fn price_rules_require_price_and_return_windows() {
        assert_eq!(
            price_rules().required_windows(),
            [WindowKind::Return, WindowKind::Price]
        );
    }

    #[test]
    fn rising_price_above_mean_is_trending() {
        let mut store = WindowStore::new(5);
        fill(&mut store, WindowKind::Price, &[100.0, 101.0, 102.0, 103.0, 104.0]);
        fill(&mut store, WindowKind::Return, &[0.001; 5]);
        assert_eq!(
            price_rules().classify(&store),
            Some(Regime::CalmTrendingUncorrelated)
        );
    }

    #[test]
    fn wide_return_spread_is_volatile() {
        let mut store = WindowStore::new(5);
        fill(&mut store, WindowKind::Price, &[100.0; 5]);
        fill(&mut store, WindowKind::Return, &[0.05, -0.05, 0.04, -0.04, 0.0]);
        assert_eq!(
            price_rules().classify(&store),
            Some(Regime::VolatileSidewaysUncorrelated)
        );
    }
}
