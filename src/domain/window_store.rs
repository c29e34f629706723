//! The engine's set of rolling windows, one per input the classifier reads.

use crate::domain::window::RollingWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowKind {
    /// Asset closes.
    Price,
    /// Asset daily returns, every asset day.
    Return,
    /// Dispersion indicator (ATR or equivalent).
    Dispersion,
    /// Trend indicator (ADX or equivalent).
    Trend,
    /// Asset returns on days paired with the benchmark.
    AssetCorrelation,
    /// Benchmark returns on the same paired days.
    BenchmarkCorrelation,
}

impl WindowKind {
    pub const ALL: [WindowKind; 6] = [
        WindowKind::Price,
        WindowKind::Return,
        WindowKind::Dispersion,
        WindowKind::Trend,
        WindowKind::AssetCorrelation,
        WindowKind::BenchmarkCorrelation,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowStore {
    size: usize,
    windows: [RollingWindow; 6],
}

impl WindowStore {
    /// Every window gets the same capacity `size`.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            windows: std::array::from_fn(|_| RollingWindow::new(size)),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn push(&mut self, kind: WindowKind, value: f64) {
        self.windows[kind.index()].push(value);
    }

    /// Correlation inputs are only ever pushed together so they stay the same length.
    pub fn push_correlation_pair(&mut self, asset: f64, benchmark: f64) {
        self.push(WindowKind::AssetCorrelation, asset);
        self.push(WindowKind::BenchmarkCorrelation, benchmark);
    }

    pub fn window(&self, kind: WindowKind) -> &RollingWindow {
        &self.windows[kind.index()]
    }

    /// Every window in `required` holds exactly `size` values.
    pub fn is_ready(&self, required: &[WindowKind]) -> bool {
        required.iter().all(|&k| self.window(k).len() == self.size)
    }

    pub fn clear(&mut self) {
        self.windows.iter_mut().for_each(RollingWindow::clear);
    }
}
