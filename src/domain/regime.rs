//! Regime labels and ledger records.
//!
//! code = 4*C + 2*T + V, where C is the correlation bit, T the trend bit and
//! V the volatility bit. A day without enough history is recorded with the
//! sentinel code -1 and label "Null".

use chrono::NaiveDate;
use std::fmt;

pub const SENTINEL_CODE: i8 = -1;
pub const SENTINEL_LABEL: &str = "Null";

const LABELS: [&str; 8] = [
    "calm, sideways, uncorrelated",
    "volatile, sideways, uncorrelated",
    "calm, trending, uncorrelated",
    "volatile, trending, uncorrelated",
    "calm, sideways, correlated",
    "volatile, sideways, correlated",
    "calm, trending, correlated",
    "volatile, trending, correlated",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Regime {
    CalmSidewaysUncorrelated = 0,
    VolatileSidewaysUncorrelated = 1,
    CalmTrendingUncorrelated = 2,
    VolatileTrendingUncorrelated = 3,
    CalmSidewaysCorrelated = 4,
    VolatileSidewaysCorrelated = 5,
    CalmTrendingCorrelated = 6,
    VolatileTrendingCorrelated = 7,
}

impl Regime {
    pub const ALL: [Regime; 8] = [
        Regime::CalmSidewaysUncorrelated,
        Regime::VolatileSidewaysUncorrelated,
        Regime::CalmTrendingUncorrelated,
        Regime::VolatileTrendingUncorrelated,
        Regime::CalmSidewaysCorrelated,
        Regime::VolatileSidewaysCorrelated,
        Regime::CalmTrendingCorrelated,
        Regime::VolatileTrendingCorrelated,
    ];

    pub fn from_bits(correlated: bool, trending: bool, volatile: bool) -> Self {
        let code = 4 * correlated as usize + 2 * trending as usize + volatile as usize;
        Self::ALL[code]
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        LABELS[self as usize]
    }

    pub fn correlated(self) -> bool {
        self.code() & 4 != 0
    }

    pub fn trending(self) -> bool {
        self.code() & 2 != 0
    }

    pub fn volatile(self) -> bool {
        self.code() & 1 != 0
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One ledger row: a classified day, or the sentinel when not ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegimeRecord {
    pub date: NaiveDate,
    pub regime: Option<Regime>,
}

impl RegimeRecord {
    pub fn new(date: NaiveDate, regime: Option<Regime>) -> Self {
        Self { date, regime }
    }

    pub fn code(&self) -> i8 {
        self.regime.map_or(SENTINEL_CODE, |r| r.code() as i8)
    }

    pub fn label(&self) -> &'static str {
        self.regime.map_or(SENTINEL_LABEL, Regime::label)
    }

    /// (C, T, V), each -1 for the sentinel.
    pub fn bits(&self) -> (i8, i8, i8) {
        match self.regime {
            Some(r) => (r.correlated() as i8, r.trending() as i8, r.volatile() as i8),
            None => (SENTINEL_CODE, SENTINEL_CODE, SENTINEL_CODE),
        }
    }
}
