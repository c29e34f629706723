//! Regime ledger port trait.

use crate::domain::error::RegimeError;
use crate::domain::regime::RegimeRecord;

/// Append-only destination for emitted classifications, in date order.
pub trait RegimeSink {
    /// Write one record and make it durable before returning.
    fn append(&mut self, record: &RegimeRecord) -> Result<(), RegimeError>;
}

impl<S: RegimeSink + ?Sized> RegimeSink for &mut S {
    fn append(&mut self, record: &RegimeRecord) -> Result<(), RegimeError> {
        (**self).append(record)
    }
}

impl<S: RegimeSink + ?Sized> RegimeSink for Box<S> {
    fn append(&mut self, record: &RegimeRecord) -> Result<(), RegimeError> {
        (**self).append(record)
    }
}

/// Ledger columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedgerShape {
    /// `date,regime_code,regime_name,C,T,V,R`
    #[default]
    Full,
    /// `date,regime_code,regime_name`
    Reduced,
}

impl LedgerShape {
    pub fn header(self) -> &'static [&'static str] {
        match self {
            LedgerShape::Full => &["date", "regime_code", "regime_name", "C", "T", "V", "R"],
            LedgerShape::Reduced => &["date", "regime_code", "regime_name"],
        }
    }
}

impl std::str::FromStr for LedgerShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(LedgerShape::Full),
            "reduced" => Ok(LedgerShape::Reduced),
            other => Err(format!("unknown ledger shape '{other}' (expected full or reduced)")),
        }
    }
}

/// What happens to an existing ledger when it is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Start over: truncate and write a fresh header.
    #[default]
    Truncate,
    /// Keep existing rows; write the header only if the ledger is new or empty.
    Append,
}

impl std::str::FromStr for OpenMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "truncate" => Ok(OpenMode::Truncate),
            "append" => Ok(OpenMode::Append),
            other => Err(format!("unknown ledger mode '{other}' (expected truncate or append)")),
        }
    }
}
