//! Day series source port trait.

use crate::domain::day_series::DaySeries;
use crate::domain::error::RegimeError;
use std::path::Path;

pub trait SeriesPort {
    /// Load and sort a full day series. Fails only when the source is
    /// unreadable, empty, or yields no parsable rows.
    fn load_series(&self, path: &Path) -> Result<DaySeries, RegimeError>;
}
