//! Configuration access port trait.

use crate::domain::error::RegimeError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Trimmed, non-empty value or `ConfigMissing`.
    fn require_string(&self, section: &str, key: &str) -> Result<String, RegimeError> {
        self.get_string(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| RegimeError::ConfigMissing {
                section: section.to_string(),
                key: key.to_string(),
            })
    }

    /// Lower-cased choice, falling back to `default` when unset.
    fn get_choice(&self, section: &str, key: &str, default: &str) -> String {
        self.get_string(section, key)
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string())
    }
}
