//! Configuration validation.
//!
//! Checks every key before a run and exposes the parsers the CLI builders
//! share, so a value that validates always builds.

use crate::domain::classifier::{
    DEFAULT_CORRELATION_THRESHOLD, DEFAULT_DISPERSION_MULTIPLIER, DEFAULT_RETURN_STDDEV_THRESHOLD,
    DEFAULT_TREND_THRESHOLD, DEFAULT_WINDOW, TrendRule, VolatilityRule,
};
use crate::domain::engine::LedgerFailurePolicy;
use crate::domain::error::RegimeError;
use crate::ports::config_port::ConfigPort;
use crate::ports::regime_sink::{LedgerShape, OpenMode};
use std::str::FromStr;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Largest accepted `[classifier] window`.
pub const MAX_WINDOW: usize = 10_000;

/// Spelled-out delimiters for bytes the INI reader would swallow or trim.
const DELIMITER_NAMES: [(&str, u8); 7] = [
    ("comma", b','),
    ("semicolon", b';'),
    ("tab", b'\t'),
    ("\\t", b'\t'),
    ("pipe", b'|'),
    ("space", b' '),
    ("hash", b'#'),
];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), RegimeError> {
    validate_series_config(config)?;
    validate_classifier_config(config)?;
    validate_ledger_config(config)?;
    validate_logging_config(config)?;
    Ok(())
}

pub fn validate_series_config(config: &dyn ConfigPort) -> Result<(), RegimeError> {
    config.require_string("series", "asset_path")?;
    parse_delimiter(config)?;
    Ok(())
}

pub fn validate_classifier_config(config: &dyn ConfigPort) -> Result<(), RegimeError> {
    parse_window(config)?;
    parse_volatility_rule(config)?;
    parse_trend_rule(config)?;
    parse_correlation_threshold(config)?;
    Ok(())
}

pub fn validate_ledger_config(config: &dyn ConfigPort) -> Result<(), RegimeError> {
    parse_ledger_shape(config)?;
    parse_open_mode(config)?;
    parse_ledger_policy(config)?;
    Ok(())
}

pub fn validate_logging_config(config: &dyn ConfigPort) -> Result<(), RegimeError> {
    let level = config.get_choice("logging", "level", "info");
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(RegimeError::invalid(
            "logging",
            "level",
            format!("unknown level '{level}'"),
        ));
    }
    Ok(())
}

pub fn parse_delimiter(config: &dyn ConfigPort) -> Result<u8, RegimeError> {
    let Some(raw) = config.get_string("series", "delimiter") else {
        return Ok(b',');
    };
    if raw.is_empty() {
        // configparser cuts a value at ';' or '#', so `delimiter = ;` lands here.
        return Err(RegimeError::invalid(
            "series",
            "delimiter",
            "delimiter is empty; write semicolon or hash for ';' or '#'",
        ));
    }
    let value = if raw.trim().is_empty() { raw.as_str() } else { raw.trim() };
    if let Some(&(_, byte)) = DELIMITER_NAMES
        .iter()
        .find(|(name, _)| value.eq_ignore_ascii_case(name))
    {
        return Ok(byte);
    }
    match value.as_bytes() {
        [b] => Ok(*b),
        _ => Err(RegimeError::invalid(
            "series",
            "delimiter",
            "delimiter must be a single byte or one of comma, semicolon, tab, pipe, space, hash",
        )),
    }
}

/// Unset or blank keeps `default`; anything else has to parse.
fn read_number<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, RegimeError> {
    match config.get_string(section, key) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|_| {
            RegimeError::invalid(section, key, format!("'{}' is not a number", raw.trim()))
        }),
        _ => Ok(default),
    }
}

pub fn parse_window(config: &dyn ConfigPort) -> Result<usize, RegimeError> {
    let window: i64 = read_number(config, "classifier", "window", DEFAULT_WINDOW as i64)?;
    if !(2..=MAX_WINDOW as i64).contains(&window) {
        return Err(RegimeError::invalid(
            "classifier",
            "window",
            format!("window must be between 2 and {MAX_WINDOW}"),
        ));
    }
    Ok(window as usize)
}

fn non_negative(section: &str, key: &str, value: f64) -> Result<f64, RegimeError> {
    if !value.is_finite() || value < 0.0 {
        return Err(RegimeError::invalid(
            section,
            key,
            format!("{key} must be a finite non-negative number"),
        ));
    }
    Ok(value)
}

pub fn parse_volatility_rule(config: &dyn ConfigPort) -> Result<VolatilityRule, RegimeError> {
    match config
        .get_choice("classifier", "volatility_rule", "dispersion_median")
        .as_str()
    {
        "dispersion_median" => {
            let multiplier = non_negative(
                "classifier",
                "dispersion_multiplier",
                read_number(
                    config,
                    "classifier",
                    "dispersion_multiplier",
                    DEFAULT_DISPERSION_MULTIPLIER,
                )?,
            )?;
            if multiplier == 0.0 {
                return Err(RegimeError::invalid(
                    "classifier",
                    "dispersion_multiplier",
                    "dispersion_multiplier must be positive",
                ));
            }
            Ok(VolatilityRule::DispersionVsMedian { multiplier })
        }
        "return_stddev" => Ok(VolatilityRule::ReturnStdDev {
            threshold: non_negative(
                "classifier",
                "return_stddev_threshold",
                read_number(
                    config,
                    "classifier",
                    "return_stddev_threshold",
                    DEFAULT_RETURN_STDDEV_THRESHOLD,
                )?,
            )?,
        }),
        other => Err(RegimeError::invalid(
            "classifier",
            "volatility_rule",
            format!("unknown rule '{other}' (expected dispersion_median or return_stddev)"),
        )),
    }
}

pub fn parse_trend_rule(config: &dyn ConfigPort) -> Result<TrendRule, RegimeError> {
    match config.get_choice("classifier", "trend_rule", "indicator").as_str() {
        "indicator" => Ok(TrendRule::IndicatorAbove {
            threshold: non_negative(
                "classifier",
                "trend_threshold",
                read_number(config, "classifier", "trend_threshold", DEFAULT_TREND_THRESHOLD)?,
            )?,
        }),
        "price_mean" => Ok(TrendRule::PriceAboveMean),
        other => Err(RegimeError::invalid(
            "classifier",
            "trend_rule",
            format!("unknown rule '{other}' (expected indicator or price_mean)"),
        )),
    }
}

pub fn parse_correlation_threshold(config: &dyn ConfigPort) -> Result<f64, RegimeError> {
    let value = read_number(
        config,
        "classifier",
        "correlation_threshold",
        DEFAULT_CORRELATION_THRESHOLD,
    )?;
    if !(0.0..=1.0).contains(&value) {
        return Err(RegimeError::invalid(
            "classifier",
            "correlation_threshold",
            "correlation_threshold must be between 0 and 1",
        ));
    }
    Ok(value)
}

pub fn parse_ledger_shape(config: &dyn ConfigPort) -> Result<LedgerShape, RegimeError> {
    config
        .get_choice("ledger", "shape", "full")
        .parse()
        .map_err(|reason: String| RegimeError::invalid("ledger", "shape", reason))
}

pub fn parse_open_mode(config: &dyn ConfigPort) -> Result<OpenMode, RegimeError> {
    config
        .get_choice("ledger", "mode", "truncate")
        .parse()
        .map_err(|reason: String| RegimeError::invalid("ledger", "mode", reason))
}

pub fn parse_ledger_policy(config: &dyn ConfigPort) -> Result<LedgerFailurePolicy, RegimeError> {
    match config.get_choice("ledger", "on_error", "fail").as_str() {
        "fail" => Ok(LedgerFailurePolicy::Fail),
        "warn" => Ok(LedgerFailurePolicy::Warn),
        other => Err(RegimeError::invalid(
            "ledger",
            "on_error",
            format!("unknown policy '{other}' (expected fail or warn)"),
        )),
    }
}
