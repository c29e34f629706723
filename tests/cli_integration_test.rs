//! CLI integration tests for configuration building and the history pipeline.
//!
//! Tests cover:
//! - Settings builders over real INI content (build_classifier, build_series_settings,
//!   build_ledger_settings, build_engine)
//! - Command-line overrides taking precedence over the config file
//! - run_history_pipeline with a mock series port, paired and single
//! - The day and info commands end to end: INI file, CSV series, ledger file

mod common;

use common::*;
use regime_engine::adapters::file_config_adapter::FileConfigAdapter;
use regime_engine::cli;
use regime_engine::domain::classifier::{RegimeClassifier, TrendRule, VolatilityRule};
use regime_engine::domain::config_validation::validate_config;
use regime_engine::domain::engine::LedgerFailurePolicy;
use regime_engine::domain::error::RegimeError;
use regime_engine::domain::regime::Regime;
use regime_engine::ports::regime_sink::{LedgerShape, OpenMode};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FULL_INI: &str = r#"
[series]
asset_path = Inputs/NIFTY.csv
benchmark_path = Inputs/SPX.csv
delimiter = |

[classifier]
window = 20
volatility_rule = return_stddev
return_stddev_threshold = 0.015
trend_rule = price_mean
correlation_threshold = 0.6

[ledger]
path = Outputs/Regimes.csv
shape = reduced
mode = append
on_error = warn

[logging]
level = debug
"#;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

mod settings {
    use super::*;

    #[test]
    fn full_config_builds_every_setting() {
        let adapter = FileConfigAdapter::from_string(FULL_INI).unwrap();
        assert!(validate_config(&adapter).is_ok());

        let classifier = cli::build_classifier(&adapter).unwrap();
        assert_eq!(
            classifier,
            RegimeClassifier {
                window: 20,
                volatility: VolatilityRule::ReturnStdDev { threshold: 0.015 },
                trend: TrendRule::PriceAboveMean,
                correlation_threshold: 0.6,
            }
        );

        let series = cli::build_series_settings(&adapter, None, None).unwrap();
        assert_eq!(series.asset_path, PathBuf::from("Inputs/NIFTY.csv"));
        assert_eq!(series.benchmark_path, Some(PathBuf::from("Inputs/SPX.csv")));
        assert_eq!(series.delimiter, b'|');

        let ledger = cli::build_ledger_settings(&adapter, None).unwrap();
        assert_eq!(ledger.path, PathBuf::from("Outputs/Regimes.csv"));
        assert_eq!(ledger.shape, LedgerShape::Reduced);
        assert_eq!(ledger.mode, OpenMode::Append);
        assert_eq!(ledger.policy, LedgerFailurePolicy::Warn);
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let adapter = FileConfigAdapter::from_string("[series]\nasset_path = a.csv\n").unwrap();
        assert_eq!(cli::build_classifier(&adapter).unwrap(), RegimeClassifier::default());

        let series = cli::build_series_settings(&adapter, None, None).unwrap();
        assert_eq!(series.benchmark_path, None);
        assert_eq!(series.delimiter, b',');

        let ledger = cli::build_ledger_settings(&adapter, None).unwrap();
        assert_eq!(ledger.path, PathBuf::from("Outputs/RegimeByDay.csv"));
        assert_eq!(ledger.shape, LedgerShape::Full);
        assert_eq!(ledger.mode, OpenMode::Truncate);
        assert_eq!(ledger.policy, LedgerFailurePolicy::Fail);
    }

    #[test]
    fn overrides_take_precedence() {
        let adapter = FileConfigAdapter::from_string(FULL_INI).unwrap();
        let series = cli::build_series_settings(
            &adapter,
            Some(Path::new("other.csv")),
            Some(Path::new("bench.csv")),
        )
        .unwrap();
        assert_eq!(series.asset_path, PathBuf::from("other.csv"));
        assert_eq!(series.benchmark_path, Some(PathBuf::from("bench.csv")));

        let ledger = cli::build_ledger_settings(&adapter, Some(Path::new("out.csv"))).unwrap();
        assert_eq!(ledger.path, PathBuf::from("out.csv"));
    }

    #[test]
    fn asset_override_replaces_missing_config_key() {
        let adapter = FileConfigAdapter::from_string("[classifier]\nwindow = 10\n").unwrap();
        assert!(matches!(
            cli::build_series_settings(&adapter, None, None),
            Err(RegimeError::ConfigMissing { key, .. }) if key == "asset_path"
        ));
        let series =
            cli::build_series_settings(&adapter, Some(Path::new("a.csv")), None).unwrap();
        assert_eq!(series.asset_path, PathBuf::from("a.csv"));
    }

    #[test]
    fn invalid_values_are_reported_by_key() {
        let adapter = FileConfigAdapter::from_string(
            "[series]\nasset_path = a.csv\n[classifier]\nvolatility_rule = vibes\n",
        )
        .unwrap();
        assert!(matches!(
            cli::build_engine(&adapter),
            Err(RegimeError::ConfigInvalid { key, .. }) if key == "volatility_rule"
        ));
    }

    #[test]
    fn semicolon_delimiter_is_spelled_out() {
        let named = FileConfigAdapter::from_string(
            "[series]\nasset_path = a.csv\ndelimiter = semicolon\n",
        )
        .unwrap();
        assert!(validate_config(&named).is_ok());
        assert_eq!(cli::build_series_settings(&named, None, None).unwrap().delimiter, b';');

        let bare =
            FileConfigAdapter::from_string("[series]\nasset_path = a.csv\ndelimiter = ;\n")
                .unwrap();
        match cli::build_series_settings(&bare, None, None) {
            Err(RegimeError::ConfigInvalid { key, reason, .. }) => {
                assert_eq!(key, "delimiter");
                assert!(reason.contains("semicolon"), "{reason}");
            }
            other => panic!("expected ConfigInvalid, got {:?}", other.map(|s| s.delimiter)),
        }
    }

    #[test]
    fn oversized_window_fails_validation_instead_of_building() {
        let adapter = FileConfigAdapter::from_string(
            "[series]\nasset_path = a.csv\n[classifier]\nwindow = 4611686018427387904\n",
        )
        .unwrap();
        assert!(matches!(
            validate_config(&adapter),
            Err(RegimeError::ConfigInvalid { key, .. }) if key == "window"
        ));
        assert!(matches!(
            cli::build_engine(&adapter),
            Err(RegimeError::ConfigInvalid { key, .. }) if key == "window"
        ));
    }

    #[test]
    fn misspelled_number_is_not_replaced_by_default() {
        let adapter = FileConfigAdapter::from_string(
            "[series]\nasset_path = a.csv\n[classifier]\nwindow = 1O\n",
        )
        .unwrap();
        assert!(matches!(
            validate_config(&adapter),
            Err(RegimeError::ConfigInvalid { key, .. }) if key == "window"
        ));
        assert!(cli::build_classifier(&adapter).is_err());
    }

    #[test]
    fn load_config_reads_file_from_disk() {
        let file = write_temp_ini(FULL_INI);
        let adapter = cli::load_config(file.path()).unwrap();
        assert_eq!(cli::build_classifier(&adapter).unwrap().window, 20);
    }

    #[test]
    fn load_config_missing_file_fails() {
        assert!(cli::load_config(Path::new("/nonexistent/regime.ini")).is_err());
    }
}

mod history_pipeline {
    use super::*;

    fn settings(benchmark: Option<&str>) -> cli::SeriesSettings {
        cli::SeriesSettings {
            asset_path: PathBuf::from("asset.csv"),
            benchmark_path: benchmark.map(PathBuf::from),
            delimiter: b',',
        }
    }

    #[test]
    fn single_series_without_benchmark() {
        let port = MockSeriesPort::new().with_series("asset.csv", bars_from_closes(&[100.0; 12]));
        let mut engine = cli::build_engine(
            &FileConfigAdapter::from_string("[series]\nasset_path = asset.csv\n").unwrap(),
        )
        .unwrap();
        let mut sink = VecSink::default();

        let history =
            cli::run_history_pipeline(&port, &settings(None), &mut engine, &mut sink).unwrap();

        assert_eq!(history.len(), 12);
        assert_eq!(history.sentinel_days(), 10);
        assert_eq!(history.counts().get(&Regime::CalmSidewaysUncorrelated), Some(&2));
        assert_eq!(sink.records.len(), 12);

        let summary = cli::summary_lines(&history);
        assert_eq!(summary.len(), 2);
        assert!(summary[0].contains("calm, sideways, uncorrelated"));
        assert!(summary[1].contains("Null"));
    }

    #[test]
    fn paired_when_benchmark_configured() {
        let port = MockSeriesPort::new()
            .with_series("asset.csv", bars_on_days(&[1, 2, 3, 4, 5, 6], 2.0))
            .with_series("bench.csv", bars_on_days(&[2, 4, 6], 1.0));
        let mut engine = cli::build_engine(
            &FileConfigAdapter::from_string("[series]\nasset_path = asset.csv\n").unwrap(),
        )
        .unwrap();
        let mut sink = VecSink::default();

        let history = cli::run_history_pipeline(
            &port,
            &settings(Some("bench.csv")),
            &mut engine,
            &mut sink,
        )
        .unwrap();

        let dates: Vec<_> = history.iter().map(|(d, _)| d).collect();
        assert_eq!(dates, vec![day(2), day(4), day(6)]);
    }

    #[test]
    fn missing_series_is_fatal() {
        let port = MockSeriesPort::new();
        let mut engine = cli::build_engine(
            &FileConfigAdapter::from_string("[series]\nasset_path = asset.csv\n").unwrap(),
        )
        .unwrap();
        let result =
            cli::run_history_pipeline(&port, &settings(None), &mut engine, &mut VecSink::default());
        assert!(matches!(result, Err(RegimeError::SeriesRead { .. })));
    }
}

mod day_and_info {
    use super::*;

    fn asset_csv(days: usize) -> String {
        let mut content = String::from("Date;Open;High;Low;Close;Volume;ATR;ADX\n");
        for i in 0..days {
            content.push_str(&format!(
                "{};100;100;100;100;1000;1.0;10.0\n",
                day(i as i64 + 1).format("%d-%m-%y")
            ));
        }
        content
    }

    fn config_in(dir: &TempDir, ledger_mode: &str) -> tempfile::NamedTempFile {
        fs::write(dir.path().join("asset.csv"), asset_csv(13)).unwrap();
        write_temp_ini(&format!(
            "[series]\nasset_path = {}\ndelimiter = semicolon\n\n\
             [ledger]\npath = {}\nshape = reduced\nmode = {ledger_mode}\n",
            dir.path().join("asset.csv").display(),
            dir.path().join("Outputs").join("ledger.csv").display(),
        ))
    }

    #[test]
    fn day_command_classifies_and_writes_ledger() {
        let dir = TempDir::new().unwrap();
        let ini = config_in(&dir, "truncate");
        let config = cli::load_config(ini.path()).unwrap();

        let records = cli::serve_days(&config, &[day(10), day(12), day(12)]).unwrap();

        let codes: Vec<i8> = records.iter().map(|r| r.code()).collect();
        assert_eq!(codes, vec![-1, 0, 0]);
        let ledger = fs::read_to_string(dir.path().join("Outputs").join("ledger.csv")).unwrap();
        assert_eq!(
            ledger,
            "date,regime_code,regime_name\n\
             2024-01-10,-1,Null\n\
             2024-01-12,0,\"calm, sideways, uncorrelated\"\n"
        );
    }

    #[test]
    fn day_command_rejects_earlier_date() {
        let dir = TempDir::new().unwrap();
        let ini = config_in(&dir, "truncate");
        let config = cli::load_config(ini.path()).unwrap();

        assert!(matches!(
            cli::serve_days(&config, &[day(12), day(11)]),
            Err(RegimeError::OutOfOrderDay { .. })
        ));
    }

    #[test]
    fn day_command_appends_across_runs() {
        let dir = TempDir::new().unwrap();
        let ini = config_in(&dir, "append");
        let config = cli::load_config(ini.path()).unwrap();

        cli::serve_days(&config, &[day(12)]).unwrap();
        cli::serve_days(&config, &[day(13)]).unwrap();

        let ledger = fs::read_to_string(dir.path().join("Outputs").join("ledger.csv")).unwrap();
        let lines: Vec<&str> = ledger.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "date,regime_code,regime_name");
        assert!(lines[1].starts_with("2024-01-12,0,"));
        assert!(lines[2].starts_with("2024-01-13,0,"));
    }

    #[test]
    fn info_command_describes_configured_series() {
        let dir = TempDir::new().unwrap();
        let ini = config_in(&dir, "truncate");
        let config = cli::load_config(ini.path()).unwrap();

        let lines = cli::series_info_lines(&config).unwrap();

        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("rows=13"), "{}", lines[0]);
        assert!(lines[0].contains("first=2024-01-01"), "{}", lines[0]);
        assert!(lines[0].contains("last=2024-01-13"), "{}", lines[0]);
    }

    #[test]
    fn info_command_reports_missing_series() {
        let dir = TempDir::new().unwrap();
        let ini = write_temp_ini(&format!(
            "[series]\nasset_path = {}\n",
            dir.path().join("absent.csv").display()
        ));
        let config = cli::load_config(ini.path()).unwrap();
        assert!(cli::series_info_lines(&config).is_err());
    }
}
