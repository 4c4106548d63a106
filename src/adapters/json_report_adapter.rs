//! JSON report adapter implementing ReportPort.
//!
//! Writes complete result documents: configuration, metrics, analysis text
//! and history for a single run; configuration, benchmarks and every grid
//! point for a sweep.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::adapters::csv_report_adapter::{labeled_history, LabeledHistoryRow};
use crate::domain::backtest::{BacktestConfig, BacktestResult, RunMetrics};
use crate::domain::error::RotatorError;
use crate::domain::leverage::HybridPoint;
use crate::domain::strategy::AssetLabels;
use crate::domain::sweep::SweepResult;
use crate::ports::report_port::ReportPort;

#[derive(Serialize)]
struct BacktestDocument<'a> {
    labels: &'a AssetLabels,
    config: &'a BacktestConfig,
    metrics: &'a RunMetrics,
    analysis: &'a str,
    history: Vec<LabeledHistoryRow<'a>>,
}

#[derive(Serialize)]
struct InspectionDocument<'a> {
    labels: &'a AssetLabels,
    points: &'a [HybridPoint],
}

pub fn backtest_json(result: &BacktestResult, labels: &AssetLabels) -> Result<String, RotatorError> {
    let doc = BacktestDocument {
        labels,
        config: &result.config,
        metrics: &result.metrics,
        analysis: &result.analysis,
        history: labeled_history(&result.history, labels),
    };
    to_pretty(&doc)
}

pub fn sweep_json(result: &SweepResult) -> Result<String, RotatorError> {
    to_pretty(result)
}

fn to_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String, RotatorError> {
    serde_json::to_string_pretty(value).map_err(|e| RotatorError::Report {
        reason: format!("failed to serialize report: {e}"),
    })
}

pub struct JsonReportAdapter;

impl JsonReportAdapter {
    fn write_file(content: &str, output_path: &Path) -> Result<(), RotatorError> {
        let file = File::create(output_path).map_err(|e| RotatorError::Report {
            reason: format!("failed to create {}: {}", output_path.display(), e),
        })?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

impl ReportPort for JsonReportAdapter {
    fn write_backtest(
        &self,
        result: &BacktestResult,
        labels: &AssetLabels,
        output_path: &Path,
    ) -> Result<(), RotatorError> {
        Self::write_file(&backtest_json(result, labels)?, output_path)
    }

    fn write_sweep(&self, result: &SweepResult, output_path: &Path) -> Result<(), RotatorError> {
        Self::write_file(&sweep_json(result)?, output_path)
    }

    fn write_inspection(
        &self,
        points: &[HybridPoint],
        labels: &AssetLabels,
        output_path: &Path,
    ) -> Result<(), RotatorError> {
        Self::write_file(&to_pretty(&InspectionDocument { labels, points })?, output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::run_backtest_on;
    use crate::domain::align::AlignedRow;
    use crate::domain::frequency::RebalanceFrequency;
    use crate::domain::strategy::StrategyParams;
    use crate::domain::sweep::{run_sweep_on, ParamRange, SweepConfig};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn rows(count: usize) -> Vec<AlignedRow> {
        let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        (0..count)
            .map(|i| AlignedRow {
                date: start + chrono::Duration::days(i as i64),
                asset_a: 100.0 + i as f64,
                asset_b: 80.0 + 0.5 * i as f64,
                rate_pct: 1.0,
                leveraged: None,
            })
            .collect()
    }

    fn backtest() -> BacktestResult {
        let config = BacktestConfig {
            params: StrategyParams {
                lookback_months: 1,
                smoothing_days: 0,
                frequency: RebalanceFrequency::SemiAnnually,
                transaction_cost_pct: 0.1,
                initial_capital: 10_000.0,
            },
            use_leverage: true,
            start_date: None,
            end_date: None,
        };
        run_backtest_on(&rows(90), &config)
    }

    #[test]
    fn backtest_document_has_expected_shape() {
        let labels = AssetLabels {
            asset_a: "BRK".into(),
            asset_b: "NDX".into(),
        };
        let json = backtest_json(&backtest(), &labels).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["labels"]["asset_b"], "NDX");
        assert_eq!(value["config"]["params"]["frequency"], "Semi-Annually");
        assert_eq!(value["config"]["use_leverage"], true);
        assert_eq!(value["config"]["start_date"], serde_json::Value::Null);
        assert_eq!(value["metrics"]["asset_a"]["trade_count"], 1);
        assert!(value["analysis"].as_str().unwrap().starts_with("ANALYSIS"));
        assert_eq!(value["history"][0]["date"], "2022-01-03");
        assert_eq!(value["history"][0]["held_asset"], "CASH");
    }

    #[test]
    fn sweep_document_lists_points_and_benchmarks() {
        let config = SweepConfig {
            lookback: ParamRange::new(1, 2, 1),
            smoothing: ParamRange::single(0),
            frequencies: vec![RebalanceFrequency::Monthly],
            transaction_cost_pct: 0.1,
            initial_capital: 10_000.0,
            use_leverage: false,
            start_date: None,
            end_date: None,
            parallel: false,
        };
        let result = run_sweep_on(&rows(120), &config);
        let value: serde_json::Value = serde_json::from_str(&sweep_json(&result).unwrap()).unwrap();
        assert_eq!(value["points"].as_array().unwrap().len(), 2);
        assert_eq!(value["points"][1]["lookback_months"], 2);
        assert_eq!(value["benchmarks"]["asset_a"]["trade_count"], 1);
        assert_eq!(value["config"]["lookback"]["end"], 2);
    }

    #[test]
    fn adapter_writes_inspection_file() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("inspect.json");
        let points = vec![HybridPoint {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            asset_a: 1.0,
            asset_b: 2.0,
            synthetic_leveraged: 2.0,
            is_real_leveraged: false,
        }];
        JsonReportAdapter
            .write_inspection(&points, &AssetLabels::default(), &out)
            .unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(value["labels"]["asset_a"], "A");
        assert_eq!(value["points"][0]["is_real_leveraged"], false);
    }
}
