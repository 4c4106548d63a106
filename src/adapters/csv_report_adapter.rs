//! CSV report adapter implementing ReportPort.
//!
//! One table per result kind: the down-sampled history of a single run, the
//! sweep grid (one row per cell, nested-loop order) and the inspection view.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::RotatorError;
use crate::domain::leverage::HybridPoint;
use crate::domain::strategy::{AssetLabels, HistoryPoint};
use crate::domain::sweep::SweepResult;
use crate::ports::report_port::ReportPort;

/// History row with the holding rendered through the configured labels.
#[derive(Debug, Serialize)]
pub struct LabeledHistoryRow<'a> {
    pub date: NaiveDate,
    pub strategy: f64,
    pub asset_a: f64,
    pub asset_b: f64,
    pub held_asset: &'a str,
    pub drawdown: f64,
}

pub fn labeled_history<'a>(
    history: &[HistoryPoint],
    labels: &'a AssetLabels,
) -> Vec<LabeledHistoryRow<'a>> {
    history
        .iter()
        .map(|p| LabeledHistoryRow {
            date: p.date,
            strategy: p.strategy,
            asset_a: p.asset_a,
            asset_b: p.asset_b,
            held_asset: labels.holding(p.held),
            drawdown: p.drawdown,
        })
        .collect()
}

fn report_err(e: impl std::fmt::Display) -> RotatorError {
    RotatorError::Report {
        reason: e.to_string(),
    }
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, RotatorError> {
    let bytes = wtr.into_inner().map_err(report_err)?;
    String::from_utf8(bytes).map_err(report_err)
}

pub fn history_csv(result: &BacktestResult, labels: &AssetLabels) -> Result<String, RotatorError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in labeled_history(&result.history, labels) {
        wtr.serialize(row).map_err(report_err)?;
    }
    finish(wtr)
}

pub fn sweep_csv(result: &SweepResult) -> Result<String, RotatorError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "lookback_months",
        "smoothing_days",
        "frequency",
        "cagr",
        "max_drawdown",
        "sharpe_ratio",
        "volatility",
        "final_balance",
        "trade_count",
    ])
    .map_err(report_err)?;

    for p in &result.points {
        let m = &p.metrics;
        wtr.write_record([
            p.lookback_months.to_string(),
            p.smoothing_days.to_string(),
            p.frequency.to_string(),
            format!("{:.6}", m.cagr),
            format!("{:.6}", m.max_drawdown),
            format!("{:.4}", m.sharpe_ratio),
            format!("{:.6}", m.volatility),
            format!("{:.2}", m.final_balance),
            m.trade_count.to_string(),
        ])
        .map_err(report_err)?;
    }
    finish(wtr)
}

pub fn inspection_csv(points: &[HybridPoint], labels: &AssetLabels) -> Result<String, RotatorError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "date",
        labels.asset_a.as_str(),
        labels.asset_b.as_str(),
        "synthetic_leveraged",
        "is_real_leveraged",
    ])
    .map_err(report_err)?;

    for p in points {
        wtr.write_record([
            p.date.format("%Y-%m-%d").to_string(),
            p.asset_a.to_string(),
            p.asset_b.to_string(),
            format!("{:.4}", p.synthetic_leveraged),
            p.is_real_leveraged.to_string(),
        ])
        .map_err(report_err)?;
    }
    finish(wtr)
}

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    fn write_file(content: &str, output_path: &Path) -> Result<(), RotatorError> {
        fs::write(output_path, content).map_err(|e| RotatorError::Report {
            reason: format!("failed to write {}: {}", output_path.display(), e),
        })
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_backtest(
        &self,
        result: &BacktestResult,
        labels: &AssetLabels,
        output_path: &Path,
    ) -> Result<(), RotatorError> {
        Self::write_file(&history_csv(result, labels)?, output_path)
    }

    fn write_sweep(&self, result: &SweepResult, output_path: &Path) -> Result<(), RotatorError> {
        Self::write_file(&sweep_csv(result)?, output_path)
    }

    fn write_inspection(
        &self,
        points: &[HybridPoint],
        labels: &AssetLabels,
        output_path: &Path,
    ) -> Result<(), RotatorError> {
        Self::write_file(&inspection_csv(points, labels)?, output_path)
    }
}
