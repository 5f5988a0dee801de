//! CSV rendering of a dispatch solution: one time-series file and one
//! summary file, both derived from the caller-supplied results path.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use super::IoError;
use crate::domain::DispatchSolution;

/// Where the rendered results ended up; echoed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportPaths {
    pub timeseries: PathBuf,
    pub summary: PathBuf,
}

/// Write `<stem>_timeseries.csv` and `<stem>_summary.csv` next to the
/// results path.
pub fn write_reports(
    solution: &DispatchSolution,
    results_path: &Path,
    decimal_places: u32,
) -> Result<ReportPaths, IoError> {
    let paths = ReportPaths {
        timeseries: sibling(results_path, "timeseries"),
        summary: sibling(results_path, "summary"),
    };

    write_timeseries(solution, &paths.timeseries, decimal_places)?;
    write_summary(solution, &paths.summary, decimal_places)?;

    info!(
        timeseries = %paths.timeseries.display(),
        summary = %paths.summary.display(),
        "results rendered"
    );
    Ok(paths)
}

fn write_timeseries(
    solution: &DispatchSolution,
    path: &Path,
    decimal_places: u32,
) -> Result<(), IoError> {
    let report_err = |reason: String| IoError::Report {
        path: path.to_path_buf(),
        reason,
    };
    let mut writer = csv::Writer::from_path(path).map_err(|e| report_err(e.to_string()))?;

    writer
        .write_record([
            "timestamp",
            "charge_mw_m1",
            "discharge_mw_m1",
            "charge_mw_m2",
            "discharge_mw_m2",
            "soc_mwh",
            "mode",
            "net_volume_mwh_m1",
            "net_volume_mwh_m2",
        ])
        .map_err(|e| report_err(e.to_string()))?;

    for interval in &solution.intervals {
        writer
            .write_record([
                interval.start.format("%Y-%m-%d %H:%M").to_string(),
                round(interval.charge_mw_m1, decimal_places),
                round(interval.discharge_mw_m1, decimal_places),
                round(interval.charge_mw_m2, decimal_places),
                round(interval.discharge_mw_m2, decimal_places),
                round(interval.soc_mwh, decimal_places),
                interval.mode.to_string(),
                round(interval.net_volume_mwh_m1, decimal_places),
                round(interval.net_volume_mwh_m2, decimal_places),
            ])
            .map_err(|e| report_err(e.to_string()))?;
    }

    writer.flush().map_err(|e| report_err(e.to_string()))
}

fn write_summary(
    solution: &DispatchSolution,
    path: &Path,
    decimal_places: u32,
) -> Result<(), IoError> {
    let report_err = |reason: String| IoError::Report {
        path: path.to_path_buf(),
        reason,
    };
    let mut writer = csv::Writer::from_path(path).map_err(|e| report_err(e.to_string()))?;

    let summary = &solution.summary;
    let rows = [
        ("status", solution.status.to_string()),
        ("objective_gbp", round(solution.objective_gbp, decimal_places)),
        ("profit_gbp_m1", round(summary.profit_gbp_m1, decimal_places)),
        ("profit_gbp_m2", round(summary.profit_gbp_m2, decimal_places)),
        (
            "energy_charged_mwh",
            round(summary.energy_charged_mwh, decimal_places),
        ),
        (
            "energy_discharged_mwh",
            round(summary.energy_discharged_mwh, decimal_places),
        ),
        (
            "equivalent_cycles",
            round(summary.equivalent_cycles, decimal_places),
        ),
        ("final_soc_mwh", round(solution.final_soc_mwh, decimal_places)),
        (
            "solve_time_seconds",
            round(summary.solve_time_seconds, decimal_places),
        ),
    ];

    writer
        .write_record(["field", "value"])
        .map_err(|e| report_err(e.to_string()))?;
    for (field, value) in rows {
        writer
            .write_record([field, value.as_str()])
            .map_err(|e| report_err(e.to_string()))?;
    }
    writer.flush().map_err(|e| report_err(e.to_string()))
}

/// `results.csv` -> `results_timeseries.csv` in the same directory.
fn sibling(results_path: &Path, suffix: &str) -> PathBuf {
    let stem = results_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("results");
    results_path.with_file_name(format!("{stem}_{suffix}.csv"))
}

fn round(value: f64, decimal_places: u32) -> String {
    format!("{value:.prec$}", prec = decimal_places as usize)
}
