//! One-shot orchestration of a complete optimise job: check files, ingest,
//! run the core pipeline, render results.

use std::time::Instant;

use thiserror::Error;
use tracing::{info, info_span};
use uuid::Uuid;

use crate::domain::SolveStatus;
use crate::io::{self, report::ReportPaths, IoError};
use crate::optimiser::{self, ModelOptions, OptimiserError, SolveOptions};

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Optimiser(#[from] OptimiserError),
}

/// Everything one optimisation request needs, resolved from configuration
/// defaults plus per-request overrides before the job starts.
#[derive(Debug, Clone)]
pub struct OptimiseJob {
    pub market_data_path: String,
    pub battery_data_path: String,
    pub results_path: String,
    pub model: ModelOptions,
    pub solve: SolveOptions,
    pub decimal_places: u32,
}

/// What the API reports back for a finished job.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub job_id: Uuid,
    pub status: SolveStatus,
    pub objective_gbp: f64,
    pub messages: Vec<String>,
    pub outputs: ReportPaths,
}

impl OptimiseJob {
    /// Run the job to completion. Blocking and CPU-bound; callers on an
    /// async runtime run this on the blocking pool.
    pub fn run(&self) -> Result<JobReport, JobError> {
        let job_id = Uuid::new_v4();
        let span = info_span!("optimise_job", %job_id);
        let _guard = span.enter();
        let started = Instant::now();

        // Path problems short-circuit before any parsing or solving.
        let market_path = io::files::validate_excel_input(&self.market_data_path)?;
        let battery_path = io::files::validate_excel_input(&self.battery_data_path)?;
        let results_path = io::files::prepare_output_path(&self.results_path)?;

        let battery = io::workbook::read_battery_properties(&battery_path)?;
        let (market1, market2) = io::workbook::read_market_series(&market_path)?;

        let solution =
            optimiser::optimise(&battery, &market1, &market2, &self.model, &self.solve)?;

        let outputs = io::report::write_reports(&solution, &results_path, self.decimal_places)?;

        let report = JobReport {
            job_id,
            status: solution.status,
            objective_gbp: solution.objective_gbp,
            messages: vec![
                format!("solver used: {}", self.solve.backend),
                format!("solver status: {}", solution.status),
                format!(
                    "optimiser run time (s): {:.3}",
                    solution.summary.solve_time_seconds
                ),
            ],
            outputs,
        };
        info!(
            status = %report.status,
            objective_gbp = report.objective_gbp,
            elapsed_s = started.elapsed().as_secs_f64(),
            "job finished"
        );
        Ok(report)
    }
}
