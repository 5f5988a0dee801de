use std::time::Instant;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::api::{error::ApiError, AppState};
use crate::domain::SolveStatus;
use crate::io::report::ReportPaths;
use crate::optimiser::{ModelOptions, SolverBackend};
use crate::runner::OptimiseJob;

/// Request body for `POST /api/v1/optimise`.
///
/// Solver fields are optional overrides on top of the configured defaults.
#[derive(Debug, Deserialize, Validate)]
pub struct OptimiseRequest {
    #[validate(length(min = 1))]
    pub market_data_path: String,
    #[validate(length(min = 1))]
    pub battery_data_path: String,
    #[validate(length(min = 1))]
    pub results_path: String,
    pub solver: Option<SolverBackend>,
    #[validate(range(min = 1))]
    pub time_limit_seconds: Option<u64>,
    #[validate(custom(function = "validate_mip_gap"))]
    pub mip_gap: Option<f64>,
    #[validate(range(min = 1))]
    pub threads: Option<u32>,
    pub presolve: Option<bool>,
    #[validate(range(min = 0.0))]
    pub terminal_soc_mwh: Option<f64>,
}

fn validate_mip_gap(gap: f64) -> Result<(), ValidationError> {
    if (0.0..1.0).contains(&gap) {
        Ok(())
    } else {
        Err(ValidationError::new("mip_gap_out_of_range"))
    }
}

#[derive(Debug, Serialize)]
pub struct OptimiseResponse {
    pub job_id: Uuid,
    pub job_status: String,
    pub solver_status: SolveStatus,
    pub objective_gbp: f64,
    pub messages: Vec<String>,
    pub outputs: ReportPaths,
    pub job_serving_time_seconds: f64,
}

/// POST /api/v1/optimise - run one optimisation job to completion.
pub async fn optimise_battery(
    State(state): State<AppState>,
    Json(request): Json<OptimiseRequest>,
) -> Result<Json<OptimiseResponse>, ApiError> {
    let started = Instant::now();
    request.validate()?;

    let job = build_job(&state, &request);

    // One permit per solve; requests beyond the configured concurrency wait
    // here rather than oversubscribing the backend.
    let _permit = state
        .solver_permits
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| ApiError::Internal("solver permit pool closed".into()))?;

    let report = tokio::task::spawn_blocking(move || job.run())
        .await
        .map_err(|e| ApiError::Internal(format!("optimise job panicked: {e}")))??;

    Ok(Json(OptimiseResponse {
        job_id: report.job_id,
        job_status: "SUCCESS".to_string(),
        solver_status: report.status,
        objective_gbp: report.objective_gbp,
        messages: report.messages,
        outputs: report.outputs,
        job_serving_time_seconds: started.elapsed().as_secs_f64(),
    }))
}

fn build_job(state: &AppState, request: &OptimiseRequest) -> OptimiseJob {
    let mut solve = state.config.solver.solve_options();
    if let Some(backend) = request.solver {
        solve.backend = backend;
    }
    if let Some(limit) = request.time_limit_seconds {
        solve.time_limit_seconds = limit;
    }
    if let Some(gap) = request.mip_gap {
        solve.mip_gap = gap;
    }
    if let Some(threads) = request.threads {
        solve.threads = threads;
    }
    if let Some(presolve) = request.presolve {
        solve.presolve = presolve;
    }

    OptimiseJob {
        market_data_path: request.market_data_path.clone(),
        battery_data_path: request.battery_data_path.clone(),
        results_path: request.results_path.clone(),
        model: ModelOptions {
            terminal_soc_mwh: request.terminal_soc_mwh,
        },
        solve,
        decimal_places: state.config.output.decimal_places,
    }
}
