//! The optimisation core: a synchronous pipeline that turns battery
//! properties and two misaligned price series into a dispatch schedule.
//!
//! Stages run strictly in order, each consuming the previous stage's output:
//! [`align`] reconciles the two price series onto one half-hour grid,
//! [`model`] builds the MILP over that grid, [`solver`] hands the model to
//! the selected backend, and [`extract`] turns the raw assignment into a
//! [`DispatchSolution`](crate::domain::DispatchSolution). No stage keeps
//! mutable state between invocations, so independent runs are isolated.

pub mod align;
pub mod extract;
pub mod model;
pub mod solver;

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{BatteryProperties, DispatchSolution, MarketPriceSeries, SolveStatus};

pub use align::{AlignedPrices, TimeGrid, GRID_STEP_HOURS};
pub use model::{BessModel, ModelOptions};
pub use solver::{SolveOptions, SolverBackend};

/// Everything that can go wrong between input validation and extraction.
///
/// Infeasibility, unboundedness and solver loss are terminal for one
/// invocation: the core never retries with a relaxed model.
#[derive(Debug, Error)]
pub enum OptimiserError {
    #[error("price series misaligned: {0}")]
    DataAlignment(String),

    #[error("invalid battery parameter: {0}")]
    InvalidParameter(String),

    #[error("model is infeasible")]
    Infeasible,

    #[error("model is unbounded")]
    Unbounded,

    #[error("solver backend unavailable: {0}")]
    SolverUnavailable(String),

    #[error("solve timed out with no feasible incumbent")]
    TimedOut,

    #[error("solver failure: {0}")]
    Solver(String),
}

impl OptimiserError {
    /// The solve status this error corresponds to, for reporting.
    pub fn status(&self) -> SolveStatus {
        match self {
            OptimiserError::Infeasible => SolveStatus::Infeasible,
            OptimiserError::Unbounded => SolveStatus::Unbounded,
            OptimiserError::SolverUnavailable(_) => SolveStatus::SolverUnavailable,
            OptimiserError::TimedOut => SolveStatus::TimedOut,
            _ => SolveStatus::Error,
        }
    }
}

/// Run the full pipeline once: validate, align, build, solve, extract.
///
/// Parameter and alignment errors short-circuit before any solver work.
pub fn optimise(
    battery: &BatteryProperties,
    market1: &MarketPriceSeries,
    market2: &MarketPriceSeries,
    model_options: &ModelOptions,
    solve_options: &SolveOptions,
) -> Result<DispatchSolution, OptimiserError> {
    battery.validate()?;

    let prices = align::align(market1, market2)?;
    debug!(
        intervals = prices.grid.len(),
        start = %prices.grid.start(),
        "price series aligned onto dispatch grid"
    );

    let model = model::build(battery, &prices, model_options);
    let assignment = solver::solve(model, solve_options)?;
    let solution = extract::extract(&assignment, battery, &prices, solve_options);

    info!(
        status = %solution.status,
        objective_gbp = solution.objective_gbp,
        intervals = solution.intervals.len(),
        "optimisation finished"
    );
    Ok(solution)
}
