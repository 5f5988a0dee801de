use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::battery::BatteryMode;

/// Outcome of one solver invocation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "PascalCase")]
pub enum SolveStatus {
    /// Proven optimal assignment.
    Optimal,
    /// Feasible assignment within the configured MIP gap.
    FeasibleWithinGap,
    Infeasible,
    Unbounded,
    /// Time budget exhausted with no feasible incumbent.
    TimedOut,
    /// Requested backend not compiled in or not installed.
    SolverUnavailable,
    Error,
}

impl SolveStatus {
    /// Whether a usable variable assignment accompanies this status.
    pub fn has_assignment(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::FeasibleWithinGap)
    }
}

/// Realized dispatch for one half-hour interval of the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchInterval {
    /// Start of the half-hour delivery period.
    pub start: NaiveDateTime,
    pub charge_mw_m1: f64,
    pub discharge_mw_m1: f64,
    pub charge_mw_m2: f64,
    pub discharge_mw_m2: f64,
    /// Stored energy at the start of the interval.
    pub soc_mwh: f64,
    pub mode: BatteryMode,
    /// Energy sold minus energy bought in Market 1 over this interval.
    pub net_volume_mwh_m1: f64,
    /// Half-hour share of the hourly Market 2 commitment.
    pub net_volume_mwh_m2: f64,
}

/// Aggregates over the whole dispatch horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchSummary {
    pub total_profit_gbp: f64,
    pub profit_gbp_m1: f64,
    pub profit_gbp_m2: f64,
    /// Grid-side energy drawn while charging.
    pub energy_charged_mwh: f64,
    /// Grid-side energy delivered while discharging.
    pub energy_discharged_mwh: f64,
    /// Discharged energy expressed in equivalent full cycles of the capacity.
    pub equivalent_cycles: f64,
    pub solve_time_seconds: f64,
}

/// The complete, immutable result of one optimisation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchSolution {
    pub status: SolveStatus,
    /// Objective value as reported by the solver.
    pub objective_gbp: f64,
    /// Stored energy at the end of the horizon.
    pub final_soc_mwh: f64,
    pub intervals: Vec<DispatchInterval>,
    pub summary: DispatchSummary,
}
