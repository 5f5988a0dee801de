//! Model Builder: the MILP formulation over the aligned dispatch grid.
//!
//! Per half-hour interval `t` and market `m` the model carries continuous
//! charge and discharge powers, one shared binary charging indicator, and a
//! continuous SoC value per interval boundary. The binary is shared across
//! markets: the battery cannot physically charge and discharge at the same
//! instant regardless of which market the energy serves.

use good_lp::variable::UnsolvedProblem;
use good_lp::{constraint, variable, Constraint, Expression, ProblemVariables, Variable};

use crate::domain::BatteryProperties;
use crate::optimiser::align::{AlignedPrices, GRID_STEP_HOURS};

/// Caller knobs that change the formulation rather than the solver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelOptions {
    /// When set, pin the SoC at the end of the horizon to this value.
    pub terminal_soc_mwh: Option<f64>,
}

/// Handles to every decision variable, indexed by grid interval.
///
/// `soc` has one extra entry: `soc[t]` is the stored energy at the start of
/// interval `t`, so `soc[n]` is the end-of-horizon state.
pub struct DecisionVars {
    pub charge_m1: Vec<Variable>,
    pub discharge_m1: Vec<Variable>,
    pub charge_m2: Vec<Variable>,
    pub discharge_m2: Vec<Variable>,
    pub soc: Vec<Variable>,
    pub is_charging: Vec<Variable>,
}

/// A fully specified MILP, ready for any backend.
///
/// The objective is kept alongside the problem so later stages can evaluate
/// it against a solved assignment.
pub struct BessModel {
    pub problem: UnsolvedProblem,
    pub constraints: Vec<Constraint>,
    pub objective: Expression,
    pub vars: DecisionVars,
    pub intervals: usize,
}

/// Build the MILP from battery parameters and aligned prices.
///
/// Inputs are assumed validated; construction itself cannot fail.
pub fn build(
    battery: &BatteryProperties,
    prices: &AlignedPrices,
    options: &ModelOptions,
) -> BessModel {
    let n = prices.grid.len();
    let mut problem = ProblemVariables::new();

    let charge_m1 = problem.add_vector(variable().min(0.0).max(battery.max_charge_mw), n);
    let discharge_m1 = problem.add_vector(variable().min(0.0).max(battery.max_discharge_mw), n);
    let charge_m2 = problem.add_vector(variable().min(0.0).max(battery.max_charge_mw), n);
    let discharge_m2 = problem.add_vector(variable().min(0.0).max(battery.max_discharge_mw), n);
    let soc = problem.add_vector(
        variable().min(battery.soc_min_mwh).max(battery.soc_max_mwh),
        n + 1,
    );
    let is_charging = problem.add_vector(variable().binary(), n);

    // Net revenue per interval, both markets priced on the half-hour grid.
    // The Market 2 price vector repeats each hourly price across its two
    // half-hours, and the consistency constraints below hold the Market 2
    // powers constant over the same pair, so each hourly settlement is priced
    // exactly once at power x 1 h x hourly price.
    let objective = (0..n)
        .map(|t| {
            let m1 = prices.market1_gbp_per_mwh[t] * (discharge_m1[t] - charge_m1[t]);
            let m2 = prices.market2_gbp_per_mwh[t] * (discharge_m2[t] - charge_m2[t]);
            (m1 + m2) * GRID_STEP_HOURS
        })
        .sum::<Expression>();

    let mut constraints = Vec::with_capacity(4 * n + 2);

    constraints.push(constraint!(soc[0] == battery.initial_soc_mwh));

    for t in 0..n {
        // One pair of constraints covers both the battery-wide power cap and
        // mutual exclusion: all powers are non-negative, so a zero indicator
        // forces every charge variable to zero and vice versa.
        constraints.push(constraint!(
            charge_m1[t] + charge_m2[t] <= battery.max_charge_mw * is_charging[t]
        ));
        constraints.push(constraint!(
            discharge_m1[t] + discharge_m2[t]
                <= battery.max_discharge_mw * (1.0 - is_charging[t])
        ));

        // Stored energy gains charged energy scaled by the charging
        // efficiency and loses discharged energy scaled by the inverse of
        // the discharging efficiency.
        let charged = (charge_m1[t] + charge_m2[t]) * (battery.charging_efficiency * GRID_STEP_HOURS);
        let discharged = (discharge_m1[t] + discharge_m2[t])
            * (GRID_STEP_HOURS / battery.discharging_efficiency);
        constraints.push(constraint!(soc[t + 1] == soc[t] + charged - discharged));
    }

    // Market 2 settles hourly: both half-hour decisions of one settlement
    // window must carry the same committed power.
    for k in 0..n / 2 {
        let (first, second) = (2 * k, 2 * k + 1);
        constraints.push(constraint!(charge_m2[first] == charge_m2[second]));
        constraints.push(constraint!(discharge_m2[first] == discharge_m2[second]));
    }

    if let Some(target) = options.terminal_soc_mwh {
        constraints.push(constraint!(soc[n] == target));
    }

    BessModel {
        problem: problem.maximise(objective.clone()),
        constraints,
        objective,
        vars: DecisionVars {
            charge_m1,
            discharge_m1,
            charge_m2,
            discharge_m2,
            soc,
            is_charging,
        },
        intervals: n,
    }
}
