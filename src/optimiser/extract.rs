//! Result Extractor: turn a raw variable assignment into a reportable
//! [`DispatchSolution`].
//!
//! Besides reshaping the series, this stage recomputes the objective from the
//! extracted values and cross-checks it against the solver-reported figure.
//! A mismatch beyond floating-point tolerance points at a broken mapping
//! between variables and grid coordinates and is logged loudly.

use itertools::izip;
use tracing::warn;

use crate::domain::{
    BatteryMode, BatteryProperties, DispatchInterval, DispatchSolution, DispatchSummary,
};
use crate::optimiser::align::{AlignedPrices, GRID_STEP_HOURS};
use crate::optimiser::solver::{RawAssignment, SolveOptions};

/// Powers below this are solver noise, not dispatch decisions.
const POWER_TOLERANCE_MW: f64 = 1e-6;

/// Relative tolerance for the objective cross-check.
const OBJECTIVE_TOLERANCE: f64 = 1e-6;

pub fn extract(
    assignment: &RawAssignment,
    battery: &BatteryProperties,
    prices: &AlignedPrices,
    options: &SolveOptions,
) -> DispatchSolution {
    let n = prices.grid.len();
    let mut intervals = Vec::with_capacity(n);
    let mut recomputed_gbp = 0.0;
    let mut profit_gbp_m1 = 0.0;
    let mut profit_gbp_m2 = 0.0;
    let mut energy_charged_mwh = 0.0;
    let mut energy_discharged_mwh = 0.0;

    for (t, (start, &c1, &d1, &c2, &d2)) in izip!(
        prices.grid.iter(),
        &assignment.charge_mw_m1,
        &assignment.discharge_mw_m1,
        &assignment.charge_mw_m2,
        &assignment.discharge_mw_m2,
    )
    .enumerate()
    {
        let m1 = GRID_STEP_HOURS * prices.market1_gbp_per_mwh[t] * (d1 - c1);
        let m2 = GRID_STEP_HOURS * prices.market2_gbp_per_mwh[t] * (d2 - c2);
        profit_gbp_m1 += m1;
        profit_gbp_m2 += m2;
        recomputed_gbp += m1 + m2;
        energy_charged_mwh += GRID_STEP_HOURS * (c1 + c2);
        energy_discharged_mwh += GRID_STEP_HOURS * (d1 + d2);

        intervals.push(DispatchInterval {
            start,
            charge_mw_m1: c1,
            discharge_mw_m1: d1,
            charge_mw_m2: c2,
            discharge_mw_m2: d2,
            soc_mwh: assignment.soc_mwh[t],
            mode: mode_of(c1 + c2, d1 + d2),
            net_volume_mwh_m1: GRID_STEP_HOURS * (d1 - c1),
            net_volume_mwh_m2: GRID_STEP_HOURS * (d2 - c2),
        });
    }

    let reported = assignment.objective_gbp;
    let tolerance = OBJECTIVE_TOLERANCE * reported.abs().max(1.0);
    if (recomputed_gbp - reported).abs() > tolerance {
        warn!(
            reported_gbp = reported,
            recomputed_gbp,
            "solver-reported objective disagrees with the extracted series"
        );
    }

    let solution = DispatchSolution {
        status: assignment.status,
        objective_gbp: reported,
        final_soc_mwh: assignment.soc_mwh.last().copied().unwrap_or(0.0),
        intervals,
        summary: DispatchSummary {
            total_profit_gbp: recomputed_gbp,
            profit_gbp_m1,
            profit_gbp_m2,
            energy_charged_mwh,
            energy_discharged_mwh,
            // Capacity is validated positive before the model is built.
            equivalent_cycles: energy_discharged_mwh / battery.capacity_mwh,
            solve_time_seconds: assignment.solve_time.as_secs_f64(),
        },
    };
    tracing::debug!(
        backend = %options.backend,
        status = %solution.status,
        objective_gbp = solution.objective_gbp,
        cycles = solution.summary.equivalent_cycles,
        "solution extracted"
    );
    solution
}

fn mode_of(charge_mw: f64, discharge_mw: f64) -> BatteryMode {
    if charge_mw > POWER_TOLERANCE_MW {
        BatteryMode::Charging
    } else if discharge_mw > POWER_TOLERANCE_MW {
        BatteryMode::Discharging
    } else {
        BatteryMode::Idle
    }
}
