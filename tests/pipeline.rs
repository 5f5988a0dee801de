//! End-to-end tests of the optimisation core: in-memory price series and
//! battery parameters through alignment, model building, solve and
//! extraction.

use battery_trade_optimiser::domain::{BatteryProperties, Market, MarketPriceSeries, PricePoint};
use battery_trade_optimiser::optimiser::{
    self, ModelOptions, OptimiserError, SolveOptions, SolverBackend,
};
use chrono::{NaiveDate, NaiveDateTime};

fn ts(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn series(market: Market, start: NaiveDateTime, prices: &[f64]) -> MarketPriceSeries {
    let step = market.resolution().step();
    MarketPriceSeries::new(
        market,
        prices
            .iter()
            .enumerate()
            .map(|(i, &price_gbp_per_mwh)| PricePoint {
                timestamp: start + step * i as i32,
                price_gbp_per_mwh,
            })
            .collect(),
    )
}

fn battery() -> BatteryProperties {
    BatteryProperties {
        capacity_mwh: 10.0,
        initial_soc_mwh: 0.0,
        max_charge_mw: 5.0,
        max_discharge_mw: 5.0,
        charging_efficiency: 1.0,
        discharging_efficiency: 1.0,
        soc_min_mwh: 0.0,
        soc_max_mwh: 10.0,
        lifetime_years: 10.0,
        lifetime_cycles: 5000.0,
        degradation_per_cycle: 0.001,
        capex_gbp: 0.0,
        opex_fixed_annual_gbp: 0.0,
    }
}

#[cfg(any(feature = "solver-highs", feature = "solver-cbc"))]
fn compiled_backend() -> SolverBackend {
    if cfg!(feature = "solver-highs") {
        SolverBackend::Highs
    } else {
        SolverBackend::Cbc
    }
}

#[cfg(any(feature = "solver-highs", feature = "solver-cbc"))]
fn options() -> SolveOptions {
    SolveOptions {
        backend: compiled_backend(),
        ..SolveOptions::default()
    }
}

#[cfg(any(feature = "solver-highs", feature = "solver-cbc"))]
mod solved {
    use super::*;
    use battery_trade_optimiser::domain::{BatteryMode, SolveStatus};
    use itertools::Itertools;

    /// Cheap hour then dear hour in both markets: store 5 MWh at 10 and sell
    /// it at 20 for a profit of 50.
    #[test]
    fn arbitrage_over_two_hours_is_solved_to_optimality() {
        let m1 = series(Market::Market1, ts(10, 0), &[10.0, 10.0, 20.0, 20.0]);
        let m2 = series(Market::Market2, ts(10, 0), &[10.0, 20.0]);

        let solution = optimiser::optimise(
            &battery(),
            &m1,
            &m2,
            &ModelOptions::default(),
            &options(),
        )
        .unwrap();

        assert_eq!(solution.status, SolveStatus::Optimal);
        assert!(
            (solution.objective_gbp - 50.0).abs() < 1e-4,
            "objective was {}",
            solution.objective_gbp
        );
        assert!(solution.final_soc_mwh.abs() < 1e-6);
        assert_eq!(solution.intervals[0].mode, BatteryMode::Charging);
        assert_eq!(solution.intervals[3].mode, BatteryMode::Discharging);
    }

    #[test]
    fn accepted_solutions_respect_every_battery_invariant() {
        let battery = BatteryProperties {
            charging_efficiency: 0.9,
            discharging_efficiency: 0.9,
            initial_soc_mwh: 3.0,
            ..battery()
        };
        let m1 = series(
            Market::Market1,
            ts(8, 0),
            &[12.0, 15.0, 40.0, 38.0, 9.0, 11.0, 35.0, 42.0],
        );
        let m2 = series(Market::Market2, ts(8, 0), &[14.0, 39.0, 10.0, 41.0]);

        let solution = optimiser::optimise(
            &battery,
            &m1,
            &m2,
            &ModelOptions::default(),
            &options(),
        )
        .unwrap();

        let tolerance = 1e-5;
        for interval in &solution.intervals {
            // SoC window.
            assert!(interval.soc_mwh >= battery.soc_min_mwh - tolerance);
            assert!(interval.soc_mwh <= battery.soc_max_mwh + tolerance);
            // Power limits.
            assert!(interval.charge_mw_m1 + interval.charge_mw_m2 <= battery.max_charge_mw + tolerance);
            assert!(
                interval.discharge_mw_m1 + interval.discharge_mw_m2
                    <= battery.max_discharge_mw + tolerance
            );
            // Mutual exclusion across both markets.
            let charging = interval.charge_mw_m1 + interval.charge_mw_m2;
            let discharging = interval.discharge_mw_m1 + interval.discharge_mw_m2;
            assert!(
                charging <= tolerance || discharging <= tolerance,
                "interval {} both charges and discharges",
                interval.start
            );
        }

        // SoC recursion with efficiency scaling.
        for (a, b) in solution.intervals.iter().tuple_windows() {
            let charged = 0.5 * battery.charging_efficiency * (a.charge_mw_m1 + a.charge_mw_m2);
            let discharged =
                0.5 * (a.discharge_mw_m1 + a.discharge_mw_m2) / battery.discharging_efficiency;
            assert!(
                (b.soc_mwh - (a.soc_mwh + charged - discharged)).abs() < tolerance,
                "SoC recursion broken between {} and {}",
                a.start,
                b.start
            );
        }

        // Both half-hours of each hourly window carry one Market 2 commitment.
        for (a, b) in solution.intervals.iter().tuples() {
            assert!((a.charge_mw_m2 - b.charge_mw_m2).abs() < tolerance);
            assert!((a.discharge_mw_m2 - b.discharge_mw_m2).abs() < tolerance);
        }

        // Reported and recomputed objectives agree.
        assert!(
            (solution.summary.total_profit_gbp - solution.objective_gbp).abs()
                < 1e-4 * solution.objective_gbp.abs().max(1.0)
        );
    }

    #[test]
    fn positive_gap_reports_feasible_within_gap() {
        let m1 = series(Market::Market1, ts(10, 0), &[10.0, 10.0, 20.0, 20.0]);
        let m2 = series(Market::Market2, ts(10, 0), &[10.0, 20.0]);
        let options = SolveOptions {
            mip_gap: 0.05,
            ..options()
        };

        let solution =
            optimiser::optimise(&battery(), &m1, &m2, &ModelOptions::default(), &options).unwrap();
        assert_eq!(solution.status, SolveStatus::FeasibleWithinGap);
        assert!(solution.objective_gbp >= 50.0 * 0.95 - 1e-6);
    }

    #[test]
    fn stored_charge_with_no_soc_headroom_is_infeasible() {
        let battery = BatteryProperties {
            soc_min_mwh: 0.0,
            soc_max_mwh: 0.0,
            initial_soc_mwh: 2.0,
            ..battery()
        };
        let m1 = series(Market::Market1, ts(10, 0), &[10.0, 10.0]);
        let m2 = series(Market::Market2, ts(10, 0), &[10.0]);

        let err = optimiser::optimise(&battery, &m1, &m2, &ModelOptions::default(), &options())
            .unwrap_err();
        assert!(matches!(err, OptimiserError::Infeasible), "{err}");
    }

    #[test]
    fn terminal_soc_target_is_honoured() {
        let m1 = series(Market::Market1, ts(10, 0), &[10.0, 10.0, 10.0, 10.0]);
        let m2 = series(Market::Market2, ts(10, 0), &[10.0, 10.0]);
        let model = ModelOptions {
            terminal_soc_mwh: Some(5.0),
        };

        let solution =
            optimiser::optimise(&battery(), &m1, &m2, &model, &options()).unwrap();
        assert!((solution.final_soc_mwh - 5.0).abs() < 1e-5);
        // Buying 5 MWh at a flat 10 costs 50.
        assert!((solution.objective_gbp + 50.0).abs() < 1e-4);
    }
}

#[test]
fn misaligned_series_fail_before_any_solver_is_touched() {
    // The requested backend may not even be compiled in; alignment must
    // reject the inputs first.
    let options = SolveOptions {
        backend: SolverBackend::Cbc,
        ..SolveOptions::default()
    };
    let m1 = series(Market::Market1, ts(0, 0), &[10.0, 10.0]);
    let m2 = series(Market::Market2, ts(12, 0), &[10.0, 20.0]);

    let err = optimiser::optimise(&battery(), &m1, &m2, &ModelOptions::default(), &options)
        .unwrap_err();
    assert!(matches!(err, OptimiserError::DataAlignment(_)), "{err}");
}

#[test]
fn empty_series_fail_before_any_solver_is_touched() {
    let m1 = series(Market::Market1, ts(0, 0), &[]);
    let m2 = series(Market::Market2, ts(0, 0), &[10.0]);

    let err = optimiser::optimise(
        &battery(),
        &m1,
        &m2,
        &ModelOptions::default(),
        &SolveOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, OptimiserError::DataAlignment(_)), "{err}");
}

#[test]
fn invalid_parameters_fail_before_alignment() {
    let battery = BatteryProperties {
        charging_efficiency: 1.4,
        ..battery()
    };
    let m1 = series(Market::Market1, ts(0, 0), &[]);
    let m2 = series(Market::Market2, ts(0, 0), &[]);

    // Both series are empty, but parameter validation runs first.
    let err = optimiser::optimise(
        &battery,
        &m1,
        &m2,
        &ModelOptions::default(),
        &SolveOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, OptimiserError::InvalidParameter(_)), "{err}");
}

#[cfg(not(feature = "solver-cbc"))]
#[test]
fn requesting_a_backend_that_is_not_compiled_in_is_unavailable() {
    let options = SolveOptions {
        backend: SolverBackend::Cbc,
        ..SolveOptions::default()
    };
    let m1 = series(Market::Market1, ts(10, 0), &[10.0, 10.0]);
    let m2 = series(Market::Market2, ts(10, 0), &[10.0]);

    let err = optimiser::optimise(&battery(), &m1, &m2, &ModelOptions::default(), &options)
        .unwrap_err();
    assert!(matches!(err, OptimiserError::SolverUnavailable(_)), "{err}");
}
