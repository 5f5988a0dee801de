use serde::{Deserialize, Serialize};

use crate::optimiser::OptimiserError;

/// Physical and economic properties of the battery being scheduled.
///
/// Loaded once per job and treated as immutable from then on. The lifetime,
/// degradation, capex and opex fields are carried through from the input
/// workbook but take no part in the trading objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryProperties {
    pub capacity_mwh: f64,
    pub initial_soc_mwh: f64,
    pub max_charge_mw: f64,
    pub max_discharge_mw: f64,
    /// Fraction of grid energy that ends up stored, in (0, 1].
    pub charging_efficiency: f64,
    /// Fraction of stored energy that reaches the grid, in (0, 1].
    pub discharging_efficiency: f64,
    pub soc_min_mwh: f64,
    pub soc_max_mwh: f64,
    pub lifetime_years: f64,
    pub lifetime_cycles: f64,
    pub degradation_per_cycle: f64,
    pub capex_gbp: f64,
    pub opex_fixed_annual_gbp: f64,
}

impl BatteryProperties {
    /// Check the numeric invariants the model relies on.
    ///
    /// This intentionally does not compare `initial_soc_mwh` against the SoC
    /// bounds: a stored charge outside the operating window is a question for
    /// the solver (infeasible model), not a malformed input.
    pub fn validate(&self) -> Result<(), OptimiserError> {
        if self.capacity_mwh <= 0.0 {
            return Err(OptimiserError::InvalidParameter(format!(
                "capacity must be positive, got {} MWh",
                self.capacity_mwh
            )));
        }
        if self.max_charge_mw <= 0.0 || self.max_discharge_mw <= 0.0 {
            return Err(OptimiserError::InvalidParameter(format!(
                "charge/discharge power limits must be positive, got {} MW / {} MW",
                self.max_charge_mw, self.max_discharge_mw
            )));
        }
        for (name, eff) in [
            ("charging efficiency", self.charging_efficiency),
            ("discharging efficiency", self.discharging_efficiency),
        ] {
            if !(eff > 0.0 && eff <= 1.0) {
                return Err(OptimiserError::InvalidParameter(format!(
                    "{name} must be in (0, 1], got {eff}"
                )));
            }
        }
        if self.soc_min_mwh < 0.0 || self.soc_max_mwh > self.capacity_mwh {
            return Err(OptimiserError::InvalidParameter(format!(
                "SoC bounds [{}, {}] MWh must lie within [0, {}] MWh",
                self.soc_min_mwh, self.soc_max_mwh, self.capacity_mwh
            )));
        }
        if self.soc_min_mwh > self.soc_max_mwh {
            return Err(OptimiserError::InvalidParameter(format!(
                "SoC bounds inverted: min {} MWh > max {} MWh",
                self.soc_min_mwh, self.soc_max_mwh
            )));
        }
        if self.initial_soc_mwh < 0.0 || self.initial_soc_mwh > self.capacity_mwh {
            return Err(OptimiserError::InvalidParameter(format!(
                "initial SoC {} MWh outside [0, {}] MWh",
                self.initial_soc_mwh, self.capacity_mwh
            )));
        }
        Ok(())
    }
}

/// Realized battery state in one dispatch interval.
///
/// Derived from the solved charge/discharge powers; the model guarantees that
/// charging and discharging are never both positive in the same interval, so
/// the three states are exhaustive and mutually exclusive.
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
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BatteryMode {
    Idle,
    Charging,
    Discharging,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn test_battery() -> BatteryProperties {
        BatteryProperties {
            capacity_mwh: 4.0,
            initial_soc_mwh: 2.0,
            max_charge_mw: 2.0,
            max_discharge_mw: 2.0,
            charging_efficiency: 0.95,
            discharging_efficiency: 0.95,
            soc_min_mwh: 0.0,
            soc_max_mwh: 4.0,
            lifetime_years: 10.0,
            lifetime_cycles: 5000.0,
            degradation_per_cycle: 0.001,
            capex_gbp: 500_000.0,
            opex_fixed_annual_gbp: 5000.0,
        }
    }

    #[test]
    fn valid_battery_passes() {
        assert!(test_battery().validate().is_ok());
    }

    #[rstest]
    #[case::zero_capacity(|b: &mut BatteryProperties| b.capacity_mwh = 0.0)]
    #[case::negative_capacity(|b: &mut BatteryProperties| b.capacity_mwh = -4.0)]
    #[case::zero_charge_power(|b: &mut BatteryProperties| b.max_charge_mw = 0.0)]
    #[case::zero_discharge_power(|b: &mut BatteryProperties| b.max_discharge_mw = 0.0)]
    #[case::zero_efficiency(|b: &mut BatteryProperties| b.charging_efficiency = 0.0)]
    #[case::efficiency_above_one(|b: &mut BatteryProperties| b.discharging_efficiency = 1.05)]
    #[case::inverted_soc_bounds(|b: &mut BatteryProperties| {
        b.soc_min_mwh = 3.0;
        b.soc_max_mwh = 1.0;
    })]
    #[case::soc_max_above_capacity(|b: &mut BatteryProperties| b.soc_max_mwh = 5.0)]
    #[case::negative_initial_soc(|b: &mut BatteryProperties| b.initial_soc_mwh = -1.0)]
    fn invalid_battery_is_rejected(#[case] mutate: fn(&mut BatteryProperties)) {
        let mut battery = test_battery();
        mutate(&mut battery);
        let err = battery.validate().unwrap_err();
        assert!(matches!(err, OptimiserError::InvalidParameter(_)));
    }

    #[test]
    fn soc_window_collapsed_to_zero_is_a_solver_question() {
        // An empty operating window with stored charge must reach the solver
        // as an infeasible model rather than fail input validation.
        let mut battery = test_battery();
        battery.soc_min_mwh = 0.0;
        battery.soc_max_mwh = 0.0;
        battery.initial_soc_mwh = 2.0;
        assert!(battery.validate().is_ok());
    }

    #[test]
    fn mode_round_trips_through_strings() {
        for mode in [
            BatteryMode::Idle,
            BatteryMode::Charging,
            BatteryMode::Discharging,
        ] {
            let parsed: BatteryMode = mode.to_string().parse().unwrap();
            assert_eq!(parsed, mode);
        }
    }
}
