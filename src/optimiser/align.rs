//! Time alignment: reconcile the two price series onto one half-hour grid.
//!
//! Market 1 settles half-hourly, Market 2 hourly. Dispatch decisions are made
//! at the finer resolution, so each hourly Market 2 price is repeated across
//! both half-hours it covers. Repetition, not interpolation: an hourly
//! settlement price applies unchanged to the whole delivery hour.

use chrono::{Duration, DurationRound, NaiveDateTime, Timelike};

use crate::domain::{MarketPriceSeries, Resolution};
use crate::optimiser::OptimiserError;

/// Duration of one dispatch interval, in hours.
pub const GRID_STEP_HOURS: f64 = 0.5;

/// The common ordered sequence of half-hour interval starts.
///
/// Always begins on a whole hour and spans an even number of steps, so every
/// hourly Market 2 settlement window owns exactly two grid slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeGrid {
    start: NaiveDateTime,
    steps: usize,
}

impl TimeGrid {
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn len(&self) -> usize {
        self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps == 0
    }

    /// Start of interval `i`.
    pub fn interval_start(&self, i: usize) -> NaiveDateTime {
        self.start + Duration::minutes(30) * i as i32
    }

    pub fn iter(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        (0..self.steps).map(|i| self.interval_start(i))
    }
}

/// A [`TimeGrid`] with the two price vectors indexed identically to it.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPrices {
    pub grid: TimeGrid,
    /// Market 1 half-hourly price per grid interval.
    pub market1_gbp_per_mwh: Vec<f64>,
    /// Market 2 hourly price repeated across both half-hours of its window.
    pub market2_gbp_per_mwh: Vec<f64>,
}

/// Round a timestamp to the nearest half-hour boundary.
///
/// Input data is allowed to drift a few minutes off the settlement boundary;
/// <15 min past goes down to :00, 15-44 to :30, 45+ up to the next hour.
pub fn round_to_half_hour(ts: NaiveDateTime) -> Result<NaiveDateTime, OptimiserError> {
    ts.duration_round(Duration::minutes(30))
        .map_err(|e| OptimiserError::DataAlignment(format!("cannot round timestamp {ts}: {e}")))
}

/// Align the two series onto one half-hour grid over their overlap.
///
/// Fails with [`OptimiserError::DataAlignment`] when either series is empty,
/// irregular after rounding, or the overlap is shorter than one whole
/// settlement hour.
pub fn align(
    market1: &MarketPriceSeries,
    market2: &MarketPriceSeries,
) -> Result<AlignedPrices, OptimiserError> {
    let m1 = rounded_regular_series(market1)?;
    let m2 = rounded_regular_series(market2)?;

    if m2.start.minute() != 0 {
        return Err(OptimiserError::DataAlignment(format!(
            "hourly series {} does not start on a whole hour ({})",
            market2.market, m2.start
        )));
    }

    // Half-open covered ranges, each series extended by its native step.
    let m1_end = m1.start + Duration::minutes(30) * m1.prices.len() as i32;
    let m2_end = m2.start + Duration::minutes(60) * m2.prices.len() as i32;

    let overlap_start = m1.start.max(m2.start);
    let overlap_end = m1_end.min(m2_end);

    // Trim to whole hourly settlement windows.
    let start = ceil_to_hour(overlap_start);
    let end = floor_to_hour(overlap_end);
    if start >= end {
        return Err(OptimiserError::DataAlignment(format!(
            "series overlap shorter than one whole settlement hour \
             ({} covers {}..{}, {} covers {}..{})",
            market1.market, m1.start, m1_end, market2.market, m2.start, m2_end
        )));
    }

    let steps = ((end - start).num_minutes() / 30) as usize;
    let grid = TimeGrid { start, steps };

    let m1_offset = ((start - m1.start).num_minutes() / 30) as usize;
    let m2_offset = ((start - m2.start).num_minutes() / 60) as usize;

    let market1_gbp_per_mwh = m1.prices[m1_offset..m1_offset + steps].to_vec();
    let market2_gbp_per_mwh = (0..steps)
        .map(|i| m2.prices[m2_offset + i / 2])
        .collect();

    Ok(AlignedPrices {
        grid,
        market1_gbp_per_mwh,
        market2_gbp_per_mwh,
    })
}

struct RoundedSeries {
    start: NaiveDateTime,
    prices: Vec<f64>,
}

/// Round every timestamp and insist the result is strictly increasing at the
/// series' native step. Duplicates after rounding, gaps and drift beyond the
/// rounding tolerance all surface here.
fn rounded_regular_series(series: &MarketPriceSeries) -> Result<RoundedSeries, OptimiserError> {
    if series.points.is_empty() {
        return Err(OptimiserError::DataAlignment(format!(
            "{} price series is empty",
            series.market
        )));
    }

    let step = series.resolution.step();
    let mut prices = Vec::with_capacity(series.points.len());
    let mut start = None;
    let mut previous: Option<NaiveDateTime> = None;

    for point in &series.points {
        let rounded = round_to_half_hour(point.timestamp)?;
        if series.resolution == Resolution::Hourly && rounded.minute() != 0 {
            return Err(OptimiserError::DataAlignment(format!(
                "{} is hourly but {} rounds to {}",
                series.market, point.timestamp, rounded
            )));
        }
        if let Some(prev) = previous {
            if rounded - prev != step {
                return Err(OptimiserError::DataAlignment(format!(
                    "{} series irregular: {} follows {} (expected step {} min)",
                    series.market,
                    rounded,
                    prev,
                    step.num_minutes()
                )));
            }
        }
        start.get_or_insert(rounded);
        previous = Some(rounded);
        prices.push(point.price_gbp_per_mwh);
    }

    Ok(RoundedSeries {
        // Non-empty checked above.
        start: start.ok_or_else(|| {
            OptimiserError::DataAlignment(format!("{} price series is empty", series.market))
        })?,
        prices,
    })
}

fn floor_to_hour(ts: NaiveDateTime) -> NaiveDateTime {
    ts - Duration::minutes(ts.minute() as i64)
}

fn ceil_to_hour(ts: NaiveDateTime) -> NaiveDateTime {
    if ts.minute() == 0 {
        ts
    } else {
        floor_to_hour(ts) + Duration::hours(1)
    }
}
