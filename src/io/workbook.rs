//! Excel ingestion for the two input workbooks.
//!
//! The battery workbook carries a `Data` sheet of `Parameter`/`Values` pairs;
//! the market workbook carries `Half-hourly data` (Market 1) and `Hourly
//! data` (Market 2) sheets of timestamped prices. Values may arrive as
//! strings with currency symbols and thousands separators, and efficiencies
//! are quoted as loss fractions.

use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::NaiveDateTime;
use tracing::debug;

use super::IoError;
use crate::domain::{BatteryProperties, Market, MarketPriceSeries, PricePoint};

const BATTERY_SHEET: &str = "Data";
const HALF_HOURLY_SHEET: &str = "Half-hourly data";
const HOURLY_SHEET: &str = "Hourly data";
const MARKET1_PRICE_HEADER: &str = "Market 1 Price [£/MWh]";
const MARKET2_PRICE_HEADER: &str = "Market 2 Price [£/MWh]";

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Read battery properties from the battery workbook.
pub fn read_battery_properties(path: &Path) -> Result<BatteryProperties, IoError> {
    let range = read_sheet(path, BATTERY_SHEET)?;
    let battery = parse_battery_sheet(path, &range)?;
    debug!(
        path = %path.display(),
        capacity_mwh = battery.capacity_mwh,
        "battery properties ingested"
    );
    Ok(battery)
}

/// Read both market price series from the market workbook.
pub fn read_market_series(
    path: &Path,
) -> Result<(MarketPriceSeries, MarketPriceSeries), IoError> {
    let half_hourly = read_sheet(path, HALF_HOURLY_SHEET)?;
    let hourly = read_sheet(path, HOURLY_SHEET)?;
    let market1 = parse_price_sheet(path, &half_hourly, Market::Market1, MARKET1_PRICE_HEADER)?;
    let market2 = parse_price_sheet(path, &hourly, Market::Market2, MARKET2_PRICE_HEADER)?;
    debug!(
        path = %path.display(),
        market1_points = market1.points.len(),
        market2_points = market2.points.len(),
        "market price series ingested"
    );
    Ok((market1, market2))
}

fn read_sheet(path: &Path, name: &str) -> Result<Range<Data>, IoError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| IoError::WorkbookFormat {
        path: path.to_path_buf(),
        reason: format!("cannot open workbook: {e}"),
    })?;
    workbook
        .worksheet_range(name)
        .map_err(|e| IoError::WorkbookFormat {
            path: path.to_path_buf(),
            reason: format!("cannot read sheet '{name}': {e}"),
        })
}

fn workbook_error(path: &Path, reason: impl Into<String>) -> IoError {
    IoError::WorkbookFormat {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Parse the `Parameter`/`Values` sheet into battery properties.
///
/// Efficiencies are quoted as loss fractions and converted here; degradation
/// quoted in percent is scaled down; the initial SoC defaults to a full store
/// and the SoC window to the whole capacity.
fn parse_battery_sheet(path: &Path, range: &Range<Data>) -> Result<BatteryProperties, IoError> {
    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| workbook_error(path, "battery sheet is empty"))?;

    let parameter_col = find_column(header, "parameter")
        .ok_or_else(|| workbook_error(path, "battery sheet has no 'Parameter' column"))?;
    let values_col = find_column(header, "values")
        .ok_or_else(|| workbook_error(path, "battery sheet has no 'Values' column"))?;

    let mut table: HashMap<String, f64> = HashMap::new();
    for row in rows {
        let Some(Data::String(name)) = row.get(parameter_col) else {
            continue;
        };
        let Some(value) = row.get(values_col).and_then(clean_numeric) else {
            continue;
        };
        table.insert(name.trim().to_lowercase(), value);
    }

    let require = |key: &str| -> Result<f64, IoError> {
        table
            .get(key)
            .copied()
            .ok_or_else(|| workbook_error(path, format!("missing parameter: {key}")))
    };

    let capacity_mwh = require("max storage volume")?;
    let max_charge_mw = require("max charging rate")?;
    let max_discharge_mw = require("max discharging rate")?;
    let charging_loss = require("battery charging efficiency")?;
    let discharging_loss = require("battery discharging efficiency")?;
    let lifetime_years = require("lifetime (1)")?;
    let lifetime_cycles = require("lifetime (2)")?;
    let mut degradation_per_cycle = require("storage volume degradation rate")?;
    let capex_gbp = require("capex")?;
    let opex_fixed_annual_gbp = require("fixed operational costs")?;

    if degradation_per_cycle > 1.0 {
        // Quoted in percent.
        degradation_per_cycle /= 100.0;
    }

    Ok(BatteryProperties {
        capacity_mwh,
        initial_soc_mwh: table
            .get("initial state of charge")
            .copied()
            .unwrap_or(capacity_mwh),
        max_charge_mw,
        max_discharge_mw,
        charging_efficiency: 1.0 - charging_loss,
        discharging_efficiency: 1.0 - discharging_loss,
        soc_min_mwh: table.get("minimum state of charge").copied().unwrap_or(0.0),
        soc_max_mwh: table
            .get("maximum state of charge")
            .copied()
            .unwrap_or(capacity_mwh),
        lifetime_years,
        lifetime_cycles,
        degradation_per_cycle,
        capex_gbp,
        opex_fixed_annual_gbp,
    })
}

/// Parse one timestamped price sheet into a series, sorted by timestamp.
fn parse_price_sheet(
    path: &Path,
    range: &Range<Data>,
    market: Market,
    price_header: &str,
) -> Result<MarketPriceSeries, IoError> {
    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| workbook_error(path, format!("{market} price sheet is empty")))?;

    // The timestamp column is named in well-formed workbooks but historic
    // exports leave it as the unnamed first column.
    let timestamp_col = find_column(header, "timestamp").unwrap_or(0);
    let price_col = find_column(header, &price_header.to_lowercase()).ok_or_else(|| {
        workbook_error(path, format!("missing price column '{price_header}'"))
    })?;

    let mut points = Vec::new();
    for (row_idx, row) in rows.enumerate() {
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }
        let timestamp = row
            .get(timestamp_col)
            .and_then(parse_timestamp)
            .ok_or_else(|| {
                workbook_error(
                    path,
                    format!("{market}: unreadable timestamp in data row {}", row_idx + 1),
                )
            })?;
        let price_gbp_per_mwh = row.get(price_col).and_then(clean_numeric).ok_or_else(|| {
            workbook_error(
                path,
                format!("{market}: unreadable price in data row {}", row_idx + 1),
            )
        })?;
        points.push(PricePoint {
            timestamp,
            price_gbp_per_mwh,
        });
    }

    points.sort_by_key(|p| p.timestamp);
    Ok(MarketPriceSeries::new(market, points))
}

/// Index of the header cell whose trimmed, lowercased text equals `wanted`.
fn find_column(header: &[Data], wanted: &str) -> Option<usize> {
    header.iter().position(|cell| {
        matches!(cell, Data::String(s) if s.trim().to_lowercase() == wanted)
    })
}

/// Read a cell as a number, tolerating "£1,234.50"-style strings.
fn clean_numeric(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s
            .replace('£', "")
            .replace(',', "")
            .trim()
            .parse::<f64>()
            .ok(),
        _ => None,
    }
}

/// Read a cell as a timestamp: native Excel datetimes or common string
/// formats.
fn parse_timestamp(cell: &Data) -> Option<NaiveDateTime> {
    match cell {
        Data::DateTime(dt) => dt.as_datetime(),
        Data::String(s) => {
            let trimmed = s.trim();
            TIMESTAMP_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        }
        _ => None,
    }
}
