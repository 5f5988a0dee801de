use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// The two markets the battery trades in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum Market {
    #[strum(serialize = "market-1")]
    #[serde(rename = "market_1")]
    Market1,
    #[strum(serialize = "market-2")]
    #[serde(rename = "market_2")]
    Market2,
}

impl Market {
    /// Settlement resolution the market natively trades at.
    pub fn resolution(self) -> Resolution {
        match self {
            Market::Market1 => Resolution::HalfHourly,
            Market::Market2 => Resolution::Hourly,
        }
    }
}

/// Native settlement granularity of a price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    HalfHourly,
    Hourly,
}

impl Resolution {
    pub fn step(self) -> Duration {
        match self {
            Resolution::HalfHourly => Duration::minutes(30),
            Resolution::Hourly => Duration::minutes(60),
        }
    }
}

/// One settlement price at the start of its delivery period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: NaiveDateTime,
    pub price_gbp_per_mwh: f64,
}

/// An ordered price series for one market at its native resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketPriceSeries {
    pub market: Market,
    pub resolution: Resolution,
    pub points: Vec<PricePoint>,
}

impl MarketPriceSeries {
    pub fn new(market: Market, points: Vec<PricePoint>) -> Self {
        Self {
            market,
            resolution: market.resolution(),
            points,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markets_carry_their_native_resolution() {
        assert_eq!(Market::Market1.resolution(), Resolution::HalfHourly);
        assert_eq!(Market::Market2.resolution(), Resolution::Hourly);
        assert_eq!(Resolution::HalfHourly.step(), Duration::minutes(30));
        assert_eq!(Resolution::Hourly.step(), Duration::minutes(60));
    }
}
