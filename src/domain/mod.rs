pub mod battery;
pub mod dispatch;
pub mod market;

pub use battery::{BatteryMode, BatteryProperties};
pub use dispatch::{DispatchInterval, DispatchSolution, DispatchSummary, SolveStatus};
pub use market::{Market, MarketPriceSeries, PricePoint, Resolution};
