//! Battery trade optimiser: schedules charge/discharge decisions for a
//! battery energy storage system trading simultaneously in a half-hourly and
//! an hourly market, maximising trading profit subject to the battery's
//! operating constraints.

pub mod api;
pub mod config;
pub mod domain;
pub mod io;
pub mod optimiser;
pub mod runner;
pub mod telemetry;
