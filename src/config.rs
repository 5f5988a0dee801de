use anyhow::Result;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::net::SocketAddr;

use crate::optimiser::{SolveOptions, SolverBackend};

/// Immutable application configuration, loaded once at startup and passed
/// down explicitly; nothing reads it from ambient context.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub solver: SolverConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

/// Defaults for the solve, overridable per request.
#[derive(Debug, Clone, Deserialize)]
pub struct SolverConfig {
    pub backend: SolverBackend,
    pub time_limit_seconds: u64,
    pub mip_gap: f64,
    pub threads: u32,
    pub presolve: bool,
    /// How many solves may run at once; the API serializes beyond this.
    pub max_concurrent_solves: usize,
}

impl SolverConfig {
    pub fn solve_options(&self) -> SolveOptions {
        SolveOptions {
            backend: self.backend,
            time_limit_seconds: self.time_limit_seconds,
            mip_gap: self.mip_gap,
            threads: self.threads,
            presolve: self.presolve,
            extra: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub decimal_places: u32,
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("BTO__").split("__"));
        Ok(figment.extract()?)
    }
}
