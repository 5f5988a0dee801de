use anyhow::Result;
use battery_trade_optimiser::{api, config::Config, telemetry};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let cfg = Config::load()?;
    let addr = cfg.server.socket_addr()?;

    if cfg.server.host == "0.0.0.0" {
        warn!(
            "server binding to 0.0.0.0 - service will be reachable from the network; \
             bind to 127.0.0.1 unless behind a firewall or reverse proxy"
        );
    }

    let state = api::AppState::new(cfg.clone());
    let app = api::router(state, &cfg);

    info!(%addr, "starting battery trade optimiser");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    info!("shutdown complete");
    Ok(())
}
