//! weather-relay - resilient weather and location relay
//!
//! This is the composition root: configuration, logging, wiring and the
//! server lifecycle.

use tracing_subscriber::fmt::format::FmtSpan;
use weather_relay::infrastructure::shutdown_signal;
use weather_relay::{build_state, load_config, ApiServer, ShutdownController};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    let listen_addr = cfg.listen_addr();
    tracing::info!(
        "starting weather-relay listen={} cache_ttl={}s max_entries={}",
        listen_addr,
        cfg.cache_ttl_secs,
        cfg.cache_max_entries
    );

    // ===== COMPOSITION ROOT =====
    let state = build_state(&cfg)?;

    let shutdown = ShutdownController::new();
    state.location.start_gc(cfg.cache_gc_interval(), &shutdown);
    state.weather.start_gc(cfg.cache_gc_interval(), &shutdown);

    tokio::spawn(shutdown_signal(shutdown.clone()));

    let server = ApiServer::new(listen_addr, state);
    server.run(shutdown).await
}
