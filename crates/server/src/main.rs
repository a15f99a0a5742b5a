//! Podcast orchestrator server entry point.

use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use podcast_config::{load_settings, Settings};
use podcast_runner::Runner;
use podcast_server::{create_router, init_metrics, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env = std::env::var("PODCAST_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        Ok(settings) => {
            eprintln!("loaded configuration from files (env: {})", env.as_deref().unwrap_or("default"));
            settings
        }
        Err(e) => {
            eprintln!("warning: failed to load config: {e}. using defaults.");
            Settings::default()
        }
    };

    init_tracing(&config);

    tracing::info!("starting podcast orchestrator server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(environment = ?config.environment, config_path = env.as_deref().unwrap_or("default"), "configuration loaded");

    let metrics_handle = init_metrics();
    tracing::info!("initialized Prometheus metrics at /metrics");

    let runner = Runner::new(&config).map_err(|e| {
        tracing::error!(error = %e, "failed to build task runner from configuration");
        e
    })?;

    let addr_host = config.server.host.clone();
    let port = config.server.port;
    let state = AppState::new(config, std::sync::Arc::new(runner), metrics_handle, env);

    let app = create_router(state);

    let addr: SocketAddr = format!("{addr_host}:{port}").parse().unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], port)));
    tracing::info!("listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("received SIGTERM, initiating graceful shutdown...");
        }
    }
}

#[cfg(feature = "telemetry")]
fn init_tracing(config: &Settings) {
    use opentelemetry_otlp::WithExportConfig;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("podcast_server={},tower_http=debug", config.observability.log_level).into());

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    subscriber.with(fmt_layer).init();
    tracing::info!("OpenTelemetry export is compiled in but not wired to an exporter for this orchestrator");
}

#[cfg(not(feature = "telemetry"))]
fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("podcast_server={},tower_http=debug", config.observability.log_level).into());

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}
