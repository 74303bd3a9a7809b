use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{middleware as axum_mw, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wikid::middleware::{RateLimitConfig, RateLimitState};
use wikid::{handlers, middleware, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wikid=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();

    let config_path = args
        .iter()
        .position(|a| a == "--config" || a == "-c")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_path);

    let mut config = Config::load(&config_path)?;

    // Command line overrides
    if let Some(port) = args
        .iter()
        .position(|a| a == "--port" || a == "-p")
        .and_then(|i| args.get(i + 1))
        .and_then(|p| p.parse().ok())
    {
        config.port = port;
    }

    if let Some(dir) = args
        .iter()
        .position(|a| a == "--data-dir" || a == "-d")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
    {
        config.data_dir = dir;
    }

    let port = config.port;
    let state = AppState::new(config)?;
    let state = Arc::new(state);

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("wikid listening on http://localhost:{}", port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let rate_config = RateLimitConfig::default();
    let rate_state = Arc::new(RateLimitState::new(&rate_config));

    Router::new()
        .nest("/api", handlers::api_routes())
        .layer(axum_mw::from_fn(middleware::security_headers))
        .layer(axum_mw::from_fn_with_state(rate_state, middleware::rate_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
