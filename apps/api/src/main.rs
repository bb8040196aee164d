use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;
mod state;

use chat_cell::spawn_session_sweeper;
use shared_config::AppConfig;
use shared_database::{InMemoryDatabase, SeedData};
use shared_models::SystemClock;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic scheduling API server");

    let config = AppConfig::from_env();

    let seed = match &config.seed_data_path {
        Some(path) => SeedData::from_file(path)?,
        None => SeedData::default(),
    };
    let database = Arc::new(InMemoryDatabase::with_seed(seed, Arc::new(SystemClock)));
    let state = state::AppState::build(&config, database, Arc::new(SystemClock))?;

    let sweeper = spawn_session_sweeper(
        Arc::clone(state.chat.conversation.sessions()),
        Duration::from_secs(config.session.sweep_interval_seconds.max(1)),
    );

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router::create_router(&state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    let served = axum::serve(listener, app).await;

    sweeper.abort();
    served.context("Server error")
}
