//! Fandom server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use fandom_api::{AppState, auth_middleware, request_span, router as api_router};
use fandom_common::{Config, HttpPageSource, PageSource};
use fandom_core::{LlmClient, OpenAiClient};
use sea_orm::{ConnectOptions, Database};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

async fn health() -> &'static str {
    "ok"
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fandom=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting fandom server...");

    let config = Config::load()?;

    let mut db_opts = ConnectOptions::new(&config.database.url);
    db_opts
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections);

    let db = Database::connect(db_opts).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    fandom_db::migrate(&db).await?;
    info!("Migrations completed");

    // Outbound HTTP for the news job
    let pages: Arc<dyn PageSource> = Arc::new(HttpPageSource::new(
        &config.news.user_agent,
        config.news.timeout_secs,
    )?);

    let llm: Option<Arc<dyn LlmClient>> = if config.llm.api_key.is_some() {
        let client = OpenAiClient::from_config(&config.llm)?;
        info!(model = %config.llm.model, "LLM client configured");
        Some(Arc::new(client))
    } else {
        warn!("llm.api_key is not set, news ingestion is disabled");
        None
    };

    if config.cron.secret.is_none() {
        warn!("cron.secret is not set, /api/cron/news will refuse every call");
    }

    let state = AppState::new(Arc::new(db), &config, pages, llm);

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
