mod config;
mod db;
mod errors;
mod export;
mod layout;
mod models;
mod normalize;
mod routes;
mod session;
mod state;
mod storage;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::export::ExportOptions;
use crate::layout::{PageBox, Renderer};
use crate::routes::build_router;
use crate::session::SessionRegistry;
use crate::state::AppState;
use crate::storage::{MemoryResumeStore, PgResumeStore, ResumeStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on invalid values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Folio API v{}", env!("CARGO_PKG_VERSION"));

    // Record store: PostgreSQL when configured, in-memory otherwise
    let store: Arc<dyn ResumeStore> = match &config.database_url {
        Some(url) => Arc::new(PgResumeStore::new(create_pool(url).await?)),
        None => {
            info!("DATABASE_URL not set; records are kept in memory");
            Arc::new(MemoryResumeStore::new())
        }
    };

    // Fit-to-page renderer (options validated again here for the page box)
    let renderer = Renderer::new(config.theme, PageBox::A4, config.fit)?;
    info!(
        font = %config.theme.font,
        max_scale = config.fit.max_scale,
        min_scale = config.fit.min_scale,
        step = config.fit.step,
        debounce_ms = config.fit_debounce.as_millis() as u64,
        "Renderer configured"
    );
    let sessions = Arc::new(SessionRegistry::new(renderer, config.fit_debounce));
    sessions.spawn_sweeper(config.session_idle_timeout);
    info!(
        idle_timeout_secs = config.session_idle_timeout.as_secs(),
        "Idle session sweeper started"
    );

    let state = AppState {
        store,
        sessions,
        config: config.clone(),
        export: ExportOptions {
            raster_scale: config.export_raster_scale,
        },
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
