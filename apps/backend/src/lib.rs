pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::services::study_timer::StudyTimers;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub timers: Arc<StudyTimers<Database>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Arc<Database>, config: Config) -> Self {
        let timers = StudyTimers::new(db.clone(), config.study_tick)
            .with_idle_ticks(config.study_idle_ticks);
        Self {
            db,
            timers: Arc::new(timers),
            config: Arc::new(config),
        }
    }
}

/// Build the router with every route
pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        // Profile
        .route("/api/me", get(routes::users::me))
        // Sets and cards
        .route("/api/sets", get(routes::sets::list).post(routes::sets::create))
        .route("/api/sets/:id", delete(routes::sets::delete))
        .route("/api/cards", get(routes::cards::list).post(routes::cards::create))
        .route("/api/cards/:id/force-due", post(routes::cards::force_due))
        // Study and quiz
        .route("/api/study/queue", get(routes::study::queue))
        .route("/api/study/grade", post(routes::study::grade))
        .route("/api/quiz", get(routes::quiz::generate))
        .route("/api/quiz/answer", post(routes::quiz::answer))
        // Progress
        .route("/api/leaderboard", get(routes::leaderboard::list))
        .route("/api/stats", get(routes::stats::get))
        .route("/api/session/start", post(routes::session::start))
        .route("/api/session/heartbeat", post(routes::session::heartbeat))
        .route("/api/session/stop", post(routes::session::stop))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(routes::users::register))
        .merge(protected_routes)
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    let addr = config.bind_addr();
    let state = AppState::new(Arc::new(db), config);

    let app = router(state.clone())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Flushing open study sessions...");
    state.timers.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

async fn health_check() -> &'static str {
    "OK"
}
