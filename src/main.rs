use std::sync::{Arc, Mutex};

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use salon_backend::config::AppConfig;
use salon_backend::db;
use salon_backend::handlers;
use salon_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/auth/register/user", post(handlers::auth::register_user))
        .route("/api/auth/register/admin", post(handlers::auth::register_admin))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/user/appointments", post(handlers::user::book_appointment))
        .route("/api/user/dashboard", get(handlers::user::dashboard))
        .route("/api/services", get(handlers::catalog::list_services))
        .route("/api/admin/users", get(handlers::admin::list_users))
        .route(
            "/api/admin/users/:id/grant-access",
            put(handlers::admin::grant_access),
        )
        .route(
            "/api/admin/appointments/:id/approve",
            put(handlers::admin::decide_appointment),
        )
        .route(
            "/api/admin/appointments/pending",
            get(handlers::admin::pending_appointments),
        )
        .route("/api/admin/services", post(handlers::admin::create_service))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
