//! Encore API composition root.

#![forbid(unsafe_code)]

mod dto;
mod error;
mod handlers;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use encore_application::{AuditLogService, ConcertService, ReservationService};
use encore_core::AppError;
use encore_infrastructure::{PostgresAuditLog, PostgresCapacityStore, PostgresReservationLedger};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

    let database_url = required_env("DATABASE_URL")?;
    let frontend_url =
        env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let capacity_store = Arc::new(PostgresCapacityStore::new(pool.clone()));
    let ledger = Arc::new(PostgresReservationLedger::new(pool.clone()));
    let audit_repository = Arc::new(PostgresAuditLog::new(pool));

    let app_state = AppState {
        concert_service: ConcertService::new(capacity_store.clone()),
        reservation_service: ReservationService::new(
            capacity_store,
            ledger,
            audit_repository.clone(),
        ),
        audit_log_service: AuditLogService::new(audit_repository),
    };

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    let app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route(
            "/api/concerts",
            get(handlers::concerts::list_concerts_handler)
                .post(handlers::concerts::create_concert_handler),
        )
        .route(
            "/api/concerts/{concert_id}",
            get(handlers::concerts::get_concert_handler)
                .delete(handlers::concerts::delete_concert_handler),
        )
        .route(
            "/api/concerts/{concert_id}/reservations",
            get(handlers::concerts::list_concert_reservations_handler),
        )
        .route(
            "/api/reservations",
            get(handlers::reservations::list_reservations_handler)
                .post(handlers::reservations::create_reservation_handler),
        )
        .route(
            "/api/reservations/{reservation_id}",
            get(handlers::reservations::get_reservation_handler)
                .delete(handlers::reservations::cancel_reservation_handler),
        )
        .route(
            "/api/reservations/user/{username}",
            get(handlers::reservations::list_user_reservations_handler),
        )
        .route(
            "/api/audit-log",
            get(handlers::audit_log::list_audit_log_handler),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state);

    let host = IpAddr::from_str(&api_host)
        .map_err(|error| AppError::Internal(format!("invalid API_HOST '{api_host}': {error}")))?;
    let address = SocketAddr::from((host, api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "encore-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}
