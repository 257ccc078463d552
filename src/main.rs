//! PlateShare Backend
//!
//! REST backend for a food donation marketplace: donors post listings,
//! recipients request them, donors accept or reject the requests.

mod api;
mod config;
mod db;
mod errors;
mod models;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    routing::{delete, get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{Config, CorsOrigins, LogFormat};
use db::{Database, Repository};
use errors::AppError;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.log_format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }

    tracing::info!("Starting PlateShare Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.cors_origins == CorsOrigins::Any {
        tracing::warn!("CORS allows any origin (PLATESHARE_CORS_ORIGINS=*)");
    }

    // Connect eagerly so a bad database fails startup instead of the first request
    let database = Arc::new(Database::new(&config.db_path, config.db_timeout));
    database.get_connection().await?;
    let repo = Arc::new(Repository::new(database));

    // Create application state
    let state = AppState {
        repo,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    with_layers(app_routes(), state)
}

/// Listing, request and health routes.
fn app_routes() -> Router<AppState> {
    let api_routes = Router::new()
        // Listings
        .route("/foods", post(api::create_food))
        .route("/foods", get(api::list_foods))
        .route("/foods/{id}", get(api::get_food))
        .route("/foods/{id}", patch(api::update_food))
        .route("/foods/{id}", delete(api::delete_food))
        // Requests
        .route("/requests", post(api::create_request))
        .route("/requests/{id}", get(api::list_requests_for_food))
        .route("/requests/{id}", patch(api::update_request_status))
        .route("/my-requests", get(api::list_my_requests));

    let health_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check));

    Router::new().merge(api_routes).merge(health_routes)
}

/// Wrap routes in tracing, CORS and the request timeout, then bind the state.
fn with_layers(routes: Router<AppState>, state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    let request_timeout = state.config.request_timeout;

    routes
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    request_timeout,
                )),
        )
        .with_state(state)
}

/// CORS policy for the configured front-end origins.
fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE]);

    match origins {
        CorsOrigins::Any => cors.allow_origin(Any),
        CorsOrigins::List(list) => {
            let origins: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                        None
                    }
                })
                .collect();
            cors.allow_origin(AllowOrigin::list(origins))
        }
    }
}

/// Liveness endpoint.
async fn root() -> &'static str {
    "PlateShare server is running..."
}

/// Health check endpoint; fails when the database does not answer.
async fn health_check(State(state): State<AppState>) -> Result<&'static str, AppError> {
    state.repo.ping().await.map_err(|e| {
        tracing::error!("Health check failed: {}", e);
        AppError::Unavailable("Database unavailable".to_string())
    })?;
    Ok("OK")
}
