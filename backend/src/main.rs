use axum::http::{HeaderValue, Method};
use axum::{
    Router,
    routing::{get, post},
};
use campusnet::db::{PgProfileDirectory, PgRelationshipStore};
use campusnet::handlers::{self, AppState};
use campusnet::services::{RelationshipManager, WebhookNotifier};
use campusnet::{Config, get_db_pool, utils};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::init_logging();

    let config = Config::from_env()?;
    let db_config = campusnet::db::DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;

    // Run migrations
    campusnet::db::migrations::run_migrations(&pool).await?;

    let port = config.port;
    let app = create_router(pool, config)?;

    let listener = tokio::net::TcpListener::bind(&format!("0.0.0.0:{}", port)).await?;
    tracing::info!("Server running on port {}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

fn create_router(pool: PgPool, config: Config) -> anyhow::Result<Router> {
    let cors_layer = create_cors_layer(&config);

    let service = RelationshipManager::new(
        PgRelationshipStore::new(pool.clone()),
        PgProfileDirectory::new(pool.clone()),
        WebhookNotifier::new(config.notifier_url.clone())?,
    );
    let app_state = AppState { pool, service: Arc::new(service) };

    let router = Router::new()
        .route("/health", get(health_check))
        // Profile directory
        .route("/api/profiles", post(handlers::create_profile))
        // Relationship mutations and status
        .route("/api/connections/status", get(handlers::connection_status))
        .route("/api/connections/actions", post(handlers::apply_action))
        .route("/api/connections/request", post(handlers::request_connection))
        .route("/api/connections/accept", post(handlers::accept_request))
        .route("/api/connections/dismiss", post(handlers::dismiss_request))
        .route("/api/connections/remove", post(handlers::remove_connection))
        // Network page data and people search
        .route("/api/network/{user_id}", get(handlers::network_overview))
        .route("/api/search", get(handlers::search_profiles))
        .layer(cors_layer)
        .with_state(app_state);

    Ok(router)
}

fn create_cors_layer(_config: &Config) -> CorsLayer {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(false);

    // Check if ALLOWED_ORIGINS environment variable is set for multiple domains
    if let Ok(cors_origins) = std::env::var("ALLOWED_ORIGINS") {
        let origins: Vec<HeaderValue> = cors_origins
            .split(',')
            .filter_map(|origin| {
                let trimmed = origin.trim();
                if !trimmed.is_empty() {
                    trimmed.parse().ok()
                } else {
                    None
                }
            })
            .collect();

        if !origins.is_empty() {
            cors = cors.allow_origin(origins);
        } else {
            // Fallback to permissive if parsing fails
            cors = cors.allow_origin(Any);
        }
    } else {
        // Default to permissive for development
        cors = cors.allow_origin(Any);
    }

    cors
}

async fn health_check() -> &'static str {
    "OK"
}
