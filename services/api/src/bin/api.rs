//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{HttpInferenceGateway, PgSessionStore},
    config::Config,
    error::ApiError,
    web::{
        chat_handler, delete_history_handler, get_history_handler, list_sessions_handler,
        rest::ApiDoc, state::AppState, upload_handler,
    },
};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post},
    Router,
};
use socratic_core::SessionManager;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let store = Arc::new(PgSessionStore::new(db_pool.clone()));
    info!("Running database migrations...");
    store
        .run_migrations()
        .await
        .map_err(|e| ApiError::Internal(format!("Migration failed: {e}")))?;
    info!("Database migrations complete.");

    // --- 3. Initialize the Gateway Adapter & Session Manager ---
    let gateway = Arc::new(
        HttpInferenceGateway::new(config.socratic_service_url.clone(), config.gateway_timeout)
            .map_err(|e| ApiError::Internal(format!("Failed to build HTTP client: {e}")))?,
    );
    let manager = Arc::new(SessionManager::new(store, gateway));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        manager,
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    let api_router = Router::new()
        .route("/socratic/upload", post(upload_handler))
        .route("/socratic/chat", post(chat_handler))
        .route("/socratic/sessions", get(list_sessions_handler))
        .route(
            "/socratic/history/{session_id}",
            get(get_history_handler).delete(delete_history_handler),
        )
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
