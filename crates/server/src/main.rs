use std::sync::Arc;

use server::config;
use server::routes;
use server::session::{ws, SessionHub};
use server::storage::{AuthStore, GameStore, MemoryAuthStore, MemoryGameStore};

use axum::{
    routing::{get, post, put},
    Extension, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env();

    // In-memory collaborators; swap here for durable backends.
    let auth_store = Arc::new(MemoryAuthStore::new());
    let games: Arc<dyn GameStore> = Arc::new(MemoryGameStore::new());
    let auth: Arc<dyn AuthStore> = auth_store.clone();
    let hub = Arc::new(SessionHub::new(games, auth));

    // CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        // Health
        .route("/health", get(routes::health::health_check))
        // Auth stub
        .route("/api/auth/register", post(routes::auth::register))
        // Games
        .route(
            "/api/games",
            post(routes::games::create_game).get(routes::games::list_games),
        )
        .route("/api/games/{game_id}/seat", put(routes::games::claim_seat))
        // Live game sessions
        .route("/ws", get(ws::ws_handler))
        // Shared state
        .layer(Extension(hub))
        .layer(Extension(auth_store))
        .layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app).await.expect("Server error");
}
