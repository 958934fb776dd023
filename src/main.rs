use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use salonbot::config::AppConfig;
use salonbot::db;
use salonbot::handlers;
use salonbot::services::chat::telegram::TelegramChatApi;
use salonbot::services::reminders;
use salonbot::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    anyhow::ensure!(!config.bot_token.is_empty(), "BOT_TOKEN must be set");

    let conn = db::init_db(&config.database_url)?;

    let chat = TelegramChatApi::new(config.bot_token.clone());
    let state = Arc::new(AppState::new(conn, config.clone(), Box::new(chat)));

    let _scheduler = reminders::spawn(Arc::clone(&state));

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/webhook/update", post(handlers::webhook::chat_update))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
