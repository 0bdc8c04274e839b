use anyhow::{Context, Result};
use api::config::{read_api_key, API_KEY_VAR};
use api::{create_router, AppState, ServerConfig};
use docuquery::GeminiService;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment variables and logging
    dotenv::dotenv().ok();
    env_logger::init();

    let config = ServerConfig::from_env()?;

    if read_api_key(API_KEY_VAR).is_none() {
        log::warn!(
            "Warning: {} is not set. The proxy will fail without it.",
            API_KEY_VAR
        );
    }

    let gemini = GeminiService::new(reqwest::Client::new(), config.api_base.clone());
    let app = create_router(AppState::new(gemini));

    let listener = tokio::net::TcpListener::bind(config.socket_address())
        .await
        .with_context(|| format!("failed to bind {}", config.socket_address()))?;
    log::info!("AI proxy server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
