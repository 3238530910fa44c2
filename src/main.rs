use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use telegram_relay::config::Config;
use telegram_relay::logging;
use telegram_relay::server::{self, AppState};
use telegram_relay::telegram::BotClient;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    logging::init(&config.logging)?;

    let missing = config.telegram.missing_vars();
    if !missing.is_empty() {
        // Requests will be answered with a configuration error until these
        // are provisioned; startup itself proceeds.
        warn!(vars = %missing.join(", "), "telegram credentials not configured");
    }

    let bot = BotClient::new(&config.telegram)?;
    let bind_addr = config.server.bind_addr;
    let state = AppState {
        config: Arc::new(config),
        bot: Arc::new(bot),
    };

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %bind_addr, "listening");
    axum::serve(listener, server::router(state)).await?;

    Ok(())
}
