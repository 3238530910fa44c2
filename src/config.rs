use anyhow::Context;
use secrecy::SecretString;
use std::net::SocketAddr;

/// Required provider credentials, checked per request before any delivery.
pub const ENV_TOKEN: &str = "TELEGRAM_TOKEN";
pub const ENV_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

const ENV_API_BASE: &str = "TELEGRAM_API_BASE";
const ENV_BIND_ADDR: &str = "BIND_ADDR";
const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub token: Option<SecretString>,
    pub chat_id: Option<String>,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl TelegramConfig {
    /// Names of required variables that are unset or empty, token first.
    pub fn missing_vars(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.token.is_none() {
            missing.push(ENV_TOKEN);
        }
        if self.chat_id.is_none() {
            missing.push(ENV_CHAT_ID);
        }
        missing
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Missing Telegram credentials are not a startup error: the handler
    /// reports them per request, so the service can come up before they are
    /// provisioned.
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = non_empty(ENV_BIND_ADDR)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .with_context(|| format!("invalid {ENV_BIND_ADDR}"))?;

        Ok(Self {
            telegram: TelegramConfig {
                token: non_empty(ENV_TOKEN).map(SecretString::from),
                chat_id: non_empty(ENV_CHAT_ID),
                api_base: non_empty(ENV_API_BASE).unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            },
            server: ServerConfig { bind_addr },
            logging: LoggingConfig {
                level: non_empty(ENV_LOG_LEVEL).unwrap_or_else(|| "info".to_string()),
                format: non_empty(ENV_LOG_FORMAT).unwrap_or_else(|| "compact".to_string()),
            },
        })
    }
}

/// An empty value is treated the same as an unset one.
fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}
