use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with configured format and output
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    // Build filter from config level or environment variable
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    // Use try_init() to gracefully handle already-initialized subscriber (common in tests)
    let result = match config.format.as_str() {
        "json" => tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .json()
            .with_env_filter(filter)
            .try_init(),
        "pretty" => tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .pretty()
            .with_env_filter(filter)
            .try_init(),
        _ => {
            // Default to compact
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .compact()
                .with_env_filter(filter)
                .try_init()
        }
    };

    // Ignore error if subscriber is already initialized (common in tests)
    result.or(Ok(()))
}

/// Mask a sensitive value for logging, keeping only its final two characters.
///
/// Values of two characters or fewer become all asterisks. The masked form
/// always has the same character count as the input; an empty input stays
/// empty.
pub fn mask(value: &str) -> String {
    let len = value.chars().count();
    if len <= 2 {
        return "*".repeat(len);
    }

    let tail: String = value.chars().skip(len - 2).collect();
    format!("{}{}", "*".repeat(len - 2), tail)
}
