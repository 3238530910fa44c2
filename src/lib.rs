pub mod config;
pub mod error;
pub mod logging;
pub mod message;
pub mod payload;
pub mod server;
pub mod telegram;

pub use config::Config;
pub use error::Error;
