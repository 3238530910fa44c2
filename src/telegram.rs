pub mod client;
pub mod types;

pub use client::{BotApi, BotClient};
pub use types::{ApiReply, OutgoingMessage, ParseMode};

#[cfg(test)]
pub use client::MockBotApi;
