use serde::Serialize;

/// Formatting dialect the provider applies to the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    #[serde(rename = "HTML")]
    Html,
}

/// Body of a Bot API `sendMessage` call.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingMessage {
    pub chat_id: String,
    pub text: String,
    pub parse_mode: ParseMode,
    pub disable_web_page_preview: bool,
}

impl OutgoingMessage {
    /// An HTML-mode message with link previews suppressed.
    pub fn html(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: text.into(),
            parse_mode: ParseMode::Html,
            disable_web_page_preview: true,
        }
    }
}

/// Raw provider response to one delivery attempt.
#[derive(Debug, Clone)]
pub struct ApiReply {
    pub status: u16,
    pub body: String,
}

impl ApiReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
