use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::{error, info};

use crate::config::Config;
use crate::error::Error;
use crate::message;
use crate::payload::Submission;
use crate::telegram::{ApiReply, BotApi, OutgoingMessage};

/// Shared handler dependencies, injected once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub bot: Arc<dyn BotApi>,
}

/// Build the service router.
///
/// The route accepts any method so the handler owns the 405 response body.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/sendTelegram", any(relay))
        .with_state(state)
}

async fn relay(State(state): State<AppState>, method: Method, body: Bytes) -> Response {
    match handle(&state, &method, &body).await {
        Ok(reply) => relay_body(reply),
        Err(error) => {
            error!(%error, "relay failed");
            error.into_response()
        }
    }
}

/// The per-request pipeline: method gate, credential check, body parse,
/// masked log line, message build, delivery. Exits with the first failure.
async fn handle(state: &AppState, method: &Method, body: &[u8]) -> Result<ApiReply, Error> {
    if method != Method::POST {
        return Err(Error::MethodNotAllowed);
    }

    let telegram = &state.config.telegram;
    let (token, chat_id) = match (&telegram.token, &telegram.chat_id) {
        (Some(token), Some(chat_id)) => (token, chat_id),
        _ => return Err(Error::MissingConfig(telegram.missing_vars())),
    };

    let submission = Submission::from_body(body)?;

    match serde_json::to_string(&submission.masked()) {
        Ok(masked) => info!(payload = %masked, "submission received"),
        Err(_) => info!("submission received"),
    }

    let outgoing = OutgoingMessage::html(chat_id.clone(), message::render(&submission));
    let reply = state.bot.send_message(token.expose_secret(), &outgoing).await?;

    if !reply.is_success() {
        return Err(Error::Provider(reply.body));
    }

    Ok(reply)
}

/// Relay the provider body as JSON when it parses, raw text otherwise.
fn relay_body(reply: ApiReply) -> Response {
    match serde_json::from_str::<Value>(&reply.body) {
        Ok(json) => (StatusCode::OK, Json(json)).into_response(),
        Err(_) => (StatusCode::OK, reply.body).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LoggingConfig, ServerConfig, TelegramConfig};
    use crate::telegram::MockBotApi;
    use axum::body::to_bytes;
    use secrecy::SecretString;

    fn config(token: Option<&str>, chat_id: Option<&str>) -> Arc<Config> {
        Arc::new(Config {
            telegram: TelegramConfig {
                token: token.map(|value| SecretString::from(value.to_string())),
                chat_id: chat_id.map(str::to_string),
                api_base: "https://api.telegram.org".to_string(),
            },
            server: ServerConfig {
                bind_addr: "127.0.0.1:0".parse().unwrap(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "compact".to_string(),
            },
        })
    }

    fn state(bot: MockBotApi, token: Option<&str>, chat_id: Option<&str>) -> AppState {
        AppState {
            config: config(token, chat_id),
            bot: Arc::new(bot),
        }
    }

    fn reply(status: u16, body: &str) -> ApiReply {
        ApiReply {
            status,
            body: body.to_string(),
        }
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    // ========================================================================
    // Gates
    // ========================================================================

    #[tokio::test]
    async fn rejects_non_post_methods() {
        let mut bot = MockBotApi::new();
        bot.expect_send_message().times(0);
        let state = state(bot, Some("123:abc"), Some("42"));

        for method in [Method::GET, Method::PUT, Method::DELETE, Method::PATCH] {
            let result = handle(&state, &method, b"{}").await;
            assert!(matches!(result, Err(Error::MethodNotAllowed)), "{method}");
        }
    }

    #[tokio::test]
    async fn reports_both_missing_credentials_without_calling_out() {
        let mut bot = MockBotApi::new();
        bot.expect_send_message().times(0);
        let state = state(bot, None, None);

        let result = handle(&state, &Method::POST, br#"{"plan":"Gold"}"#).await;

        match result {
            Err(error @ Error::MissingConfig(_)) => {
                assert_eq!(
                    error.to_string(),
                    "Missing env vars: TELEGRAM_TOKEN, TELEGRAM_CHAT_ID"
                );
                assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
            }
            other => panic!("expected MissingConfig, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reports_single_missing_credential() {
        let mut bot = MockBotApi::new();
        bot.expect_send_message().times(0);
        let state = state(bot, Some("123:abc"), None);

        let result = handle(&state, &Method::POST, b"{}").await;

        match result {
            Err(Error::MissingConfig(missing)) => {
                assert_eq!(missing, vec!["TELEGRAM_CHAT_ID"]);
            }
            other => panic!("expected MissingConfig, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn credential_check_precedes_body_parsing() {
        let mut bot = MockBotApi::new();
        bot.expect_send_message().times(0);
        let state = state(bot, None, Some("42"));

        let result = handle(&state, &Method::POST, b"{not json").await;
        assert!(matches!(result, Err(Error::MissingConfig(_))));
    }

    #[tokio::test]
    async fn rejects_malformed_body() {
        let mut bot = MockBotApi::new();
        bot.expect_send_message().times(0);
        let state = state(bot, Some("123:abc"), Some("42"));

        let result = handle(&state, &Method::POST, b"{not json").await;
        assert!(matches!(result, Err(Error::InvalidJson)));
    }

    // ========================================================================
    // Delivery
    // ========================================================================

    #[tokio::test]
    async fn relays_a_loan_submission() {
        let mut bot = MockBotApi::new();
        bot.expect_send_message()
            .withf(|token, message| {
                token == "123:abc"
                    && message.chat_id == "42"
                    && message.parse_mode == crate::telegram::ParseMode::Html
                    && message.disable_web_page_preview
                    && message
                        .text
                        .starts_with("<b>Loan Request: USD 1000 / 6 month(s) (Salaried)</b>")
            })
            .times(1)
            .returning(|_, _| Ok(reply(200, r#"{"ok":true}"#)));
        let state = state(bot, Some("123:abc"), Some("42"));

        let body = br#"{"loanAmount":"1000","loanPeriod":"6","employment":"Salaried"}"#;
        let result = handle(&state, &Method::POST, body).await.unwrap();

        assert_eq!(result.status, 200);
        assert_eq!(result.body, r#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn empty_body_sends_the_fallback_heading() {
        let mut bot = MockBotApi::new();
        bot.expect_send_message()
            .withf(|_, message| message.text == "<b>New Loan Submission Request</b>\n\n")
            .times(1)
            .returning(|_, _| Ok(reply(200, "ok")));
        let state = state(bot, Some("123:abc"), Some("42"));

        let result = handle(&state, &Method::POST, b"").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn delivers_pin_and_otp_unmasked() {
        let mut bot = MockBotApi::new();
        bot.expect_send_message()
            .withf(|_, message| {
                message.text.contains("<b>PIN:</b> 9999\n")
                    && message.text.contains("<b>OTP:</b> 1111\n")
            })
            .times(1)
            .returning(|_, _| Ok(reply(200, "ok")));
        let state = state(bot, Some("123:abc"), Some("42"));

        let body = br#"{"loginPhone":"1234567890","loginPin":"9999","otp":"1111"}"#;
        let result = handle(&state, &Method::POST, body).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn provider_failure_becomes_bad_gateway() {
        let mut bot = MockBotApi::new();
        bot.expect_send_message()
            .times(1)
            .returning(|_, _| Ok(reply(400, r#"{"ok":false,"description":"Bad Request"}"#)));
        let state = state(bot, Some("123:abc"), Some("42"));

        let result = handle(&state, &Method::POST, b"{}").await;

        match result {
            Err(error @ Error::Provider(_)) => {
                assert_eq!(error.status(), StatusCode::BAD_GATEWAY);
                assert_eq!(
                    error.to_string(),
                    r#"Telegram error: {"ok":false,"description":"Bad Request"}"#
                );
            }
            other => panic!("expected Provider, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_failure_is_surfaced_directly() {
        let mut bot = MockBotApi::new();
        bot.expect_send_message()
            .times(1)
            .returning(|_, _| Err(Error::Delivery("connection refused".to_string())));
        let state = state(bot, Some("123:abc"), Some("42"));

        let result = handle(&state, &Method::POST, b"{}").await;

        match result {
            Err(error @ Error::Delivery(_)) => {
                assert_eq!(error.to_string(), "Fetch error: connection refused");
                assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
            }
            other => panic!("expected Delivery, got {other:?}"),
        }
    }

    // ========================================================================
    // Response relay
    // ========================================================================

    #[tokio::test]
    async fn json_provider_body_relays_as_json() {
        let response = relay_body(reply(200, r#"{"ok":true,"result":{"message_id":7}}"#));

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(content_type.starts_with("application/json"));

        let body = body_string(response).await;
        let value: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["ok"], Value::Bool(true));
        assert_eq!(value["result"]["message_id"], 7);
    }

    #[tokio::test]
    async fn non_json_provider_body_relays_as_text() {
        let response = relay_body(reply(200, "plain ok"));

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "plain ok");
    }

    #[tokio::test]
    async fn error_responses_use_plain_text_bodies() {
        let response = Error::MissingConfig(vec!["TELEGRAM_TOKEN", "TELEGRAM_CHAT_ID"])
            .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_string(response).await,
            "Missing env vars: TELEGRAM_TOKEN, TELEGRAM_CHAT_ID"
        );
    }
}
