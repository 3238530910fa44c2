use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Terminal request failures. The display text doubles as the response body.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Missing env vars: {}", .0.join(", "))]
    MissingConfig(Vec<&'static str>),

    #[error("Invalid JSON")]
    InvalidJson,

    #[error("Fetch error: {0}")]
    Delivery(String),

    #[error("Telegram error: {0}")]
    Provider(String),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Error::MissingConfig(_) | Error::Delivery(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::InvalidJson => StatusCode::BAD_REQUEST,
            Error::Provider(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
