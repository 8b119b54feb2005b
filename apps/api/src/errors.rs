#![allow(dead_code)]

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::docx::DocxError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// The HTTP contract is deliberately coarse: a request with no template
/// source is the caller's fault (400); everything else collapses into a 500
/// whose body carries the message and the error chain as `traceback`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("No template_url or template_data provided")]
    MissingInput,

    #[error("invalid template_data: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("template download failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("document error: {0}")]
    Document(#[from] DocxError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::MissingInput => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
            other => {
                tracing::error!("request failed: {other}");
                let body = Json(json!({
                    "error": other.to_string(),
                    "traceback": error_chain(&other),
                }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

/// Renders the full source chain, outermost first.
fn error_chain(error: &(dyn std::error::Error)) -> String {
    let mut chain = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push_str("\ncaused by: ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_message_matches_contract() {
        assert_eq!(
            AppError::MissingInput.to_string(),
            "No template_url or template_data provided"
        );
    }

    #[test]
    fn test_error_chain_includes_causes() {
        let inner = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let error = AppError::Document(DocxError::Io(inner));
        let chain = error_chain(&error);
        assert!(chain.starts_with("document error:"));
        assert!(chain.contains("caused by: no such file"));
    }
}
