//! Axum route handler for the guide-processing endpoint.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::docx::Document;
use crate::errors::AppError;
use crate::guide::acquire::acquire;
use crate::guide::substitute::apply_replacements;
use crate::state::AppState;

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const ATTACHMENT: &str = "attachment; filename=\"completed_guide.docx\"";

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

/// Body of `POST /process-guide`. `template_data` (base64) takes precedence
/// over `template_url`; one of the two is required. `replacements` maps
/// literal placeholder strings to their values and keeps payload order
/// (serde_json's preserve_order), which is the substitution order.
#[derive(Debug, Deserialize)]
pub struct ProcessGuideRequest {
    pub template_data: Option<String>,
    pub template_url: Option<String>,
    #[serde(default)]
    pub replacements: Map<String, Value>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /process-guide
///
/// Acquire the template, substitute placeholders in every paragraph, and
/// return the completed document as an attachment. Both temp files are
/// request-scoped and deleted when the handler returns, success or not.
pub async fn handle_process_guide(
    State(state): State<AppState>,
    Json(request): Json<ProcessGuideRequest>,
) -> Result<Response, AppError> {
    let template = acquire(&state, &request).await?;

    let mut document = Document::open(template.path())?;
    apply_replacements(&mut document, &request.replacements);

    let output = tempfile::Builder::new()
        .prefix("guide-output-")
        .suffix(".docx")
        .tempfile()?;
    document.save(output.path())?;
    let bytes = std::fs::read(output.path())?;

    info!(
        "processed guide ({} replacement keys, {} bytes out)",
        request.replacements.len(),
        bytes.len()
    );

    Ok((
        [
            (header::CONTENT_TYPE, DOCX_CONTENT_TYPE),
            (header::CONTENT_DISPOSITION, ATTACHMENT),
        ],
        bytes,
    )
        .into_response())
}
