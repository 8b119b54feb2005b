//! Template acquisition: embedded payload or remote download.

use std::io::Write;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::errors::AppError;
use crate::guide::handlers::ProcessGuideRequest;
use crate::state::AppState;

/// Obtains the raw template bytes and spools them to a named temp file so the
/// document layer can open them by path. Dropping the returned handle deletes
/// the file, on every exit path.
///
/// Precedence mirrors the request contract: `template_data` wins over
/// `template_url`; neither present is a caller error.
pub async fn acquire(
    state: &AppState,
    request: &ProcessGuideRequest,
) -> Result<NamedTempFile, AppError> {
    let bytes = if let Some(data) = &request.template_data {
        BASE64.decode(data.as_bytes())?
    } else if let Some(url) = &request.template_url {
        fetch_template(state, url).await?
    } else {
        return Err(AppError::MissingInput);
    };
    debug!("acquired template ({} bytes)", bytes.len());

    let mut file = tempfile::Builder::new()
        .prefix("guide-template-")
        .suffix(".docx")
        .tempfile()?;
    file.write_all(&bytes)?;
    file.flush()?;
    Ok(file)
}

/// GET the template from a direct-download URL. A non-success status is an
/// error, same as a transport failure.
async fn fetch_template(state: &AppState, url: &str) -> Result<Vec<u8>, AppError> {
    let response = state.http.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}
