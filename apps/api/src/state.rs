use crate::config::Config;

/// Shared application state injected into all route handlers via Axum
/// extractors. Immutable after startup; every request gets its own document
/// and temp files, so nothing here needs locking.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Shared HTTP client for template downloads (connection pooling).
    pub http: reqwest::Client,
}
