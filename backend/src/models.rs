use crate::config::Config;
use crate::records::CertificateStore;
use crate::render::{DocumentCache, RenderEngine, RenderPool};
use crate::storage::ArtifactStore;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize)]
pub struct RenderRequest {
    pub html: String,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    /// Viewport overrides take precedence over `width`/`height` when present.
    #[serde(default)]
    pub viewport_width: Option<f64>,
    #[serde(default)]
    pub viewport_height: Option<f64>,
    #[serde(default)]
    pub certificate_data: Option<CertificateData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CertificateData {
    pub recipient_name: String,
    pub course_name: String,
    pub completion_date: String,
}

pub type SharedState = Arc<AppState>;

/// Long-lived service context, constructed once at startup and shared by all
/// request handlers.
pub struct AppState {
    pub config: Config,
    pub engine: Arc<dyn RenderEngine>,
    pub cache: DocumentCache,
    pub pool: RenderPool,
    pub store: ArtifactStore,
    pub records: CertificateStore,
}
