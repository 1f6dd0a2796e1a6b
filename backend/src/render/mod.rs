use crate::error::ApiError;
use async_trait::async_trait;

mod cache;
mod pool;
mod sidecar;

pub use cache::DocumentCache;
pub use pool::RenderPool;
pub use sidecar::SidecarEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pdf,
    Png,
}

impl OutputFormat {
    pub fn ext(&self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Png => "png",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Png => "image/png",
        }
    }
}

/// Requested output dimensions. Millimeters for PDF pages, pixels for PNG
/// viewports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDimensions {
    pub width: f64,
    pub height: f64,
}

/// An engine's constructed representation of one HTML input. Immutable once
/// built, so cached copies can be shared across requests without locking.
#[derive(Debug, Clone)]
pub struct Document {
    html: String,
}

impl Document {
    pub fn new(html: String) -> Self {
        Self { html }
    }

    pub fn html(&self) -> &str {
        &self.html
    }
}

/// Stylesheet pinning the output bounds exactly to the requested dimensions,
/// with zero margin.
pub fn page_style(dims: PageDimensions, format: OutputFormat) -> String {
    match format {
        OutputFormat::Pdf => format!(
            "@page {{ size: {}mm {}mm; margin: 0; }} html, body {{ margin: 0; padding: 0; }}",
            dims.width, dims.height
        ),
        OutputFormat::Png => format!(
            "html, body {{ margin: 0; padding: 0; width: {}px; height: {}px; overflow: hidden; }}",
            dims.width, dims.height
        ),
    }
}

#[async_trait]
pub trait RenderEngine: Send + Sync {
    /// Parse/construct step. Deterministic for identical input, so results
    /// are cacheable by content fingerprint.
    fn build(&self, html: &str) -> Result<Document, ApiError>;

    /// Produce the artifact bytes for a built document. Not retried; a
    /// failure carries the engine diagnostic.
    async fn render(
        &self,
        doc: &Document,
        dims: PageDimensions,
        format: OutputFormat,
    ) -> Result<Vec<u8>, ApiError>;
}
