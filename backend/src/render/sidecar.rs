use super::{page_style, Document, OutputFormat, PageDimensions, RenderEngine};
use crate::error::ApiError;
use async_trait::async_trait;
use base64::Engine as _;
use tracing::{info, warn};

/// Client for a wkhtmltox-style HTTP renderer sidecar. The sidecar owns all
/// layout and rasterization; this engine only prepares the markup and moves
/// bytes.
pub struct SidecarEngine {
    base_url: String,
    client: reqwest::Client,
}

impl SidecarEngine {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

/// Wrap bare fragments in a full document skeleton so the sidecar always
/// receives well-formed markup.
fn ensure_document(html: &str) -> String {
    let trimmed = html.trim();
    if trimmed.to_ascii_lowercase().contains("<html") {
        trimmed.to_string()
    } else {
        format!(
            "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"></head>\n<body>{}</body>\n</html>",
            trimmed
        )
    }
}

fn inject_style(html: &str, style: &str) -> String {
    let tag = format!("<style>{}</style>", style);
    if let Some(pos) = html.find("</head>") {
        let mut out = String::with_capacity(html.len() + tag.len());
        out.push_str(&html[..pos]);
        out.push_str(&tag);
        out.push_str(&html[pos..]);
        out
    } else {
        format!("{}{}", tag, html)
    }
}

#[derive(serde::Deserialize)]
struct RenderResp {
    status: String,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[async_trait]
impl RenderEngine for SidecarEngine {
    fn build(&self, html: &str) -> Result<Document, ApiError> {
        Ok(Document::new(ensure_document(html)))
    }

    async fn render(
        &self,
        doc: &Document,
        dims: PageDimensions,
        format: OutputFormat,
    ) -> Result<Vec<u8>, ApiError> {
        let html = inject_style(doc.html(), &page_style(dims, format));
        let body = serde_json::json!({
            "html": html,
            "width": dims.width,
            "height": dims.height,
            "format": format.ext(),
        });

        info!("Calling renderer sidecar: {}", self.base_url);
        let resp = self
            .client
            .post(format!("{}/render", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Render(format!("failed to reach renderer: {}", e)))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::Render(format!("failed to read renderer response: {}", e)))?;

        if !status.is_success() {
            let snippet: String = text.chars().take(400).collect();
            return Err(ApiError::Render(format!(
                "renderer returned HTTP {}: {}",
                status.as_u16(),
                snippet
            )));
        }

        let data: RenderResp = serde_json::from_str(&text).map_err(|e| {
            ApiError::Render(format!(
                "failed to parse renderer response: {}: {}",
                e,
                text.chars().take(200).collect::<String>()
            ))
        })?;

        if data.status == "success" {
            let encoded = data
                .data
                .ok_or_else(|| ApiError::Render("renderer response missing data field".to_string()))?;
            base64::engine::general_purpose::STANDARD
                .decode(encoded.as_bytes())
                .map_err(|e| ApiError::Render(format!("renderer returned invalid base64: {}", e)))
        } else {
            let msg = data.message.unwrap_or_else(|| "unknown error".to_string());
            warn!("Renderer sidecar reported failure: {}", msg);
            Err(ApiError::Render(msg))
        }
    }
}
