use crate::error::ApiError;
use crate::models::{RenderRequest, SharedState};
use crate::records::CertificateRecord;
use crate::render::OutputFormat;
use crate::validate::validate;
use axum::extract::{Json, Path, State};
use axum::http::{header, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub fn router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);
    Router::new()
        .route("/", get(root_handler))
        .route("/html-to-image", post(html_to_image_handler))
        .route("/html-to-pdf", post(html_to_pdf_handler))
        .route("/static/*filename", get(get_artifact_handler))
        .route("/certificate/:id", get(get_certificate_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    // Wildcards are rejected by tower-http once credentials are allowed, so
    // methods are listed and headers mirror the request.
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

async fn root_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Welcome to the HTML to Image API" }))
}

async fn html_to_image_handler(
    State(state): State<SharedState>,
    Json(payload): Json<RenderRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    generate(state, payload, OutputFormat::Png).await
}

async fn html_to_pdf_handler(
    State(state): State<SharedState>,
    Json(payload): Json<RenderRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    generate(state, payload, OutputFormat::Pdf).await
}

/// Request pipeline: validate, record pending metadata, sweep, build (or
/// reuse) the document, render under the pool, store, complete the record.
/// Nothing is retried; the first failing stage terminates the request.
async fn generate(
    state: SharedState,
    payload: RenderRequest,
    format: OutputFormat,
) -> Result<Json<serde_json::Value>, ApiError> {
    let validated = validate(&payload, &state.config, format)?;

    let record_id = payload
        .certificate_data
        .as_ref()
        .map(|data| state.records.insert_pending(data));

    state.store.sweep();

    let doc = state.cache.get_or_build(&validated.html, state.engine.as_ref())?;

    info!(
        "Rendering {} at {}x{}",
        format.ext(),
        validated.dims.width,
        validated.dims.height
    );
    let bytes = state
        .pool
        .render(state.engine.as_ref(), &doc, validated.dims, format)
        .await?;

    let filename = state.store.save(&bytes, format).await?;
    let url = format!("{}/static/{}", state.config.base_url, filename);

    match record_id {
        Some(id) => {
            state.records.complete(id, &url);
            Ok(Json(serde_json::json!({ "url": url, "id": id })))
        }
        None => Ok(Json(serde_json::json!({ "url": url }))),
    }
}

async fn get_artifact_handler(
    State(state): State<SharedState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let (bytes, content_type) = state.store.load(&filename).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

async fn get_certificate_handler(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<Json<CertificateRecord>, ApiError> {
    state.records.get(id).map(Json).ok_or(ApiError::NotFound)
}
