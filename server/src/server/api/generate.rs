//! QR art generation endpoint.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::Response;
use image::DynamicImage;
use qr_art::{QrArtError, RawParams, RenderConfig};
use serde::Deserialize;

use crate::app::SharedState;
use crate::services::artwork::fetch_artwork;

use super::err_text;

const MISSING_DATA: &str = "Missing QR data";

/// Query string of `GET /generate`. Every field is free-form text so that
/// malformed numbers degrade to defaults instead of rejecting the request.
/// Canvas geometry is fixed server-side; `box`/`quiet` are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateQuery {
    pub data: Option<String>,
    pub art: Option<String>,
    pub dot: Option<String>,
    pub wash: Option<String>,
    pub budget: Option<String>,
    pub ec: Option<String>,
    pub fit: Option<String>,
    pub trim: Option<String>,
    pub light: Option<String>,
    pub adaptive: Option<String>,
}

impl GenerateQuery {
    fn raw_params(&self) -> RawParams {
        RawParams {
            dot: self.dot.clone(),
            wash: self.wash.clone(),
            budget: self.budget.clone(),
            ec: self.ec.clone(),
            fit: self.fit.clone(),
            trim: self.trim.clone(),
            light: self.light.clone(),
            adaptive: self.adaptive.clone(),
        }
    }
}

/// GET /generate
pub async fn generate(
    State(state): State<SharedState>,
    Query(q): Query<GenerateQuery>,
) -> Response {
    let data = q.data.as_deref().unwrap_or_default().trim().to_string();
    if data.is_empty() {
        return err_text(400, MISSING_DATA);
    }
    let cfg = RenderConfig::from_raw(&q.raw_params(), state.config().render);
    let artwork = load_artwork(&state, q.art.as_deref()).await;

    tracing::info!(
        data_len = data.len(),
        with_art = artwork.is_some(),
        dot = cfg.dot_scale,
        wash = cfg.wash,
        budget = cfg.budget,
        "Generate request"
    );

    let rendered =
        tokio::task::spawn_blocking(move || qr_art::generate_png(&data, artwork.as_ref(), &cfg))
            .await;
    match rendered {
        Ok(Ok(png)) => png_response(png),
        Ok(Err(QrArtError::EmptyData)) => err_text(400, MISSING_DATA),
        Ok(Err(e)) => {
            tracing::warn!("QR generation failed: {e}");
            err_text(500, &e.to_string())
        }
        Err(e) => {
            tracing::error!("Render task failed: {e}");
            err_text(500, "Render task failed")
        }
    }
}

/// Fetch the artwork if a URL was given. Failures are logged and the request
/// continues without artwork.
async fn load_artwork(state: &SharedState, art: Option<&str>) -> Option<DynamicImage> {
    let url = art.map(str::trim).filter(|s| !s.is_empty())?;
    match fetch_artwork(state.http(), url, state.config().art_max_bytes).await {
        Ok(img) => Some(img),
        Err(e) => {
            tracing::warn!(url, "Artwork unavailable, rendering without it: {e}");
            None
        }
    }
}

fn png_response(png: Vec<u8>) -> Response {
    Response::builder()
        .header(header::CONTENT_TYPE, "image/png")
        .header(header::CONTENT_DISPOSITION, r#"inline; filename="qr.png""#)
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::from(png))
        .unwrap_or_else(|e| err_text(500, &e.to_string()))
}
