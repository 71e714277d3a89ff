//! Remote artwork download and decoding.

use image::DynamicImage;
use reqwest::{Client, StatusCode, Url};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("unsupported artwork URL: {0}")]
    UnsupportedUrl(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("artwork server returned status {0}")]
    Status(StatusCode),

    #[error("artwork exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("artwork decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

/// Download `url` and decode it as an image.
///
/// Only http and https URLs are fetched. Non-success statuses and bodies
/// larger than `max_bytes` are rejected. The request timeout comes from the
/// client.
pub async fn fetch_artwork(
    client: &Client,
    url: &str,
    max_bytes: usize,
) -> Result<DynamicImage, FetchError> {
    let url = parse_http_url(url)?;
    let mut resp = client.get(url.clone()).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }
    if resp.content_length().is_some_and(|len| len > max_bytes as u64) {
        return Err(FetchError::TooLarge { limit: max_bytes });
    }

    let mut body = Vec::new();
    while let Some(chunk) = resp.chunk().await? {
        if body.len() + chunk.len() > max_bytes {
            return Err(FetchError::TooLarge { limit: max_bytes });
        }
        body.extend_from_slice(&chunk);
    }

    let img = image::load_from_memory(&body)?;
    tracing::debug!(
        %url,
        bytes = body.len(),
        width = img.width(),
        height = img.height(),
        "Fetched artwork"
    );
    Ok(img)
}

fn parse_http_url(raw: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw.trim()).map_err(|_| FetchError::UnsupportedUrl(raw.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(FetchError::UnsupportedUrl(raw.to_string())),
    }
}
