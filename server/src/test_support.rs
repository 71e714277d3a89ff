//! Local HTTP fixtures for tests that fetch artwork.

use std::io::Cursor;

use axum::Router;
use axum::http::header;
use axum::routing::get;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tokio::net::TcpListener;

pub(crate) fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(color)));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// Serve `/art.png`, `/big.bin` and `/not-an-image` on an ephemeral port.
/// Returns the base URL.
pub(crate) async fn spawn_art_server() -> String {
    let png = png_bytes(64, 48, [20, 20, 20, 255]);
    let big = vec![0u8; 4096];
    let app = Router::new()
        .route(
            "/art.png",
            get(move || {
                let png = png.clone();
                async move { ([(header::CONTENT_TYPE, "image/png")], png) }
            }),
        )
        .route(
            "/big.bin",
            get(move || {
                let big = big.clone();
                async move { big }
            }),
        )
        .route("/not-an-image", get(|| async { "hello" }));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
