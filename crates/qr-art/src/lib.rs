//! Artistic QR code compositing.
//!
//! Renders a scannable QR symbol over arbitrary artwork: structural zones are
//! drawn as flat squares, data modules as dots whose placement follows the
//! artwork's brightness, and a small budget of dark modules over bright
//! artwork may be dropped entirely. The quiet zone is always pure white.

pub mod compose;
pub mod config;
pub mod ecc;
pub mod encode;
pub mod mask;
pub mod normalize;
pub mod pipeline;
pub mod protect;
pub mod render;
pub mod sample;

pub use config::{RawParams, RenderConfig};
pub use ecc::CodewordLayout;
pub use encode::{EcLevel, EncodedSymbol, MaskIndex, ModuleMatrix, QrVersion};
pub use normalize::FitMode;
pub use pipeline::{Generated, generate, generate_png};
pub use render::{LightModuleStyle, RenderDecision, RenderStats};
pub use sample::LuminanceField;

/// Unified error type for the qr-art crate.
#[derive(Debug, thiserror::Error)]
pub enum QrArtError {
    #[error("missing QR data")]
    EmptyData,

    #[error("QR encode error: {0}")]
    Encode(String),

    #[error("invalid mask pattern {0} (expected 0-7)")]
    InvalidMask(u8),

    #[error("invalid QR version {0} (expected 1-40)")]
    InvalidVersion(i32),

    #[error("luminance field is {field}x{field} but the symbol is {symbol}x{symbol}")]
    Dimension { field: usize, symbol: usize },

    #[error("PNG encode error: {0}")]
    Png(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, QrArtError>;
