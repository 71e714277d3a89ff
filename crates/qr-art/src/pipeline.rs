//! End-to-end generation: encode, fit artwork, pick a mask, render, compose.


use image::{DynamicImage, RgbImage, RgbaImage};
use tracing::{debug, info};

use crate::compose::{Layers, compose, encode_png};
use crate::config::RenderConfig;
use crate::ecc::CodewordLayout;
use crate::encode::{EncodedSymbol, MaskIndex, QrVersion, encode};
use crate::mask::choose_symbol;
use crate::normalize::{apply_wash, normalize};
use crate::protect::ProtectedZones;
use crate::render::{RenderStats, SuppressionPlan, plan_suppression};
use crate::sample::{LuminanceField, sample};
use crate::{QrArtError, Result};

/// A rendered symbol and how it was built.
#[derive(Debug, Clone)]
pub struct Generated {
    pub image: RgbImage,
    pub version: QrVersion,
    /// Mask chosen against the artwork, `None` for the encoder default.
    pub mask: Option<MaskIndex>,
    pub stats: RenderStats,
}

struct PreparedArt {
    art: RgbaImage,
    luma: LuminanceField,
}

/// Render `data` as an artistic QR code over optional `artwork`.
///
/// Without artwork the symbol is drawn on white with the encoder's default
/// mask and no suppression.
pub fn generate(
    data: &str,
    artwork: Option<&DynamicImage>,
    cfg: &RenderConfig,
) -> Result<Generated> {
    let data = data.trim();
    if data.is_empty() {
        return Err(QrArtError::EmptyData);
    }
    let cfg = cfg.clamped();

    // The artwork footprint depends on the symbol size, which is the same
    // for every mask, so a first encode fixes it before mask selection.
    let prepared = match artwork {
        Some(source) => {
            let sizing = encode(data.as_bytes(), cfg.ec_level, Some(MaskIndex::ALL[0]))?;
            Some(prepare_art(source, sizing.version.width(), &cfg))
        }
        None => None,
    };

    let luma = prepared.as_ref().map(|p| &p.luma);
    let symbol = choose_symbol(data.as_bytes(), cfg.ec_level, luma)?;
    let EncodedSymbol { matrix, version, mask } = symbol;
    let zones = ProtectedZones::new(version);

    let plan = match &prepared {
        Some(p) if cfg.budget > 0.0 => {
            let layout = CodewordLayout::new(version, cfg.ec_level)?;
            if layout.width() != matrix.width() {
                return Err(QrArtError::Dimension {
                    field: layout.width(),
                    symbol: matrix.width(),
                });
            }
            plan_suppression(&matrix, &zones, &layout, &p.luma, cfg.budget)
        }
        _ => SuppressionPlan::none(matrix.width()),
    };

    let layers = Layers {
        matrix: &matrix,
        zones: &zones,
        art: prepared.as_ref().map(|p| &p.art),
        luma: prepared.as_ref().map(|p| &p.luma),
        plan: &plan,
    };
    let (image, stats) = compose(&layers, &cfg);

    info!(
        version = version.number(),
        mask = ?mask.map(MaskIndex::index),
        with_art = prepared.is_some(),
        side = image.width(),
        suppressed = stats.suppressed,
        "Generated QR art"
    );
    Ok(Generated {
        image,
        version,
        mask,
        stats,
    })
}

/// [`generate`] followed by PNG encoding.
pub fn generate_png(
    data: &str,
    artwork: Option<&DynamicImage>,
    cfg: &RenderConfig,
) -> Result<Vec<u8>> {
    let generated = generate(data, artwork, cfg)?;
    encode_png(&generated.image)
}

fn prepare_art(source: &DynamicImage, n: usize, cfg: &RenderConfig) -> PreparedArt {
    let module_px = n as u32 * cfg.box_size;
    let mut art = normalize(source, module_px, cfg.fit, cfg.trim_padding);
    apply_wash(&mut art, cfg.wash);
    let luma = sample(&art, n);
    debug!(n, module_px, mean_luma = luma.mean(), "Prepared artwork");
    PreparedArt { art, luma }
}
