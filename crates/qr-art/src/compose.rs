//! Final canvas assembly: background, artwork, modules, quiet zone.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgba, RgbImage, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use crate::Result;
use crate::config::RenderConfig;
use crate::encode::ModuleMatrix;
use crate::protect::ProtectedZones;
use crate::render::{RenderStats, SuppressionPlan, WHITE, draw_modules};
use crate::sample::LuminanceField;

/// Alpha-composite `top` onto `base` at the given position.
///
/// Pixels falling outside `base` are skipped.
pub fn overlay(base: &mut RgbaImage, top: &RgbaImage, x: u32, y: u32) {
    for (dx, dy, pixel) in top.enumerate_pixels() {
        let target_x = x + dx;
        let target_y = y + dy;
        if target_x < base.width() && target_y < base.height() {
            let alpha = f32::from(pixel[3]) / 255.0;
            if alpha > 0.99 {
                base.put_pixel(target_x, target_y, Rgba([pixel[0], pixel[1], pixel[2], 255]));
            } else if alpha > 0.01 {
                let bg = base.get_pixel(target_x, target_y);
                let blended = blend_pixel(bg, pixel, alpha);
                base.put_pixel(target_x, target_y, blended);
            }
        }
    }
}

fn blend_pixel(bg: &Rgba<u8>, fg: &Rgba<u8>, alpha: f32) -> Rgba<u8> {
    let inv = 1.0 - alpha;
    let mix = |f: u8, b: u8| {
        (f32::from(f) * alpha + f32::from(b) * inv)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    Rgba([mix(fg[0], bg[0]), mix(fg[1], bg[1]), mix(fg[2], bg[2]), 255])
}

/// Overwrite a border `width` pixels wide on all four sides with white.
pub fn paint_quiet_zone(canvas: &mut RgbaImage, width: u32) {
    let (w, h) = canvas.dimensions();
    if width == 0 || w == 0 || h == 0 {
        return;
    }
    let band_w = width.min(w);
    let band_h = width.min(h);
    draw_filled_rect_mut(canvas, Rect::at(0, 0).of_size(w, band_h), WHITE);
    draw_filled_rect_mut(canvas, Rect::at(0, (h - band_h) as i32).of_size(w, band_h), WHITE);
    draw_filled_rect_mut(canvas, Rect::at(0, 0).of_size(band_w, h), WHITE);
    draw_filled_rect_mut(canvas, Rect::at((w - band_w) as i32, 0).of_size(band_w, h), WHITE);
}

/// Everything the compositor needs for one symbol.
pub struct Layers<'a> {
    pub matrix: &'a ModuleMatrix,
    pub zones: &'a ProtectedZones,
    /// Normalized artwork, exactly the module area in size.
    pub art: Option<&'a RgbaImage>,
    pub luma: Option<&'a LuminanceField>,
    pub plan: &'a SuppressionPlan,
}

/// Assemble the final raster.
///
/// Paint order is white fill, artwork inside the module area, modules, then
/// the quiet zone, which always wins.
pub fn compose(layers: &Layers<'_>, cfg: &RenderConfig) -> (RgbImage, RenderStats) {
    let n = layers.matrix.width();
    let side = cfg.canvas_side(n);
    let origin = cfg.quiet * cfg.box_size;
    let mut canvas = RgbaImage::from_pixel(side, side, WHITE);

    if let Some(art) = layers.art {
        let module_px = n as u32 * cfg.box_size;
        let x = origin + module_px.saturating_sub(art.width()) / 2;
        let y = origin + module_px.saturating_sub(art.height()) / 2;
        overlay(&mut canvas, art, x, y);
    }

    let stats = draw_modules(
        &mut canvas,
        origin,
        layers.matrix,
        layers.zones,
        layers.luma,
        layers.plan,
        cfg,
    );

    paint_quiet_zone(&mut canvas, origin);
    (DynamicImage::ImageRgba8(canvas).to_rgb8(), stats)
}

/// Encode an RGB image as PNG.
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}
