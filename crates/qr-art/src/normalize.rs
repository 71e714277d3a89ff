//! Artwork normalization onto the square module area.
//!
//! Artwork of any aspect ratio is mapped onto exactly `side x side` pixels
//! using Lanczos3 resampling, either letterboxed (contain) or center-cropped
//! (cover).

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use tracing::debug;

use crate::config::{TRIM_ALPHA_THRESHOLD, TRIM_LUMA_THRESHOLD};
use crate::sample::luminance;

/// How artwork is fitted onto the square module area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitMode {
    /// Scale the larger side to fit and pad the rest with transparency.
    #[default]
    Contain,
    /// Scale the smaller side to fit and crop the overflow.
    Cover,
}

impl FitMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "contain" | "pad" => Some(Self::Contain),
            "cover" | "crop" => Some(Self::Cover),
            _ => None,
        }
    }
}

/// Crop away transparent or near-white borders.
///
/// Images with any transparency keep the bounding box of pixels whose alpha
/// exceeds the trim threshold; fully opaque images keep the bounding box of
/// pixels darker than the white threshold. Returns `None` when nothing
/// survives.
pub fn trim_padding(img: &RgbaImage) -> Option<RgbaImage> {
    let has_alpha = img.pixels().any(|p| p[3] < 255);
    let keep = |p: &Rgba<u8>| {
        if has_alpha {
            p[3] > TRIM_ALPHA_THRESHOLD
        } else {
            luminance(*p) < TRIM_LUMA_THRESHOLD
        }
    };

    let (mut min_x, mut min_y) = (u32::MAX, u32::MAX);
    let (mut max_x, mut max_y) = (0u32, 0u32);
    let mut found = false;
    for (x, y, p) in img.enumerate_pixels() {
        if keep(p) {
            found = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }
    if !found {
        return None;
    }

    let (w, h) = (max_x - min_x + 1, max_y - min_y + 1);
    debug!(
        orig_w = img.width(),
        orig_h = img.height(),
        x = min_x,
        y = min_y,
        w,
        h,
        "Trimmed artwork padding"
    );
    Some(imageops::crop_imm(img, min_x, min_y, w, h).to_image())
}

/// Scale so the larger side equals `side` and center on a transparent square.
pub fn contain(img: &RgbaImage, side: u32) -> RgbaImage {
    let (w, h) = img.dimensions();
    let mut canvas = RgbaImage::new(side, side);
    if w == 0 || h == 0 || side == 0 {
        return canvas;
    }

    let longest = f64::from(w.max(h));
    let new_w = ((f64::from(w) * f64::from(side) / longest).round() as u32).clamp(1, side);
    let new_h = ((f64::from(h) * f64::from(side) / longest).round() as u32).clamp(1, side);
    debug!(w, h, new_w, new_h, side, "Contain-fitting artwork");

    let resized = imageops::resize(img, new_w, new_h, FilterType::Lanczos3);
    let x = (side - new_w) / 2;
    let y = (side - new_h) / 2;
    imageops::replace(&mut canvas, &resized, i64::from(x), i64::from(y));
    canvas
}

/// Scale so the smaller side equals `side` and center-crop the overflow.
pub fn cover(img: &RgbaImage, side: u32) -> RgbaImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 || side == 0 {
        return RgbaImage::new(side, side);
    }

    let shortest = f64::from(w.min(h));
    let new_w = ((f64::from(w) * f64::from(side) / shortest).round() as u32).max(side);
    let new_h = ((f64::from(h) * f64::from(side) / shortest).round() as u32).max(side);
    debug!(w, h, new_w, new_h, side, "Cover-fitting artwork");

    let resized = imageops::resize(img, new_w, new_h, FilterType::Lanczos3);
    let x = (new_w - side) / 2;
    let y = (new_h - side) / 2;
    imageops::crop_imm(&resized, x, y, side, side).to_image()
}

/// Map `source` onto a `side x side` square. Always returns exactly that size.
pub fn normalize(source: &DynamicImage, side: u32, mode: FitMode, trim: bool) -> RgbaImage {
    let rgba = source.to_rgba8();
    let art = if trim {
        match trim_padding(&rgba) {
            Some(trimmed) => trimmed,
            None => {
                debug!("Artwork is empty after trimming, using blank square");
                return RgbaImage::new(side, side);
            }
        }
    } else {
        rgba
    };

    match mode {
        FitMode::Contain => contain(&art, side),
        FitMode::Cover => cover(&art, side),
    }
}

/// Composite a white layer of opacity `wash` over the artwork.
///
/// Lightens the artwork toward white, which keeps dark dots readable.
/// Transparent pixels become white at the wash opacity.
pub fn apply_wash(img: &mut RgbaImage, wash: f64) {
    let wash = wash.clamp(0.0, 1.0);
    if wash <= 0.0 {
        return;
    }
    for pixel in img.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        let alpha = f64::from(a) / 255.0;
        let out_alpha = wash + alpha * (1.0 - wash);
        let blend = |c: u8| {
            let v = (255.0 * wash + f64::from(c) * alpha * (1.0 - wash)) / out_alpha;
            v.round().clamp(0.0, 255.0) as u8
        };
        *pixel = Rgba([
            blend(r),
            blend(g),
            blend(b),
            (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8,
        ]);
    }
}
