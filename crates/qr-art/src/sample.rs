//! Per-module brightness sampling of normalized artwork.

use image::{Rgba, RgbaImage};
use tracing::debug;

/// One perceptual luminance value in `[0, 255]` per module, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct LuminanceField {
    side: usize,
    values: Vec<f64>,
}

impl LuminanceField {
    /// A field with the same value everywhere.
    pub fn uniform(side: usize, value: f64) -> Self {
        Self {
            side,
            values: vec![value.clamp(0.0, 255.0); side * side],
        }
    }

    pub fn from_fn(side: usize, f: impl Fn(usize, usize) -> f64) -> Self {
        let mut values = Vec::with_capacity(side * side);
        for row in 0..side {
            for col in 0..side {
                values.push(f(row, col).clamp(0.0, 255.0));
            }
        }
        Self { side, values }
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.side + col]
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 255.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }
}

/// Luminance of a pixel flattened over a white background.
///
/// Transparent areas read as white so undefined artwork never pulls dark
/// modules toward it.
pub fn luminance(pixel: Rgba<u8>) -> f64 {
    let [r, g, b] = flatten_over_white(pixel);
    0.299 * r + 0.587 * g + 0.114 * b
}

fn flatten_over_white(pixel: Rgba<u8>) -> [f64; 3] {
    let Rgba([r, g, b, a]) = pixel;
    if a == 0 {
        return [255.0; 3];
    }
    let alpha = f64::from(a) / 255.0;
    let over = |c: u8| f64::from(c) * alpha + 255.0 * (1.0 - alpha);
    [over(r), over(g), over(b)]
}

/// Box-average `art` down to `n x n` cells and take each cell's luminance.
///
/// Cell `i` spans pixels `floor(i*side/n) .. floor((i+1)*side/n)` on each
/// axis and always covers at least one pixel.
pub fn sample(art: &RgbaImage, n: usize) -> LuminanceField {
    let (width, height) = (art.width() as usize, art.height() as usize);
    if n == 0 || width == 0 || height == 0 {
        return LuminanceField::uniform(n, 255.0);
    }

    let bounds = |i: usize, len: usize| {
        let start = (i * len / n).min(len - 1);
        let end = ((i + 1) * len / n).clamp(start + 1, len);
        (start, end)
    };

    let mut values = Vec::with_capacity(n * n);
    for row in 0..n {
        let (y0, y1) = bounds(row, height);
        for col in 0..n {
            let (x0, x1) = bounds(col, width);
            let mut sum = [0.0f64; 3];
            for y in y0..y1 {
                for x in x0..x1 {
                    let rgb = flatten_over_white(*art.get_pixel(x as u32, y as u32));
                    sum[0] += rgb[0];
                    sum[1] += rgb[1];
                    sum[2] += rgb[2];
                }
            }
            let count = ((y1 - y0) * (x1 - x0)) as f64;
            let luma = (0.299 * sum[0] + 0.587 * sum[1] + 0.114 * sum[2]) / count;
            values.push(luma.clamp(0.0, 255.0));
        }
    }

    let field = LuminanceField { side: n, values };
    debug!(n, width, height, mean = field.mean(), "Sampled artwork luminance");
    field
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transparent_pixels_read_as_white() {
        assert_eq!(luminance(Rgba([0, 0, 0, 0])), 255.0);
        assert!((luminance(Rgba([0, 0, 0, 255]))).abs() < 1e-9);
    }

    #[test]
    fn half_transparent_black_is_mid_grey() {
        let y = luminance(Rgba([0, 0, 0, 128]));
        assert!((y - 127.0).abs() < 1.0, "got {y}");
    }

    #[test]
    fn luminance_weights_green_most() {
        assert!(luminance(Rgba([0, 255, 0, 255])) > luminance(Rgba([255, 0, 0, 255])));
        assert!(luminance(Rgba([255, 0, 0, 255])) > luminance(Rgba([0, 0, 255, 255])));
    }

    #[test]
    fn box_average_not_point_sample() {
        // 4x4 image, each 2x2 cell is a black/white checkerboard.
        let img = RgbaImage::from_fn(4, 4, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let field = sample(&img, 2);
        assert_eq!(field.side(), 2);
        for row in 0..2 {
            for col in 0..2 {
                assert!((field.get(row, col) - 127.5).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn quadrants_are_sampled_in_row_major_order() {
        let img = RgbaImage::from_fn(20, 20, |x, _| {
            if x < 10 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let field = sample(&img, 2);
        assert!(field.get(0, 0) < 1.0);
        assert!(field.get(1, 0) < 1.0);
        assert!(field.get(0, 1) > 254.0);
        assert!(field.get(1, 1) > 254.0);
    }

    #[test]
    fn more_cells_than_pixels_still_covers_everything() {
        let img = RgbaImage::from_pixel(3, 3, Rgba([10, 10, 10, 255]));
        let field = sample(&img, 7);
        assert_eq!(field.side(), 7);
        for row in 0..7 {
            for col in 0..7 {
                assert!((field.get(row, col) - 10.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn empty_image_samples_as_white() {
        let img = RgbaImage::new(0, 0);
        let field = sample(&img, 5);
        assert_eq!(field.mean(), 255.0);
    }
}
