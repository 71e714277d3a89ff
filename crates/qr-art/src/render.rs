//! Per-module render decisions and drawing.
//!
//! Protected modules become flat squares of their true value. Other dark
//! modules become dots, unless suppression removes them to let bright
//! artwork show through. Light modules become smaller white dots or are
//! left to the artwork.

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use tracing::debug;

use crate::config::{DOT_SCALE_RANGE, RenderConfig};
use crate::ecc::CodewordLayout;
use crate::encode::ModuleMatrix;
use crate::protect::ProtectedZones;
use crate::sample::LuminanceField;

/// Absolute ceiling on suppressed modules regardless of budget.
pub const MAX_SUPPRESSED: usize = 2500;
/// Upper bound for the suppression budget.
pub const MAX_BUDGET: f64 = 0.18;
/// Light dots are this fraction of the dark dot scale.
pub const LIGHT_DOT_RATIO: f64 = 0.88;
/// Largest dot scale change applied by adaptive dots.
pub const ADAPTIVE_SPREAD: f64 = 0.10;

const LIGHT_DOT_MIN: f64 = 0.45;
const LIGHT_DOT_MAX: f64 = 0.88;

pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// How non-protected light modules are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightModuleStyle {
    /// A white dot, slightly smaller than the dark dots.
    #[default]
    Dot,
    /// Nothing; the artwork shows through.
    Omit,
}

impl LightModuleStyle {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "dot" | "dots" => Some(Self::Dot),
            "omit" | "none" => Some(Self::Omit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DotColor {
    Dark,
    Light,
}

impl DotColor {
    fn rgba(self) -> Rgba<u8> {
        match self {
            Self::Dark => BLACK,
            Self::Light => WHITE,
        }
    }
}

/// What to draw for one module.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderDecision {
    ProtectedDark,
    ProtectedLight,
    Dot { color: DotColor, scale: f64 },
    /// Dark module removed by the suppression budget.
    Suppressed,
    /// Light module left to the artwork.
    Omitted,
}

/// Dark modules selected for removal, row-major.
#[derive(Debug, Clone)]
pub struct SuppressionPlan {
    width: usize,
    removed: Vec<bool>,
    count: usize,
    eligible: usize,
}

impl SuppressionPlan {
    pub fn none(width: usize) -> Self {
        Self {
            width,
            removed: vec![false; width * width],
            count: 0,
            eligible: 0,
        }
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.removed[row * self.width + col]
    }

    /// Number of suppressed modules.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Non-protected dark modules that were candidates.
    pub fn eligible(&self) -> usize {
        self.eligible
    }
}

/// Number of modules the budget allows out of `eligible` candidates.
pub fn suppression_limit(eligible: usize, budget: f64) -> usize {
    let budget = if budget.is_finite() {
        budget.clamp(0.0, MAX_BUDGET)
    } else {
        0.0
    };
    ((eligible as f64 * budget).floor() as usize).min(MAX_SUPPRESSED)
}

/// Pick the dark modules over the brightest artwork for removal.
///
/// Only non-protected dark modules are candidates. Ties in brightness are
/// broken by position so the plan is deterministic. Besides the budget,
/// each Reed-Solomon block may lose at most
/// [`CodewordLayout::suppressible_per_block`] codewords; a candidate whose
/// codeword is already damaged costs nothing extra.
pub fn plan_suppression(
    matrix: &ModuleMatrix,
    zones: &ProtectedZones,
    layout: &CodewordLayout,
    luma: &LuminanceField,
    budget: f64,
) -> SuppressionPlan {
    let n = matrix.width();
    let mut candidates = Vec::new();
    for row in 0..n {
        for col in 0..n {
            if matrix.get(row, col) && !zones.contains(row, col) {
                candidates.push((luma.get(row, col), row, col));
            }
        }
    }

    let eligible = candidates.len();
    let limit = suppression_limit(eligible, budget);
    candidates.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    let per_block = layout.suppressible_per_block();
    let mut damaged = vec![false; layout.codewords()];
    let mut spent = vec![0usize; layout.blocks()];

    let mut plan = SuppressionPlan::none(n);
    plan.eligible = eligible;
    for &(_, row, col) in &candidates {
        if plan.count == limit {
            break;
        }
        if let Some(cw) = layout.codeword_at(row, col) {
            if !damaged[cw] {
                let block = layout.block_of(cw);
                if spent[block] >= per_block {
                    continue;
                }
                spent[block] += 1;
                damaged[cw] = true;
            }
        }
        plan.removed[row * n + col] = true;
        plan.count += 1;
    }
    debug!(
        eligible,
        limit,
        suppressed = plan.count,
        damaged_codewords = spent.iter().sum::<usize>(),
        budget,
        "Planned module suppression"
    );
    plan
}

/// Dark dot scale for a module, optionally nudged by local brightness.
///
/// Brighter artwork shrinks the dot to reveal more of it; darker artwork
/// grows it for contrast.
pub fn dark_dot_scale(cfg: &RenderConfig, luma: Option<f64>) -> f64 {
    let base = cfg.dot_scale.clamp(*DOT_SCALE_RANGE.start(), *DOT_SCALE_RANGE.end());
    match luma {
        Some(y) if cfg.adaptive_dots => {
            let t = ((128.0 - y) / 128.0).clamp(-1.0, 1.0);
            (base + ADAPTIVE_SPREAD * t).clamp(*DOT_SCALE_RANGE.start(), *DOT_SCALE_RANGE.end())
        }
        _ => base,
    }
}

pub fn light_dot_scale(cfg: &RenderConfig) -> f64 {
    (cfg.dot_scale * LIGHT_DOT_RATIO).clamp(LIGHT_DOT_MIN, LIGHT_DOT_MAX)
}

/// Decide how to draw the module at `(row, col)`.
pub fn decide(
    row: usize,
    col: usize,
    matrix: &ModuleMatrix,
    zones: &ProtectedZones,
    luma: Option<&LuminanceField>,
    plan: &SuppressionPlan,
    cfg: &RenderConfig,
) -> RenderDecision {
    let dark = matrix.get(row, col);
    if zones.contains(row, col) {
        return if dark {
            RenderDecision::ProtectedDark
        } else {
            RenderDecision::ProtectedLight
        };
    }

    if dark {
        if plan.contains(row, col) {
            return RenderDecision::Suppressed;
        }
        let scale = dark_dot_scale(cfg, luma.map(|l| l.get(row, col)));
        return RenderDecision::Dot {
            color: DotColor::Dark,
            scale,
        };
    }

    match cfg.light_style {
        LightModuleStyle::Dot => RenderDecision::Dot {
            color: DotColor::Light,
            scale: light_dot_scale(cfg),
        },
        LightModuleStyle::Omit => RenderDecision::Omitted,
    }
}

/// Counts of what was drawn, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub protected: usize,
    pub dark_dots: usize,
    pub light_dots: usize,
    pub suppressed: usize,
    pub omitted: usize,
}

/// Paint every module onto `canvas`, with the module area starting at
/// `origin` pixels on both axes.
pub fn draw_modules(
    canvas: &mut RgbaImage,
    origin: u32,
    matrix: &ModuleMatrix,
    zones: &ProtectedZones,
    luma: Option<&LuminanceField>,
    plan: &SuppressionPlan,
    cfg: &RenderConfig,
) -> RenderStats {
    let n = matrix.width();
    let size = cfg.box_size;
    let mut stats = RenderStats::default();

    for row in 0..n {
        for col in 0..n {
            let x0 = origin + col as u32 * size;
            let y0 = origin + row as u32 * size;
            match decide(row, col, matrix, zones, luma, plan, cfg) {
                RenderDecision::ProtectedDark => {
                    fill_module(canvas, x0, y0, size, BLACK);
                    stats.protected += 1;
                }
                RenderDecision::ProtectedLight => {
                    fill_module(canvas, x0, y0, size, WHITE);
                    stats.protected += 1;
                }
                RenderDecision::Dot { color, scale } => {
                    draw_dot(canvas, x0, y0, size, scale, color.rgba());
                    match color {
                        DotColor::Dark => stats.dark_dots += 1,
                        DotColor::Light => stats.light_dots += 1,
                    }
                }
                RenderDecision::Suppressed => stats.suppressed += 1,
                RenderDecision::Omitted => stats.omitted += 1,
            }
        }
    }
    stats
}

fn fill_module(canvas: &mut RgbaImage, x0: u32, y0: u32, size: u32, color: Rgba<u8>) {
    draw_filled_rect_mut(canvas, Rect::at(x0 as i32, y0 as i32).of_size(size, size), color);
}

/// Filled circle of diameter `scale * size`, centered in the module cell.
fn draw_dot(canvas: &mut RgbaImage, x0: u32, y0: u32, size: u32, scale: f64, color: Rgba<u8>) {
    let half = f64::from(size) / 2.0;
    let center_x = f64::from(x0) + half;
    let center_y = f64::from(y0) + half;
    let radius = scale * half;
    let r_sq = radius * radius;

    for dy in 0..size {
        for dx in 0..size {
            let (ix, iy) = (x0 + dx, y0 + dy);
            if ix >= canvas.width() || iy >= canvas.height() {
                continue;
            }
            let dist_x = f64::from(ix) + 0.5 - center_x;
            let dist_y = f64::from(iy) + 0.5 - center_y;
            if dist_x * dist_x + dist_y * dist_y <= r_sq {
                canvas.put_pixel(ix, iy, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{EcLevel, QrVersion, encode};

    fn symbol() -> (ModuleMatrix, ProtectedZones, CodewordLayout) {
        let sym = encode(b"https://example.com/suppression", EcLevel::H, None).unwrap();
        let layout = CodewordLayout::new(sym.version, EcLevel::H).unwrap();
        (sym.matrix, ProtectedZones::new(sym.version), layout)
    }

    fn gradient(n: usize) -> LuminanceField {
        LuminanceField::from_fn(n, |r, c| ((r * n + c) * 255 / (n * n)) as f64)
    }

    #[test]
    fn suppression_respects_budget_and_protection() {
        let (matrix, zones, layout) = symbol();
        let luma = gradient(matrix.width());
        for step in 0..=18 {
            let budget = f64::from(step) / 100.0;
            let plan = plan_suppression(&matrix, &zones, &layout, &luma, budget);
            let eligible = plan.eligible();
            assert!(plan.len() <= (eligible as f64 * budget).floor() as usize);
            assert!(plan.len() <= MAX_SUPPRESSED);
            let n = matrix.width();
            let mut seen = 0;
            for row in 0..n {
                for col in 0..n {
                    if plan.contains(row, col) {
                        seen += 1;
                        assert!(!zones.contains(row, col));
                        assert!(matrix.get(row, col));
                    }
                }
            }
            assert_eq!(seen, plan.len());
        }
    }

    #[test]
    fn budget_is_capped() {
        assert_eq!(suppression_limit(1000, 0.5), 180);
        assert_eq!(suppression_limit(1000, -1.0), 0);
        assert_eq!(suppression_limit(1000, f64::NAN), 0);
        assert_eq!(suppression_limit(100_000, 0.18), MAX_SUPPRESSED);
        assert_eq!(suppression_limit(99, 0.08), 7);
    }

    #[test]
    fn brighter_candidates_are_only_skipped_for_exhausted_blocks() {
        let (matrix, zones, layout) = symbol();
        let n = matrix.width();
        let luma = gradient(n);
        let plan = plan_suppression(&matrix, &zones, &layout, &luma, 0.1);
        assert!(!plan.is_empty());

        let mut damaged = vec![false; layout.codewords()];
        let mut spent = vec![0; layout.blocks()];
        let mut min_removed = f64::MAX;
        for row in 0..n {
            for col in 0..n {
                if plan.contains(row, col) {
                    min_removed = min_removed.min(luma.get(row, col));
                    if let Some(cw) = layout.codeword_at(row, col) {
                        if !damaged[cw] {
                            damaged[cw] = true;
                            spent[layout.block_of(cw)] += 1;
                        }
                    }
                }
            }
        }

        for row in 0..n {
            for col in 0..n {
                let candidate = matrix.get(row, col) && !zones.contains(row, col);
                if !candidate || plan.contains(row, col) || luma.get(row, col) <= min_removed {
                    continue;
                }
                let cw = layout
                    .codeword_at(row, col)
                    .expect("skipped module carries a codeword");
                assert!(!damaged[cw], "({row},{col}) shares a damaged codeword");
                assert_eq!(spent[layout.block_of(cw)], layout.suppressible_per_block());
            }
        }
    }

    #[test]
    fn damage_per_block_stays_within_share_of_capacity() {
        let long = "x".repeat(300);
        for data in ["https://example.com", "QR ART 1234567890", long.as_str()] {
            let sym = encode(data.as_bytes(), EcLevel::H, None).unwrap();
            let zones = ProtectedZones::new(sym.version);
            let layout = CodewordLayout::new(sym.version, EcLevel::H).unwrap();
            let n = sym.matrix.width();
            let luma = LuminanceField::uniform(n, 255.0);
            let plan = plan_suppression(&sym.matrix, &zones, &layout, &luma, MAX_BUDGET);
            assert!(!plan.is_empty());

            let mut damaged = vec![false; layout.codewords()];
            for row in 0..n {
                for col in 0..n {
                    if !plan.contains(row, col) {
                        continue;
                    }
                    if let Some(cw) = layout.codeword_at(row, col) {
                        damaged[cw] = true;
                    }
                }
            }
            let mut per_block = vec![0; layout.blocks()];
            for (cw, _) in damaged.iter().enumerate().filter(|(_, d)| **d) {
                per_block[layout.block_of(cw)] += 1;
            }
            let cap = layout.suppressible_per_block();
            assert!(per_block.iter().all(|&d| d <= cap), "{per_block:?} > {cap}");
            assert!(cap * 2 <= layout.correctable_per_block());
        }
    }

    #[test]
    fn protected_modules_are_never_dots() {
        let (matrix, zones, layout) = symbol();
        let n = matrix.width();
        let luma = LuminanceField::uniform(n, 255.0);
        let plan = plan_suppression(&matrix, &zones, &layout, &luma, MAX_BUDGET);
        let cfg = RenderConfig::default();
        for row in 0..n {
            for col in 0..n {
                let d = decide(row, col, &matrix, &zones, Some(&luma), &plan, &cfg);
                if zones.contains(row, col) {
                    let expected = if matrix.get(row, col) {
                        RenderDecision::ProtectedDark
                    } else {
                        RenderDecision::ProtectedLight
                    };
                    assert_eq!(d, expected);
                }
            }
        }
    }

    #[test]
    fn light_style_controls_light_modules() {
        let version = QrVersion::new(1).unwrap();
        let zones = ProtectedZones::new(version);
        let n = version.width();
        let matrix = ModuleMatrix::from_fn(n, |_, _| false);
        let plan = SuppressionPlan::none(n);
        let mut cfg = RenderConfig::default();
        let d = decide(10, 10, &matrix, &zones, None, &plan, &cfg);
        assert_eq!(
            d,
            RenderDecision::Dot {
                color: DotColor::Light,
                scale: light_dot_scale(&cfg)
            }
        );
        cfg.light_style = LightModuleStyle::Omit;
        assert_eq!(decide(10, 10, &matrix, &zones, None, &plan, &cfg), RenderDecision::Omitted);
    }

    #[test]
    fn light_dot_scale_is_bounded() {
        let cfg = RenderConfig::default().with_dot_scale(0.55);
        assert!((light_dot_scale(&cfg) - 0.484).abs() < 1e-9);
        let cfg = RenderConfig::default().with_dot_scale(0.92);
        assert!((light_dot_scale(&cfg) - 0.8096).abs() < 1e-9);
    }

    #[test]
    fn adaptive_dots_follow_brightness() {
        let mut cfg = RenderConfig::default();
        assert_eq!(dark_dot_scale(&cfg, Some(0.0)), cfg.dot_scale);
        cfg.adaptive_dots = true;
        let dark = dark_dot_scale(&cfg, Some(0.0));
        let bright = dark_dot_scale(&cfg, Some(255.0));
        assert!(dark > cfg.dot_scale);
        assert!(bright < cfg.dot_scale);
        assert!((dark - 0.88).abs() < 1e-9);

        let cfg = RenderConfig {
            adaptive_dots: true,
            ..RenderConfig::default().with_dot_scale(0.92)
        };
        assert_eq!(dark_dot_scale(&cfg, Some(0.0)), 0.92);
    }

    #[test]
    fn dot_is_centered_and_sized() {
        let mut canvas = RgbaImage::from_pixel(16, 16, WHITE);
        draw_dot(&mut canvas, 0, 0, 16, 0.5, BLACK);
        assert_eq!(*canvas.get_pixel(8, 8), BLACK);
        assert_eq!(*canvas.get_pixel(7, 7), BLACK);
        assert_eq!(*canvas.get_pixel(0, 0), WHITE);
        assert_eq!(*canvas.get_pixel(8, 2), WHITE);
        assert_eq!(*canvas.get_pixel(8, 4), BLACK);
    }

    #[test]
    fn draw_modules_counts_every_module() {
        let (matrix, zones, layout) = symbol();
        let n = matrix.width();
        let luma = gradient(n);
        let plan = plan_suppression(&matrix, &zones, &layout, &luma, 0.08);
        let cfg = RenderConfig::default().with_box_size(4);
        let side = n as u32 * cfg.box_size;
        let mut canvas = RgbaImage::from_pixel(side, side, WHITE);
        let stats = draw_modules(&mut canvas, 0, &matrix, &zones, Some(&luma), &plan, &cfg);
        assert_eq!(
            stats.protected + stats.dark_dots + stats.light_dots + stats.suppressed + stats.omitted,
            n * n
        );
        assert_eq!(stats.protected, zones.count());
        assert_eq!(stats.suppressed, plan.len());
        assert_eq!(*canvas.get_pixel(0, 0), BLACK);
    }
}
