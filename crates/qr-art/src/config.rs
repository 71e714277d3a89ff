//! Render configuration: validated, clamped pipeline parameters.
//!
//! Free-form inputs never fail. Unparseable values fall back to the
//! default, out-of-range values are clamped to the nearest bound.

use std::ops::RangeInclusive;

use crate::encode::EcLevel;
use crate::normalize::FitMode;
use crate::render::LightModuleStyle;

pub const DOT_SCALE_RANGE: RangeInclusive<f64> = 0.55..=0.92;
pub const WASH_RANGE: RangeInclusive<f64> = 0.0..=0.6;
pub const BUDGET_RANGE: RangeInclusive<f64> = 0.0..=0.18;
pub const BOX_SIZE_RANGE: RangeInclusive<u32> = 4..=32;
pub const QUIET_RANGE: RangeInclusive<u32> = 4..=16;

pub const DEFAULT_DOT_SCALE: f64 = 0.78;
pub const DEFAULT_WASH: f64 = 0.20;
pub const DEFAULT_BUDGET: f64 = 0.08;
pub const DEFAULT_BOX_SIZE: u32 = 16;
pub const DEFAULT_QUIET: u32 = 6;

/// Pixels trimmed from artwork must have alpha at or below this value.
pub const TRIM_ALPHA_THRESHOLD: u8 = 8;
/// Opaque artwork padding is anything at least this bright.
pub const TRIM_LUMA_THRESHOLD: f64 = 250.0;

/// Parameters for one render, passed by value through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    /// Dark dot diameter as a fraction of the module size.
    pub dot_scale: f64,
    /// Opacity of the white layer washed over the artwork.
    pub wash: f64,
    /// Fraction of eligible dark modules that may be dropped.
    pub budget: f64,
    /// Pixels per module.
    pub box_size: u32,
    /// Quiet zone width in modules.
    pub quiet: u32,
    pub ec_level: EcLevel,
    pub fit: FitMode,
    pub trim_padding: bool,
    pub light_style: LightModuleStyle,
    /// Modulate dark dot size by local brightness.
    pub adaptive_dots: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dot_scale: DEFAULT_DOT_SCALE,
            wash: DEFAULT_WASH,
            budget: DEFAULT_BUDGET,
            box_size: DEFAULT_BOX_SIZE,
            quiet: DEFAULT_QUIET,
            ec_level: EcLevel::H,
            fit: FitMode::Contain,
            trim_padding: true,
            light_style: LightModuleStyle::Dot,
            adaptive_dots: false,
        }
    }
}

/// Unvalidated string parameters as they arrive from a request.
///
/// Canvas geometry (box size, quiet zone) is not request-controlled; it
/// comes from the base config.
#[derive(Debug, Clone, Default)]
pub struct RawParams {
    pub dot: Option<String>,
    pub wash: Option<String>,
    pub budget: Option<String>,
    pub ec: Option<String>,
    pub fit: Option<String>,
    pub trim: Option<String>,
    pub light: Option<String>,
    pub adaptive: Option<String>,
}

impl RenderConfig {
    /// Coerce raw parameters on top of `base`. Never fails.
    pub fn from_raw(raw: &RawParams, base: RenderConfig) -> Self {
        Self {
            dot_scale: parse_clamped_f64(raw.dot.as_deref(), DOT_SCALE_RANGE, base.dot_scale),
            wash: parse_clamped_f64(raw.wash.as_deref(), WASH_RANGE, base.wash),
            budget: parse_clamped_f64(raw.budget.as_deref(), BUDGET_RANGE, base.budget),
            box_size: base.box_size,
            quiet: base.quiet,
            ec_level: raw.ec.as_deref().and_then(EcLevel::parse).unwrap_or(base.ec_level),
            fit: raw.fit.as_deref().and_then(FitMode::parse).unwrap_or(base.fit),
            trim_padding: raw.trim.as_deref().and_then(parse_bool).unwrap_or(base.trim_padding),
            light_style: raw
                .light
                .as_deref()
                .and_then(LightModuleStyle::parse)
                .unwrap_or(base.light_style),
            adaptive_dots: raw
                .adaptive
                .as_deref()
                .and_then(parse_bool)
                .unwrap_or(base.adaptive_dots),
        }
        .clamped()
    }

    /// Force every numeric field into its documented range.
    pub fn clamped(self) -> Self {
        Self {
            dot_scale: clamp_f64(self.dot_scale, DOT_SCALE_RANGE, DEFAULT_DOT_SCALE),
            wash: clamp_f64(self.wash, WASH_RANGE, DEFAULT_WASH),
            budget: clamp_f64(self.budget, BUDGET_RANGE, DEFAULT_BUDGET),
            box_size: self.box_size.clamp(*BOX_SIZE_RANGE.start(), *BOX_SIZE_RANGE.end()),
            quiet: self.quiet.clamp(*QUIET_RANGE.start(), *QUIET_RANGE.end()),
            ..self
        }
    }

    pub fn with_dot_scale(self, dot_scale: f64) -> Self {
        Self { dot_scale, ..self }.clamped()
    }

    pub fn with_wash(self, wash: f64) -> Self {
        Self { wash, ..self }.clamped()
    }

    pub fn with_budget(self, budget: f64) -> Self {
        Self { budget, ..self }.clamped()
    }

    pub fn with_box_size(self, box_size: u32) -> Self {
        Self { box_size, ..self }.clamped()
    }

    pub fn with_quiet(self, quiet: u32) -> Self {
        Self { quiet, ..self }.clamped()
    }

    /// Final canvas side in pixels for an `n`-module symbol.
    pub fn canvas_side(&self, n: usize) -> u32 {
        (n as u32 + 2 * self.quiet) * self.box_size
    }
}

fn clamp_f64(v: f64, range: RangeInclusive<f64>, default: f64) -> f64 {
    if v.is_finite() {
        v.clamp(*range.start(), *range.end())
    } else {
        default
    }
}

fn parse_clamped_f64(s: Option<&str>, range: RangeInclusive<f64>, default: f64) -> f64 {
    let Some(s) = s.map(str::trim).filter(|s| !s.is_empty()) else {
        return default;
    };
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => v.clamp(*range.start(), *range.end()),
        _ => default,
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
