//! QR symbol encoding on top of the `qrcode` crate.
//!
//! The compositor needs to pin the mask pattern, which `QrCode` does not
//! expose, so symbols with an explicit mask are assembled from the crate's
//! lower-level `bits`, `ec` and `canvas` building blocks in the same order
//! `QrCode::with_bits` uses.

use std::fmt;

use qrcode::canvas::{Canvas, MaskPattern};
use qrcode::{Color, QrCode, Version};
use tracing::debug;

use crate::{QrArtError, Result};

/// Error-correction level of the generated symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EcLevel {
    L,
    M,
    Q,
    #[default]
    H,
}

impl EcLevel {
    /// Parse a level letter (case-insensitive). Unknown input yields `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "L" => Some(Self::L),
            "M" => Some(Self::M),
            "Q" => Some(Self::Q),
            "H" => Some(Self::H),
            _ => None,
        }
    }

    pub(crate) fn to_qrcode(self) -> qrcode::EcLevel {
        match self {
            Self::L => qrcode::EcLevel::L,
            Self::M => qrcode::EcLevel::M,
            Self::Q => qrcode::EcLevel::Q,
            Self::H => qrcode::EcLevel::H,
        }
    }
}

/// One of the eight standard data mask patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MaskIndex(u8);

impl MaskIndex {
    pub const ALL: [MaskIndex; 8] = [
        MaskIndex(0),
        MaskIndex(1),
        MaskIndex(2),
        MaskIndex(3),
        MaskIndex(4),
        MaskIndex(5),
        MaskIndex(6),
        MaskIndex(7),
    ];

    pub fn new(index: u8) -> Result<Self> {
        if index < 8 {
            Ok(Self(index))
        } else {
            Err(QrArtError::InvalidMask(index))
        }
    }

    pub fn index(self) -> u8 {
        self.0
    }

    fn pattern(self) -> MaskPattern {
        match self.0 {
            0 => MaskPattern::Checkerboard,
            1 => MaskPattern::HorizontalLines,
            2 => MaskPattern::VerticalLines,
            3 => MaskPattern::DiagonalLines,
            4 => MaskPattern::LargeCheckerboard,
            5 => MaskPattern::Fields,
            6 => MaskPattern::Diamonds,
            _ => MaskPattern::Meadow,
        }
    }
}

impl fmt::Display for MaskIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Symbol version, 1 through 40.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QrVersion(u8);

impl QrVersion {
    pub fn new(version: i32) -> Result<Self> {
        if (1..=40).contains(&version) {
            Ok(Self(version as u8))
        } else {
            Err(QrArtError::InvalidVersion(version))
        }
    }

    /// Recover the version from a symbol side length (`17 + 4v`).
    pub fn from_width(width: usize) -> Result<Self> {
        if width < 21 || (width - 17) % 4 != 0 {
            return Err(QrArtError::InvalidVersion(width as i32));
        }
        Self::new(((width - 17) / 4) as i32)
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Modules per side.
    pub fn width(self) -> usize {
        17 + 4 * usize::from(self.0)
    }

    pub(crate) fn to_qrcode(self) -> Version {
        Version::Normal(i16::from(self.0))
    }
}

impl fmt::Display for QrVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Square grid of modules, `true` = dark. Row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMatrix {
    width: usize,
    modules: Vec<bool>,
}

impl ModuleMatrix {
    /// Build a matrix by evaluating `f(row, col)` for every module.
    pub fn from_fn(width: usize, f: impl Fn(usize, usize) -> bool) -> Self {
        let mut modules = Vec::with_capacity(width * width);
        for row in 0..width {
            for col in 0..width {
                modules.push(f(row, col));
            }
        }
        Self { width, modules }
    }

    fn from_colors(width: usize, colors: &[Color]) -> Self {
        debug_assert_eq!(colors.len(), width * width);
        Self {
            width,
            modules: colors.iter().map(|c| *c == Color::Dark).collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        self.modules[row * self.width + col]
    }
}

/// Output of the encoder: the module matrix plus the parameters that shaped it.
#[derive(Debug, Clone)]
pub struct EncodedSymbol {
    pub matrix: ModuleMatrix,
    pub version: QrVersion,
    /// `None` when the encoder picked its own (penalty-based) mask.
    pub mask: Option<MaskIndex>,
}

/// Encode `data` in the smallest version that fits at `ec_level`.
///
/// With `mask == None` the encoder's default mask choice is used.
pub fn encode(data: &[u8], ec_level: EcLevel, mask: Option<MaskIndex>) -> Result<EncodedSymbol> {
    let level = ec_level.to_qrcode();
    let Some(mask) = mask else {
        let code = QrCode::with_error_correction_level(data, level).map_err(encode_err)?;
        let version = version_of(code.version())?;
        debug!(version = version.number(), ?ec_level, "Encoded QR with default mask");
        return Ok(EncodedSymbol {
            matrix: ModuleMatrix::from_colors(code.width(), &code.to_colors()),
            version,
            mask: None,
        });
    };

    let bits = qrcode::bits::encode_auto(data, level).map_err(encode_err)?;
    build_masked(bits, level, mask)
}

/// Encode `data` at a fixed version.
pub fn encode_with_version(
    data: &[u8],
    ec_level: EcLevel,
    version: QrVersion,
    mask: Option<MaskIndex>,
) -> Result<EncodedSymbol> {
    let level = ec_level.to_qrcode();
    let Some(mask) = mask else {
        let code = QrCode::with_version(data, version.to_qrcode(), level).map_err(encode_err)?;
        return Ok(EncodedSymbol {
            matrix: ModuleMatrix::from_colors(code.width(), &code.to_colors()),
            version,
            mask: None,
        });
    };

    let mut bits = qrcode::bits::Bits::new(version.to_qrcode());
    bits.push_optimal_data(data).map_err(encode_err)?;
    bits.push_terminator(level).map_err(encode_err)?;
    build_masked(bits, level, mask)
}

fn build_masked(
    bits: qrcode::bits::Bits,
    level: qrcode::EcLevel,
    mask: MaskIndex,
) -> Result<EncodedSymbol> {
    let qr_version = bits.version();
    let version = version_of(qr_version)?;
    let raw = bits.into_bytes();
    let (data_codewords, ec_codewords) =
        qrcode::ec::construct_codewords(&raw, qr_version, level).map_err(encode_err)?;

    let mut canvas = Canvas::new(qr_version, level);
    canvas.draw_all_functional_patterns();
    canvas.draw_data(&data_codewords, &ec_codewords);
    canvas.apply_mask(mask.pattern());

    let width = version.width();
    let colors = canvas.into_colors();
    if colors.len() != width * width {
        return Err(QrArtError::Encode(format!(
            "encoder produced {} modules for a {width}x{width} symbol",
            colors.len()
        )));
    }

    Ok(EncodedSymbol {
        matrix: ModuleMatrix::from_colors(width, &colors),
        version,
        mask: Some(mask),
    })
}

fn version_of(version: Version) -> Result<QrVersion> {
    match version {
        Version::Normal(v) => QrVersion::new(i32::from(v)),
        _ => Err(QrArtError::Encode("micro QR symbols are not supported".into())),
    }
}

fn encode_err(e: qrcode::types::QrError) -> QrArtError {
    QrArtError::Encode(e.to_string())
}
