//! Error-correction geometry of a symbol.
//!
//! Maps every data module to the codeword it carries and every codeword to
//! its Reed-Solomon block, so module suppression can be budgeted against
//! what each block is able to correct.

use qrcode::bits::Bits;
use qrcode::canvas::{Canvas, Module};
use tracing::debug;

use crate::encode::{EcLevel, QrVersion};
use crate::{QrArtError, Result};

/// Share of each block's correction capacity that suppression may consume.
/// The rest is left for print and camera noise.
pub const SUPPRESSION_EC_SHARE: f64 = 0.5;

/// Codeword and block layout for one version and error-correction level.
#[derive(Debug, Clone)]
pub struct CodewordLayout {
    width: usize,
    /// Bit position in the placed stream per module, row-major. `None` for
    /// function modules.
    bit_at: Vec<Option<usize>>,
    /// Block index per codeword, data codewords first, then EC codewords.
    block_of: Vec<usize>,
    blocks: usize,
    correctable_per_block: usize,
}

impl CodewordLayout {
    pub fn new(version: QrVersion, ec_level: EcLevel) -> Result<Self> {
        let qr_version = version.to_qrcode();
        let level = ec_level.to_qrcode();
        let width = version.width();

        let data_len = Bits::new(qr_version).max_len(level).map_err(ecc_err)? / 8;
        let (block_of, blocks) = codeword_blocks(qr_version, level, data_len)?;

        let total_errors = qrcode::ec::max_allowed_errors(qr_version, level).map_err(ecc_err)?;
        let correctable_per_block = total_errors / blocks;

        let mut canvas = Canvas::new(qr_version, level);
        canvas.draw_all_functional_patterns();
        let mut bit_at = vec![None; width * width];
        for (bit, (row, col)) in placement_order(&canvas, width).into_iter().enumerate() {
            bit_at[row * width + col] = Some(bit);
        }

        debug!(
            version = version.number(),
            ?ec_level,
            codewords = block_of.len(),
            blocks,
            correctable_per_block,
            "Built codeword layout"
        );
        Ok(Self {
            width,
            bit_at,
            block_of,
            blocks,
            correctable_per_block,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Total codewords in the symbol.
    pub fn codewords(&self) -> usize {
        self.block_of.len()
    }

    pub fn blocks(&self) -> usize {
        self.blocks
    }

    /// Codewords each block can recover.
    pub fn correctable_per_block(&self) -> usize {
        self.correctable_per_block
    }

    /// Codewords per block that suppression may damage.
    pub fn suppressible_per_block(&self) -> usize {
        (self.correctable_per_block as f64 * SUPPRESSION_EC_SHARE).floor() as usize
    }

    /// Position of the module's bit in the placed stream, `None` for
    /// function modules.
    pub fn bit_at(&self, row: usize, col: usize) -> Option<usize> {
        self.bit_at[row * self.width + col]
    }

    /// Codeword carried by the module. Function modules and remainder bits
    /// carry none.
    pub fn codeword_at(&self, row: usize, col: usize) -> Option<usize> {
        self.bit_at(row, col)
            .map(|bit| bit / 8)
            .filter(|&cw| cw < self.block_of.len())
    }

    pub fn block_of(&self, codeword: usize) -> usize {
        self.block_of[codeword]
    }
}

/// Data modules in placement order: two-column strips from the right edge,
/// alternating upward and downward, skipping the vertical timing column.
fn placement_order(canvas: &Canvas, width: usize) -> Vec<(usize, usize)> {
    let mut order = Vec::new();
    let mut right = width - 1;
    let mut upward = true;
    loop {
        if right == 6 {
            right = 5;
        }
        for i in 0..width {
            let row = if upward { width - 1 - i } else { i };
            for col in [right, right - 1] {
                if canvas.get(col as i16, row as i16) == Module::Empty {
                    order.push((row, col));
                }
            }
        }
        if right < 3 {
            break;
        }
        upward = !upward;
        right -= 2;
    }
    order
}

/// Block index of every codeword in interleaved order.
///
/// The block split is recovered by tagging each data byte with its own
/// index and observing where the interleaver puts it.
fn codeword_blocks(
    version: qrcode::Version,
    level: qrcode::EcLevel,
    data_len: usize,
) -> Result<(Vec<usize>, usize)> {
    let low: Vec<u8> = (0..data_len).map(|i| (i & 0xff) as u8).collect();
    let high: Vec<u8> = (0..data_len).map(|i| (i >> 8) as u8).collect();
    let (low_data, ec) = qrcode::ec::construct_codewords(&low, version, level).map_err(ecc_err)?;
    let (high_data, _) = qrcode::ec::construct_codewords(&high, version, level).map_err(ecc_err)?;

    let source: Vec<usize> = low_data
        .iter()
        .zip(&high_data)
        .map(|(&lo, &hi)| usize::from(hi) << 8 | usize::from(lo))
        .collect();

    // Interleaving emits the first byte of every block before the second
    // byte of the first block.
    let blocks = source.iter().skip(1).position(|&i| i == 1).map_or(1, |p| p + 1);
    let starts = &source[..blocks];
    if ec.len() % blocks != 0 {
        return Err(QrArtError::Encode(format!(
            "inconsistent block layout: {blocks} blocks, {} EC codewords",
            ec.len()
        )));
    }

    let mut block_of: Vec<usize> = source
        .iter()
        .map(|&i| starts.partition_point(|&s| s <= i) - 1)
        .collect();
    block_of.extend((0..ec.len()).map(|k| k % blocks));
    Ok((block_of, blocks))
}

fn ecc_err(e: qrcode::types::QrError) -> QrArtError {
    QrArtError::Encode(e.to_string())
}
