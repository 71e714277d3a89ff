//! Structural zone classification.
//!
//! A module is protected when it belongs to a finder pattern (with its
//! separator and the adjacent format strip), a timing pattern, the format
//! information, an alignment pattern, or the version information blocks.
//! Protected modules are always drawn as flat squares of their true value.
//!
//! The corner blocks are 9x9 at all three finders. At the top-right and
//! bottom-left corners that is one module wider than what the encoder
//! reserves, which only over-protects.

use crate::encode::QrVersion;

/// Alignment pattern center coordinates (shared by rows and columns).
///
/// The first center is 6, the last is `n - 7`, and the intermediate ones are
/// spaced by the standard even step. Version 1 has none.
pub fn alignment_centers(version: QrVersion) -> Vec<usize> {
    let v = usize::from(version.number());
    if v < 2 {
        return Vec::new();
    }
    let count = v / 7 + 2;
    let last = version.width() - 7;
    if count == 2 {
        return vec![6, last];
    }

    let step = if v == 32 {
        26
    } else {
        (v * 4 + count * 2 + 1) / (count * 2 - 2) * 2
    };
    let mut centers = Vec::with_capacity(count);
    centers.push(6);
    for i in 1..count {
        centers.push(last - (count - 1 - i) * step);
    }
    centers
}

fn in_finder_or_separator(row: usize, col: usize, n: usize) -> bool {
    (row <= 8 && col <= 8) || (row <= 8 && col >= n - 9) || (row >= n - 9 && col <= 8)
}

fn in_timing(row: usize, col: usize, n: usize) -> bool {
    (row == 6 && (8..=n - 9).contains(&col)) || (col == 6 && (8..=n - 9).contains(&row))
}

fn in_format_info(row: usize, col: usize, n: usize) -> bool {
    (row == 8 && (col <= 8 || col >= n - 9)) || (col == 8 && (row <= 8 || row >= n - 9))
}

fn in_version_info(row: usize, col: usize, n: usize, version: QrVersion) -> bool {
    if version.number() < 7 {
        return false;
    }
    let band = n - 11..=n - 9;
    (row <= 5 && band.contains(&col)) || (col <= 5 && band.contains(&row))
}

fn in_alignment(row: usize, col: usize, n: usize, centers: &[usize]) -> bool {
    let last = n - 7;
    for &cy in centers {
        for &cx in centers {
            let overlaps_finder =
                (cx == 6 && cy == 6) || (cx == 6 && cy == last) || (cx == last && cy == 6);
            if overlaps_finder {
                continue;
            }
            if row.abs_diff(cy) <= 2 && col.abs_diff(cx) <= 2 {
                return true;
            }
        }
    }
    false
}

/// Whether the module at `(row, col)` of an `n x n` symbol is structural.
pub fn is_protected(row: usize, col: usize, n: usize, version: QrVersion) -> bool {
    if in_finder_or_separator(row, col, n)
        || in_timing(row, col, n)
        || in_format_info(row, col, n)
        || in_version_info(row, col, n, version)
    {
        return true;
    }
    if version.number() < 2 {
        return false;
    }
    in_alignment(row, col, n, &alignment_centers(version))
}

/// Precomputed protection map for one symbol, row-major.
///
/// Renderers query every module, so the alignment centers are resolved once.
#[derive(Debug, Clone)]
pub struct ProtectedZones {
    width: usize,
    cells: Vec<bool>,
}

impl ProtectedZones {
    pub fn new(version: QrVersion) -> Self {
        let n = version.width();
        let centers = alignment_centers(version);
        let mut cells = Vec::with_capacity(n * n);
        for row in 0..n {
            for col in 0..n {
                cells.push(
                    in_finder_or_separator(row, col, n)
                        || in_timing(row, col, n)
                        || in_format_info(row, col, n)
                        || in_version_info(row, col, n, version)
                        || in_alignment(row, col, n, &centers),
                );
            }
        }
        Self { width: n, cells }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.cells[row * self.width + col]
    }

    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&p| p).count()
    }
}
