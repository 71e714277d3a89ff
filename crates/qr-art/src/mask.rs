//! Mask pattern selection against artwork brightness.
//!
//! Every mask yields a different arrangement of data modules for the same
//! payload. The best mask for a given artwork is the one that puts dark
//! modules over dark regions and light modules over light regions.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::encode::{EcLevel, EncodedSymbol, MaskIndex, ModuleMatrix, encode};
use crate::protect::ProtectedZones;
use crate::sample::LuminanceField;
use crate::{QrArtError, Result};

/// Weight of light-module agreement relative to dark-module agreement.
pub const LIGHT_WEIGHT: f64 = 0.35;

/// Average agreement between the matrix and the luminance field over all
/// non-protected modules. Higher is better.
pub fn score_mask(matrix: &ModuleMatrix, zones: &ProtectedZones, luma: &LuminanceField) -> f64 {
    let n = matrix.width();
    let mut score = 0.0;
    let mut count = 0usize;
    for row in 0..n {
        for col in 0..n {
            if zones.contains(row, col) {
                continue;
            }
            let y = luma.get(row, col);
            score += if matrix.get(row, col) {
                255.0 - y
            } else {
                LIGHT_WEIGHT * y
            };
            count += 1;
        }
    }
    score / count.max(1) as f64
}

/// Index and score of the best candidate. The first maximum wins ties.
pub fn select_mask(scores: &[f64]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &s) in scores.iter().enumerate() {
        match best {
            Some((_, b)) if s <= b => {}
            _ => best = Some((i, s)),
        }
    }
    best
}

/// Encode `data`, choosing the mask that best fits `luma` when given.
///
/// Without a luminance field there is nothing to optimize and the encoder's
/// default mask is used.
pub fn choose_symbol(
    data: &[u8],
    ec_level: EcLevel,
    luma: Option<&LuminanceField>,
) -> Result<EncodedSymbol> {
    let Some(luma) = luma else {
        return encode(data, ec_level, None);
    };

    let candidates = MaskIndex::ALL
        .par_iter()
        .map(|&mask| encode(data, ec_level, Some(mask)))
        .collect::<Result<Vec<_>>>()?;

    let version = candidates[0].version;
    let n = version.width();
    if luma.side() != n {
        return Err(QrArtError::Dimension {
            field: luma.side(),
            symbol: n,
        });
    }

    let zones = ProtectedZones::new(version);
    let scores: Vec<f64> = candidates
        .par_iter()
        .map(|c| score_mask(&c.matrix, &zones, luma))
        .collect();
    debug!(?scores, "Scored mask candidates");

    let (best, score) = select_mask(&scores)
        .ok_or_else(|| QrArtError::Encode("no mask candidates".into()))?;
    let chosen = candidates
        .into_iter()
        .nth(best)
        .ok_or_else(|| QrArtError::Encode("mask candidate vanished".into()))?;
    info!(
        mask = best,
        score,
        version = version.number(),
        "Selected mask for artwork"
    );
    Ok(chosen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::QrVersion;

    #[test]
    fn dark_modules_on_dark_art_score_higher() {
        let version = QrVersion::new(1).unwrap();
        let zones = ProtectedZones::new(version);
        let n = version.width();
        let luma = LuminanceField::from_fn(n, |_, col| if col < n / 2 { 0.0 } else { 255.0 });
        let aligned = ModuleMatrix::from_fn(n, |_, col| col < n / 2);
        let inverted = ModuleMatrix::from_fn(n, |_, col| col >= n / 2);
        assert!(score_mask(&aligned, &zones, &luma) > score_mask(&inverted, &zones, &luma));
    }

    #[test]
    fn score_matches_formula_on_uniform_field() {
        let version = QrVersion::new(1).unwrap();
        let zones = ProtectedZones::new(version);
        let n = version.width();
        let luma = LuminanceField::uniform(n, 100.0);
        let all_dark = ModuleMatrix::from_fn(n, |_, _| true);
        let all_light = ModuleMatrix::from_fn(n, |_, _| false);
        assert!((score_mask(&all_dark, &zones, &luma) - 155.0).abs() < 1e-9);
        assert!((score_mask(&all_light, &zones, &luma) - 35.0).abs() < 1e-9);
    }

    #[test]
    fn protected_modules_do_not_count() {
        let version = QrVersion::new(1).unwrap();
        let zones = ProtectedZones::new(version);
        let n = version.width();
        let luma = LuminanceField::uniform(n, 0.0);
        // Dark only inside protected zones: all scored modules are light.
        let matrix = ModuleMatrix::from_fn(n, |r, c| zones.contains(r, c));
        assert_eq!(score_mask(&matrix, &zones, &luma), 0.0);
    }

    #[test]
    fn select_mask_prefers_first_on_ties() {
        assert_eq!(select_mask(&[1.0, 3.0, 3.0, 2.0]), Some((1, 3.0)));
        assert_eq!(select_mask(&[]), None);
    }

    #[test]
    fn no_artwork_uses_encoder_default() {
        let sym = choose_symbol(b"https://example.com", EcLevel::H, None).unwrap();
        assert!(sym.mask.is_none());
    }

    #[test]
    fn selection_is_deterministic() {
        let n = encode(b"https://example.com", EcLevel::H, None).unwrap().version.width();
        let luma = LuminanceField::from_fn(n, |r, c| ((r * 7 + c * 13) % 256) as f64);
        let a = choose_symbol(b"https://example.com", EcLevel::H, Some(&luma)).unwrap();
        for _ in 0..3 {
            let b = choose_symbol(b"https://example.com", EcLevel::H, Some(&luma)).unwrap();
            assert_eq!(a.mask, b.mask);
            assert_eq!(a.matrix, b.matrix);
        }
    }

    #[test]
    fn chosen_mask_has_the_best_score() {
        let data = b"mask selection";
        let n = encode(data, EcLevel::H, None).unwrap().version.width();
        let luma = LuminanceField::from_fn(n, |r, _| if r < n / 2 { 20.0 } else { 230.0 });
        let chosen = choose_symbol(data, EcLevel::H, Some(&luma)).unwrap();
        let zones = ProtectedZones::new(chosen.version);
        let best = score_mask(&chosen.matrix, &zones, &luma);
        for mask in MaskIndex::ALL {
            let other = encode(data, EcLevel::H, Some(mask)).unwrap();
            assert!(score_mask(&other.matrix, &zones, &luma) <= best);
        }
    }

    #[test]
    fn mismatched_field_is_rejected() {
        let luma = LuminanceField::uniform(5, 128.0);
        let err = choose_symbol(b"hello", EcLevel::H, Some(&luma)).unwrap_err();
        assert!(matches!(err, QrArtError::Dimension { field: 5, .. }));
    }
}
