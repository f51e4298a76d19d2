//! False-discovery-rate cutoffs for a batch of independence tests.
//!
//! In skeleton search a *discovery* is a rejected independence hypothesis,
//! i.e. a test whose p-value is small enough to keep the edge. Given the
//! p-values of one depth pass, [`fdr_cutoff`] returns the largest threshold
//! `t` such that declaring every test with `p <= t` dependent controls the
//! FDR at the nominal level:
//!
//! ```text
//! sort p ascending: p(1) <= ... <= p(m)
//! k = max { i : p(i) <= i / (m * c(m)) * level }
//! cutoff = p(k), or 0.0 if no such i
//! ```
//!
//! `c(m) = 1` for Benjamini-Hochberg and `c(m) = 1 + 1/2 + ... + 1/m` for
//! Benjamini-Yekutieli. The rank boundary is inclusive. Installing the
//! cutoff as an oracle's alpha (independent iff `p > alpha`) marks exactly
//! the tests at or below `p(k)` as dependent.

use crate::search::config::FdrDependence;

/// Harmonic number `H(m) = 1 + 1/2 + ... + 1/m`.
pub fn harmonic(m: usize) -> f64 {
    (1..=m).map(|i| 1.0 / i as f64).sum()
}

/// FDR-adjusted significance cutoff for `p_values`.
///
/// Returns `None` for an empty batch, where there is nothing to adjust.
/// Non-finite p-values are treated as 1.0.
pub fn fdr_cutoff(level: f64, p_values: &[f64], dependence: FdrDependence) -> Option<f64> {
    if p_values.is_empty() {
        return None;
    }

    let mut sorted: Vec<f64> = p_values
        .iter()
        .map(|&p| if p.is_finite() { p.clamp(0.0, 1.0) } else { 1.0 })
        .collect();
    sorted.sort_by(f64::total_cmp);

    let m = sorted.len();
    let correction = match dependence {
        FdrDependence::Independent => 1.0,
        FdrDependence::Arbitrary => harmonic(m),
    };
    let scale = level / (m as f64 * correction);

    let cutoff = sorted
        .iter()
        .enumerate()
        .rev()
        .find(|&(i, &p)| p <= (i + 1) as f64 * scale)
        .map(|(_, &p)| p)
        .unwrap_or(0.0);
    Some(cutoff)
}

/// Number of tests declared dependent under `cutoff`.
pub fn rejections(p_values: &[f64], cutoff: f64) -> usize {
    p_values.iter().filter(|&&p| p <= cutoff).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_has_no_cutoff() {
        assert_eq!(fdr_cutoff(0.05, &[], FdrDependence::Independent), None);
    }

    #[test]
    fn benjamini_hochberg_textbook_example() {
        // m = 10, level 0.05: thresholds 0.005, 0.010, ..., 0.050.
        let p = [
            0.001, 0.008, 0.039, 0.041, 0.042, 0.060, 0.074, 0.205, 0.212, 0.216,
        ];
        let cutoff = fdr_cutoff(0.05, &p, FdrDependence::Independent).unwrap();
        // p(2) = 0.008 <= 0.010 is the largest passing rank.
        assert_eq!(cutoff, 0.008);
        assert_eq!(rejections(&p, cutoff), 2);
    }

    #[test]
    fn boundary_is_inclusive() {
        let p = [0.025, 0.5];
        // Rank 1 threshold is 0.025 exactly.
        assert_eq!(fdr_cutoff(0.05, &p, FdrDependence::Independent), Some(0.025));
    }

    #[test]
    fn step_up_takes_largest_rank() {
        // Rank 1 fails (0.03 > 0.0167) but rank 3 passes (0.04 <= 0.05).
        let p = [0.04, 0.03, 0.035];
        assert_eq!(fdr_cutoff(0.05, &p, FdrDependence::Independent), Some(0.04));
    }

    #[test]
    fn no_discoveries_gives_zero_cutoff() {
        let p = [0.3, 0.6, 0.9];
        assert_eq!(fdr_cutoff(0.05, &p, FdrDependence::Independent), Some(0.0));
    }

    #[test]
    fn yekutieli_is_more_conservative() {
        let p = [0.001, 0.008, 0.039, 0.041, 0.042, 0.060];
        let bh = fdr_cutoff(0.05, &p, FdrDependence::Independent).unwrap();
        let by = fdr_cutoff(0.05, &p, FdrDependence::Arbitrary).unwrap();
        assert!(by <= bh);
        assert_eq!(by, 0.001);
    }

    #[test]
    fn order_of_batch_does_not_matter() {
        let a = [0.2, 0.001, 0.04, 0.01];
        let b = [0.04, 0.2, 0.01, 0.001];
        assert_eq!(
            fdr_cutoff(0.1, &a, FdrDependence::Independent),
            fdr_cutoff(0.1, &b, FdrDependence::Independent)
        );
    }

    #[test]
    fn non_finite_values_count_as_one() {
        let p = [f64::NAN, 0.001];
        assert_eq!(fdr_cutoff(0.05, &p, FdrDependence::Independent), Some(0.001));
    }

    #[test]
    fn harmonic_numbers() {
        assert_eq!(harmonic(0), 0.0);
        assert!((harmonic(4) - 25.0 / 12.0).abs() < 1e-12);
    }
}
