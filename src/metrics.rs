//! Clustering evaluation metrics.
//!
//! Measures for comparing two labelings of the same points, e.g. a
//! discovered clustering against a reference partition. All of them are
//! invariant to label permutation, which is what makes them usable on
//! algorithms that discover clusters in arbitrary order.
//!
//! | Metric | Range | Best | Notes |
//! |----------|---------|------|--------------------------------|
//! | [`ari`] | [-1, 1] | 1 | chance-adjusted pair counting |
//! | [`nmi`] | [0, 1] | 1 | information-theoretic |
//! | [`purity`] | [0, 1] | 1 | simple; favors many clusters |

use std::collections::HashMap;

type Contingency = (
    HashMap<(usize, usize), usize>,
    HashMap<usize, usize>,
    HashMap<usize, usize>,
);

fn contingency(pred: &[usize], truth: &[usize]) -> Contingency {
    let mut cells = HashMap::new();
    let mut rows = HashMap::new();
    let mut cols = HashMap::new();
    for (&p, &t) in pred.iter().zip(truth) {
        *cells.entry((p, t)).or_insert(0) += 1;
        *rows.entry(p).or_insert(0) += 1;
        *cols.entry(t).or_insert(0) += 1;
    }
    (cells, rows, cols)
}

fn comb2(n: usize) -> f64 {
    (n * n.saturating_sub(1)) as f64 / 2.0
}

/// Adjusted Rand Index between two labelings.
///
/// Counts point pairs the two labelings agree on, corrected for chance;
/// 1 means the partitions are identical up to label permutation, and a
/// random labeling scores near 0.
///
/// Panics if the labelings have different lengths.
pub fn ari(pred: &[usize], truth: &[usize]) -> f64 {
    assert_eq!(pred.len(), truth.len(), "labelings must cover the same points");
    let n = pred.len();
    if n < 2 {
        return 1.0;
    }

    let (cells, rows, cols) = contingency(pred, truth);
    let sum_cells: f64 = cells.values().map(|&c| comb2(c)).sum();
    let sum_rows: f64 = rows.values().map(|&c| comb2(c)).sum();
    let sum_cols: f64 = cols.values().map(|&c| comb2(c)).sum();

    let expected = sum_rows * sum_cols / comb2(n);
    let max = 0.5 * (sum_rows + sum_cols);
    if (max - expected).abs() < f64::EPSILON {
        // both partitions are trivial (all-in-one or all-singletons)
        return 1.0;
    }
    (sum_cells - expected) / (max - expected)
}

/// Normalized Mutual Information between two labelings, in [0, 1].
///
/// Mutual information between the two label distributions, normalized by
/// the mean of their entropies.
///
/// Panics if the labelings have different lengths.
pub fn nmi(pred: &[usize], truth: &[usize]) -> f64 {
    assert_eq!(pred.len(), truth.len(), "labelings must cover the same points");
    if pred.is_empty() {
        return 1.0;
    }

    let (cells, rows, cols) = contingency(pred, truth);
    let n = pred.len() as f64;

    let mut information = 0.0;
    for (&(p, t), &count) in &cells {
        let joint = count as f64 / n;
        let marginal_p = rows[&p] as f64 / n;
        let marginal_t = cols[&t] as f64 / n;
        information += joint * (joint / (marginal_p * marginal_t)).ln();
    }

    let entropy = |counts: &HashMap<usize, usize>| -> f64 {
        counts
            .values()
            .map(|&c| {
                let p = c as f64 / n;
                -p * p.ln()
            })
            .sum()
    };
    let denominator = entropy(&rows) + entropy(&cols);
    if denominator <= 0.0 {
        return 1.0;
    }
    (2.0 * information / denominator).clamp(0.0, 1.0)
}

/// Purity: the fraction of points that fall in their cluster's majority
/// class. Biased toward labelings with many small clusters.
///
/// Panics if the labelings have different lengths.
pub fn purity(pred: &[usize], truth: &[usize]) -> f64 {
    assert_eq!(pred.len(), truth.len(), "labelings must cover the same points");
    if pred.is_empty() {
        return 1.0;
    }

    let (cells, _, _) = contingency(pred, truth);
    let mut majority: HashMap<usize, usize> = HashMap::new();
    for (&(p, _), &count) in &cells {
        let best = majority.entry(p).or_insert(0);
        if count > *best {
            *best = count;
        }
    }
    majority.values().sum::<usize>() as f64 / pred.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_agreement() {
        let labels = [0, 0, 1, 1, 2, 2];
        assert!((ari(&labels, &labels) - 1.0).abs() < 1e-12);
        assert!((nmi(&labels, &labels) - 1.0).abs() < 1e-12);
        assert!((purity(&labels, &labels) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_label_permutation_invariance() {
        let pred = [2, 2, 0, 0, 1, 1];
        let truth = [0, 0, 1, 1, 2, 2];
        assert!((ari(&pred, &truth) - 1.0).abs() < 1e-12);
        assert!((nmi(&pred, &truth) - 1.0).abs() < 1e-12);
        assert!((purity(&pred, &truth) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_disagreement_scores_below_one() {
        let pred = [0, 0, 0, 1, 1, 1];
        let truth = [0, 0, 1, 1, 2, 2];
        assert!(ari(&pred, &truth) < 1.0);
        assert!(nmi(&pred, &truth) < 1.0);
        assert!(purity(&pred, &truth) < 1.0);
    }

    #[test]
    fn test_trivial_partitions() {
        let one_cluster = [0, 0, 0];
        assert!((ari(&one_cluster, &one_cluster) - 1.0).abs() < 1e-12);
        assert!((nmi(&one_cluster, &one_cluster) - 1.0).abs() < 1e-12);
        assert!((purity(&one_cluster, &one_cluster) - 1.0).abs() < 1e-12);
    }
}
