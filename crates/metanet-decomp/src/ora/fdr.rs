//! Benjamini–Hochberg false-discovery-rate control.

/// Step-up Benjamini–Hochberg selection.
///
/// `candidates` are `(key, p)` pairs; `total_tests` is the number of
/// hypotheses `m`, which may exceed `candidates.len()` when some tests were
/// excluded up front. Candidates are visited by ascending p-value (ties by
/// key) and accepted while `p ≤ (rank / m) · alpha`; the first failure stops
/// the scan. Returns accepted keys in acceptance order.
#[must_use]
pub fn benjamini_hochberg<K: Copy + Ord>(
    candidates: &[(K, f64)],
    total_tests: usize,
    alpha: f64,
) -> Vec<K> {
    if total_tests == 0 {
        return Vec::new();
    }
    let mut sorted: Vec<(K, f64)> = candidates.to_vec();
    sorted.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

    let m = to_f64(total_tests);
    let mut accepted = Vec::new();
    for (rank, (key, p)) in sorted.into_iter().enumerate() {
        let threshold = to_f64(rank + 1) / m * alpha;
        if p > threshold {
            break;
        }
        accepted.push(key);
    }
    accepted
}

#[allow(clippy::cast_precision_loss)]
fn to_f64(value: usize) -> f64 {
    value as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_five_tests() {
        let p = [(0, 0.001), (1, 0.01), (2, 0.02), (3, 0.5), (4, 0.9)];
        assert_eq!(benjamini_hochberg(&p, 5, 0.05), vec![0, 1, 2]);
    }

    #[test]
    fn input_order_is_irrelevant() {
        let p = [(4, 0.9), (2, 0.02), (0, 0.001), (3, 0.5), (1, 0.01)];
        assert_eq!(benjamini_hochberg(&p, 5, 0.05), vec![0, 1, 2]);
    }

    #[test]
    fn stops_at_first_failure() {
        // Rank 2 fails (0.03 > 0.02) although rank 3 would pass (0.03 ≤ 0.03).
        let p = [(0, 0.001), (1, 0.03), (2, 0.03)];
        let accepted = benjamini_hochberg(&p, 5, 0.05);
        assert_eq!(accepted, vec![0]);
    }

    #[test]
    fn excluded_tests_still_count() {
        // With m = 2 the second p-value passes; m = 10 makes it fail.
        let p = [(0, 0.004), (1, 0.011)];
        assert_eq!(benjamini_hochberg(&p, 2, 0.05), vec![0, 1]);
        assert_eq!(benjamini_hochberg(&p, 10, 0.05), vec![0]);
    }

    #[test]
    fn empty_inputs() {
        assert!(benjamini_hochberg::<u8>(&[], 3, 0.05).is_empty());
        assert!(benjamini_hochberg(&[(0, 0.0)], 0, 0.05).is_empty());
    }
}
