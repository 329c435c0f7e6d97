use ndarray::{Array2, ArrayView1};

/// Mean silhouette coefficient with Euclidean distance.
///
/// For each point, `a` is the mean distance to the other members of its
/// cluster and `b` the smallest mean distance to any other non-empty cluster.
/// The point scores `(b - a) / max(a, b)`, or 0 when both are 0. A point alone
/// in its cluster scores 0. Returns 0.0 for an empty input.
pub fn silhouette_score(data: &Array2<f64>, labels: &[usize]) -> f64 {
    let n = data.nrows();
    if n == 0 {
        return 0.0;
    }
    let n_clusters = labels.iter().copied().max().map_or(0, |m| m + 1);

    let mut sizes = vec![0usize; n_clusters];
    for &label in labels {
        sizes[label] += 1;
    }

    let mut total = 0.0;
    let mut dist_sums = vec![0.0f64; n_clusters];

    for i in 0..n {
        dist_sums.iter_mut().for_each(|d| *d = 0.0);
        let point = data.row(i);
        for j in 0..n {
            if i != j {
                dist_sums[labels[j]] += euclidean(point, data.row(j));
            }
        }

        let own = labels[i];
        if sizes[own] < 2 {
            continue;
        }
        let a = dist_sums[own] / (sizes[own] - 1) as f64;
        let b = (0..n_clusters)
            .filter(|&c| c != own && sizes[c] > 0)
            .map(|c| dist_sums[c] / sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);
        let b = if b.is_finite() { b } else { 0.0 };

        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }

    total / n as f64
}

pub(crate) fn euclidean(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    squared_euclidean(a, b).sqrt()
}

pub(crate) fn squared_euclidean(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn matches_hand_computed_value() {
        let data = array![[0.0], [1.0], [10.0], [11.0]];
        let score = silhouette_score(&data, &[0, 0, 1, 1]);

        // s = 9.5/10.5 for the outer points, 8.5/9.5 for the inner ones
        let expected = (9.5 / 10.5 + 8.5 / 9.5) / 2.0;
        assert_abs_diff_eq!(score, expected, epsilon = 1e-12);
    }

    #[test]
    fn singletons_score_zero() {
        let data = array![[0.0, 1.0], [3.0, -2.0]];
        assert_abs_diff_eq!(silhouette_score(&data, &[0, 1]), 0.0);
    }

    #[test]
    fn singleton_outlier_does_not_inflate_the_mean() {
        let data = array![[0.0], [1.0], [2.0], [100.0]];
        let score = silhouette_score(&data, &[0, 0, 0, 1]);

        // (1 - 1.5/100) + (1 - 1/99) + (1 - 1.5/98) + 0, over 4 points
        let expected = ((1.0 - 1.5 / 100.0) + (1.0 - 1.0 / 99.0) + (1.0 - 1.5 / 98.0)) / 4.0;
        assert_abs_diff_eq!(score, expected, epsilon = 1e-12);
        assert_abs_diff_eq!(score, 0.740, epsilon = 1e-3);
    }

    #[test]
    fn bad_assignment_scores_negative() {
        let data = array![[0.0], [10.0], [1.0], [11.0]];
        assert!(silhouette_score(&data, &[0, 0, 1, 1]) < 0.0);
    }
}
