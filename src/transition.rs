//! Row-stochastic transition model.
//!
//! The walk moves `i -> j` with probability
//! \[
//!   P(i \to j) = \frac{A_{ij}}{\sum_k A_{ik}}
//! \]
//! Rows of isolated nodes (zero out-strength) stay all-zero: the node has no
//! outgoing transitions.

use crate::graph::AdjacencyMatrix;

/// Row-normalized adjacency matrix, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrix {
    n: usize,
    data: Vec<f64>,
}

impl TransitionMatrix {
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    pub fn is_isolated(&self, i: usize) -> bool {
        self.row(i).iter().all(|&p| p == 0.0)
    }

    pub fn to_dmatrix(&self) -> nalgebra::DMatrix<f64> {
        nalgebra::DMatrix::from_row_slice(self.n, self.n, &self.data)
    }
}

/// Row-wise running sum of a [`TransitionMatrix`], used for inverse-CDF
/// sampling of the next site.
#[derive(Debug, Clone, PartialEq)]
pub struct CumulativeTransitionMatrix {
    n: usize,
    data: Vec<f64>,
}

impl CumulativeTransitionMatrix {
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    /// A row is isolated when it carries no probability at all.
    pub fn is_isolated(&self, i: usize) -> bool {
        self.row(i).last().map_or(true, |&c| c == 0.0)
    }
}

pub fn row_normalize(adj: &AdjacencyMatrix) -> TransitionMatrix {
    let n = adj.len();
    let mut data = Vec::with_capacity(n * n);
    for row in adj.rows() {
        let s: f64 = row.iter().sum();
        if s > 0.0 {
            data.extend(row.iter().map(|&w| w / s));
        } else {
            data.resize(data.len() + n, 0.0);
        }
    }
    TransitionMatrix { n, data }
}

/// Running sum of each row.
///
/// The last entry of every non-isolated row is pinned to exactly `1.0`, so a
/// uniform draw in `[0, 1)` always lands inside the row.
pub fn cumulative(t: &TransitionMatrix) -> CumulativeTransitionMatrix {
    let n = t.n;
    let mut data = Vec::with_capacity(n * n);
    for i in 0..n {
        let start = data.len();
        let mut acc = 0.0;
        for &p in t.row(i) {
            acc += p;
            data.push(acc);
        }
        if acc > 0.0 {
            // Pin the tail: every index at or after the last positive entry is 1.0.
            if let Some(last_pos) = t.row(i).iter().rposition(|&p| p > 0.0) {
                for c in &mut data[start + last_pos..start + n] {
                    *c = 1.0;
                }
            }
        }
    }
    CumulativeTransitionMatrix { n, data }
}

/// Inverse-CDF sampling: the first index with `uniform_draw < cumrow[index]`.
///
/// An all-zero row (isolated node) returns 0; callers must not simulate from
/// isolated nodes. The result is always a valid index.
pub fn sample_next(cumrow: &[f64], uniform_draw: f64) -> usize {
    let idx = cumrow.partition_point(|&c| c <= uniform_draw);
    if idx >= cumrow.len() {
        0
    } else {
        idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weighted() -> AdjacencyMatrix {
        AdjacencyMatrix::new(vec![
            vec![0.0, 3.0, 1.0],
            vec![1.0, 0.0, 1.0],
            vec![0.0, 0.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_rows_sum_to_one_or_zero() {
        let t = row_normalize(&weighted());
        assert!((t.row(0).iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((t.row(1).iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(t.row(2).iter().sum::<f64>(), 0.0);
        assert!(t.is_isolated(2));
        assert!((t.get(0, 1) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_cumulative_tail_is_exactly_one() {
        let c = cumulative(&row_normalize(&weighted()));
        assert_eq!(c.row(0), &[0.0, 0.75, 1.0]);
        assert_eq!(c.row(1), &[0.5, 0.5, 1.0]);
        assert_eq!(c.row(2), &[0.0, 0.0, 0.0]);
        assert!(c.is_isolated(2));
        assert!(!c.is_isolated(0));
    }

    #[test]
    fn test_tail_pinned_past_last_positive_entry() {
        // 0 -> {0, 1}, never to 2: cumulative must reach 1.0 at index 1.
        let adj = AdjacencyMatrix::new(vec![
            vec![1.0, 2.0, 0.0],
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
        ])
        .unwrap();
        let c = cumulative(&row_normalize(&adj));
        assert_eq!(c.row(0)[1], 1.0);
        assert_eq!(c.row(0)[2], 1.0);
        // A draw arbitrarily close to 1 still lands on index 1, never on the zero-probability 2.
        assert_eq!(sample_next(c.row(0), 1.0 - f64::EPSILON), 1);
    }

    #[test]
    fn test_sample_next_inverse_cdf() {
        let cum = [0.25, 0.25, 0.75, 1.0];
        assert_eq!(sample_next(&cum, 0.0), 0);
        assert_eq!(sample_next(&cum, 0.2499), 0);
        // Zero-probability index 1 is skipped.
        assert_eq!(sample_next(&cum, 0.25), 2);
        assert_eq!(sample_next(&cum, 0.9), 3);
        assert_eq!(sample_next(&[0.0, 0.0], 0.3), 0);
    }
}
