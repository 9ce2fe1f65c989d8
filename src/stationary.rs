//! Stationary weights used to combine per-start-node results.
//!
//! Two estimators, deliberately kept apart:
//! - [`degree_weights`]: `w_i = d_i / Σ d`. Exact for undirected graphs, an
//!   approximation otherwise. Never fails on a non-empty graph.
//! - [`exact_stationary`]: the left eigenvector of the transition matrix for
//!   eigenvalue 1, read off the SVD of `Tᵀ − I`. Exact for any ergodic chain,
//!   but fails loudly when the chain has no unique stationary distribution.
//!
//! The caller picks one through [`WeightingStrategy`]; nothing is inferred.

use crate::graph::AdjacencyMatrix;
use crate::transition::{row_normalize, TransitionMatrix};
use crate::{Error, Result};
use nalgebra::DMatrix;

/// Tolerance for "this singular value is 0" (relative to the largest one).
const NULL_TOL: f64 = 1e-9;
/// Iteration cap of the SVD; the chain is reported non-ergodic past it.
const SVD_MAX_ITER: usize = 10_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WeightingStrategy {
    /// Degree-proportional weights.
    #[default]
    Degree,
    /// Exact stationary distribution of the row-normalized chain.
    ExactStationary,
}

impl WeightingStrategy {
    pub fn weights(self, adj: &AdjacencyMatrix) -> Result<Vec<f64>> {
        match self {
            WeightingStrategy::Degree => degree_weights(adj),
            WeightingStrategy::ExactStationary => exact_stationary(&row_normalize(adj)),
        }
    }
}

/// `w_i = row_sum_i / total_sum`.
pub fn degree_weights(adj: &AdjacencyMatrix) -> Result<Vec<f64>> {
    let degrees = adj.degrees();
    let total: f64 = degrees.iter().sum();
    if !(total > 0.0) {
        return Err(Error::InvalidParameter("graph has no edges; degree weights are undefined".into()));
    }
    Ok(degrees.into_iter().map(|d| d / total).collect())
}

/// Stationary distribution `π = π T`, normalized to sum to 1.
///
/// `π` spans the null space of `Tᵀ − I`. Rows of `T` sum to 1 or 0, so no
/// eigenvalue exceeds 1 in modulus and a null vector means eigenvalue 1 is the
/// leading one. Fails with [`Error::NonErgodic`] when that null space is empty
/// or more than one-dimensional (e.g. a disconnected graph), when the null
/// vector is not single-signed, or when the SVD does not converge.
pub fn exact_stationary(t: &TransitionMatrix) -> Result<Vec<f64>> {
    let n = t.len();
    if n == 0 {
        return Err(Error::InvalidParameter("empty transition matrix".into()));
    }

    let a = t.to_dmatrix().transpose() - DMatrix::<f64>::identity(n, n);
    let svd = a.try_svd(false, true, f64::EPSILON, SVD_MAX_ITER).ok_or_else(|| {
        log::warn!("SVD of Tᵀ − I did not converge within {SVD_MAX_ITER} iterations");
        Error::NonErgodic("SVD of Tᵀ − I did not converge".into())
    })?;
    let v_t = svd.v_t.ok_or_else(|| Error::NonErgodic("SVD produced no singular vectors".into()))?;
    let sv = &svd.singular_values;
    let smax = sv.iter().copied().fold(0.0f64, f64::max);
    let cutoff = NULL_TOL * smax.max(1.0);

    let null: Vec<usize> = (0..sv.len()).filter(|&k| sv[k] <= cutoff).collect();
    let k = match null.as_slice() {
        [k] => *k,
        [] => {
            let smin = sv.iter().copied().fold(f64::INFINITY, f64::min);
            log::warn!("Tᵀ − I has no null vector (smallest singular value {smin:e})");
            return Err(Error::NonErgodic(format!(
                "eigenvalue 1 is missing (smallest singular value of Tᵀ − I is {smin:e})"
            )));
        }
        many => {
            log::warn!("eigenvalue 1 has multiplicity {}; stationary distribution is not unique", many.len());
            return Err(Error::NonErgodic(format!("eigenvalue 1 has multiplicity {}", many.len())));
        }
    };

    let raw: Vec<f64> = v_t.row(k).iter().copied().collect();
    let sum: f64 = raw.iter().sum();
    if sum.abs() < NULL_TOL {
        return Err(Error::NonErgodic("stationary vector sums to zero".into()));
    }
    let mut w: Vec<f64> = raw.iter().map(|x| x / sum).collect();
    if w.iter().any(|&x| x < -1e-9) {
        return Err(Error::NonErgodic("stationary vector has mixed signs".into()));
    }
    // Round-off can leave tiny negatives on unvisited nodes.
    for x in &mut w {
        if *x < 0.0 {
            *x = 0.0;
        }
    }
    let total: f64 = w.iter().sum();
    for x in &mut w {
        *x /= total;
    }
    Ok(w)
}

/// Equilibrium occupation probability of each node of `adj`.
pub fn occupancy_theory(adj: &AdjacencyMatrix) -> Result<Vec<f64>> {
    exact_stationary(&row_normalize(adj))
}
