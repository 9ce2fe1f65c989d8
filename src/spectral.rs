//! Global mean first-passage times from the Laplacian spectrum.
//!
//! For a connected undirected graph with Laplacian `L = D − A`, orthonormal
//! eigenpairs `(λ_k, v_k)`, degree vector `d`, `2E = Σ_i d_i` and
//! `D_k = v_k · d`, the mean first-passage time from `i` to `j` is
//!
//! ```text
//! T_ij = Σ_{k≥2} (1/λ_k) [ 2E v_k[j]² − 2E v_k[i] v_k[j] + (v_k[i] − v_k[j]) D_k ]
//! ```
//!
//! The trivial pair (`λ_1 = 0`, constant eigenvector) is excluded. Averaging
//! over start nodes `i ≠ j` gives closed forms that need one eigendecomposition
//! for all targets at once:
//! - uniform start: `N/(N−1) · Σ_k (2E v_k[j]² − v_k[j] D_k) / λ_k`
//! - stationary start (`d_i / 2E`, renormalized over `i ≠ j`):
//!   `2E/(2E − d_j) · Σ_k (2E v_k[j]² − 2 v_k[j] D_k + D_k²/2E) / λ_k`
//!
//! Both match [`crate::gfpt::mfpt`] of a simulated GFPT with the same weights,
//! with no sampling noise.

use crate::graph::AdjacencyMatrix;
use crate::{Error, Result};
use nalgebra::{DMatrix, SymmetricEigen};

/// Relative tolerance below which a Laplacian eigenvalue counts as zero.
const ZERO_MODE_TOL: f64 = 1e-10;

/// Laplacian eigenpairs sorted by ascending eigenvalue.
#[derive(Debug, Clone)]
pub struct LaplacianSpectrum {
    pub eigenvalues: Vec<f64>,
    /// Column `k` is the unit eigenvector of `eigenvalues[k]`.
    pub eigenvectors: DMatrix<f64>,
}

impl LaplacianSpectrum {
    /// Number of (numerically) zero eigenvalues, i.e. connected components.
    pub fn zero_modes(&self) -> usize {
        let scale = self.eigenvalues.last().copied().unwrap_or(0.0).abs().max(1.0);
        self.eigenvalues.iter().filter(|&&l| l.abs() <= ZERO_MODE_TOL * scale).count()
    }
}

/// Eigendecomposition of `L = D − A` for a symmetric adjacency matrix.
pub fn laplacian_spectrum(adj: &AdjacencyMatrix) -> Result<LaplacianSpectrum> {
    if !adj.is_symmetric() {
        return Err(Error::NotSymmetric);
    }
    let n = adj.len();
    let degrees = adj.degrees();
    let mut laplacian = -adj.to_dmatrix();
    for i in 0..n {
        laplacian[(i, i)] += degrees[i];
    }

    let eigen = SymmetricEigen::new(laplacian);

    // nalgebra does not guarantee eigenvalue order.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        eigen.eigenvalues[a].partial_cmp(&eigen.eigenvalues[b]).unwrap_or(std::cmp::Ordering::Equal)
    });

    let eigenvalues: Vec<f64> = order.iter().map(|&k| eigen.eigenvalues[k]).collect();
    let mut eigenvectors = DMatrix::<f64>::zeros(n, n);
    for (dst, &src) in order.iter().enumerate() {
        eigenvectors.set_column(dst, &eigen.eigenvectors.column(src));
    }
    Ok(LaplacianSpectrum { eigenvalues, eigenvectors })
}

/// Global mean first-passage time to every node.
///
/// `weighted = false` averages uniformly over start nodes; `weighted = true`
/// weights start nodes by degree (the stationary distribution of the walk).
/// Requires a symmetric, connected adjacency matrix with at least two nodes.
pub fn gmfpt_spectral(adj: &AdjacencyMatrix, weighted: bool) -> Result<Vec<f64>> {
    let n = adj.len();
    if n < 2 {
        return Err(Error::InvalidParameter("GMFPT needs at least two nodes".into()));
    }
    let spectrum = laplacian_spectrum(adj)?;
    let components = spectrum.zero_modes();
    if components != 1 {
        log::warn!("Laplacian has {components} zero modes; graph is not connected");
        return Err(Error::NonErgodic(format!("graph has {components} connected components")));
    }
    log::debug!(
        "gmfpt_spectral: n={n} weighted={weighted} spectral gap={:.6e}",
        spectrum.eigenvalues[1]
    );

    let degrees = adj.degrees();
    let two_e: f64 = degrees.iter().sum();
    let vecs = &spectrum.eigenvectors;

    let mut out = vec![0.0; n];
    for (k, &lambda) in spectrum.eigenvalues.iter().enumerate().skip(1) {
        let v = vecs.column(k);
        let dk: f64 = v.iter().zip(&degrees).map(|(x, d)| x * d).sum();
        for (j, acc) in out.iter_mut().enumerate() {
            let vj = v[j];
            let term = if weighted {
                two_e * vj * vj - 2.0 * vj * dk + dk * dk / two_e
            } else {
                two_e * vj * vj - vj * dk
            };
            *acc += term / lambda;
        }
    }

    if weighted {
        for (j, acc) in out.iter_mut().enumerate() {
            let rest = two_e - degrees[j];
            if !(rest > 0.0) {
                return Err(Error::InvalidParameter(format!("no start weight outside target {j}")));
            }
            *acc *= two_e / rest;
        }
    } else {
        let scale = n as f64 / (n as f64 - 1.0);
        for acc in &mut out {
            *acc *= scale;
        }
    }
    Ok(out)
}
