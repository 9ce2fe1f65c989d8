//! Global first-passage time (GFPT): the FPT distribution averaged over start
//! nodes, weighted by a stationary-like distribution.
//!
//! Convention: the average runs over start nodes `i ≠ target`, with weights
//! renormalized over that set, so the GFPT is a proper distribution whenever
//! every trial lands inside the bin edges. The same convention is used by the
//! spectral GMFPT, so the two can be compared directly.

use crate::graph::AdjacencyMatrix;
use crate::reachability::reaches_target;
use crate::simulate::{fpt_histograms, BinEdges, FptConfig, FptHistogram};
use crate::transition::{cumulative, row_normalize};
use crate::{Error, Result};

/// Weighted FPT mass over shared bin edges.
#[derive(Debug, Clone, PartialEq)]
pub struct GfptDistribution {
    pub edges: BinEdges,
    pub mass: Vec<f64>,
}

impl GfptDistribution {
    pub fn total_mass(&self) -> f64 {
        self.mass.iter().sum()
    }

    pub fn density(&self) -> Vec<f64> {
        self.mass.iter().zip(self.edges.widths()).map(|(m, w)| m / w).collect()
    }

    pub fn mean(&self) -> f64 {
        mfpt(self)
    }
}

/// Result of a GFPT run.
#[derive(Debug, Clone, PartialEq)]
pub struct Gfpt {
    pub target: usize,
    pub distribution: GfptDistribution,
    /// One histogram per node, indexed by node id. The target's entry, and
    /// entries of skipped zero-weight nodes, are all-zero with `ntrials == 0`.
    pub per_node: Vec<FptHistogram>,
    /// Start weights actually used: zero on the target, summing to 1.
    pub weights: Vec<f64>,
}

/// Simulated GFPT towards `target`.
///
/// Weights come from `config.weighting`. A start node that cannot reach the
/// target fails the run with [`Error::Unreachable`] unless its weight is zero
/// (an isolated node under degree weighting), in which case it is skipped.
pub fn gfpt(adj: &AdjacencyMatrix, target: usize, edges: &BinEdges, config: &FptConfig) -> Result<Gfpt> {
    adj.check_node(target)?;
    let n = adj.len();
    if n < 2 {
        return Err(Error::InvalidParameter("GFPT needs at least two nodes".into()));
    }
    if config.trials_for(n) == 0 {
        return Err(Error::InvalidParameter("ntrials must be positive".into()));
    }

    let cum = cumulative(&row_normalize(adj));
    let raw = config.weighting.weights(adj)?;
    let reached = reaches_target(&cum, target);

    let mut starts = Vec::with_capacity(n - 1);
    for i in (0..n).filter(|&i| i != target) {
        if !reached[i] {
            if raw[i] > 0.0 {
                return Err(Error::Unreachable { start: i, target, max_steps: config.max_steps });
            }
            log::debug!("skipping node {i}: cannot reach target {target} and carries no weight");
            continue;
        }
        starts.push(i);
    }

    let norm: f64 = starts.iter().map(|&i| raw[i]).sum();
    if !(norm > 0.0) {
        return Err(Error::InvalidParameter(format!("no start node towards {target} carries positive weight")));
    }
    let mut weights = vec![0.0; n];
    for &i in &starts {
        weights[i] = raw[i] / norm;
    }

    log::debug!(
        "gfpt: n={n} target={target} starts={} ntrials={} bins={} workers={} weighting={:?}",
        starts.len(),
        config.trials_for(n),
        edges.nbins(),
        config.workers,
        config.weighting
    );
    let histograms = fpt_histograms(&cum, &starts, target, edges, config)?;

    let mut per_node = vec![FptHistogram::zeros(edges.nbins()); n];
    let mut mass = vec![0.0; edges.nbins()];
    for (&i, h) in starts.iter().zip(histograms) {
        for (acc, m) in mass.iter_mut().zip(&h.mass) {
            *acc += weights[i] * m;
        }
        per_node[i] = h;
    }

    let distribution = GfptDistribution { edges: edges.clone(), mass };
    log::debug!("gfpt: target={target} total_mass={:.6} mfpt={:.4}", distribution.total_mass(), mfpt(&distribution));
    Ok(Gfpt { target, distribution, per_node, weights })
}

/// Mean of a GFPT distribution: `Σ_k midpoint_k · density_k · width_k`.
///
/// Mass outside the bin edges is missing from the sum, so edges that cut off
/// the tail bias the mean low.
pub fn mfpt(distribution: &GfptDistribution) -> f64 {
    let density = distribution.density();
    distribution
        .edges
        .midpoints()
        .into_iter()
        .zip(distribution.edges.widths())
        .zip(density)
        .map(|((mid, width), d)| mid * d * width)
        .sum()
}
