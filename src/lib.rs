//! `firstpassage`: first-passage times of random walks on graphs.
//!
//! Given an adjacency matrix and a target node, the crate estimates how long a
//! random walker needs to reach the target, three ways:
//! - **Monte Carlo** ([`simulate`], [`gfpt`]): per-start-node FPT histograms,
//!   combined into the global FPT (GFPT) distribution and its mean (MFPT).
//! - **Analytic series** ([`theory`]): the GFPT of compact / non-compact walks
//!   on self-similar networks, in rescaled time.
//! - **Spectral** ([`spectral`]): exact global mean first-passage times from
//!   the Laplacian spectrum.
//!
//! [`topology`] builds the chain, lattice and Sierpinski gasket networks the
//! analytic results are usually checked against.
//!
//! Public invariants (must not drift):
//! - **Node order**: outputs are indexed by node id \(0..n-1\), the row order of
//!   the input [`AdjacencyMatrix`].
//! - **Determinism**: simulations are deterministic given the seed, independent
//!   of the number of workers.
//! - **No silent degradation**: an unreachable target, a non-ergodic chain or a
//!   missing special function is an [`Error`], never a zero-filled result.

pub mod gfpt;
pub mod graph;
pub mod reachability;
pub mod simulate;
pub mod special;
pub mod spectral;
pub mod stationary;
pub mod theory;
pub mod topology;
pub mod transition;

pub use gfpt::{gfpt, mfpt, Gfpt, GfptDistribution};
pub use graph::{extend_with_void, AdjacencyMatrix, Graph, WeightedGraph};
pub use reachability::{reaches_target, unreachable_from};
pub use simulate::{
    fpt_histogram, fpt_histograms, fpt_samples, observed_transitions, occupancy, random_walk,
    simulate_fpt, BinEdges, FptConfig, FptHistogram, FptSamples, DEFAULT_MAX_STEPS,
};
pub use special::{BesselSource, NumericalBessel};
pub use spectral::{gmfpt_spectral, laplacian_spectrum, LaplacianSpectrum};
pub use stationary::{degree_weights, exact_stationary, occupancy_theory, WeightingStrategy};
pub use theory::{gfpt_theory, gfpt_theory_with};
pub use transition::{
    cumulative, row_normalize, sample_next, CumulativeTransitionMatrix, TransitionMatrix,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("adjacency matrix is not square: {rows} rows, a row of length {cols}")]
    NotSquare { rows: usize, cols: usize },
    #[error("invalid weight {value} at ({row}, {col}): weights must be finite and non-negative")]
    InvalidWeight { row: usize, col: usize, value: f64 },
    #[error("adjacency matrix is not symmetric")]
    NotSymmetric,
    #[error("index out of bounds: {0}")]
    IndexOutOfBounds(usize),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("target {target} not reached from {start} within {max_steps} steps")]
    Unreachable { start: usize, target: usize, max_steps: usize },
    #[error("non-ergodic chain: {0}")]
    NonErgodic(String),
    #[error("special function unavailable: {0}")]
    Unavailable(String),
}

impl Error {
    /// Numerical conditions a batch caller may skip over, as opposed to
    /// malformed input.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Unreachable { .. } | Error::NonErgodic(_) | Error::Unavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
