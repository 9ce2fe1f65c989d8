//! Monte Carlo first-passage-time simulation.
//!
//! One trial is a walk on the cumulative transition matrix: start at `start`,
//! draw the next site by inverse-CDF sampling, count steps, stop on `target`.
//! Every trial carries a step budget; running out of it is reported as
//! [`Error::Unreachable`] instead of looping forever.
//!
//! Randomness is always an explicit generator passed by the caller. Batch
//! helpers derive one `ChaCha8Rng` per start node from `(seed, node)`, so
//! results do not depend on how many workers run them.

use crate::graph::{AdjacencyMatrix, Graph};
use crate::stationary::WeightingStrategy;
use crate::transition::{sample_next, CumulativeTransitionMatrix};
use crate::{Error, Result};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Default per-trial step budget.
pub const DEFAULT_MAX_STEPS: usize = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FptConfig {
    /// Trials per start node; `None` means `10 · N`.
    pub ntrials: Option<usize>,
    /// Step budget of a single trial.
    pub max_steps: usize,
    pub seed: u64,
    /// Worker threads for per-node dispatch; `0` or `1` runs sequentially.
    pub workers: usize,
    pub weighting: WeightingStrategy,
}

impl Default for FptConfig {
    fn default() -> Self {
        Self {
            ntrials: None,
            max_steps: DEFAULT_MAX_STEPS,
            seed: 42,
            workers: 1,
            weighting: WeightingStrategy::Degree,
        }
    }
}

impl FptConfig {
    pub fn trials_for(&self, node_count: usize) -> usize {
        self.ntrials.unwrap_or(10 * node_count)
    }
}

/// Histogram bin edges shared by every start node of one computation.
///
/// Bin `k` covers `[e_k, e_{k+1})`; the last bin also includes its right edge.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<f64>", into = "Vec<f64>"))]
pub struct BinEdges(Vec<f64>);

impl TryFrom<Vec<f64>> for BinEdges {
    type Error = Error;

    fn try_from(edges: Vec<f64>) -> Result<Self> {
        Self::new(edges)
    }
}

impl From<BinEdges> for Vec<f64> {
    fn from(edges: BinEdges) -> Self {
        edges.0
    }
}

impl BinEdges {
    pub fn new(edges: Vec<f64>) -> Result<Self> {
        if edges.len() < 2 {
            return Err(Error::InvalidParameter("need at least two bin edges".into()));
        }
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(Error::InvalidParameter("bin edges must be finite".into()));
        }
        if edges.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::InvalidParameter("bin edges must be strictly increasing".into()));
        }
        Ok(Self(edges))
    }

    /// `nbins` equal-width bins spanning `[lo, hi]`.
    pub fn uniform(lo: f64, hi: f64, nbins: usize) -> Result<Self> {
        if nbins == 0 {
            return Err(Error::InvalidParameter("nbins must be positive".into()));
        }
        let width = (hi - lo) / nbins as f64;
        Self::new((0..=nbins).map(|k| lo + width * k as f64).collect())
    }

    /// One unit-width bin per step count `1..=max_t`, centered on the integer.
    pub fn integer(max_t: usize) -> Result<Self> {
        Self::new((0..=max_t).map(|k| k as f64 + 0.5).collect())
    }

    /// `nbins` equal bins over the observed range of `samples`.
    pub fn covering(samples: &[usize], nbins: usize) -> Result<Self> {
        let lo = samples.iter().min().copied().unwrap_or(0) as f64;
        let hi = samples.iter().max().copied().unwrap_or(0) as f64;
        if hi > lo {
            Self::uniform(lo, hi, nbins)
        } else {
            Self::uniform(lo - 0.5, hi + 0.5, nbins)
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn nbins(&self) -> usize {
        self.0.len() - 1
    }

    pub fn midpoints(&self) -> Vec<f64> {
        self.0.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
    }

    pub fn widths(&self) -> Vec<f64> {
        self.0.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Bin containing `x`, if any.
    pub fn locate(&self, x: f64) -> Option<usize> {
        let first = self.0[0];
        let last = self.0[self.0.len() - 1];
        if !(x >= first && x <= last) {
            return None;
        }
        if x == last {
            return Some(self.nbins() - 1);
        }
        Some(self.0.partition_point(|&e| e <= x) - 1)
    }
}

/// Raw outcome of a batch of trials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FptSamples {
    /// Step counts of the trials that reached the target.
    pub steps: Vec<usize>,
    /// Trials that exhausted the step budget.
    pub censored: usize,
}

impl FptSamples {
    pub fn ntrials(&self) -> usize {
        self.steps.len() + self.censored
    }

    pub fn mean(&self) -> Option<f64> {
        if self.steps.is_empty() {
            return None;
        }
        Some(self.steps.iter().sum::<usize>() as f64 / self.steps.len() as f64)
    }
}

/// Empirical FPT distribution of one `(start, target)` pair.
///
/// `mass[k]` is the fraction of all trials that landed in bin `k` (a
/// probability mass, not a density). Censored trials and step counts outside
/// the edges are counted in `ntrials` but in no bin, so the mass sums to ≤ 1.
#[derive(Debug, Clone, PartialEq)]
pub struct FptHistogram {
    pub mass: Vec<f64>,
    pub ntrials: usize,
    pub censored: usize,
}

impl FptHistogram {
    pub fn zeros(nbins: usize) -> Self {
        Self { mass: vec![0.0; nbins], ntrials: 0, censored: 0 }
    }

    pub fn from_samples(samples: &FptSamples, edges: &BinEdges) -> Self {
        let ntrials = samples.ntrials();
        let mut mass = vec![0.0; edges.nbins()];
        if ntrials > 0 {
            let unit = 1.0 / ntrials as f64;
            for &t in &samples.steps {
                if let Some(k) = edges.locate(t as f64) {
                    mass[k] += unit;
                }
            }
        }
        Self { mass, ntrials, censored: samples.censored }
    }

    pub fn total_mass(&self) -> f64 {
        self.mass.iter().sum()
    }

    /// Mass divided by bin width.
    pub fn density(&self, edges: &BinEdges) -> Vec<f64> {
        self.mass.iter().zip(edges.widths()).map(|(m, w)| m / w).collect()
    }
}

/// Number of steps of one walk from `start` until it first hits `target`.
///
/// `start == target` takes zero steps. A walk that reaches an isolated node or
/// uses up `max_steps` returns [`Error::Unreachable`].
pub fn simulate_fpt<R: Rng>(
    cum: &CumulativeTransitionMatrix,
    start: usize,
    target: usize,
    max_steps: usize,
    rng: &mut R,
) -> Result<usize> {
    check_node(cum, start)?;
    check_node(cum, target)?;

    let mut site = start;
    let mut t = 0usize;
    while site != target {
        if t == max_steps || cum.is_isolated(site) {
            return Err(Error::Unreachable { start, target, max_steps });
        }
        site = sample_next(cum.row(site), rng.random::<f64>());
        t += 1;
    }
    Ok(t)
}

/// Run `ntrials` independent trials; budget exhaustion is counted, not fatal.
pub fn fpt_samples<R: Rng>(
    cum: &CumulativeTransitionMatrix,
    start: usize,
    target: usize,
    ntrials: usize,
    max_steps: usize,
    rng: &mut R,
) -> Result<FptSamples> {
    check_node(cum, start)?;
    check_node(cum, target)?;
    if start != target && cum.is_isolated(start) {
        return Err(Error::Unreachable { start, target, max_steps: 0 });
    }

    let mut steps = Vec::with_capacity(ntrials);
    let mut censored = 0usize;
    for _ in 0..ntrials {
        match simulate_fpt(cum, start, target, max_steps, rng) {
            Ok(t) => steps.push(t),
            Err(Error::Unreachable { .. }) => censored += 1,
            Err(e) => return Err(e),
        }
    }
    if censored > 0 {
        log::warn!(
            "{censored}/{ntrials} trials from {start} to {target} censored (stuck at an isolated node or over {max_steps} steps)"
        );
    }
    Ok(FptSamples { steps, censored })
}

/// FPT histogram of `ntrials` trials from `start` to `target`, as probability
/// mass over `edges`.
pub fn fpt_histogram<R: Rng>(
    cum: &CumulativeTransitionMatrix,
    start: usize,
    target: usize,
    edges: &BinEdges,
    ntrials: usize,
    max_steps: usize,
    rng: &mut R,
) -> Result<FptHistogram> {
    if ntrials == 0 {
        return Err(Error::InvalidParameter("ntrials must be positive".into()));
    }
    let samples = fpt_samples(cum, start, target, ntrials, max_steps, rng)?;
    Ok(FptHistogram::from_samples(&samples, edges))
}

/// Histograms for many start nodes, one independent RNG stream per node.
///
/// Output order follows `starts`. Runs on a pool of `config.workers` threads
/// when the `parallel` feature is enabled; the result is the same for any
/// worker count.
pub fn fpt_histograms(
    cum: &CumulativeTransitionMatrix,
    starts: &[usize],
    target: usize,
    edges: &BinEdges,
    config: &FptConfig,
) -> Result<Vec<FptHistogram>> {
    let ntrials = config.trials_for(cum.len());
    let run = |start: usize| -> Result<FptHistogram> {
        let mut rng = ChaCha8Rng::seed_from_u64(node_seed(config.seed, start));
        fpt_histogram(cum, start, target, edges, ntrials, config.max_steps, &mut rng)
    };

    if config.workers <= 1 {
        return starts.iter().map(|&s| run(s)).collect();
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .build()
            .map_err(|e| Error::InvalidParameter(format!("cannot build worker pool: {e}")))?;
        pool.install(|| starts.par_iter().map(|&s| run(s)).collect())
    }

    #[cfg(not(feature = "parallel"))]
    {
        log::warn!("{} workers requested but the `parallel` feature is off; running sequentially", config.workers);
        starts.iter().map(|&s| run(s)).collect()
    }
}

/// Seed of the RNG stream of one start node.
fn node_seed(seed: u64, node: usize) -> u64 {
    fn mix64(mut x: u64) -> u64 {
        x ^= x >> 30;
        x = x.wrapping_mul(0xbf58476d1ce4e5b9);
        x ^= x >> 27;
        x = x.wrapping_mul(0x94d049bb133111eb);
        x ^= x >> 31;
        x
    }
    mix64(seed ^ mix64(node as u64))
}

/// A walk of `nsteps` sites (including `start`).
///
/// Stops early at an isolated node, like a walk with nowhere to go.
pub fn random_walk<R: Rng>(
    cum: &CumulativeTransitionMatrix,
    start: usize,
    nsteps: usize,
    rng: &mut R,
) -> Result<Vec<usize>> {
    check_node(cum, start)?;
    let mut walk = Vec::with_capacity(nsteps);
    if nsteps == 0 {
        return Ok(walk);
    }
    walk.push(start);
    let mut site = start;
    for _ in 1..nsteps {
        if cum.is_isolated(site) {
            break;
        }
        site = sample_next(cum.row(site), rng.random::<f64>());
        walk.push(site);
    }
    Ok(walk)
}

/// Visits per node along `walk`.
pub fn occupancy(walk: &[usize], n: usize) -> Result<Vec<usize>> {
    let mut counts = vec![0usize; n];
    for &site in walk {
        *counts.get_mut(site).ok_or(Error::IndexOutOfBounds(site))? += 1;
    }
    Ok(counts)
}

/// Observed `i -> j` transition counts along `walk`, as an adjacency matrix.
///
/// Row-normalizing the result gives the maximum-likelihood estimate of the
/// transition matrix that generated the walk.
pub fn observed_transitions(walk: &[usize], n: usize) -> Result<AdjacencyMatrix> {
    let mut data = vec![0.0; n * n];
    for &site in walk {
        if site >= n {
            return Err(Error::IndexOutOfBounds(site));
        }
    }
    for w in walk.windows(2) {
        data[w[0] * n + w[1]] += 1.0;
    }
    Ok(AdjacencyMatrix::from_raw(n, data))
}

fn check_node(cum: &CumulativeTransitionMatrix, node: usize) -> Result<()> {
    if node < cum.len() {
        Ok(())
    } else {
        Err(Error::IndexOutOfBounds(node))
    }
}

impl Graph for CumulativeTransitionMatrix {
    fn node_count(&self) -> usize {
        self.len()
    }

    /// Sites with positive transition probability.
    fn neighbors(&self, node: usize) -> Vec<usize> {
        let mut prev = 0.0;
        let mut out = Vec::new();
        for (j, &c) in self.row(node).iter().enumerate() {
            if c > prev {
                out.push(j);
            }
            prev = c;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transition::{cumulative, row_normalize};

    fn cum_of(adj: &AdjacencyMatrix) -> CumulativeTransitionMatrix {
        cumulative(&row_normalize(adj))
    }

    #[test]
    fn test_leaf_next_to_target_takes_one_step() {
        // Star: leaf 1 has degree 1 and its only neighbor is the target 0.
        let adj = AdjacencyMatrix::from_edges(4, &[(0, 1), (0, 2), (0, 3)]).unwrap();
        let cum = cum_of(&adj);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(simulate_fpt(&cum, 1, 0, 10, &mut rng).unwrap(), 1);
        }
        assert_eq!(simulate_fpt(&cum, 0, 0, 10, &mut rng).unwrap(), 0);
    }

    #[test]
    fn test_step_budget_reports_unreachable() {
        // Two disjoint edges: 0-1 and 2-3.
        let adj = AdjacencyMatrix::from_edges(4, &[(0, 1), (2, 3)]).unwrap();
        let cum = cum_of(&adj);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = simulate_fpt(&cum, 0, 3, 50, &mut rng).unwrap_err();
        assert!(matches!(err, Error::Unreachable { start: 0, target: 3, max_steps: 50 }));
        assert!(err.is_recoverable());

        let samples = fpt_samples(&cum, 0, 3, 5, 20, &mut rng).unwrap();
        assert_eq!(samples.censored, 5);
        assert!(samples.steps.is_empty());
        assert_eq!(samples.mean(), None);
    }

    #[test]
    fn test_isolated_start_is_unreachable() {
        let adj = AdjacencyMatrix::from_edges(3, &[(0, 1)]).unwrap();
        let cum = cum_of(&adj);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(fpt_samples(&cum, 2, 0, 3, 100, &mut rng), Err(Error::Unreachable { start: 2, .. })));
        assert!(matches!(simulate_fpt(&cum, 0, 9, 100, &mut rng), Err(Error::IndexOutOfBounds(9))));
    }

    #[test]
    fn test_histogram_mass_and_censoring() {
        // Path 0-1-2, target 2: from 0 the FPT is always even (2, 4, 6, ...).
        let adj = AdjacencyMatrix::from_edges(3, &[(0, 1), (1, 2)]).unwrap();
        let cum = cum_of(&adj);
        let edges = BinEdges::integer(8).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let h = fpt_histogram(&cum, 0, 2, &edges, 2000, 1000, &mut rng).unwrap();
        assert_eq!(h.ntrials, 2000);
        assert!(h.total_mass() <= 1.0 + 1e-12);
        // Odd step counts are impossible on a bipartite path.
        for t in [1usize, 3, 5, 7] {
            assert_eq!(h.mass[t - 1], 0.0, "t={t}");
        }
        // P(T = 2) = 1/2.
        assert!((h.mass[1] - 0.5).abs() < 0.05, "P(T=2)={}", h.mass[1]);
        // Trials longer than 8 steps fall outside the edges.
        assert!(h.total_mass() < 1.0);
    }

    #[test]
    fn test_bin_edges_locate() {
        let e = BinEdges::new(vec![0.0, 1.0, 3.0]).unwrap();
        assert_eq!(e.locate(-0.1), None);
        assert_eq!(e.locate(0.0), Some(0));
        assert_eq!(e.locate(1.0), Some(1));
        assert_eq!(e.locate(3.0), Some(1));
        assert_eq!(e.locate(3.5), None);
        assert_eq!(e.midpoints(), vec![0.5, 2.0]);
        assert_eq!(e.widths(), vec![1.0, 2.0]);
        assert!(BinEdges::new(vec![1.0, 1.0]).is_err());
        assert!(BinEdges::new(vec![1.0]).is_err());
        assert_eq!(BinEdges::covering(&[4, 4], 1).unwrap().as_slice(), &[3.5, 4.5]);
    }

    #[test]
    fn test_bin_edges_try_from_validates() {
        assert!(matches!(BinEdges::try_from(Vec::<f64>::new()), Err(Error::InvalidParameter(_))));
        assert!(BinEdges::try_from(vec![0.0, f64::INFINITY]).is_err());
        assert!(BinEdges::try_from(vec![2.0, 1.0]).is_err());
        let e = BinEdges::try_from(vec![0.5, 1.5]).unwrap();
        assert_eq!(Vec::from(e), vec![0.5, 1.5]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_bin_edges_deserialize_validates() {
        assert!(serde_json::from_str::<BinEdges>("[]").is_err());
        assert!(serde_json::from_str::<BinEdges>("[3.0, 1.0]").is_err());
        let e: BinEdges = serde_json::from_str("[0.5, 1.5, 2.5]").unwrap();
        assert_eq!(e.nbins(), 2);
        assert_eq!(serde_json::to_string(&e).unwrap(), "[0.5,1.5,2.5]");
    }

    #[test]
    fn test_censoring_counts_walks_stuck_at_isolated_node() {
        // 0 -> {1, 2}; 1 is a dead end, 2 -> 0. Target 2 is missed whenever the walk enters 1.
        let adj = AdjacencyMatrix::new(vec![
            vec![0.0, 1.0, 1.0],
            vec![0.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0],
        ])
        .unwrap();
        let cum = cum_of(&adj);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let samples = fpt_samples(&cum, 0, 2, 400, 1_000_000, &mut rng).unwrap();
        assert_eq!(samples.ntrials(), 400);
        assert!(samples.censored > 100, "censored={}", samples.censored);
        assert!(samples.steps.iter().all(|&t| t == 1));
    }

    #[test]
    fn test_density_divides_by_width() {
        let edges = BinEdges::new(vec![0.0, 2.0, 3.0]).unwrap();
        let h = FptHistogram { mass: vec![0.5, 0.5], ntrials: 2, censored: 0 };
        assert_eq!(h.density(&edges), vec![0.25, 0.5]);
    }

    #[test]
    fn test_worker_count_does_not_change_histograms() {
        let adj = AdjacencyMatrix::from_edges(5, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)]).unwrap();
        let cum = cum_of(&adj);
        let edges = BinEdges::integer(30).unwrap();
        let starts = [1usize, 2, 3, 4];
        let seq = FptConfig { ntrials: Some(200), seed: 99, ..FptConfig::default() };
        let par = FptConfig { workers: 3, ..seq };
        let a = fpt_histograms(&cum, &starts, 0, &edges, &seq).unwrap();
        let b = fpt_histograms(&cum, &starts, 0, &edges, &par).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_walk_follows_edges_and_stops_at_isolated() {
        // 0 -> 1 -> 2, 2 has no out-edges.
        let adj = AdjacencyMatrix::new(vec![
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
            vec![0.0, 0.0, 0.0],
        ])
        .unwrap();
        let cum = cum_of(&adj);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert_eq!(random_walk(&cum, 0, 10, &mut rng).unwrap(), vec![0, 1, 2]);
        assert!(random_walk(&cum, 0, 0, &mut rng).unwrap().is_empty());
    }

    #[test]
    fn test_occupancy_and_transitions() {
        let walk = [0usize, 1, 0, 1, 2];
        assert_eq!(occupancy(&walk, 3).unwrap(), vec![2, 2, 1]);
        let obs = observed_transitions(&walk, 3).unwrap();
        assert_eq!(obs.get(0, 1), 2.0);
        assert_eq!(obs.get(1, 0), 1.0);
        assert_eq!(obs.get(1, 2), 1.0);
        assert_eq!(obs.total_weight(), 4.0);
        assert!(matches!(occupancy(&walk, 2), Err(Error::IndexOutOfBounds(2))));
    }

    #[test]
    fn test_long_walk_occupancy_tracks_stationary_distribution() {
        // Star with three leaves: stationary occupancy of the center is 1/2.
        let adj = AdjacencyMatrix::from_edges(4, &[(0, 1), (0, 2), (0, 3)]).unwrap();
        let cum = cum_of(&adj);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let walk = random_walk(&cum, 1, 20_000, &mut rng).unwrap();
        let occ = occupancy(&walk, 4).unwrap();
        let center = occ[0] as f64 / walk.len() as f64;
        assert!((center - 0.5).abs() < 0.01, "center={center}");
    }

    #[test]
    fn test_cumulative_neighbors_skip_zero_probability_sites() {
        let adj = AdjacencyMatrix::new(vec![
            vec![0.0, 1.0, 0.0, 2.0],
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0, 0.0],
        ])
        .unwrap();
        let cum = cum_of(&adj);
        assert_eq!(cum.neighbors(0), vec![1, 3]);
        assert!(cum.neighbors(2).is_empty());
    }
}
