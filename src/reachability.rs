//! Reachability towards a single target.
//!
//! A random walk started at `u` hits `target` with probability one only if
//! `target` is reachable from `u` along positive-weight edges. This is checked
//! up front so the simulator never burns its step budget on a hopeless walk.
//!
//! Edges are interpreted as `u -> v` (directed), exactly like the transition
//! model reads the adjacency matrix.

use crate::graph::Graph;

/// For every node, whether `target` can be reached from it.
///
/// `target` itself is always marked reachable. Out-of-range targets yield an
/// all-`false` vector (callers should validate, but be robust).
pub fn reaches_target<G: Graph>(graph: &G, target: usize) -> Vec<bool> {
    let n = graph.node_count();
    let mut reached = vec![false; n];
    if target >= n {
        return reached;
    }

    // Reverse adjacency, built once.
    let mut rev: Vec<Vec<usize>> = vec![Vec::new(); n];
    for u in 0..n {
        for v in graph.neighbors(u) {
            if v < n {
                rev[v].push(u);
            }
        }
    }

    let mut q: Vec<usize> = Vec::with_capacity(n);
    reached[target] = true;
    q.push(target);
    let mut head = 0usize;
    while head < q.len() {
        let cur = q[head];
        head += 1;
        for &prev in &rev[cur] {
            if !reached[prev] {
                reached[prev] = true;
                q.push(prev);
            }
        }
    }
    reached
}

/// Nodes from which `target` cannot be reached.
pub fn unreachable_from<G: Graph>(graph: &G, target: usize) -> Vec<usize> {
    reaches_target(graph, target)
        .into_iter()
        .enumerate()
        .filter(|(_, ok)| !ok)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AdjacencyMatrix;

    #[test]
    fn test_directed_chain_only_reaches_downstream() {
        // 0 -> 1 -> 2, and 3 isolated
        let adj = AdjacencyMatrix::new(vec![
            vec![0.0, 1.0, 0.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0],
        ])
        .unwrap();

        assert_eq!(reaches_target(&adj, 2), vec![true, true, true, false]);
        assert_eq!(reaches_target(&adj, 0), vec![true, false, false, false]);
        assert_eq!(unreachable_from(&adj, 1), vec![2, 3]);
    }

    #[test]
    fn test_cycle_reaches_everything() {
        let adj = AdjacencyMatrix::from_edges(3, &[(0, 1), (1, 2), (2, 0)]).unwrap();
        assert!(reaches_target(&adj, 1).iter().all(|&r| r));
        assert!(unreachable_from(&adj, 1).is_empty());
    }

    #[test]
    fn test_out_of_range_target() {
        let adj = AdjacencyMatrix::from_edges(2, &[(0, 1)]).unwrap();
        assert_eq!(reaches_target(&adj, 5), vec![false, false]);
    }
}
