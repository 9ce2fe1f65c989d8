//! Unweighted lattice and fractal topologies.
//!
//! Every generator returns a symmetric 0/1 [`AdjacencyMatrix`] with a fixed
//! node numbering, so targets can be addressed by coordinates.

use crate::graph::AdjacencyMatrix;
use crate::{Error, Result};

struct EdgeSet {
    n: usize,
    data: Vec<f64>,
}

impl EdgeSet {
    fn new(n: usize) -> Self {
        Self { n, data: vec![0.0; n * n] }
    }

    fn link(&mut self, u: usize, v: usize) {
        self.data[u * self.n + v] = 1.0;
        self.data[v * self.n + u] = 1.0;
    }

    fn finish(self) -> AdjacencyMatrix {
        AdjacencyMatrix::from_raw(self.n, self.data)
    }
}

/// Path `0 - 1 - … - (n−1)`.
pub fn chain(n: usize) -> AdjacencyMatrix {
    let mut g = EdgeSet::new(n);
    for i in 1..n {
        g.link(i - 1, i);
    }
    g.finish()
}

/// Ring of `n` nodes (`n ≥ 3` for a simple cycle).
pub fn cycle(n: usize) -> AdjacencyMatrix {
    let mut g = EdgeSet::new(n);
    for i in 0..n {
        let j = (i + 1) % n;
        if i != j {
            g.link(i, j);
        }
    }
    g.finish()
}

/// Fully connected graph; with `self_loops` every node also links to itself,
/// so each step is a uniform jump over all `n` sites.
pub fn complete(n: usize, self_loops: bool) -> AdjacencyMatrix {
    let mut g = EdgeSet::new(n);
    for i in 0..n {
        for j in i..n {
            if i != j || self_loops {
                g.link(i, j);
            }
        }
    }
    g.finish()
}

/// Node id of site `(i, j)` on an `n × n` square lattice.
pub fn square_site(i: usize, j: usize, n: usize) -> usize {
    i * n + j
}

/// `n × n` square lattice with nearest-neighbor bonds, open boundaries.
pub fn square_lattice(n: usize) -> AdjacencyMatrix {
    let mut g = EdgeSet::new(n * n);
    for i in 0..n {
        for j in 0..n {
            let here = square_site(i, j, n);
            if i > 0 {
                g.link(here, square_site(i - 1, j, n));
            }
            if j > 0 {
                g.link(here, square_site(i, j - 1, n));
            }
        }
    }
    g.finish()
}

/// Node id of site `(i, j, k)` on an `n × n × n` cubic lattice.
pub fn cubic_site(i: usize, j: usize, k: usize, n: usize) -> usize {
    i * n * n + j * n + k
}

/// `n × n × n` cubic lattice with nearest-neighbor bonds, open boundaries.
pub fn cubic_lattice(n: usize) -> AdjacencyMatrix {
    let mut g = EdgeSet::new(n * n * n);
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                let here = cubic_site(i, j, k, n);
                if i > 0 {
                    g.link(here, cubic_site(i - 1, j, k, n));
                }
                if j > 0 {
                    g.link(here, cubic_site(i, j - 1, k, n));
                }
                if k > 0 {
                    g.link(here, cubic_site(i, j, k - 1, n));
                }
            }
        }
    }
    g.finish()
}

/// Sierpinski gasket network.
///
/// Generation 1 is the triangle `0, 1, 2`. Each further generation replaces
/// every primary triangle `[a, b, c]` by three corner triangles, allocating
/// its three new midpoints `m0 (ab), m1 (bc), m2 (ca)` as the next free ids in
/// traversal order. Generation `g` has `3 (3^{g−1} + 1) / 2` nodes.
pub fn sierpinski_gasket(generation: u32) -> Result<AdjacencyMatrix> {
    if generation == 0 {
        return Err(Error::InvalidParameter("Sierpinski generation starts at 1".into()));
    }
    let mut triangles: Vec<[usize; 3]> = vec![[0, 1, 2]];
    let mut num_vertices = 3usize;
    for _ in 1..generation {
        let mut next = Vec::with_capacity(triangles.len() * 3);
        for &[a, b, c] in &triangles {
            let [m0, m1, m2] = [num_vertices, num_vertices + 1, num_vertices + 2];
            num_vertices += 3;
            next.push([a, m0, m2]);
            next.push([m0, b, m1]);
            next.push([m2, m1, c]);
        }
        triangles = next;
    }

    let mut g = EdgeSet::new(num_vertices);
    for t in &triangles {
        for i in 0..3 {
            g.link(t[(i + 2) % 3], t[i]);
        }
    }
    Ok(g.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    fn edge_count(adj: &AdjacencyMatrix) -> f64 {
        adj.total_weight() / 2.0
    }

    #[test]
    fn test_chain_and_cycle() {
        let c = chain(4);
        assert_eq!(c.degrees(), vec![1.0, 2.0, 2.0, 1.0]);
        assert!(c.is_symmetric());
        let r = cycle(4);
        assert_eq!(r.degrees(), vec![2.0; 4]);
        assert_eq!(r.neighbors(0), vec![1, 3]);
        assert_eq!(chain(1).total_weight(), 0.0);
    }

    #[test]
    fn test_complete() {
        assert_eq!(complete(4, false).degrees(), vec![3.0; 4]);
        let looped = complete(3, true);
        assert_eq!(looped.degrees(), vec![3.0; 3]);
        assert_eq!(looped.get(1, 1), 1.0);
    }

    #[test]
    fn test_square_lattice() {
        let n = 3;
        let sq = square_lattice(n);
        assert_eq!(sq.len(), 9);
        assert_eq!(edge_count(&sq), 12.0);
        // Corner, edge and center coordination numbers.
        assert_eq!(sq.neighbors(square_site(0, 0, n)).len(), 2);
        assert_eq!(sq.neighbors(square_site(0, 1, n)).len(), 3);
        assert_eq!(sq.neighbors(square_site(1, 1, n)).len(), 4);
    }

    #[test]
    fn test_cubic_lattice() {
        let n = 3;
        let cu = cubic_lattice(n);
        assert_eq!(cu.len(), 27);
        assert_eq!(edge_count(&cu), 54.0);
        assert_eq!(cu.neighbors(cubic_site(1, 1, 1, n)).len(), 6);
        assert_eq!(cu.neighbors(cubic_site(0, 0, 0, n)).len(), 3);
    }

    #[test]
    fn test_sierpinski_sizes_and_degrees() {
        for (generation, nodes) in [(1u32, 3usize), (2, 6), (3, 15), (4, 42)] {
            let g = sierpinski_gasket(generation).unwrap();
            assert_eq!(g.len(), nodes, "generation {generation}");
            assert_eq!(edge_count(&g), 3f64.powi(generation as i32));
            assert!(g.is_symmetric());
            // Outer corners have degree 2, every other node degree 4.
            let deg = g.degrees();
            assert_eq!(&deg[..3], &[2.0, 2.0, 2.0]);
            assert!(deg[3..].iter().all(|&d| d == 4.0));
        }
        assert!(sierpinski_gasket(0).is_err());
    }

    #[test]
    fn test_sierpinski_second_generation_layout() {
        let g = sierpinski_gasket(2).unwrap();
        // Midpoint 3 sits between corners 0 and 1, and is linked to midpoints 4 and 5.
        assert_eq!(g.neighbors(3), vec![0, 1, 4, 5]);
        assert_eq!(g.neighbors(0), vec![3, 5]);
    }
}
