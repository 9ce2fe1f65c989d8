//! Dense adjacency matrices and minimal graph adapter traits.

use crate::{Error, Result};
use nalgebra::DMatrix;

pub trait Graph {
    fn node_count(&self) -> usize;
    fn neighbors(&self, node: usize) -> Vec<usize>;
    fn out_degree(&self, node: usize) -> usize {
        self.neighbors(node).len()
    }
}

pub trait WeightedGraph: Graph {
    fn edge_weight(&self, source: usize, target: usize) -> f64;
}

/// Square matrix of finite, non-negative edge weights, stored row-major.
///
/// Construction validates the input once; afterwards the matrix is immutable
/// and every component reads it by reference.
///
/// Entry `(i, j)` is the weight of the move `i -> j`. Symmetry is not required
/// by the transition model, only by the spectral routines.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjacencyMatrix {
    n: usize,
    data: Vec<f64>,
}

impl AdjacencyMatrix {
    /// Build from rows. Rejects ragged/non-square input, negative and
    /// non-finite weights.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = rows.len();
        let mut data = Vec::with_capacity(n * n);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n {
                return Err(Error::NotSquare { rows: n, cols: row.len() });
            }
            for (j, &w) in row.iter().enumerate() {
                check_weight(i, j, w)?;
            }
            data.extend(row);
        }
        Ok(Self { n, data })
    }

    pub fn from_dmatrix(m: &DMatrix<f64>) -> Result<Self> {
        if m.nrows() != m.ncols() {
            return Err(Error::NotSquare { rows: m.nrows(), cols: m.ncols() });
        }
        let n = m.nrows();
        let mut data = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                let w = m[(i, j)];
                check_weight(i, j, w)?;
                data.push(w);
            }
        }
        Ok(Self { n, data })
    }

    /// Densify any weighted graph adapter.
    pub fn from_graph<G: WeightedGraph>(graph: &G) -> Result<Self> {
        let n = graph.node_count();
        let mut data = vec![0.0; n * n];
        for u in 0..n {
            for v in graph.neighbors(u) {
                if v >= n {
                    return Err(Error::IndexOutOfBounds(v));
                }
                let w = graph.edge_weight(u, v);
                check_weight(u, v, w)?;
                data[u * n + v] = w;
            }
        }
        Ok(Self { n, data })
    }

    /// Unweighted, undirected matrix from an edge list. Duplicate edges are
    /// collapsed; `(i, i)` adds a self-loop.
    pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> Result<Self> {
        let mut data = vec![0.0; n * n];
        for &(u, v) in edges {
            if u >= n {
                return Err(Error::IndexOutOfBounds(u));
            }
            if v >= n {
                return Err(Error::IndexOutOfBounds(v));
            }
            data[u * n + v] = 1.0;
            data[v * n + u] = 1.0;
        }
        Ok(Self { n, data })
    }

    pub(crate) fn from_raw(n: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), n * n);
        Self { n, data }
    }

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

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // `max(1)` keeps `chunks` happy on the empty matrix.
        self.data.chunks(self.n.max(1))
    }

    /// Row sums (out-strength; the degree for unweighted graphs).
    pub fn degrees(&self) -> Vec<f64> {
        self.rows().map(|r| r.iter().sum()).collect()
    }

    pub fn total_weight(&self) -> f64 {
        self.data.iter().sum()
    }

    pub fn is_symmetric(&self) -> bool {
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                if self.get(i, j) != self.get(j, i) {
                    return false;
                }
            }
        }
        true
    }

    pub fn to_dmatrix(&self) -> DMatrix<f64> {
        DMatrix::from_row_slice(self.n, self.n, &self.data)
    }

    pub fn check_node(&self, node: usize) -> Result<()> {
        if node < self.n {
            Ok(())
        } else {
            Err(Error::IndexOutOfBounds(node))
        }
    }
}

fn check_weight(row: usize, col: usize, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidWeight { row, col, value })
    }
}

impl Graph for AdjacencyMatrix {
    fn node_count(&self) -> usize {
        self.n
    }
    fn neighbors(&self, node: usize) -> Vec<usize> {
        self.row(node).iter().enumerate().filter(|(_, &w)| w > 0.0).map(|(i, _)| i).collect()
    }
}

impl WeightedGraph for AdjacencyMatrix {
    fn edge_weight(&self, source: usize, target: usize) -> f64 {
        self.get(source, target)
    }
}

/// Append an absorbing "void" node reachable from every node.
///
/// Node `j` gets an edge of weight `λ_j = p_void · d_j / (1 − p_void)` to and
/// from the new node `N`, so a walker at `j` evaporates with probability
/// exactly `p_void` per step. The top-left `N×N` block is copied unchanged and
/// `A[N, N] = 0`.
pub fn extend_with_void(adj: &AdjacencyMatrix, p_void: f64) -> Result<AdjacencyMatrix> {
    if !(0.0..1.0).contains(&p_void) {
        return Err(Error::InvalidParameter(format!("p_void must lie in [0, 1), got {p_void}")));
    }
    let n = adj.len();
    let m = n + 1;
    let scale = p_void / (1.0 - p_void);
    let degrees = adj.degrees();

    let mut data = vec![0.0; m * m];
    for (i, row) in adj.rows().enumerate() {
        data[i * m..i * m + n].copy_from_slice(row);
        let lambda = scale * degrees[i];
        data[i * m + n] = lambda;
        data[n * m + i] = lambda;
    }
    Ok(AdjacencyMatrix::from_raw(m, data))
}
