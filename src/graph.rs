// This file has code from https://github.com/LIHPC-Computational-Geometry/coupe
use rustc_hash::FxHashMap;
use sprs::{CsMat, TriMat};

/// Struct that represents a signed weighted graph
#[derive(Debug)]
pub struct Graph {
    /// Symmetric weight matrix stored in CSR format, `W[i][i] = 0`
    pub graph_csr: CsMat<f64>,
}

impl Graph {
    /// Create a graph with `num_vertices` vertices and no edges.
    pub fn with_vertices(num_vertices: usize) -> Self {
        Self {
            graph_csr: CsMat::zero((num_vertices, num_vertices)),
        }
    }

    /// Build a graph from a list of undirected edges.
    ///
    /// Each `(i, j, w)` is stored in both directions. When a pair appears
    /// more than once the last weight wins; self-loops are dropped.
    pub fn from_edges(num_vertices: usize, edges: &[(usize, usize, f64)]) -> Self {
        let mut weights: FxHashMap<(usize, usize), f64> = FxHashMap::default();
        for &(i, j, w) in edges {
            if i == j {
                continue;
            }
            weights.insert((i.min(j), i.max(j)), w);
        }

        let mut tri_mat = TriMat::new((num_vertices, num_vertices));
        for (&(i, j), &w) in &weights {
            if w != 0.0 {
                tri_mat.add_triplet(i, j, w);
                tri_mat.add_triplet(j, i, w);
            }
        }

        Self {
            graph_csr: tri_mat.to_csr(),
        }
    }

    /// The number of vertices in the graph.
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.graph_csr.rows(), self.graph_csr.cols());
        self.graph_csr.rows()
    }

    /// Whether the graph has no vertices.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// An iterator over the neighbors of the given vertex, with edge weights.
    ///
    /// Neighbors come out in increasing vertex order.
    pub fn neighbors(&self, vertex: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.graph_csr
            .outer_view(vertex)
            .into_iter()
            .flat_map(|row| {
                let (indices, data) = row.into_raw_storage();
                indices.iter().cloned().zip(data.iter().cloned())
            })
    }

    /// Weight of the edge between two vertices, zero when absent.
    pub fn weight(&self, vertex1: usize, vertex2: usize) -> f64 {
        self.graph_csr.get(vertex1, vertex2).cloned().unwrap_or(0.0)
    }

}

impl Clone for Graph {
    fn clone(&self) -> Self {
        Self {
            graph_csr: self.graph_csr.clone(),
        }
    }
}
