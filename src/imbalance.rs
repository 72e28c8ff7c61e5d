// This file has code from https://github.com/LIHPC-Computational-Geometry/coupe
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator as _};
use crate::graph::Graph;

/// Disagreement contributed by a single vertex pair.
///
/// A positive edge counts when it is cut, a negative edge counts (by its
/// magnitude) when both ends share a cluster.
pub fn pair_disagreement(edge_weight: f64, same_cluster: bool) -> f64 {
    if same_cluster {
        if edge_weight < 0.0 { -edge_weight } else { 0.0 }
    } else if edge_weight > 0.0 {
        edge_weight
    } else {
        0.0
    }
}

/// The Correlation Clustering imbalance of a membership vector.
///
/// Sum of the positive weights between clusters plus the absolute negative
/// weights inside clusters. Labels are compared for equality only.
///
/// # Example
///
/// ```text,ignore
///   0 ──(+1)── 1          membership [1, 1, 2]
///    ╲        ╱           (0,1) kept     -> 0
///   (-2)   (+3)           (1,2) cut      -> 3
///      ╲   ╱              (0,2) cut, <0  -> 0
///        2                imbalance = 3
/// ```
pub fn imbalance(graph: &Graph, membership: &[usize]) -> f64 {
    debug_assert_eq!(graph.len(), membership.len());

    let indptr = graph.graph_csr.indptr().into_raw_storage();
    let indices = graph.graph_csr.indices();
    let data = graph.graph_csr.data();
    indptr
        .par_iter()
        .zip(&indptr[1..])
        .enumerate()
        .map(|(vertex, (start, end))| {
            let neighbors = &indices[*start..*end];
            let edge_weights = &data[*start..*end];
            let vertex_cluster = membership[vertex];
            neighbors
                .iter()
                .zip(edge_weights)
                .take_while(|(neighbor, _edge_weight)| **neighbor < vertex)
                .map(|(neighbor, edge_weight)| {
                    pair_disagreement(*edge_weight, membership[*neighbor] == vertex_cluster)
                })
                .sum::<f64>()
        })
        .sum()
}

/// Imbalance computed pair by pair over the full vertex set, O(n²).
///
/// Used as the reference the faster routines are checked against.
pub fn imbalance_dense(graph: &Graph, membership: &[usize]) -> f64 {
    let n = graph.len();
    let mut total = 0.0;
    for i in 1..n {
        for j in 0..i {
            total += pair_disagreement(graph.weight(i, j), membership[i] == membership[j]);
        }
    }
    total
}

/// Whether two imbalance values are equal up to `tolerance`.
pub fn same_imbalance(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

#[cfg(test)]
mod tests {
    use approx::assert_ulps_eq;
    use crate::gen_graph::gen_signed_graph;
    use super::*;

    #[test]
    fn test_pair_disagreement() {
        assert_ulps_eq!(pair_disagreement(2.0, false), 2.0);
        assert_ulps_eq!(pair_disagreement(2.0, true), 0.0);
        assert_ulps_eq!(pair_disagreement(-1.5, true), 1.5);
        assert_ulps_eq!(pair_disagreement(-1.5, false), 0.0);
    }

    #[test]
    fn test_imbalance() {
        // Arrange
        let graph = Graph::from_edges(3, &[(0, 1, 1.0), (1, 2, 3.0), (0, 2, -2.0)]);

        // Act
        let imb = imbalance(&graph, &[1, 1, 2]);
        let imb_single_cluster = imbalance(&graph, &[4, 4, 4]);

        // Assert
        assert_ulps_eq!(imb, 3.0);
        assert_ulps_eq!(imb_single_cluster, 2.0);
    }

    #[test]
    fn test_imbalance_matches_dense_on_random_graphs() {
        for seed in 0..5 {
            // Arrange
            let graph = gen_signed_graph(9, 0.6, seed);
            let membership = [1, 2, 1, 3, 3, 2, 1, 4, 2];

            // Act
            let sparse = imbalance(&graph, &membership);
            let dense = imbalance_dense(&graph, &membership);

            // Assert
            assert!(same_imbalance(sparse, dense, 1e-9));
        }
    }
}
