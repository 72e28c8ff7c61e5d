// Per-vertex, per-cluster edge sums used to price single-vertex moves.
//
// Column `c - 1` holds cluster label `c`. Every row carries `n` extra columns
// past the largest label so that moves into fresh singleton clusters can be
// priced without reallocating.

use rayon::prelude::*;
use crate::clustering::Clustering;
use crate::error::{Error, Result};
use crate::graph::Graph;

/// Aggregate edge sums of one clustering. Read-only once built; build a new
/// index when the clustering changes.
#[derive(Debug)]
pub struct ClusterAggregateIndex<'a> {
    clustering: &'a Clustering,
    capacity: usize,

    // Sum of the positive weights from a vertex into a cluster.
    pos_sum: Vec<Vec<f64>>,

    // Signed sum of the weights from a vertex into a cluster.
    weight_sum: Vec<Vec<f64>>,

    // Sum of the absolute weights from a vertex into a cluster.
    abs_weight_sum: Vec<Vec<f64>>,

    // Sum of the positive weights incident to a vertex.
    pos_total: Vec<f64>,
}

impl<'a> ClusterAggregateIndex<'a> {
    /// Compute the sums of `clustering` against `graph`.
    pub fn build(graph: &Graph, clustering: &'a Clustering) -> Self {
        debug_assert_eq!(graph.len(), clustering.num_vertices());

        let n = clustering.num_vertices();
        let capacity = clustering.max_label() + n;
        let membership = clustering.membership();

        let rows: Vec<(Vec<f64>, Vec<f64>, Vec<f64>)> = (0..n)
            .into_par_iter()
            .map(|vertex| {
                let mut pos = vec![0.0; capacity];
                let mut signed = vec![0.0; capacity];
                let mut abs = vec![0.0; capacity];
                for (neighbor, edge_weight) in graph.neighbors(vertex) {
                    if neighbor == vertex {
                        continue;
                    }
                    let column = membership[neighbor] - 1;
                    if edge_weight > 0.0 {
                        pos[column] += edge_weight;
                    }
                    signed[column] += edge_weight;
                    abs[column] += edge_weight.abs();
                }
                (pos, signed, abs)
            })
            .collect();

        let mut pos_sum = Vec::with_capacity(n);
        let mut weight_sum = Vec::with_capacity(n);
        let mut abs_weight_sum = Vec::with_capacity(n);
        for (pos, signed, abs) in rows {
            pos_sum.push(pos);
            weight_sum.push(signed);
            abs_weight_sum.push(abs);
        }
        let pos_total = pos_sum.iter().map(|row| row.iter().sum()).collect();

        Self {
            clustering,
            capacity,
            pos_sum,
            weight_sum,
            abs_weight_sum,
            pos_total,
        }
    }

    /// Number of cluster labels the index has columns for.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The smallest label with no vertex in it, usable as a fresh cluster.
    pub fn fresh_label(&self) -> usize {
        self.clustering.max_label() + 1
    }

    pub fn pos_sum(&self, vertex: usize, cluster: usize) -> Result<f64> {
        Ok(self.pos_sum[vertex][self.column(cluster)?])
    }

    pub fn weight_sum(&self, vertex: usize, cluster: usize) -> Result<f64> {
        Ok(self.weight_sum[vertex][self.column(cluster)?])
    }

    pub fn abs_weight_sum(&self, vertex: usize, cluster: usize) -> Result<f64> {
        Ok(self.abs_weight_sum[vertex][self.column(cluster)?])
    }

    /// Disagreement carried by the edges of `vertex` if it sat in `cluster`:
    /// negative weight inside the cluster plus positive weight leaving it.
    pub fn disagreement_in(&self, vertex: usize, cluster: usize) -> Result<f64> {
        let column = self.column(cluster)?;
        let pos = self.pos_sum[vertex][column];
        let negative_inside = self.abs_weight_sum[vertex][column] - pos;
        Ok(negative_inside + (self.pos_total[vertex] - pos))
    }

    /// Change in imbalance when `vertex` moves from `from_cluster` to
    /// `to_cluster`, all other vertices staying put.
    pub fn delta_for_move(&self, vertex: usize, from_cluster: usize, to_cluster: usize) -> Result<f64> {
        let actual = self.clustering.label_of(vertex);
        if actual != from_cluster {
            return Err(Error::ClusterMismatch {
                vertex,
                expected: from_cluster,
                actual,
            });
        }
        let from = self.column(from_cluster)?;
        let to = self.column(to_cluster)?;
        if from == to {
            return Ok(0.0);
        }

        Ok(self.weight_sum[vertex][from] - self.weight_sum[vertex][to])
    }

    fn column(&self, cluster: usize) -> Result<usize> {
        if cluster == 0 || cluster > self.capacity {
            return Err(Error::ClusterOutOfRange {
                cluster,
                capacity: self.capacity,
            });
        }
        Ok(cluster - 1)
    }
}
