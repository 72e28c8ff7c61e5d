use std::fmt;
use std::hash::{Hash, Hasher};
use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::imbalance::imbalance;

/// Position of the unordered pair `{i, j}` in an edge-indicator vector.
///
/// Pairs are laid out lower-triangle, row by row: (1,0), (2,0), (2,1), (3,0), ...
pub fn edge_index(i: usize, j: usize) -> usize {
    debug_assert_ne!(i, j);
    let (hi, lo) = if i > j { (i, j) } else { (j, i) };
    hi * (hi - 1) / 2 + lo
}

/// Number of unordered vertex pairs of a graph with `num_vertices` vertices.
pub fn edge_count(num_vertices: usize) -> usize {
    num_vertices * num_vertices.saturating_sub(1) / 2
}

/// All unordered pairs `(i, j)`, `j < i`, in edge-indicator order.
pub fn edge_pairs(num_vertices: usize) -> impl Iterator<Item = (usize, usize)> {
    (1..num_vertices).flat_map(|i| (0..i).map(move |j| (i, j)))
}

/// One entry per unordered vertex pair, 1 when the pair is co-clustered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeIndicators(Vec<u8>);

impl EdgeIndicators {
    /// Wrap a raw edge-variable assignment. Its length must be `edge_count(n)`.
    pub fn from_raw(values: Vec<u8>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether vertices `i` and `j` are co-clustered.
    pub fn together(&self, i: usize, j: usize) -> bool {
        self.0[edge_index(i, j)] == 1
    }
}

/// Renumber labels 1..k in order of first appearance.
fn canonical_form(membership: &[usize]) -> (Vec<usize>, usize) {
    let mut relabel = vec![0usize; membership.len() + 1];
    let mut next_label = 0;
    let canonical = membership
        .iter()
        .map(|&label| {
            if relabel[label] == 0 {
                next_label += 1;
                relabel[label] = next_label;
            }
            relabel[label]
        })
        .collect();
    (canonical, next_label)
}

/// A partition of the vertex set, given as a membership vector.
///
/// Labels are arbitrary identifiers in `1..=n`. Two clusterings compare equal
/// when they induce the same set partition, whatever their labels.
#[derive(Debug, Clone)]
pub struct Clustering {
    membership: Vec<usize>,
    canonical: Vec<usize>,
    num_clusters: usize,
    imbalance: Option<f64>,
}

impl Clustering {
    /// Create a clustering of a graph with `num_vertices` vertices.
    pub fn new(membership: Vec<usize>, num_vertices: usize) -> Result<Self> {
        if membership.len() != num_vertices {
            return Err(Error::InvalidMembership(format!(
                "expected {} labels, got {}",
                num_vertices,
                membership.len()
            )));
        }
        if let Some((vertex, &label)) = membership
            .iter()
            .enumerate()
            .find(|&(_, &label)| label == 0 || label > num_vertices)
        {
            return Err(Error::InvalidMembership(format!(
                "vertex {} has label {}, expected a value in 1..={}",
                vertex, label, num_vertices
            )));
        }

        let (canonical, num_clusters) = canonical_form(&membership);
        Ok(Self {
            membership,
            canonical,
            num_clusters,
            imbalance: None,
        })
    }

    /// Create a clustering and compute its imbalance against `graph`.
    pub fn with_imbalance(membership: Vec<usize>, graph: &Graph) -> Result<Self> {
        let mut clustering = Self::new(membership, graph.len())?;
        clustering.compute_imbalance(graph);
        Ok(clustering)
    }

    pub fn membership(&self) -> &[usize] {
        &self.membership
    }

    /// Membership relabelled 1..k in order of first appearance.
    pub fn canonical_membership(&self) -> &[usize] {
        &self.canonical
    }

    pub fn num_vertices(&self) -> usize {
        self.membership.len()
    }

    /// Number of non-empty clusters.
    pub fn num_clusters(&self) -> usize {
        self.num_clusters
    }

    /// Largest label in use, zero for an empty clustering.
    pub fn max_label(&self) -> usize {
        self.membership.iter().cloned().max().unwrap_or(0)
    }

    pub fn label_of(&self, vertex: usize) -> usize {
        self.membership[vertex]
    }

    /// Compute (once) and return the imbalance against `graph`.
    pub fn compute_imbalance(&mut self, graph: &Graph) -> f64 {
        match self.imbalance {
            Some(value) => value,
            None => {
                let value = imbalance(graph, &self.membership);
                self.imbalance = Some(value);
                value
            }
        }
    }

    /// Compute the imbalance against `graph` from scratch, replacing any
    /// cached value.
    pub fn recompute_imbalance(&mut self, graph: &Graph) -> f64 {
        self.imbalance = None;
        self.compute_imbalance(graph)
    }

    /// The cached imbalance, if it was computed.
    pub fn imbalance(&self) -> Option<f64> {
        self.imbalance
    }

    /// Whether both clusterings induce the same set partition.
    pub fn equivalent_to(&self, other: &Clustering) -> bool {
        self.canonical == other.canonical
    }

    /// The same partition with labels renumbered 1..k.
    pub fn canonical(&self) -> Clustering {
        Clustering {
            membership: self.canonical.clone(),
            canonical: self.canonical.clone(),
            num_clusters: self.num_clusters,
            imbalance: self.imbalance,
        }
    }

    /// The canonical form of this partition with `vertex` moved to `label`.
    ///
    /// `label` may be `num_clusters() + 1` to open a fresh singleton cluster.
    /// The imbalance of the result is not computed.
    pub fn with_move(&self, vertex: usize, label: usize) -> Result<Clustering> {
        let mut membership = self.canonical.clone();
        membership[vertex] = label;
        Clustering::new(membership, self.num_vertices())
    }

    /// Co-clustering indicator of every vertex pair, in `edge_pairs` order.
    pub fn to_edge_indicators(&self) -> EdgeIndicators {
        let n = self.num_vertices();
        EdgeIndicators(
            edge_pairs(n)
                .map(|(i, j)| u8::from(self.membership[i] == self.membership[j]))
                .collect(),
        )
    }

    /// Vertices of each cluster, clusters ordered by their smallest vertex.
    pub fn clusters(&self) -> Vec<Vec<usize>> {
        let mut clusters = vec![Vec::new(); self.num_clusters];
        for (vertex, &label) in self.canonical.iter().enumerate() {
            clusters[label - 1].push(vertex);
        }
        clusters
    }
}

impl PartialEq for Clustering {
    fn eq(&self, other: &Self) -> bool {
        self.equivalent_to(other)
    }
}

impl Eq for Clustering {}

impl Hash for Clustering {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for Clustering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (index, cluster) in self.clusters().iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}", cluster)?;
        }
        write!(f, "]")?;
        if let Some(imbalance) = self.imbalance {
            write!(f, " imbalance={}", imbalance)?;
        }
        Ok(())
    }
}
