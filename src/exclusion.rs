use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::clustering::{Clustering, EdgeIndicators};

/// Edge-indicator vectors of a batch of clusterings, in batch order.
pub fn from_batch<'a, I>(clusterings: I) -> Vec<EdgeIndicators>
where
    I: IntoIterator<Item = &'a Clustering>,
{
    clusterings
        .into_iter()
        .map(Clustering::to_edge_indicators)
        .collect()
}

/// The edge-indicator vector of a single clustering, as a one-element list.
pub fn from_single(clustering: &Clustering) -> Vec<EdgeIndicators> {
    vec![clustering.to_edge_indicators()]
}

/// How the exclusion set reacts when a jump returns a known solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExclusionStrategy {
    /// Replace the working set with the duplicate alone before retrying.
    #[default]
    NarrowOnDuplicate,
    /// Always exclude every registered solution.
    FullRegistry,
}

impl fmt::Display for ExclusionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionStrategy::NarrowOnDuplicate => write!(f, "narrow"),
            ExclusionStrategy::FullRegistry => write!(f, "full"),
        }
    }
}

impl FromStr for ExclusionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "narrow" => Ok(ExclusionStrategy::NarrowOnDuplicate),
            "full" => Ok(ExclusionStrategy::FullRegistry),
            other => Err(format!("unknown exclusion strategy '{}', expected 'narrow' or 'full'", other)),
        }
    }
}

/// The edge-indicator vectors handed to the solver on the next jump.
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    strategy: ExclusionStrategy,
    working: Vec<EdgeIndicators>,
}

impl ExclusionSet {
    pub fn new(strategy: ExclusionStrategy) -> Self {
        Self {
            strategy,
            working: Vec::new(),
        }
    }

    /// Append the vectors of newly registered solutions.
    pub fn extend(&mut self, vectors: Vec<EdgeIndicators>) {
        self.working.extend(vectors);
    }

    /// React to a jump that returned an already registered solution.
    pub fn on_duplicate(&mut self, duplicate: &Clustering) {
        match self.strategy {
            ExclusionStrategy::NarrowOnDuplicate => {
                self.working = from_single(duplicate);
            }
            ExclusionStrategy::FullRegistry => {
                let vector = duplicate.to_edge_indicators();
                if !self.working.contains(&vector) {
                    self.working.push(vector);
                }
            }
        }
    }

    pub fn vectors(&self) -> &[EdgeIndicators] {
        &self.working
    }

    pub fn len(&self) -> usize {
        self.working.len()
    }

    pub fn is_empty(&self) -> bool {
        self.working.is_empty()
    }
}
