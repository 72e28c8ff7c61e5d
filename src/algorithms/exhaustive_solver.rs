// This file contains an exact solver for jump queries on small graphs.
//
// Clusterings are enumerated as restricted-growth strings (vertex v takes a
// label in 1..=k+1 where k is the largest label used by vertices 0..v). The
// imbalance of a prefix only grows as vertices are added, so a prefix whose
// cost already exceeds the target is cut.

use rustc_hash::FxHashSet;
use std::time::Instant;
use tracing::{debug, warn};
use crate::algorithms::{JumpOutcome, JumpQuery, JumpSolver, JumpStatus};
use crate::clustering::{edge_pairs, EdgeIndicators};
use crate::error::Result;
use crate::graph::Graph;
use crate::imbalance::pair_disagreement;

// Beyond this many vertices the enumeration is unlikely to finish.
const COMFORTABLE_VERTEX_COUNT: usize = 14;

// How many search nodes are visited between two clock readings.
const CLOCK_CHECK_INTERVAL: u64 = 1024;

/// Exact solver by exhaustive enumeration with cost pruning.
#[derive(Debug)]
pub struct ExhaustiveSolver {
    // Keep every exclusion ever received, as constraints added to a model do.
    retain_exclusions: bool,
    retained: FxHashSet<EdgeIndicators>,
}

impl Default for ExhaustiveSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ExhaustiveSolver {
    /// A solver that keeps the exclusions of earlier queries.
    pub fn new() -> Self {
        Self {
            retain_exclusions: true,
            retained: FxHashSet::default(),
        }
    }

    /// A solver that only honors the exclusions of the current query.
    pub fn stateless() -> Self {
        Self {
            retain_exclusions: false,
            retained: FxHashSet::default(),
        }
    }

    /// Number of distinct exclusions held across queries.
    pub fn retained_exclusions(&self) -> usize {
        self.retained.len()
    }
}

struct Search<'a> {
    n: usize,

    // lower_weights[v][u] is the weight of (v, u) for u < v.
    lower_weights: Vec<Vec<f64>>,
    target: f64,
    tolerance: f64,
    excluded: &'a FxHashSet<EdgeIndicators>,
    deadline: Option<Instant>,
    solution_cap: usize,

    labels: Vec<usize>,
    found: Vec<Vec<usize>>,
    visited_nodes: u64,
    timed_out: bool,
}

impl<'a> Search<'a> {
    // Returns true when the search must stop.
    fn branch(&mut self, vertex: usize, num_labels: usize, cost: f64) -> bool {
        self.visited_nodes += 1;
        if self.visited_nodes % CLOCK_CHECK_INTERVAL == 0 {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    self.timed_out = true;
                    return true;
                }
            }
        }

        if vertex == self.n {
            if (cost - self.target).abs() <= self.tolerance && !self.is_excluded() {
                self.found.push(self.labels.clone());
                return self.found.len() >= self.solution_cap;
            }
            return false;
        }

        for label in 1..=(num_labels + 1) {
            let added: f64 = self.lower_weights[vertex]
                .iter()
                .enumerate()
                .map(|(other, &weight)| pair_disagreement(weight, self.labels[other] == label))
                .sum();
            let new_cost = cost + added;
            if new_cost > self.target + self.tolerance {
                continue;
            }

            self.labels[vertex] = label;
            if self.branch(vertex + 1, num_labels.max(label), new_cost) {
                return true;
            }
        }
        self.labels[vertex] = 0;

        false
    }

    fn is_excluded(&self) -> bool {
        if self.excluded.is_empty() {
            return false;
        }
        let indicators = EdgeIndicators::from_raw(
            edge_pairs(self.n)
                .map(|(i, j)| u8::from(self.labels[i] == self.labels[j]))
                .collect(),
        );
        self.excluded.contains(&indicators)
    }
}

impl JumpSolver for ExhaustiveSolver {
    fn solve(&mut self, graph: &Graph, query: &JumpQuery<'_>) -> Result<JumpOutcome> {
        let n = graph.len();
        if n > COMFORTABLE_VERTEX_COUNT {
            warn!("exhaustive solver on {} vertices, the query may not finish in time", n);
        }

        let local: FxHashSet<EdgeIndicators>;
        let excluded = if self.retain_exclusions {
            self.retained.extend(query.exclusions.iter().cloned());
            &self.retained
        } else {
            local = query.exclusions.iter().cloned().collect();
            &local
        };

        let lower_weights = (0..n)
            .map(|v| (0..v).map(|u| graph.weight(v, u)).collect())
            .collect();

        let started = Instant::now();
        let mut search = Search {
            n,
            lower_weights,
            target: query.optimal_imbalance,
            tolerance: query.tolerance,
            excluded,
            deadline: query.time_limit.map(|limit| started + limit),
            solution_cap: query.solution_cap.max(1),
            labels: vec![0; n],
            found: Vec::new(),
            visited_nodes: 0,
            timed_out: false,
        };
        search.branch(0, 0, 0.0);

        debug!(
            "exhaustive search visited {} nodes in {:?} against {} exclusions ({:?} root)",
            search.visited_nodes,
            started.elapsed(),
            excluded.len(),
            query.root_algorithm,
        );

        let reached_cap = search.found.len() >= search.solution_cap;
        let outcome = match search.found.into_iter().next() {
            Some(membership) if reached_cap => JumpOutcome::found(JumpStatus::SolutionLimitReached, membership),
            Some(membership) if !search.timed_out => JumpOutcome::found(JumpStatus::Optimal, membership),
            _ if search.timed_out => JumpOutcome::without_solution(JumpStatus::TimedOut),
            _ => JumpOutcome::without_solution(JumpStatus::Infeasible),
        };
        Ok(outcome)
    }
}
