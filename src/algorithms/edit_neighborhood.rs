// This file contains an in-process recurrent neighborhood search.
//
// From a seed clustering, every clustering within `max_edit_distance`
// single-vertex moves is visited, each move priced through the cluster
// aggregate index of its parent. Optimal clusterings that are not yet known
// are reported and queued as new seeds, until the queue runs dry or a budget
// is hit.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::time::Instant;
use tracing::debug;
use crate::algorithms::{Discovered, NeighborhoodRequest, NeighborhoodSearch};
use crate::cluster_index::ClusterAggregateIndex;
use crate::clustering::Clustering;
use crate::error::Result;
use crate::graph::Graph;
use crate::imbalance::same_imbalance;
use crate::registry::Registry;

/// Bounded edit-distance search around known optimal clusterings.
#[derive(Debug, Default, Clone, Copy)]
pub struct EditNeighborhoodSearch;

impl EditNeighborhoodSearch {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug)]
struct Move {
    // The index of the vertex.
    vertex: usize,

    // Label of the cluster the vertex moves to.
    cluster: usize,
}

struct Explorer<'a> {
    graph: &'a Graph,
    known: &'a Registry,
    target: f64,
    tolerance: f64,
    deadline: Option<Instant>,
    solution_cap: Option<usize>,

    found: Vec<Discovered>,
    found_keys: FxHashSet<Vec<usize>>,
    stopped: bool,
}

impl<'a> Explorer<'a> {
    fn walk(
        &mut self,
        base: &Clustering,
        base_imbalance: f64,
        depth_left: usize,
        edits: usize,
        depth_seen: &mut FxHashMap<Vec<usize>, usize>,
    ) -> Result<()> {
        let index = ClusterAggregateIndex::build(self.graph, base);

        for single_move in candidate_moves(base, &index) {
            if self.deadline.map_or(false, |deadline| Instant::now() >= deadline) {
                self.stopped = true;
                return Ok(());
            }

            let from = base.label_of(single_move.vertex);
            let delta = index.delta_for_move(single_move.vertex, from, single_move.cluster)?;
            let child = base.with_move(single_move.vertex, single_move.cluster)?.canonical();
            let child_imbalance = base_imbalance + delta;
            let remaining_depth = depth_left - 1;

            // A clustering already reached with at least as many edits left
            // has nothing more to offer.
            match depth_seen.get(child.canonical_membership()) {
                Some(&seen) if seen >= remaining_depth => continue,
                _ => {
                    depth_seen.insert(child.canonical_membership().to_vec(), remaining_depth);
                }
            }

            if same_imbalance(child_imbalance, self.target, self.tolerance) {
                self.record(&child, edits + 1);
                if self.stopped {
                    return Ok(());
                }
            }

            if remaining_depth > 0 {
                self.walk(&child, child_imbalance, remaining_depth, edits + 1, depth_seen)?;
                if self.stopped {
                    return Ok(());
                }
            }
        }

        Ok(())
    }

    fn record(&mut self, candidate: &Clustering, edits: usize) {
        if self.known.contains(candidate) || self.found_keys.contains(candidate.canonical_membership()) {
            return;
        }

        // Deltas accumulate along the path; confirm on the exact value.
        let mut clustering = candidate.clone();
        let exact = clustering.compute_imbalance(self.graph);
        if !same_imbalance(exact, self.target, self.tolerance) {
            return;
        }

        self.found_keys.insert(clustering.canonical_membership().to_vec());
        self.found.push(Discovered {
            clustering,
            diversity_lower_bound: edits as i64,
        });
        if self.solution_cap.map_or(false, |cap| self.found.len() >= cap) {
            self.stopped = true;
        }
    }
}

// Every move of one vertex to another existing cluster, or to a fresh
// singleton when the vertex is not already alone.
fn candidate_moves(base: &Clustering, index: &ClusterAggregateIndex<'_>) -> Vec<Move> {
    let fresh = index.fresh_label();
    let mut cluster_sizes = vec![0usize; fresh + 1];
    for &label in base.membership() {
        cluster_sizes[label] += 1;
    }

    let mut moves = Vec::new();
    for vertex in 0..base.num_vertices() {
        let from = base.label_of(vertex);
        for cluster in 1..=fresh {
            if cluster == from || (cluster == fresh && cluster_sizes[from] == 1) {
                continue;
            }
            moves.push(Move { vertex, cluster });
        }
    }
    moves
}

impl NeighborhoodSearch for EditNeighborhoodSearch {
    fn explore(&mut self, request: &NeighborhoodRequest<'_>) -> Result<Vec<Discovered>> {
        if request.max_edit_distance == 0 || request.remaining_solutions == Some(0) {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let mut explorer = Explorer {
            graph: request.graph,
            known: request.known,
            target: request.optimal_imbalance,
            tolerance: request.tolerance,
            deadline: request.remaining_time.map(|limit| started + limit),
            solution_cap: request.remaining_solutions,
            found: Vec::new(),
            found_keys: FxHashSet::default(),
            stopped: false,
        };

        let mut seeds = VecDeque::new();
        seeds.push_back(request.frontier.canonical());
        let mut queued = 0;

        while let Some(seed) = seeds.pop_front() {
            let mut depth_seen = FxHashMap::default();
            depth_seen.insert(seed.canonical_membership().to_vec(), request.max_edit_distance);

            explorer.walk(&seed, request.optimal_imbalance, request.max_edit_distance, 0, &mut depth_seen)?;
            if explorer.stopped {
                break;
            }

            // Solutions found from this seed are seeds themselves.
            seeds.extend(explorer.found[queued..].iter().map(|d| d.clustering.clone()));
            queued = explorer.found.len();
        }

        debug!(
            "pass {}: neighborhood search found {} solutions in {:?}",
            request.pass,
            explorer.found.len(),
            started.elapsed()
        );
        Ok(explorer.found)
    }
}
