// This file contains the enumeration controller.
//
// Starting from one optimal clustering, the controller alternates a
// neighborhood phase (optimal clusterings a few edits away from the current
// frontier) and a jump phase (an exact query for any optimal clustering that
// is not excluded). The run ends when the solver proves that no optimal
// clustering is left, or when the time or solution budget is spent.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use crate::algorithms::{
    Discovered, JumpQuery, JumpSolver, JumpStatus, NeighborhoodRequest, NeighborhoodSearch, RootAlgorithm,
    SolutionOrigin, SolutionSink,
};
use crate::clustering::Clustering;
use crate::error::{Error, Result};
use crate::exclusion::{self, ExclusionSet, ExclusionStrategy};
use crate::graph::Graph;
use crate::imbalance::same_imbalance;
use crate::registry::Registry;

/// Tunables of an enumeration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumerationConfig {
    /// Maximum number of single-vertex moves explored by the neighborhood phase.
    pub max_edit_distance: usize,

    /// Wall-clock budget of the whole run, `None` when unbounded.
    pub time_limit: Option<Duration>,

    /// Maximum registry size, the initial clustering included. `None` when unbounded.
    pub solution_limit: Option<usize>,

    pub thread_count: usize,

    pub exclusion_strategy: ExclusionStrategy,

    /// Two imbalances closer than this are equal.
    pub imbalance_tolerance: f64,
}

impl Default for EnumerationConfig {
    fn default() -> Self {
        Self {
            max_edit_distance: 3,
            time_limit: None,
            solution_limit: None,
            thread_count: 1,
            exclusion_strategy: ExclusionStrategy::default(),
            imbalance_tolerance: 1e-6,
        }
    }
}

impl EnumerationConfig {
    /// Time limit in seconds where zero or less means unbounded.
    pub fn time_limit_from_secs(seconds: f64) -> Option<Duration> {
        if seconds > 0.0 && seconds.is_finite() {
            Some(Duration::from_secs_f64(seconds))
        } else {
            None
        }
    }

    /// Solution limit where zero or less means unbounded.
    pub fn solution_limit_from(limit: i64) -> Option<usize> {
        usize::try_from(limit).ok().filter(|&limit| limit > 0)
    }
}

/// Which budget ended a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetKind {
    Time,
    Solutions,
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// The solver proved that every optimal clustering has been found.
    Exhausted,
    BudgetExceeded(BudgetKind),
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Exhausted => write!(f, "solution space exhausted"),
            Termination::BudgetExceeded(BudgetKind::Time) => write!(f, "time limit reached"),
            Termination::BudgetExceeded(BudgetKind::Solutions) => write!(f, "solution limit reached"),
        }
    }
}

/// Counters of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumerationReport {
    pub termination: Termination,
    pub optimal_imbalance: f64,
    pub passes: usize,
    pub jump_queries: usize,

    /// Jump results that were already registered.
    pub duplicate_jumps: usize,
    pub neighborhood_solutions: usize,
    pub jump_solutions: usize,

    /// Registry size at the end, the initial clustering included.
    pub total_solutions: usize,
    pub elapsed_secs: f64,
}

/// Result of [`EnumerationController::run`].
#[derive(Debug)]
pub struct Enumeration {
    pub report: EnumerationReport,
    pub registry: Registry,
}

#[derive(Debug)]
struct Budget {
    started: Instant,
    time_limit: Option<Duration>,
    solution_limit: Option<usize>,
}

impl Budget {
    fn remaining_time(&self) -> Option<Duration> {
        self.time_limit
            .map(|limit| limit.saturating_sub(self.started.elapsed()))
    }

    fn time_exhausted(&self) -> bool {
        self.remaining_time() == Some(Duration::ZERO)
    }

    fn remaining_solutions(&self, registered: usize) -> Option<usize> {
        self.solution_limit
            .map(|limit| limit.saturating_sub(registered))
    }

    fn exceeded(&self, registered: usize) -> Option<BudgetKind> {
        if self.time_exhausted() {
            Some(BudgetKind::Time)
        } else if self.remaining_solutions(registered) == Some(0) {
            Some(BudgetKind::Solutions)
        } else {
            None
        }
    }
}

enum Phase {
    Neighborhood,
    Jump,
    Done(Termination),
}

/// Drives the neighborhood and jump phases over an optimal clustering.
pub struct EnumerationController<'g, S, N, K> {
    graph: &'g Graph,
    config: EnumerationConfig,
    solver: S,
    search: N,
    sink: K,

    registry: Registry,
    exclusions: ExclusionSet,

    // Latest clustering accepted from a jump.
    frontier: Clustering,
    optimal_imbalance: f64,

    pass: usize,
    jump_queries: usize,
    duplicate_jumps: usize,
    neighborhood_solutions: usize,
    jump_solutions: usize,
}

impl<'g, S, N, K> EnumerationController<'g, S, N, K>
where
    S: JumpSolver,
    N: NeighborhoodSearch,
    K: SolutionSink,
{
    /// Set up a run from `initial`, whose imbalance becomes the target of
    /// every later solution.
    pub fn new(
        graph: &'g Graph,
        initial: Clustering,
        config: EnumerationConfig,
        solver: S,
        search: N,
        sink: K,
    ) -> Result<Self> {
        if initial.num_vertices() != graph.len() {
            return Err(Error::InvalidMembership(format!(
                "initial membership has {} labels for a graph of {} vertices",
                initial.num_vertices(),
                graph.len()
            )));
        }

        let mut frontier = initial;
        let optimal_imbalance = frontier.recompute_imbalance(graph);
        let mut exclusions = ExclusionSet::new(config.exclusion_strategy);
        exclusions.extend(exclusion::from_single(&frontier));

        Ok(Self {
            graph,
            config,
            solver,
            search,
            sink,
            registry: Registry::with_initial(frontier.clone()),
            exclusions,
            frontier,
            optimal_imbalance,
            pass: 0,
            jump_queries: 0,
            duplicate_jumps: 0,
            neighborhood_solutions: 0,
            jump_solutions: 0,
        })
    }

    /// Enumerate until exhaustion or until a budget runs out.
    pub fn run(mut self) -> Result<Enumeration> {
        let budget = Budget {
            started: Instant::now(),
            time_limit: self.config.time_limit,
            solution_limit: self.config.solution_limit,
        };
        info!(
            "enumerating optimal clusterings of imbalance {} on {} vertices ({} exclusions)",
            self.optimal_imbalance,
            self.graph.len(),
            self.config.exclusion_strategy
        );
        self.sink.record_solution(0, &self.frontier, SolutionOrigin::Initial)?;

        let mut phase = Phase::Neighborhood;
        let termination = loop {
            phase = match phase {
                Phase::Neighborhood => self.neighborhood_phase(&budget)?,
                Phase::Jump => self.jump_phase(&budget)?,
                Phase::Done(termination) => break termination,
            };
        };

        let report = EnumerationReport {
            termination,
            optimal_imbalance: self.optimal_imbalance,
            passes: self.pass,
            jump_queries: self.jump_queries,
            duplicate_jumps: self.duplicate_jumps,
            neighborhood_solutions: self.neighborhood_solutions,
            jump_solutions: self.jump_solutions,
            total_solutions: self.registry.len(),
            elapsed_secs: budget.started.elapsed().as_secs_f64(),
        };
        info!(
            "{} after {} passes: {} optimal clusterings in {:.3}s",
            termination, report.passes, report.total_solutions, report.elapsed_secs
        );
        self.sink.finish(&report)?;

        Ok(Enumeration {
            report,
            registry: self.registry,
        })
    }

    fn neighborhood_phase(&mut self, budget: &Budget) -> Result<Phase> {
        if let Some(kind) = budget.exceeded(self.registry.len()) {
            return Ok(Phase::Done(Termination::BudgetExceeded(kind)));
        }
        self.pass += 1;

        let remaining_solutions = budget.remaining_solutions(self.registry.len());
        let request = NeighborhoodRequest {
            pass: self.pass,
            graph: self.graph,
            frontier: &self.frontier,
            known: &self.registry,
            optimal_imbalance: self.optimal_imbalance,
            tolerance: self.config.imbalance_tolerance,
            max_edit_distance: self.config.max_edit_distance,
            remaining_time: budget.remaining_time(),
            remaining_solutions,
            thread_count: self.config.thread_count,
        };
        let discovered = self.search.explore(&request)?;
        let reported = discovered.len();

        let mut accepted = Vec::new();
        for Discovered { mut clustering, diversity_lower_bound } in discovered {
            if remaining_solutions.map_or(false, |cap| accepted.len() >= cap) {
                break;
            }
            if clustering.num_vertices() != self.graph.len() {
                return Err(Error::Collaborator(format!(
                    "clustering of {} vertices for a graph of {}",
                    clustering.num_vertices(),
                    self.graph.len()
                )));
            }
            let actual = clustering.recompute_imbalance(self.graph);
            if !same_imbalance(actual, self.optimal_imbalance, self.config.imbalance_tolerance) {
                return Err(Error::Collaborator(format!(
                    "reported clustering {} has imbalance {}, expected {}",
                    clustering, actual, self.optimal_imbalance
                )));
            }
            if !self.registry.add(clustering.clone()) {
                warn!("pass {}: discarding already known clustering {}", self.pass, clustering);
                continue;
            }
            self.sink.record_solution(
                self.registry.len() - 1,
                &clustering,
                SolutionOrigin::Neighborhood { diversity_lower_bound },
            )?;
            accepted.push(clustering);
        }

        if accepted.len() < reported {
            debug!("pass {}: kept {} of {} reported clusterings", self.pass, accepted.len(), reported);
        }
        info!(
            "pass {}: {} new clusterings from the neighborhood, {} known",
            self.pass,
            accepted.len(),
            self.registry.len()
        );
        self.neighborhood_solutions += accepted.len();
        self.exclusions.extend(exclusion::from_batch(&accepted));

        match budget.exceeded(self.registry.len()) {
            Some(kind) => Ok(Phase::Done(Termination::BudgetExceeded(kind))),
            None => Ok(Phase::Jump),
        }
    }

    fn jump_phase(&mut self, budget: &Budget) -> Result<Phase> {
        if budget.time_exhausted() {
            return Ok(Phase::Done(Termination::BudgetExceeded(BudgetKind::Time)));
        }

        let root_algorithm = if self.pass <= 1 {
            RootAlgorithm::Network
        } else {
            RootAlgorithm::Dual
        };
        let query = JumpQuery {
            optimal_imbalance: self.optimal_imbalance,
            tolerance: self.config.imbalance_tolerance,
            exclusions: self.exclusions.vectors(),
            time_limit: budget.remaining_time(),
            solution_cap: 1,
            thread_count: self.config.thread_count,
            root_algorithm,
        };
        self.jump_queries += 1;
        debug!(
            "pass {}: jump query {} against {} exclusions",
            self.pass,
            self.jump_queries,
            query.exclusions.len()
        );

        let started = Instant::now();
        let outcome = self.solver.solve(self.graph, &query)?;
        let elapsed = started.elapsed();
        self.sink.record_jump(self.jump_queries, &outcome.status, elapsed)?;
        debug!("pass {}: jump status {} after {:?}", self.pass, outcome.status, elapsed);

        match outcome.status {
            JumpStatus::Infeasible => Ok(Phase::Done(Termination::Exhausted)),
            JumpStatus::TimedOut if budget.time_exhausted() => {
                Ok(Phase::Done(Termination::BudgetExceeded(BudgetKind::Time)))
            }
            JumpStatus::TimedOut => Ok(Phase::Neighborhood),
            JumpStatus::Error(message) => Err(Error::Solver(message)),
            status @ (JumpStatus::Optimal | JumpStatus::SolutionLimitReached) => {
                let membership = outcome
                    .membership
                    .ok_or_else(|| Error::Solver(format!("status {} without a membership", status)))?;
                let mut candidate = Clustering::new(membership, self.graph.len())?;
                let actual = candidate.recompute_imbalance(self.graph);
                if !same_imbalance(actual, self.optimal_imbalance, self.config.imbalance_tolerance) {
                    return Err(Error::SolverInconsistency {
                        expected: self.optimal_imbalance,
                        actual,
                    });
                }

                if self.registry.contains(&candidate) {
                    warn!("pass {}: jump returned known clustering {}, retrying", self.pass, candidate);
                    self.duplicate_jumps += 1;
                    self.exclusions.on_duplicate(&candidate);
                    return Ok(Phase::Jump);
                }

                self.registry.add(candidate.clone());
                self.sink.record_solution(
                    self.registry.len() - 1,
                    &candidate,
                    SolutionOrigin::Jump { pass: self.pass },
                )?;
                self.exclusions.extend(exclusion::from_single(&candidate));
                info!("pass {}: jump found new clustering {}", self.pass, candidate);
                self.frontier = candidate;
                self.jump_solutions += 1;
                Ok(Phase::Neighborhood)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use std::collections::VecDeque;
    use std::fs;
    use tempfile::tempdir;
    use crate::algorithms::{EditNeighborhoodSearch, ExhaustiveSolver, JumpOutcome, NullSink};
    use crate::clustering::EdgeIndicators;
    use crate::gen_graph::gen_planted_graph;
    use crate::io::{read_manifest, DirectorySink, ASSOC_FILE, SUMMARY_FILE};
    use super::*;

    #[derive(Default)]
    struct ScriptedSolver {
        replies: VecDeque<JumpOutcome>,
        seen_exclusions: Vec<Vec<EdgeIndicators>>,
        seen_roots: Vec<RootAlgorithm>,
    }

    impl ScriptedSolver {
        fn replying(replies: Vec<JumpOutcome>) -> Self {
            Self {
                replies: replies.into(),
                ..Self::default()
            }
        }
    }

    impl JumpSolver for ScriptedSolver {
        fn solve(&mut self, _graph: &Graph, query: &JumpQuery<'_>) -> Result<JumpOutcome> {
            self.seen_exclusions.push(query.exclusions.to_vec());
            self.seen_roots.push(query.root_algorithm);
            Ok(self
                .replies
                .pop_front()
                .unwrap_or_else(|| JumpOutcome::without_solution(JumpStatus::Infeasible)))
        }
    }

    #[derive(Default)]
    struct ScriptedSearch {
        batches: VecDeque<Vec<Discovered>>,
        calls: usize,
    }

    impl NeighborhoodSearch for ScriptedSearch {
        fn explore(&mut self, _request: &NeighborhoodRequest<'_>) -> Result<Vec<Discovered>> {
            self.calls += 1;
            Ok(self.batches.pop_front().unwrap_or_default())
        }
    }

    fn clustering(membership: &[usize]) -> Clustering {
        Clustering::new(membership.to_vec(), membership.len()).unwrap()
    }

    fn found(membership: &[usize]) -> JumpOutcome {
        JumpOutcome::found(JumpStatus::Optimal, membership.to_vec())
    }

    // 0 -(+1)- 1 -(+1)- 2, 0 -(-1)- 2: three optimal clusterings of imbalance 1.
    fn path_triangle() -> Graph {
        Graph::from_edges(3, &[(0, 1, 1.0), (1, 2, 1.0), (0, 2, -1.0)])
    }

    fn assert_registry_is_sound(graph: &Graph, registry: &Registry, optimal: f64) {
        let solutions = registry.as_slice();
        for (i, a) in solutions.iter().enumerate() {
            assert_abs_diff_eq!(crate::imbalance::imbalance(graph, a.membership()), optimal, epsilon = 1e-9);
            for b in &solutions[i + 1..] {
                assert!(!a.equivalent_to(b));
            }
        }
    }

    #[test]
    fn test_duplicate_jump_narrows_and_retries() {
        // Arrange
        let graph = Graph::with_vertices(3);
        let batch = [[1, 1, 2], [1, 2, 1]]
            .iter()
            .map(|m| Discovered {
                clustering: clustering(m),
                diversity_lower_bound: 1,
            })
            .collect();
        let search = ScriptedSearch {
            batches: VecDeque::from(vec![batch]),
            calls: 0,
        };
        // same partition as the neighbor [1, 1, 2]
        let duplicate = [2, 2, 1];
        let mut solver = ScriptedSolver::replying(vec![found(&duplicate), found(&duplicate), found(&[1, 2, 2])]);
        let config = EnumerationConfig {
            solution_limit: Some(4),
            exclusion_strategy: ExclusionStrategy::NarrowOnDuplicate,
            ..EnumerationConfig::default()
        };
        let controller =
            EnumerationController::new(&graph, clustering(&[1, 1, 1]), config, &mut solver, search, NullSink).unwrap();

        // Act
        let enumeration = controller.run().unwrap();

        // Assert
        assert_eq!(enumeration.registry.len(), 4);
        assert_eq!(enumeration.report.jump_queries, 3);
        assert_eq!(enumeration.report.duplicate_jumps, 2);
        assert_eq!(enumeration.report.jump_solutions, 1);
        assert_eq!(enumeration.report.termination, Termination::BudgetExceeded(BudgetKind::Solutions));
        let duplicate_vector = clustering(&duplicate).to_edge_indicators();
        assert_eq!(solver.seen_exclusions[0].len(), 3);
        assert!(solver.seen_exclusions[0].contains(&duplicate_vector));
        assert_eq!(solver.seen_exclusions[1], vec![duplicate_vector.clone()]);
        assert_eq!(solver.seen_exclusions[2], vec![duplicate_vector]);
        assert!(enumeration.registry.contains(&clustering(&[1, 2, 2])));
    }

    #[test]
    fn test_full_registry_never_narrows() {
        // Arrange
        let graph = Graph::with_vertices(3);
        let mut solver = ScriptedSolver::replying(vec![found(&[1, 1, 1]), found(&[1, 2, 1])]);
        let config = EnumerationConfig {
            exclusion_strategy: ExclusionStrategy::FullRegistry,
            ..EnumerationConfig::default()
        };
        let controller = EnumerationController::new(
            &graph,
            clustering(&[1, 1, 1]),
            config,
            &mut solver,
            ScriptedSearch::default(),
            NullSink,
        )
        .unwrap();

        // Act
        let enumeration = controller.run().unwrap();

        // Assert
        assert_eq!(enumeration.report.termination, Termination::Exhausted);
        assert_eq!(enumeration.report.jump_queries, 3);
        assert_eq!(solver.seen_exclusions[1].len(), 1);
        assert_eq!(solver.seen_exclusions[2].len(), 2);
    }

    #[test]
    fn test_single_optimum_is_exhausted_after_one_jump() {
        // Arrange
        let graph = gen_planted_graph(&[3, 2]);
        let controller = EnumerationController::new(
            &graph,
            clustering(&[1, 1, 1, 2, 2]),
            EnumerationConfig::default(),
            ExhaustiveSolver::new(),
            EditNeighborhoodSearch::new(),
            NullSink,
        )
        .unwrap();

        // Act
        let enumeration = controller.run().unwrap();

        // Assert
        assert_eq!(enumeration.registry.len(), 1);
        assert_eq!(enumeration.report.jump_queries, 1);
        assert_eq!(enumeration.report.termination, Termination::Exhausted);
        assert_eq!(enumeration.report.optimal_imbalance, 0.0);
    }

    #[test]
    fn test_path_triangle_complete_enumeration() {
        // Arrange
        let graph = path_triangle();
        let controller = EnumerationController::new(
            &graph,
            clustering(&[1, 1, 1]),
            EnumerationConfig::default(),
            ExhaustiveSolver::new(),
            EditNeighborhoodSearch::new(),
            NullSink,
        )
        .unwrap();

        // Act
        let enumeration = controller.run().unwrap();

        // Assert
        assert_eq!(enumeration.report.termination, Termination::Exhausted);
        assert_eq!(enumeration.registry.len(), 3);
        for expected in [[1, 1, 1], [1, 1, 2], [1, 2, 2]] {
            assert!(enumeration.registry.contains(&clustering(&expected)));
        }
        assert_registry_is_sound(&graph, &enumeration.registry, 1.0);
    }

    #[test]
    fn test_jumps_alone_enumerate_every_optimum() {
        // Arrange
        let graph = path_triangle();
        let mut search = ScriptedSearch::default();
        let controller = EnumerationController::new(
            &graph,
            clustering(&[1, 2, 2]),
            EnumerationConfig::default(),
            ExhaustiveSolver::new(),
            &mut search,
            NullSink,
        )
        .unwrap();

        // Act
        let enumeration = controller.run().unwrap();

        // Assert
        assert_eq!(enumeration.registry.len(), 3);
        assert_eq!(enumeration.report.jump_solutions, 2);
        assert_eq!(enumeration.report.jump_queries, 3);
        assert_eq!(enumeration.report.passes, 3);
        assert_eq!(search.calls, 3);
        assert_registry_is_sound(&graph, &enumeration.registry, 1.0);
    }

    #[test]
    fn test_every_partition_of_edgeless_graph_is_found() {
        // Arrange
        let graph = Graph::with_vertices(4);
        let neighborhood = EnumerationController::new(
            &graph,
            clustering(&[1, 1, 1, 1]),
            EnumerationConfig::default(),
            ExhaustiveSolver::new(),
            EditNeighborhoodSearch::new(),
            NullSink,
        )
        .unwrap();
        let jumps_only = EnumerationController::new(
            &graph,
            clustering(&[1, 2, 3, 4]),
            EnumerationConfig {
                exclusion_strategy: ExclusionStrategy::FullRegistry,
                ..EnumerationConfig::default()
            },
            ExhaustiveSolver::stateless(),
            ScriptedSearch::default(),
            NullSink,
        )
        .unwrap();

        // Act
        let neighborhood = neighborhood.run().unwrap();
        let jumps_only = jumps_only.run().unwrap();

        // Assert
        // Bell number B(4)
        assert_eq!(neighborhood.registry.len(), 15);
        assert_eq!(neighborhood.report.neighborhood_solutions, 14);
        assert_eq!(jumps_only.registry.len(), 15);
        assert_eq!(jumps_only.report.jump_queries, 15);
        assert_registry_is_sound(&graph, &neighborhood.registry, 0.0);
        assert_registry_is_sound(&graph, &jumps_only.registry, 0.0);
    }

    #[test]
    fn test_solution_limit_is_respected() {
        // Arrange
        let graph = Graph::with_vertices(4);
        let config = EnumerationConfig {
            solution_limit: Some(5),
            ..EnumerationConfig::default()
        };
        let controller = EnumerationController::new(
            &graph,
            clustering(&[1, 1, 1, 1]),
            config,
            ExhaustiveSolver::new(),
            EditNeighborhoodSearch::new(),
            NullSink,
        )
        .unwrap();

        // Act
        let enumeration = controller.run().unwrap();

        // Assert
        assert_eq!(enumeration.registry.len(), 5);
        assert_eq!(enumeration.report.jump_queries, 0);
        assert_eq!(enumeration.report.termination, Termination::BudgetExceeded(BudgetKind::Solutions));
    }

    #[test]
    fn test_oversized_batch_is_truncated() {
        // Arrange
        let graph = Graph::with_vertices(3);
        let batch = [[1, 1, 2], [1, 2, 1], [1, 2, 2], [1, 2, 3]]
            .iter()
            .map(|m| Discovered {
                clustering: clustering(m),
                diversity_lower_bound: 1,
            })
            .collect();
        let search = ScriptedSearch {
            batches: VecDeque::from(vec![batch]),
            calls: 0,
        };
        let config = EnumerationConfig {
            solution_limit: Some(3),
            ..EnumerationConfig::default()
        };
        let controller =
            EnumerationController::new(&graph, clustering(&[1, 1, 1]), config, ScriptedSolver::default(), search, NullSink)
                .unwrap();

        // Act
        let enumeration = controller.run().unwrap();

        // Assert
        assert_eq!(enumeration.registry.len(), 3);
        assert_eq!(enumeration.report.neighborhood_solutions, 2);
    }

    #[test]
    fn test_zero_time_limit_stops_before_any_phase() {
        // Arrange
        let graph = path_triangle();
        let mut solver = ScriptedSolver::default();
        let config = EnumerationConfig {
            time_limit: Some(Duration::ZERO),
            ..EnumerationConfig::default()
        };
        let controller =
            EnumerationController::new(&graph, clustering(&[1, 1, 1]), config, &mut solver, ScriptedSearch::default(), NullSink)
                .unwrap();

        // Act
        let enumeration = controller.run().unwrap();

        // Assert
        assert_eq!(enumeration.report.termination, Termination::BudgetExceeded(BudgetKind::Time));
        assert_eq!(enumeration.report.passes, 0);
        assert!(solver.seen_exclusions.is_empty());
    }

    #[test]
    fn test_timed_out_jump_with_time_left_continues() {
        // Arrange
        let graph = path_triangle();
        let mut solver = ScriptedSolver::replying(vec![JumpOutcome::without_solution(JumpStatus::TimedOut)]);
        let controller = EnumerationController::new(
            &graph,
            clustering(&[1, 1, 1]),
            EnumerationConfig::default(),
            &mut solver,
            ScriptedSearch::default(),
            NullSink,
        )
        .unwrap();

        // Act
        let enumeration = controller.run().unwrap();

        // Assert
        assert_eq!(enumeration.report.passes, 2);
        assert_eq!(enumeration.report.jump_queries, 2);
        assert_eq!(enumeration.report.termination, Termination::Exhausted);
        assert_eq!(solver.seen_roots, vec![RootAlgorithm::Network, RootAlgorithm::Dual]);
    }

    #[test]
    fn test_non_optimal_jump_is_inconsistent() {
        // Arrange
        let graph = path_triangle();
        let controller = EnumerationController::new(
            &graph,
            clustering(&[1, 1, 1]),
            EnumerationConfig::default(),
            ScriptedSolver::replying(vec![found(&[1, 2, 3])]),
            ScriptedSearch::default(),
            NullSink,
        )
        .unwrap();

        // Act
        let result = controller.run();

        // Assert
        match result {
            Err(Error::SolverInconsistency { expected, actual }) => {
                assert_abs_diff_eq!(expected, 1.0);
                assert_abs_diff_eq!(actual, 2.0);
            }
            other => panic!("expected an inconsistency, got {:?}", other.map(|e| e.report)),
        }
    }

    #[test]
    fn test_solver_failures_abort() {
        let graph = path_triangle();
        let run = |reply: JumpOutcome| {
            EnumerationController::new(
                &graph,
                clustering(&[1, 1, 1]),
                EnumerationConfig::default(),
                ScriptedSolver::replying(vec![reply]),
                ScriptedSearch::default(),
                NullSink,
            )
            .unwrap()
            .run()
        };

        assert!(matches!(
            run(JumpOutcome::without_solution(JumpStatus::Error("license".to_string()))),
            Err(Error::Solver(_))
        ));
        assert!(matches!(
            run(JumpOutcome::without_solution(JumpStatus::Optimal)),
            Err(Error::Solver(_))
        ));
    }

    #[test]
    fn test_non_optimal_neighbor_is_rejected() {
        // Arrange
        let graph = path_triangle();
        let search = ScriptedSearch {
            batches: VecDeque::from(vec![vec![Discovered {
                clustering: clustering(&[1, 2, 3]),
                diversity_lower_bound: 2,
            }]]),
            calls: 0,
        };
        let controller = EnumerationController::new(
            &graph,
            clustering(&[1, 1, 1]),
            EnumerationConfig::default(),
            ScriptedSolver::default(),
            search,
            NullSink,
        )
        .unwrap();

        // Act and Assert
        assert!(matches!(controller.run(), Err(Error::Collaborator(_))));
    }

    #[test]
    fn test_neighbor_with_stale_cached_imbalance_is_rejected() {
        // Arrange
        let graph = path_triangle();
        // imbalance 1 on this graph, 2 on the path triangle
        let other_graph = Graph::from_edges(3, &[(0, 1, 1.0)]);
        let stale = Clustering::with_imbalance(vec![1, 2, 3], &other_graph).unwrap();
        assert_eq!(stale.imbalance(), Some(1.0));
        let search = ScriptedSearch {
            batches: VecDeque::from(vec![vec![Discovered {
                clustering: stale,
                diversity_lower_bound: 1,
            }]]),
            calls: 0,
        };
        let controller = EnumerationController::new(
            &graph,
            clustering(&[1, 1, 1]),
            EnumerationConfig::default(),
            ScriptedSolver::default(),
            search,
            NullSink,
        )
        .unwrap();

        // Act and Assert
        assert!(matches!(controller.run(), Err(Error::Collaborator(_))));
    }

    #[test]
    fn test_initial_imbalance_is_recomputed() {
        let graph = path_triangle();
        let other_graph = Graph::with_vertices(3);
        let initial = Clustering::with_imbalance(vec![1, 1, 1], &other_graph).unwrap();

        let enumeration = EnumerationController::new(
            &graph,
            initial,
            EnumerationConfig::default(),
            ScriptedSolver::default(),
            ScriptedSearch::default(),
            NullSink,
        )
        .unwrap()
        .run()
        .unwrap();

        assert_abs_diff_eq!(enumeration.report.optimal_imbalance, 1.0);
    }

    #[test]
    fn test_known_neighbors_are_not_counted_twice() {
        // Arrange
        let graph = Graph::with_vertices(3);
        let batch = [[1, 1, 1], [2, 1, 2], [1, 2, 1]]
            .iter()
            .map(|m| Discovered {
                clustering: clustering(m),
                diversity_lower_bound: 1,
            })
            .collect();
        let search = ScriptedSearch {
            batches: VecDeque::from(vec![batch]),
            calls: 0,
        };
        let controller = EnumerationController::new(
            &graph,
            clustering(&[1, 1, 1]),
            EnumerationConfig::default(),
            ScriptedSolver::default(),
            search,
            NullSink,
        )
        .unwrap();

        // Act
        let enumeration = controller.run().unwrap();

        // Assert
        assert_eq!(enumeration.registry.len(), 2);
        assert_eq!(enumeration.report.neighborhood_solutions, 1);
    }

    #[test]
    fn test_mismatched_initial_membership() {
        let graph = path_triangle();
        let result = EnumerationController::new(
            &graph,
            clustering(&[1, 1]),
            EnumerationConfig::default(),
            ScriptedSolver::default(),
            ScriptedSearch::default(),
            NullSink,
        );
        assert!(matches!(result, Err(Error::InvalidMembership(_))));
    }

    #[test]
    fn test_run_persists_to_directory() {
        // Arrange
        let temp_dir = tempdir().unwrap();
        let graph = path_triangle();
        let sink = DirectorySink::create(temp_dir.path()).unwrap();
        let controller = EnumerationController::new(
            &graph,
            clustering(&[1, 1, 1]),
            EnumerationConfig::default(),
            ExhaustiveSolver::new(),
            EditNeighborhoodSearch::new(),
            sink,
        )
        .unwrap();

        // Act
        let enumeration = controller.run().unwrap();

        // Assert
        for index in 0..3 {
            assert!(temp_dir.path().join(format!("membership{}.txt", index)).exists());
        }
        assert_eq!(read_manifest(&temp_dir.path().join(ASSOC_FILE)).unwrap().len(), 2);
        assert_eq!(fs::read_to_string(temp_dir.path().join("jump-status1.txt")).unwrap(), "Infeasible");
        let summary: EnumerationReport =
            serde_json::from_str(&fs::read_to_string(temp_dir.path().join(SUMMARY_FILE)).unwrap()).unwrap();
        assert_eq!(summary.termination, Termination::Exhausted);
        assert_eq!(summary.total_solutions, enumeration.registry.len());
    }

    #[test]
    fn test_legacy_limits() {
        assert_eq!(EnumerationConfig::time_limit_from_secs(-1.0), None);
        assert_eq!(EnumerationConfig::time_limit_from_secs(0.0), None);
        assert_eq!(EnumerationConfig::time_limit_from_secs(2.5), Some(Duration::from_millis(2500)));
        assert_eq!(EnumerationConfig::solution_limit_from(-1), None);
        assert_eq!(EnumerationConfig::solution_limit_from(0), None);
        assert_eq!(EnumerationConfig::solution_limit_from(7), Some(7));
    }
}
