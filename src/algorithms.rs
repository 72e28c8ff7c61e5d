use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use crate::clustering::{Clustering, EdgeIndicators};
use crate::error::Result;
use crate::graph::Graph;
use crate::registry::Registry;

mod controller;
mod edit_neighborhood;
mod exhaustive_solver;
mod external_search;

pub use controller::{
    BudgetKind, Enumeration, EnumerationConfig, EnumerationController, EnumerationReport, Termination,
};
pub use edit_neighborhood::EditNeighborhoodSearch;
pub use exhaustive_solver::ExhaustiveSolver;
pub use external_search::ExternalNeighborhoodSearch;

/// Status reported by an exact solver for one jump query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JumpStatus {
    /// A solution was found and proven optimal.
    Optimal,
    /// The solver stopped at its solution cap with a feasible solution.
    SolutionLimitReached,
    /// No solution satisfies the constraints.
    Infeasible,
    /// The time limit elapsed before any conclusion.
    TimedOut,
    /// The solver failed.
    Error(String),
}

impl JumpStatus {
    /// Whether the outcome carries a solution.
    pub fn is_feasible(&self) -> bool {
        matches!(self, JumpStatus::Optimal | JumpStatus::SolutionLimitReached)
    }
}

impl fmt::Display for JumpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JumpStatus::Optimal => write!(f, "Optimal"),
            JumpStatus::SolutionLimitReached => write!(f, "SolLim"),
            JumpStatus::Infeasible => write!(f, "Infeasible"),
            JumpStatus::TimedOut => write!(f, "AbortTimeLim"),
            JumpStatus::Error(message) => write!(f, "Error: {}", message),
        }
    }
}

/// Root relaxation algorithm hint for the solver. Has no effect on results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootAlgorithm {
    Network,
    Dual,
}

/// Everything a solver needs to look for one more optimal clustering.
#[derive(Debug, Clone)]
pub struct JumpQuery<'a> {
    /// Imbalance every returned clustering must reach.
    pub optimal_imbalance: f64,

    /// Tolerance on the optimality constraint.
    pub tolerance: f64,

    /// Co-clustering patterns the returned clustering must differ from.
    pub exclusions: &'a [EdgeIndicators],

    /// Wall-clock budget for this query, `None` when unbounded.
    pub time_limit: Option<Duration>,

    /// Maximum number of feasible solutions to collect before stopping.
    pub solution_cap: usize,

    pub thread_count: usize,

    pub root_algorithm: RootAlgorithm,
}

/// Answer to a jump query.
#[derive(Debug, Clone, PartialEq)]
pub struct JumpOutcome {
    pub status: JumpStatus,

    /// Cluster label of each vertex, present for feasible statuses.
    pub membership: Option<Vec<usize>>,
}

impl JumpOutcome {
    pub fn found(status: JumpStatus, membership: Vec<usize>) -> Self {
        Self {
            status,
            membership: Some(membership),
        }
    }

    pub fn without_solution(status: JumpStatus) -> Self {
        Self {
            status,
            membership: None,
        }
    }
}

/// An exact solver able to find an optimal clustering outside an exclusion set.
pub trait JumpSolver {
    fn solve(&mut self, graph: &Graph, query: &JumpQuery<'_>) -> Result<JumpOutcome>;
}

impl<T: JumpSolver + ?Sized> JumpSolver for &mut T {
    fn solve(&mut self, graph: &Graph, query: &JumpQuery<'_>) -> Result<JumpOutcome> {
        (**self).solve(graph, query)
    }
}

/// Input of one neighborhood-search pass.
#[derive(Debug, Clone, Copy)]
pub struct NeighborhoodRequest<'a> {
    /// 1-based pass counter.
    pub pass: usize,

    pub graph: &'a Graph,

    /// Optimal clustering the search starts from.
    pub frontier: &'a Clustering,

    /// Every optimal clustering found so far, the frontier included.
    pub known: &'a Registry,

    pub optimal_imbalance: f64,

    pub tolerance: f64,

    /// Maximum number of single-vertex moves between two solutions.
    pub max_edit_distance: usize,

    pub remaining_time: Option<Duration>,

    /// How many more solutions may be reported, `None` when unbounded.
    pub remaining_solutions: Option<usize>,

    pub thread_count: usize,
}

/// An optimal clustering reported by a neighborhood search.
#[derive(Debug, Clone)]
pub struct Discovered {
    pub clustering: Clustering,

    /// Distinctness estimate computed by the search, passed through as is.
    pub diversity_lower_bound: i64,
}

/// Produces batches of optimal clusterings near a known one.
pub trait NeighborhoodSearch {
    fn explore(&mut self, request: &NeighborhoodRequest<'_>) -> Result<Vec<Discovered>>;
}

impl<T: NeighborhoodSearch + ?Sized> NeighborhoodSearch for &mut T {
    fn explore(&mut self, request: &NeighborhoodRequest<'_>) -> Result<Vec<Discovered>> {
        (**self).explore(request)
    }
}

/// Where an accepted solution came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionOrigin {
    Initial,
    Neighborhood { diversity_lower_bound: i64 },
    Jump { pass: usize },
}

/// Durable record of a run.
pub trait SolutionSink {
    /// Called once per accepted solution; `index` is its registry position.
    fn record_solution(&mut self, index: usize, clustering: &Clustering, origin: SolutionOrigin) -> Result<()>;

    /// Called after every jump query; `query` is its 1-based number.
    fn record_jump(&mut self, query: usize, status: &JumpStatus, elapsed: Duration) -> Result<()>;

    /// Called once when the run terminates.
    fn finish(&mut self, report: &EnumerationReport) -> Result<()>;
}

impl<T: SolutionSink + ?Sized> SolutionSink for &mut T {
    fn record_solution(&mut self, index: usize, clustering: &Clustering, origin: SolutionOrigin) -> Result<()> {
        (**self).record_solution(index, clustering, origin)
    }

    fn record_jump(&mut self, query: usize, status: &JumpStatus, elapsed: Duration) -> Result<()> {
        (**self).record_jump(query, status, elapsed)
    }

    fn finish(&mut self, report: &EnumerationReport) -> Result<()> {
        (**self).finish(report)
    }
}

/// A sink that keeps nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl SolutionSink for NullSink {
    fn record_solution(&mut self, _index: usize, _clustering: &Clustering, _origin: SolutionOrigin) -> Result<()> {
        Ok(())
    }

    fn record_jump(&mut self, _query: usize, _status: &JumpStatus, _elapsed: Duration) -> Result<()> {
        Ok(())
    }

    fn finish(&mut self, _report: &EnumerationReport) -> Result<()> {
        Ok(())
    }
}
