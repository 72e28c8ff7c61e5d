//! Error types for enumeration runs

use thiserror::Error;

/// Result type alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can abort an enumeration run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A membership vector (or membership file) does not describe a valid
    /// partition of the graph's vertices.
    #[error("invalid membership: {0}")]
    InvalidMembership(String),

    /// The input graph file is malformed.
    #[error("malformed graph input at line {line}: {reason}")]
    GraphParse { line: usize, reason: String },

    /// The solver returned a partition that is not optimal.
    #[error("solver returned a partition of imbalance {actual}, expected {expected}")]
    SolverInconsistency { expected: f64, actual: f64 },

    /// The solver reported an error, or a feasible status without a solution.
    #[error("solver failed: {0}")]
    Solver(String),

    /// The neighborhood search failed or produced unusable output.
    #[error("neighborhood search failed: {0}")]
    Collaborator(String),

    /// A move was evaluated from a cluster the vertex does not belong to.
    #[error("vertex {vertex} belongs to cluster {actual}, not {expected}")]
    ClusterMismatch {
        vertex: usize,
        expected: usize,
        actual: usize,
    },

    /// A cluster label outside the columns reserved by the aggregate index.
    #[error("cluster {cluster} is outside the index capacity ({capacity} clusters)")]
    ClusterOutOfRange { cluster: usize, capacity: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
