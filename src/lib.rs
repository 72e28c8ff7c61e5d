//! Enumeration of the optimal solutions of Correlation Clustering.
//!
//! Given a signed graph and one optimal clustering, the
//! [`EnumerationController`](algorithms::EnumerationController) alternates a
//! bounded neighborhood search with exact "jump" queries until every
//! clustering of the same imbalance has been found, or a budget runs out.

pub mod algorithms;
pub mod cluster_index;
pub mod clustering;
pub mod error;
pub mod exclusion;
pub mod gen_graph;
pub mod graph;
pub mod imbalance;
pub mod io;
pub mod registry;

pub use error::{Error, Result};
