use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use crate::graph::Graph;

/// Generate a random signed graph.
///
/// Every vertex pair gets an edge with probability `density`, with a weight
/// drawn uniformly from `[-1, 1)`. The same seed always gives the same graph.
pub fn gen_signed_graph(no_of_vertices: usize, density: f64, seed: u64) -> Graph {
    let mut rng = SmallRng::seed_from_u64(seed);
    let density = density.clamp(0.0, 1.0);

    let mut edges = Vec::new();
    for i in 1..no_of_vertices {
        for j in 0..i {
            if rng.gen_bool(density) {
                edges.push((i, j, rng.gen_range(-1.0..1.0)));
            }
        }
    }

    Graph::from_edges(no_of_vertices, &edges)
}

/// Generate a complete graph with one positive clique per entry of
/// `group_sizes` and negative edges between cliques. The planted grouping is
/// the unique optimum, with imbalance zero.
pub fn gen_planted_graph(group_sizes: &[usize]) -> Graph {
    let no_of_vertices: usize = group_sizes.iter().sum();
    let mut group_of = Vec::with_capacity(no_of_vertices);
    for (group, &size) in group_sizes.iter().enumerate() {
        group_of.extend(std::iter::repeat(group).take(size));
    }

    let mut edges = Vec::new();
    for i in 1..no_of_vertices {
        for j in 0..i {
            let weight = if group_of[i] == group_of[j] { 1.0 } else { -1.0 };
            edges.push((i, j, weight));
        }
    }

    Graph::from_edges(no_of_vertices, &edges)
}
