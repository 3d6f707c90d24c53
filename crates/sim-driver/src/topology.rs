//! Link topologies for the two scenarios.

use rand::Rng;

/// Every distinct pair of miners is linked independently with probability
/// `edge_probability`.
pub fn random_graph(n: usize, edge_probability: f64, rng: &mut impl Rng) -> Vec<(usize, usize)> {
    let mut edges = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            if rng.gen_bool(edge_probability) {
                edges.push((i, j));
            }
        }
    }
    edges
}

/// Every pair of miners is linked.
pub fn complete_graph(n: usize) -> Vec<(usize, usize)> {
    let mut edges = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            edges.push((i, j));
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn complete_graph_has_all_pairs() {
        assert_eq!(complete_graph(3).len(), 3);
        assert_eq!(complete_graph(4).len(), 6);
    }

    #[test]
    fn random_graph_never_exceeds_complete_graph_size() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let edges = random_graph(5, 1.0, &mut rng);
        assert_eq!(edges.len(), complete_graph(5).len());
    }
}
