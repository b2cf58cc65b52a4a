//! Barycenter ordering for edge crossing minimization
//!
//! Reorders nodes inside each layer by the mean position of their neighbours
//! in the adjacent layer, alternating downward and upward sweeps. The best
//! ordering seen is kept.

use std::collections::HashMap;

use tracing::{debug, span, trace, Level};

use crate::core::{Adjacency, OrderingConfig};

/// Count edge crossings between all adjacent layers.
///
/// For edges (a1→b1) and (a2→b2) with a1, a2 in layer L and b1, b2 in
/// layer L+1, they cross when a1 is left of a2 and b1 is right of b2, or
/// vice versa.
pub fn cross_count<S: AsRef<str>>(layers: &[Vec<S>], adjacency: &Adjacency) -> usize {
    layers
        .windows(2)
        .map(|pair| two_layer_cross_count(&pair[0], &pair[1], adjacency))
        .sum()
}

fn position_map<S: AsRef<str>>(layer: &[S]) -> HashMap<&str, usize> {
    layer
        .iter()
        .enumerate()
        .map(|(i, n)| (n.as_ref(), i))
        .collect()
}

/// Count crossings between two adjacent layers.
fn two_layer_cross_count<S: AsRef<str>>(north: &[S], south: &[S], adjacency: &Adjacency) -> usize {
    let south_pos = position_map(south);

    let mut edges: Vec<(usize, usize)> = Vec::new();
    for (np, n) in north.iter().enumerate() {
        for succ in adjacency.successors(n.as_ref()) {
            if let Some(&sp) = south_pos.get(succ.as_str()) {
                edges.push((np, sp));
            }
        }
    }

    // O(E²); layers here are small
    let mut crossings = 0;
    for i in 0..edges.len() {
        for j in (i + 1)..edges.len() {
            let (n1, s1) = edges[i];
            let (n2, s2) = edges[j];
            if (n1 < n2 && s1 > s2) || (n1 > n2 && s1 < s2) {
                crossings += 1;
            }
        }
    }
    crossings
}

/// Direction for barycenter calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepDirection {
    /// Look at predecessors (nodes in previous layer)
    Downward,
    /// Look at successors (nodes in next layer)
    Upward,
}

/// Compute barycenter values for nodes in a layer.
///
/// The barycenter of a node is the average position of its neighbours in
/// the reference layer. Returns None for nodes with no connection there.
pub fn compute_barycenters<S: AsRef<str>>(
    layer: &[S],
    ref_layer: &[S],
    adjacency: &Adjacency,
    direction: SweepDirection,
) -> Vec<Option<f64>> {
    let ref_pos = position_map(ref_layer);

    layer
        .iter()
        .map(|node| {
            let neighbors = match direction {
                SweepDirection::Downward => adjacency.predecessors(node.as_ref()),
                SweepDirection::Upward => adjacency.successors(node.as_ref()),
            };

            let positions: Vec<f64> = neighbors
                .iter()
                .filter_map(|n| ref_pos.get(n.as_str()).map(|&p| p as f64))
                .collect();

            if positions.is_empty() {
                None
            } else {
                Some(positions.iter().sum::<f64>() / positions.len() as f64)
            }
        })
        .collect()
}

/// Order nodes in a layer by their barycenter values.
///
/// A node without a barycenter uses its current index instead, so
/// unconnected nodes never swap with each other. The sort is stable.
pub fn order_layer_by_barycenter<S: Clone>(layer: &mut Vec<S>, barycenters: &[Option<f64>]) {
    let mut entries: Vec<(f64, usize)> = (0..layer.len())
        .map(|i| (barycenters.get(i).copied().flatten().unwrap_or(i as f64), i))
        .collect();

    entries.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    *layer = entries.into_iter().map(|(_, i)| layer[i].clone()).collect();
}

fn sweep<S: AsRef<str> + Clone>(layers: &mut [Vec<S>], adjacency: &Adjacency, direction: SweepDirection) {
    let indices: Vec<usize> = match direction {
        SweepDirection::Downward => (1..layers.len()).collect(),
        SweepDirection::Upward => (0..layers.len() - 1).rev().collect(),
    };

    for layer_idx in indices {
        let ref_idx = match direction {
            SweepDirection::Downward => layer_idx - 1,
            SweepDirection::Upward => layer_idx + 1,
        };
        let barycenters =
            compute_barycenters(&layers[layer_idx], &layers[ref_idx], adjacency, direction);
        let mut layer = layers[layer_idx].clone();
        order_layer_by_barycenter(&mut layer, &barycenters);
        layers[layer_idx] = layer;
    }
}

/// Apply barycenter ordering to minimize edge crossings.
///
/// Each iteration is one downward sweep followed by one upward sweep. Keeps
/// the best ordering found; ties keep the earlier one.
///
/// Returns the crossing count of the best ordering found.
pub fn order_layers_barycenter<S: AsRef<str> + Clone>(
    adjacency: &Adjacency,
    layers: &mut Vec<Vec<S>>,
    iterations: usize,
) -> usize {
    if layers.len() < 2 {
        return 0;
    }

    let mut best_layers = layers.clone();
    let mut best_cc = cross_count(layers, adjacency);

    for i in 0..iterations {
        if best_cc == 0 {
            break;
        }

        sweep(layers, adjacency, SweepDirection::Downward);
        sweep(layers, adjacency, SweepDirection::Upward);

        let cc = cross_count(layers, adjacency);
        trace!(iteration = i, crossings = cc, "Barycenter sweep");
        if cc < best_cc {
            best_layers = layers.clone();
            best_cc = cc;
        }
    }

    *layers = best_layers;
    best_cc
}

/// Reorder layers with the iteration budget from `config`
pub fn reorder(
    mut layers: Vec<Vec<String>>,
    adjacency: &Adjacency,
    config: &OrderingConfig,
) -> Vec<Vec<String>> {
    let node_count: usize = layers.iter().map(|l| l.len()).sum();
    let iterations = config.iterations(layers.len(), node_count);

    let ordering_span = span!(
        Level::DEBUG,
        "reorder",
        layers = layers.len(),
        nodes = node_count,
        iterations
    );
    let _enter = ordering_span.enter();

    let crossings = order_layers_barycenter(adjacency, &mut layers, iterations);
    debug!(crossings, "Crossing minimization completed");
    layers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjacency(edges: &[(&str, &str)]) -> Adjacency {
        let mut adj = Adjacency::new();
        for (from, to) in edges {
            adj.add(from, to);
        }
        adj
    }

    // =========================================================================
    // Cross count
    // =========================================================================

    #[test]
    fn test_cross_count_no_crossings() {
        let adj = adjacency(&[("A", "C"), ("B", "D")]);
        let layers = vec![vec!["A", "B"], vec!["C", "D"]];
        assert_eq!(cross_count(&layers, &adj), 0);
    }

    #[test]
    fn test_cross_count_one_crossing() {
        let adj = adjacency(&[("A", "D"), ("B", "C")]);
        let layers = vec![vec!["A", "B"], vec!["C", "D"]];
        assert_eq!(cross_count(&layers, &adj), 1);
    }

    #[test]
    fn test_cross_count_multi_layer() {
        let adj = adjacency(&[("A", "D"), ("B", "C"), ("C", "F"), ("D", "E")]);
        let layers = vec![vec!["A", "B"], vec!["C", "D"], vec!["E", "F"]];
        assert_eq!(cross_count(&layers, &adj), 2);
    }

    #[test]
    fn test_cross_count_empty_layers() {
        let layers: Vec<Vec<&str>> = vec![];
        assert_eq!(cross_count(&layers, &Adjacency::new()), 0);
    }

    // =========================================================================
    // Barycenters
    // =========================================================================

    #[test]
    fn test_barycenter_no_predecessors() {
        let adj = adjacency(&[]);
        let bcs = compute_barycenters(&["B"], &["A"], &adj, SweepDirection::Downward);
        assert_eq!(bcs, vec![None]);
    }

    #[test]
    fn test_barycenter_multiple_predecessors() {
        let adj = adjacency(&[("A", "D"), ("C", "D")]);
        let bcs = compute_barycenters(&["D"], &["A", "B", "C"], &adj, SweepDirection::Downward);
        assert_eq!(bcs, vec![Some(1.0)]);
    }

    #[test]
    fn test_barycenter_upward_direction() {
        let adj = adjacency(&[("A", "B")]);
        let bcs = compute_barycenters(&["A"], &["B"], &adj, SweepDirection::Upward);
        assert_eq!(bcs, vec![Some(0.0)]);
    }

    #[test]
    fn test_barycenter_mixed_connectivity() {
        let adj = adjacency(&[("A", "D"), ("A", "E"), ("C", "F")]);
        let bcs = compute_barycenters(
            &["D", "E", "F"],
            &["A", "B", "C"],
            &adj,
            SweepDirection::Downward,
        );
        assert_eq!(bcs, vec![Some(0.0), Some(0.0), Some(2.0)]);
    }

    // =========================================================================
    // Single layer ordering
    // =========================================================================

    #[test]
    fn test_order_by_barycenter_simple() {
        let mut layer = vec!["A", "B", "C"];
        order_layer_by_barycenter(&mut layer, &[Some(2.0), Some(0.5), Some(1.0)]);
        assert_eq!(layer, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_order_by_barycenter_tie_breaking() {
        let mut layer = vec!["A", "B"];
        order_layer_by_barycenter(&mut layer, &[Some(1.0), Some(1.0)]);
        assert_eq!(layer, vec!["A", "B"]);
    }

    #[test]
    fn test_unconnected_node_keeps_index() {
        // B has no barycenter and stays at index 1
        let mut layer = vec!["A", "B", "C"];
        order_layer_by_barycenter(&mut layer, &[Some(2.0), None, Some(0.0)]);
        assert_eq!(layer, vec!["C", "B", "A"]);
    }

    #[test]
    fn test_order_by_barycenter_all_none() {
        let mut layer = vec!["A", "B", "C"];
        order_layer_by_barycenter(&mut layer, &[None, None, None]);
        assert_eq!(layer, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_order_by_barycenter_empty() {
        let mut layer: Vec<&str> = vec![];
        order_layer_by_barycenter(&mut layer, &[]);
        assert!(layer.is_empty());
    }

    // =========================================================================
    // Full ordering
    // =========================================================================

    #[test]
    fn test_order_layers_fixes_crossing() {
        let adj = adjacency(&[("A", "C"), ("B", "D")]);
        let mut layers = vec![vec!["A", "B"], vec!["D", "C"]];
        assert_eq!(cross_count(&layers, &adj), 1);

        let final_cc = order_layers_barycenter(&adj, &mut layers, 4);

        assert_eq!(final_cc, 0);
        assert_eq!(layers[1], vec!["C", "D"]);
    }

    #[test]
    fn test_order_layers_already_optimal_is_untouched() {
        let adj = adjacency(&[("A", "C"), ("B", "D")]);
        let mut layers = vec![vec!["A", "B"], vec!["C", "D"]];
        assert_eq!(order_layers_barycenter(&adj, &mut layers, 4), 0);
        assert_eq!(layers, vec![vec!["A", "B"], vec!["C", "D"]]);
    }

    #[test]
    fn test_order_layers_deterministic() {
        let adj = adjacency(&[("A", "D"), ("B", "C")]);
        let mut layers1 = vec![vec!["A", "B"], vec!["C", "D"]];
        let mut layers2 = layers1.clone();

        let cc1 = order_layers_barycenter(&adj, &mut layers1, 4);
        let cc2 = order_layers_barycenter(&adj, &mut layers2, 4);

        assert_eq!(cc1, cc2);
        assert_eq!(layers1, layers2);
    }

    #[test]
    fn test_order_layers_three_layers() {
        let adj = adjacency(&[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")]);
        let mut layers = vec![vec!["A"], vec!["C", "B"], vec!["D"]];
        assert_eq!(order_layers_barycenter(&adj, &mut layers, 4), 0);
    }

    #[test]
    fn test_order_layers_single_layer() {
        let mut layers = vec![vec!["A", "B"]];
        assert_eq!(order_layers_barycenter(&Adjacency::new(), &mut layers, 4), 0);
    }

    #[test]
    fn test_reorder_preserves_contents() {
        let adj = adjacency(&[("A", "E"), ("B", "D"), ("C", "D")]);
        let layers = vec![
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            vec!["D".to_string(), "E".to_string()],
        ];
        let result = reorder(layers.clone(), &adj, &OrderingConfig::default());
        assert_eq!(result.len(), 2);
        for (before, after) in layers.iter().zip(&result) {
            let mut b = before.clone();
            let mut a = after.clone();
            b.sort();
            a.sort();
            assert_eq!(a, b);
        }
        assert_eq!(cross_count(&result, &adj), 0);
    }
}
