//! Layout configuration
//!
//! Every tunable constant of the engine lives here. The defaults are the
//! empirically tuned values; none of them is an invariant.

use serde::{Deserialize, Serialize};

/// Barycenter sweep budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderingConfig {
    /// Iterations every graph gets
    pub base_iterations: usize,
    /// Graphs with more nodes than this get `large_graph_bonus` extra iterations
    pub large_graph_threshold: usize,
    pub large_graph_bonus: usize,
    /// Hard cap on iterations
    pub max_iterations: usize,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            base_iterations: 4,
            large_graph_threshold: 20,
            large_graph_bonus: 4,
            max_iterations: 20,
        }
    }
}

impl OrderingConfig {
    /// Number of down+up sweep pairs for a graph of this shape
    pub fn iterations(&self, layer_count: usize, node_count: usize) -> usize {
        let mut iterations = self.base_iterations + layer_count / 2;
        if node_count > self.large_graph_threshold {
            iterations += self.large_graph_bonus;
        }
        iterations.min(self.max_iterations)
    }
}

/// Router and connection-point settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Clearance kept between a routed segment and any obstacle
    pub margin: i32,
    /// Fractions of the span tried as Z-route midpoints, in order
    pub z_fractions: Vec<f64>,
    /// Share of a node's width used to spread top/bottom attachments
    pub horizontal_spread: f64,
    /// Share of a node's height used to spread left/right attachments
    pub vertical_spread: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            margin: 5,
            z_fractions: vec![0.5, 0.25, 0.75, 1.0 / 3.0, 2.0 / 3.0],
            horizontal_spread: 0.5,
            vertical_spread: 0.4,
        }
    }
}

/// When and how pattern templates replace the layered layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Lowest score a match needs before `LayoutStrategy::Auto` uses it
    pub min_score: f64,
    /// Require the match to bind every node of the diagram
    pub require_full_coverage: bool,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            min_score: 0.5,
            require_full_coverage: true,
        }
    }
}

/// How a renderer picks between layered and pattern layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutStrategy {
    /// Use a pattern when a good enough match exists
    #[default]
    Auto,
    /// Always use layered layout
    Heuristic,
    /// Require a pattern; the render call fails without one
    Pattern,
}

impl LayoutStrategy {
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Some(LayoutStrategy::Auto),
            "heuristic" | "layered" => Some(LayoutStrategy::Heuristic),
            "pattern" => Some(LayoutStrategy::Pattern),
            _ => None,
        }
    }
}

/// Top-level layout configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Horizontal gap between nodes in the same layer
    pub node_sep: i32,
    /// Vertical gap between layers
    pub rank_sep: i32,
    /// Canvas padding
    pub padding: i32,
    /// Pixels per display column of label text
    pub char_width: i32,
    /// Pixels per text line
    pub line_height: i32,
    /// Labels wider than this many columns wrap (0 = never)
    pub max_label_width: usize,
    pub min_node_width: i32,
    pub min_node_height: i32,
    pub strategy: LayoutStrategy,
    pub ordering: OrderingConfig,
    pub routing: RoutingConfig,
    pub patterns: PatternConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_sep: 40,
            rank_sep: 60,
            padding: 20,
            char_width: 8,
            line_height: 16,
            max_label_width: 30,
            min_node_width: 60,
            min_node_height: 36,
            strategy: LayoutStrategy::Auto,
            ordering: OrderingConfig::default(),
            routing: RoutingConfig::default(),
            patterns: PatternConfig::default(),
        }
    }
}

impl LayoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, strategy: LayoutStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_spacing(mut self, node_sep: i32, rank_sep: i32) -> Self {
        self.node_sep = node_sep;
        self.rank_sep = rank_sep;
        self
    }

    pub fn with_ordering(mut self, ordering: OrderingConfig) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_routing(mut self, routing: RoutingConfig) -> Self {
        self.routing = routing;
        self
    }

    pub fn with_patterns(mut self, patterns: PatternConfig) -> Self {
        self.patterns = patterns;
        self
    }
}
