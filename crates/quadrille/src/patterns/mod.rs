//! Structural pattern path
//!
//! Detectors recognise common motifs (inheritance trees, if/else diamonds,
//! request/response pairs, ...) purely from adjacency and bind the roles of
//! a registered template to diagram ids. The applier then scales that
//! template onto measured node sizes.

mod applier;
mod registry;

pub use applier::*;
pub use registry::*;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::DiagramKind;

/// Roles of a template bound to diagram ids, with a confidence score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    /// Name of the template this match is for
    pub template: String,
    /// role → diagram id, in role declaration order
    pub roles: IndexMap<String, String>,
    /// Confidence in [0, 1]
    pub score: f64,
}

impl PatternMatch {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            roles: IndexMap::new(),
            score: 0.0,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>, id: impl Into<String>) -> Self {
        self.roles.insert(role.into(), id.into());
        self
    }

    /// Bind `prefix_0`, `prefix_1`, ... to `ids`, stopping at `cap`
    pub fn with_indexed_roles<S: AsRef<str>>(mut self, prefix: &str, ids: &[S], cap: usize) -> Self {
        for (i, id) in ids.iter().take(cap).enumerate() {
            self.roles
                .insert(format!("{}_{}", prefix, i), id.as_ref().to_string());
        }
        self
    }

    /// Set the score, clamped to [0, 1]; NaN becomes 0
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, 1.0)
        };
        self
    }

    pub fn role(&self, role: &str) -> Option<&str> {
        self.roles.get(role).map(|s| s.as_str())
    }

    /// Role bound to a diagram id
    pub fn role_of(&self, id: &str) -> Option<&str> {
        self.roles
            .iter()
            .find(|(_, v)| v.as_str() == id)
            .map(|(k, _)| k.as_str())
    }

    /// True when every id is bound to some role
    pub fn covers<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> bool {
        ids.into_iter().all(|id| self.roles.values().any(|v| v == id))
    }
}

/// `count / total` clamped to [0, 1]; zero when `total` is zero
pub fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (count as f64 / total as f64).min(1.0)
    }
}

/// Structural detector over one diagram model
///
/// Implementations are pure: the same model always yields the same matches.
pub trait PatternDetector<M>: Send + Sync {
    /// Detect all motifs present in the model
    fn detect(&self, model: &M) -> Vec<PatternMatch>;

    /// Diagram kind this detector understands
    fn kind(&self) -> DiagramKind;
}

/// Pick the highest-scoring match.
///
/// Ties go to the template registered first; matches naming an unknown
/// template rank after every registered one.
pub fn select_best(matches: Vec<PatternMatch>, registry: &PatternRegistry) -> Option<PatternMatch> {
    let rank = |m: &PatternMatch| registry.position(&m.template).unwrap_or(usize::MAX);
    let mut best: Option<PatternMatch> = None;
    for candidate in matches {
        let better = match &best {
            None => true,
            Some(current) => {
                candidate.score > current.score
                    || (candidate.score == current.score && rank(&candidate) < rank(current))
            }
        };
        if better {
            best = Some(candidate);
        }
    }
    best
}
