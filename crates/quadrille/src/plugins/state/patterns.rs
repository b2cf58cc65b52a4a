//! Structural patterns in state diagrams
//!
//! Detection runs on the layout graph's view of the model: composites that
//! contain states are represented by their first leaf, and self-transitions
//! are ignored.

use indexmap::IndexMap;
use tracing::{span, trace, Level};

use super::model::{StateDiagram, StateKind};
use crate::core::DiagramKind;
use crate::patterns::{ratio, PatternDetector, PatternMatch, BINARY_CHOICE, LINEAR_CHAIN, STAR, STATE_LOOP};

/// Distinct successors and predecessors of every laid-out state
struct StateGraph<'a> {
    successors: IndexMap<&'a str, Vec<&'a str>>,
    predecessors: IndexMap<&'a str, Vec<&'a str>>,
}

impl<'a> StateGraph<'a> {
    fn new(diagram: &'a StateDiagram) -> Self {
        let ids = diagram
            .states
            .iter()
            .filter(|s| !diagram.is_container(&s.id))
            .map(|s| (s.id.as_str(), Vec::new()));
        let mut successors: IndexMap<&str, Vec<&str>> = ids.clone().collect();
        let mut predecessors: IndexMap<&str, Vec<&str>> = ids.collect();

        for transition in diagram.valid_transitions() {
            let from = diagram.layout_id(&transition.from);
            let to = diagram.layout_id(&transition.to);
            if from == to {
                continue;
            }
            if let Some(succ) = successors.get_mut(from) {
                if !succ.contains(&to) {
                    succ.push(to);
                }
            }
            if let Some(pred) = predecessors.get_mut(to) {
                if !pred.contains(&from) {
                    pred.push(from);
                }
            }
        }
        Self {
            successors,
            predecessors,
        }
    }

    fn len(&self) -> usize {
        self.successors.len()
    }

    fn succ(&self, id: &str) -> &[&'a str] {
        self.successors.get(id).map(|s| s.as_slice()).unwrap_or(&[])
    }

    fn pred(&self, id: &str) -> &[&'a str] {
        self.predecessors.get(id).map(|s| s.as_slice()).unwrap_or(&[])
    }

    /// First cycle closed by a back edge in depth-first order
    fn first_cycle(&self) -> Option<Vec<&'a str>> {
        let mut visited: Vec<&str> = Vec::new();
        for &root in self.successors.keys() {
            let mut path = Vec::new();
            if let Some(cycle) = self.dfs(root, &mut visited, &mut path) {
                return Some(cycle);
            }
        }
        None
    }

    fn dfs(&self, id: &'a str, visited: &mut Vec<&'a str>, path: &mut Vec<&'a str>) -> Option<Vec<&'a str>> {
        if let Some(start) = path.iter().position(|p| *p == id) {
            return Some(path[start..].to_vec());
        }
        if visited.contains(&id) {
            return None;
        }
        visited.push(id);
        path.push(id);
        for &next in self.succ(id) {
            if let Some(cycle) = self.dfs(next, visited, path) {
                return Some(cycle);
            }
        }
        path.pop();
        None
    }
}

/// Straight run from the initial state through single-exit states
pub fn linear_chain(diagram: &StateDiagram) -> Option<PatternMatch> {
    let graph = StateGraph::new(diagram);
    let initial = diagram
        .states
        .iter()
        .find(|s| s.kind == StateKind::Initial && graph.successors.contains_key(s.id.as_str()))
        .map(|s| s.id.as_str());
    let entry = initial.or_else(|| {
        graph
            .successors
            .keys()
            .copied()
            .find(|id| graph.pred(id).is_empty())
    })?;

    let mut run = vec![entry];
    let mut current = entry;
    while let &[next] = graph.succ(current) {
        if run.contains(&next) {
            break;
        }
        run.push(next);
        current = next;
    }
    if run.len() < 2 {
        return None;
    }
    Some(
        PatternMatch::new(LINEAR_CHAIN)
            .with_indexed_roles("state", run.as_slice(), 6)
            .with_score(ratio(run.len().min(6), graph.len())),
    )
}

/// State with two outgoing transitions whose targets meet again
pub fn binary_choice(diagram: &StateDiagram) -> Option<PatternMatch> {
    let graph = StateGraph::new(diagram);
    for (&source, succ) in &graph.successors {
        let &[a, b] = succ.as_slice() else {
            continue;
        };
        let after_b = graph.succ(b);
        let merge = graph
            .succ(a)
            .iter()
            .copied()
            .find(|m| after_b.contains(m) && *m != source);
        if let Some(merge) = merge {
            trace!(source, merge, "Binary choice candidate");
            return Some(
                PatternMatch::new(BINARY_CHOICE)
                    .with_role("source", source)
                    .with_role("option_a", a)
                    .with_role("option_b", b)
                    .with_role("merge", merge)
                    .with_score(1.0),
            );
        }
    }
    None
}

/// First cycle found by a depth-first walk
pub fn state_loop(diagram: &StateDiagram) -> Option<PatternMatch> {
    let graph = StateGraph::new(diagram);
    let cycle = graph.first_cycle()?;
    trace!(length = cycle.len(), "State loop candidate");
    Some(
        PatternMatch::new(STATE_LOOP)
            .with_indexed_roles("loop", cycle.as_slice(), 4)
            .with_score(ratio(cycle.len().min(4), graph.len())),
    )
}

/// State connected to at least four distinct neighbours
pub fn star(diagram: &StateDiagram) -> Option<PatternMatch> {
    let graph = StateGraph::new(diagram);
    let mut best: Option<(&str, Vec<&str>)> = None;
    for &id in graph.successors.keys() {
        let mut neighbours: Vec<&str> = graph.succ(id).to_vec();
        for &p in graph.pred(id) {
            if !neighbours.contains(&p) {
                neighbours.push(p);
            }
        }
        if neighbours.len() < 4 {
            continue;
        }
        if best.as_ref().map_or(true, |(_, b)| neighbours.len() > b.len()) {
            best = Some((id, neighbours));
        }
    }

    let (hub, spokes) = best?;
    Some(
        PatternMatch::new(STAR)
            .with_role("hub", hub)
            .with_indexed_roles("spoke", spokes.as_slice(), 6)
            .with_score(ratio(spokes.len().min(6), graph.len())),
    )
}

/// Runs every state diagram detector
#[derive(Debug, Clone, Copy, Default)]
pub struct StatePatternDetector;

impl StatePatternDetector {
    pub fn new() -> Self {
        Self
    }
}

impl PatternDetector<StateDiagram> for StatePatternDetector {
    fn detect(&self, diagram: &StateDiagram) -> Vec<PatternMatch> {
        let detect_span = span!(Level::DEBUG, "detect_state_patterns", state_count = diagram.states.len());
        let _enter = detect_span.enter();

        [
            linear_chain(diagram),
            binary_choice(diagram),
            state_loop(diagram),
            star(diagram),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn kind(&self) -> DiagramKind {
        DiagramKind::State
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::state::model::{StateNode, Transition};

    fn diagram(states: &[&str], transitions: &[(&str, &str)]) -> StateDiagram {
        StateDiagram {
            states: states.iter().map(|id| StateNode::simple(*id)).collect(),
            transitions: transitions
                .iter()
                .map(|(f, t)| Transition::new(*f, *t))
                .collect(),
        }
    }

    #[test]
    fn test_linear_chain_from_initial() {
        let mut d = diagram(&["x", "start", "a", "b"], &[("start", "a"), ("a", "b"), ("x", "a")]);
        d.states[1].kind = StateKind::Initial;
        let m = linear_chain(&d).unwrap();
        assert_eq!(m.role("state_0"), Some("start"));
        assert_eq!(m.role("state_2"), Some("b"));
        assert_eq!(m.score, 0.75);
    }

    #[test]
    fn test_long_chain_scores_placed_states_only() {
        let ids = ["s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7"];
        let transitions: Vec<(&str, &str)> = ids.windows(2).map(|w| (w[0], w[1])).collect();
        let m = linear_chain(&diagram(&ids, &transitions)).unwrap();
        assert_eq!(m.roles.len(), 6);
        assert_eq!(m.role("state_6"), None);
        assert_eq!(m.score, 0.75);
    }

    #[test]
    fn test_binary_choice() {
        let d = diagram(
            &["S", "A", "B", "M"],
            &[("S", "A"), ("S", "B"), ("A", "M"), ("B", "M")],
        );
        let m = binary_choice(&d).unwrap();
        assert_eq!(m.role("source"), Some("S"));
        assert_eq!(m.role("option_a"), Some("A"));
        assert_eq!(m.role("option_b"), Some("B"));
        assert_eq!(m.role("merge"), Some("M"));
    }

    #[test]
    fn test_state_loop() {
        let d = diagram(
            &["Idle", "Busy", "Done", "Off"],
            &[("Idle", "Busy"), ("Busy", "Done"), ("Done", "Idle"), ("Done", "Off")],
        );
        let m = state_loop(&d).unwrap();
        assert_eq!(m.role("loop_0"), Some("Idle"));
        assert_eq!(m.role("loop_2"), Some("Done"));
        assert_eq!(m.role("loop_3"), None);
        assert_eq!(m.score, 0.75);
    }

    #[test]
    fn test_self_transitions_are_not_loops() {
        let d = diagram(&["A", "B"], &[("A", "A"), ("A", "B")]);
        assert!(state_loop(&d).is_none());
    }

    #[test]
    fn test_star() {
        let d = diagram(
            &["Hub", "N", "E", "S", "W"],
            &[("Hub", "N"), ("Hub", "E"), ("S", "Hub"), ("W", "Hub")],
        );
        let m = star(&d).unwrap();
        assert_eq!(m.role("hub"), Some("Hub"));
        assert_eq!(m.role("spoke_0"), Some("N"));
        assert_eq!(m.role("spoke_2"), Some("S"));
        assert_eq!(m.score, 0.8);
    }

    #[test]
    fn test_container_is_represented_by_first_child() {
        let d = StateDiagram::new()
            .with_state(StateNode::new("Outer", StateKind::Composite))
            .with_state(StateNode::simple("In1").with_parent("Outer"))
            .with_state(StateNode::simple("After"))
            .with_transition(Transition::new("Outer", "After"));
        let m = linear_chain(&d).unwrap();
        assert_eq!(m.role("state_0"), Some("In1"));
        assert_eq!(m.role("state_1"), Some("After"));
        assert_eq!(m.score, 1.0);
    }
}
