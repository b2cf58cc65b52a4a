//! Structural patterns in flowcharts

use indexmap::IndexMap;
use tracing::{span, trace, Level};

use super::model::{FlowDiagram, FlowEdge, FlowShape};
use crate::core::DiagramKind;
use crate::patterns::{ratio, PatternDetector, PatternMatch, IF_ELSE, SEQUENTIAL_CHAIN, WHILE_LOOP};

type Outgoing<'a> = IndexMap<&'a str, Vec<&'a FlowEdge>>;

fn successors<'a>(outgoing: &Outgoing<'a>, id: &str) -> Vec<&'a str> {
    outgoing
        .get(id)
        .map(|edges| edges.iter().map(|e| e.to.as_str()).collect())
        .unwrap_or_default()
}

/// Whether `goal` is reachable from `start` along outgoing edges
fn reaches(outgoing: &Outgoing<'_>, start: &str, goal: &str) -> bool {
    let mut visited: Vec<&str> = Vec::new();
    let mut queue = vec![start];
    while let Some(current) = queue.pop() {
        if current == goal {
            return true;
        }
        if visited.contains(&current) {
            continue;
        }
        visited.push(current);
        queue.extend(successors(outgoing, current));
    }
    false
}

/// Decisions with exactly two outgoing edges, with those edges
fn two_way_decisions<'a>(diagram: &'a FlowDiagram, outgoing: &Outgoing<'a>) -> Vec<(&'a str, &'a FlowEdge, &'a FlowEdge)> {
    diagram
        .nodes
        .iter()
        .filter(|n| n.shape == FlowShape::Decision)
        .filter_map(|n| match outgoing.get(n.id.as_str()).map(|e| e.as_slice()) {
            Some(&[first, second]) => Some((n.id.as_str(), first, second)),
            _ => None,
        })
        .collect()
}

/// Decision whose two process branches meet again
pub fn if_else(diagram: &FlowDiagram) -> Option<PatternMatch> {
    let outgoing = diagram.outgoing();
    for (decision, first, second) in two_way_decisions(diagram, &outgoing) {
        let (mut yes, mut no) = (first, second);
        if no.is_affirmative() && !yes.is_affirmative() {
            std::mem::swap(&mut yes, &mut no);
        }
        if yes.to == no.to || yes.to == decision || no.to == decision {
            continue;
        }
        let is_process = |id: &str| diagram.node(id).is_some_and(|n| n.shape.is_process());
        if !is_process(yes.to.as_str()) || !is_process(no.to.as_str()) {
            continue;
        }

        let after_no = successors(&outgoing, &no.to);
        let merge = successors(&outgoing, &yes.to)
            .into_iter()
            .find(|m| after_no.contains(m) && *m != decision);
        if let Some(merge) = merge {
            trace!(decision, merge, "If/else candidate");
            return Some(
                PatternMatch::new(IF_ELSE)
                    .with_role("decision", decision)
                    .with_role("true_process", yes.to.as_str())
                    .with_role("false_process", no.to.as_str())
                    .with_role("merge", merge)
                    .with_score(1.0),
            );
        }
    }
    None
}

/// Decision with one branch looping back to it
pub fn while_loop(diagram: &FlowDiagram) -> Option<PatternMatch> {
    let outgoing = diagram.outgoing();
    for (condition, first, second) in two_way_decisions(diagram, &outgoing) {
        for (body, exit) in [(first, second), (second, first)] {
            if body.to == condition || exit.to == condition || body.to == exit.to {
                continue;
            }
            if reaches(&outgoing, &body.to, condition) && !reaches(&outgoing, &exit.to, condition) {
                trace!(condition, body = %body.to, "While loop candidate");
                return Some(
                    PatternMatch::new(WHILE_LOOP)
                        .with_role("condition", condition)
                        .with_role("body", body.to.as_str())
                        .with_role("exit", exit.to.as_str())
                        .with_score(1.0),
                );
            }
        }
    }
    None
}

/// Longest straight run from an entry node
pub fn sequential_chain(diagram: &FlowDiagram) -> Option<PatternMatch> {
    let outgoing = diagram.outgoing();
    let mut entries: Vec<&str> = diagram
        .nodes
        .iter()
        .filter(|n| n.shape == FlowShape::Start)
        .map(|n| n.id.as_str())
        .collect();
    if entries.is_empty() {
        entries = diagram
            .nodes
            .iter()
            .filter(|n| !diagram.valid_edges().any(|e| e.to == n.id && e.from != n.id))
            .map(|n| n.id.as_str())
            .collect();
    }

    let mut best: Vec<&str> = Vec::new();
    for entry in entries {
        let mut run = vec![entry];
        let mut current = entry;
        while let Some(&[edge]) = outgoing.get(current).map(|e| e.as_slice()) {
            let next = edge.to.as_str();
            if run.contains(&next) {
                break;
            }
            run.push(next);
            current = next;
        }
        if run.len() > best.len() {
            best = run;
        }
    }

    if best.len() < 2 {
        return None;
    }
    Some(
        PatternMatch::new(SEQUENTIAL_CHAIN)
            .with_indexed_roles("step", best.as_slice(), 6)
            .with_score(ratio(best.len().min(6), diagram.nodes.len())),
    )
}

/// Runs every flowchart detector
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowPatternDetector;

impl FlowPatternDetector {
    pub fn new() -> Self {
        Self
    }
}

impl PatternDetector<FlowDiagram> for FlowPatternDetector {
    fn detect(&self, diagram: &FlowDiagram) -> Vec<PatternMatch> {
        let detect_span = span!(Level::DEBUG, "detect_flow_patterns", node_count = diagram.nodes.len());
        let _enter = detect_span.enter();

        [if_else(diagram), while_loop(diagram), sequential_chain(diagram)]
            .into_iter()
            .flatten()
            .collect()
    }

    fn kind(&self) -> DiagramKind {
        DiagramKind::Flow
    }
}
