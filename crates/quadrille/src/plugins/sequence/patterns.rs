//! Structural patterns in sequence diagrams
//!
//! Detection only looks at the order of messages between participants.

use tracing::{span, trace, Level};

use super::model::SequenceDiagram;
use crate::core::DiagramKind;
use crate::patterns::{ratio, PatternDetector, PatternMatch, CALLBACK, PARTICIPANT_CHAIN, REQUEST_RESPONSE};

/// Non-overlapping occurrences of `shape` in `messages`, where `shape` is a
/// run of `(from, to)` pairs written in terms of two participants
fn count_runs(messages: &[(&str, &str)], shape: &[(&str, &str)]) -> usize {
    let mut count = 0;
    let mut i = 0;
    while i + shape.len() <= messages.len() {
        if messages[i..i + shape.len()] == *shape {
            count += 1;
            i += shape.len();
        } else {
            i += 1;
        }
    }
    count
}

/// A message immediately answered in the other direction
pub fn request_response(diagram: &SequenceDiagram) -> Option<PatternMatch> {
    let messages = diagram.messages();
    let (client, server) = messages
        .windows(2)
        .find(|w| w[0].0 != w[0].1 && w[1] == (w[0].1, w[0].0))
        .map(|w| w[0])?;
    let covered = 2 * count_runs(&messages, &[(client, server), (server, client)]);
    trace!(client, server, covered, "Request/response candidate");
    Some(
        PatternMatch::new(REQUEST_RESPONSE)
            .with_role("client", client)
            .with_role("server", server)
            .with_score(ratio(covered, messages.len())),
    )
}

/// A call, a call back and a follow-up call
pub fn callback(diagram: &SequenceDiagram) -> Option<PatternMatch> {
    let messages = diagram.messages();
    let (caller, callee) = messages
        .windows(3)
        .find(|w| w[0].0 != w[0].1 && w[1] == (w[0].1, w[0].0) && w[2] == w[0])
        .map(|w| w[0])?;
    let covered = 3 * count_runs(
        &messages,
        &[(caller, callee), (callee, caller), (caller, callee)],
    );
    Some(
        PatternMatch::new(CALLBACK)
            .with_role("caller", caller)
            .with_role("callee", callee)
            .with_score(ratio(covered, messages.len())),
    )
}

/// Longest run of hand-offs A→B, B→C, ... visiting each participant once
pub fn chain(diagram: &SequenceDiagram) -> Option<PatternMatch> {
    let messages = diagram.messages();
    let mut best: Vec<&str> = Vec::new();
    for start in 0..messages.len() {
        let (first, second) = messages[start];
        if first == second {
            continue;
        }
        let mut run = vec![first, second];
        for &(from, to) in &messages[start + 1..] {
            if run.last() != Some(&from) || run.contains(&to) {
                break;
            }
            run.push(to);
        }
        if run.len() > best.len() {
            best = run;
        }
    }

    if best.len() < 3 {
        return None;
    }
    Some(
        PatternMatch::new(PARTICIPANT_CHAIN)
            .with_indexed_roles("p", best.as_slice(), 5)
            .with_score(ratio(best.len().min(5), diagram.participants.len())),
    )
}

/// Runs every sequence diagram detector
#[derive(Debug, Clone, Copy, Default)]
pub struct SequencePatternDetector;

impl SequencePatternDetector {
    pub fn new() -> Self {
        Self
    }
}

impl PatternDetector<SequenceDiagram> for SequencePatternDetector {
    fn detect(&self, diagram: &SequenceDiagram) -> Vec<PatternMatch> {
        let detect_span = span!(
            Level::DEBUG,
            "detect_sequence_patterns",
            participant_count = diagram.participants.len(),
            event_count = diagram.events.len()
        );
        let _enter = detect_span.enter();

        [request_response(diagram), callback(diagram), chain(diagram)]
            .into_iter()
            .flatten()
            .collect()
    }

    fn kind(&self) -> DiagramKind {
        DiagramKind::Sequence
    }
}
