//! Structural patterns in class diagrams

use indexmap::IndexMap;
use tracing::{span, trace, Level};

use super::model::{ClassDiagram, RelationKind};
use crate::core::DiagramKind;
use crate::patterns::{
    ratio, PatternDetector, PatternMatch, COMPOSITION, DIAMOND_INHERITANCE, INHERITANCE_TREE,
    INTERFACE_IMPLEMENTATION,
};

/// Group distinct `to`/`from` ids of matching relations by the other end
fn group_by<'a>(
    diagram: &'a ClassDiagram,
    keep: impl Fn(RelationKind) -> bool,
    by_target: bool,
) -> IndexMap<&'a str, Vec<&'a str>> {
    let mut groups: IndexMap<&str, Vec<&str>> = IndexMap::new();
    for relation in diagram.valid_relations().filter(|r| keep(r.kind)) {
        if relation.from == relation.to {
            continue;
        }
        let (key, member) = if by_target {
            (relation.to.as_str(), relation.from.as_str())
        } else {
            (relation.from.as_str(), relation.to.as_str())
        };
        let members = groups.entry(key).or_default();
        if !members.contains(&member) {
            members.push(member);
        }
    }
    groups
}

/// Largest group with at least two members; first one wins ties
fn largest<'a>(groups: &'a IndexMap<&'a str, Vec<&'a str>>) -> Option<(&'a str, &'a [&'a str])> {
    let mut best: Option<(&'a str, &'a [&'a str])> = None;
    for (key, members) in groups {
        if members.len() < 2 {
            continue;
        }
        if best.map_or(true, |(_, b)| members.len() > b.len()) {
            best = Some((*key, members.as_slice()));
        }
    }
    best
}

/// One parent with several `extends` children
pub fn inheritance_tree(diagram: &ClassDiagram) -> Option<PatternMatch> {
    let groups = group_by(diagram, |k| k == RelationKind::Extends, true);
    let (parent, children) = largest(&groups)?;
    trace!(parent, children = children.len(), "Inheritance tree candidate");
    Some(
        PatternMatch::new(INHERITANCE_TREE)
            .with_role("parent", parent)
            .with_indexed_roles("child", children, 4)
            .with_score(ratio(children.len().min(4), diagram.classes.len())),
    )
}

/// A class with two parents that share an ancestor
pub fn diamond_inheritance(diagram: &ClassDiagram) -> Option<PatternMatch> {
    let parents = group_by(diagram, |k| k.is_inheritance(), false);
    let parents_of = |id: &str| parents.get(id).map(|p| p.as_slice()).unwrap_or(&[]);

    for class in &diagram.classes {
        let direct = parents_of(class.id.as_str());
        if direct.len() < 2 {
            continue;
        }
        for (i, &left) in direct.iter().enumerate() {
            for &right in &direct[i + 1..] {
                let right_parents = parents_of(right);
                let shared = parents_of(left)
                    .iter()
                    .copied()
                    .find(|top| right_parents.contains(top) && *top != class.id);
                if let Some(top) = shared {
                    trace!(bottom = %class.id, top, "Diamond candidate");
                    return Some(
                        PatternMatch::new(DIAMOND_INHERITANCE)
                            .with_role("top", top)
                            .with_role("left", left)
                            .with_role("right", right)
                            .with_role("bottom", class.id.as_str())
                            .with_score(1.0),
                    );
                }
            }
        }
    }
    None
}

/// An interface implemented by several classes
pub fn interface_implementation(diagram: &ClassDiagram) -> Option<PatternMatch> {
    let mut groups = group_by(diagram, |k| k == RelationKind::Implements, true);
    groups.retain(|id, _| diagram.class(id).is_some_and(|c| c.is_interface()));
    let (interface, impls) = largest(&groups)?;
    Some(
        PatternMatch::new(INTERFACE_IMPLEMENTATION)
            .with_role("interface", interface)
            .with_indexed_roles("impl", impls, 4)
            .with_score(ratio(impls.len().min(4), diagram.classes.len())),
    )
}

/// A class owning or aggregating several parts
pub fn composition(diagram: &ClassDiagram) -> Option<PatternMatch> {
    let groups = group_by(diagram, |k| k.is_ownership(), false);
    let (owner, parts) = largest(&groups)?;
    Some(
        PatternMatch::new(COMPOSITION)
            .with_role("owner", owner)
            .with_indexed_roles("part", parts, 4)
            .with_score(ratio(parts.len().min(4), diagram.classes.len())),
    )
}

/// Runs every class diagram detector
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassPatternDetector;

impl ClassPatternDetector {
    pub fn new() -> Self {
        Self
    }
}

impl PatternDetector<ClassDiagram> for ClassPatternDetector {
    fn detect(&self, diagram: &ClassDiagram) -> Vec<PatternMatch> {
        let detect_span = span!(
            Level::DEBUG,
            "detect_class_patterns",
            class_count = diagram.classes.len()
        );
        let _enter = detect_span.enter();

        [
            inheritance_tree(diagram),
            diamond_inheritance(diagram),
            interface_implementation(diagram),
            composition(diagram),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn kind(&self) -> DiagramKind {
        DiagramKind::Class
    }
}
