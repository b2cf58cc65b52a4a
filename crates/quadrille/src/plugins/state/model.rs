//! State diagram model
//!
//! States live in a flat table; nesting is expressed by each state naming
//! its `parent` composite.

use serde::{Deserialize, Serialize};

/// Kind of a state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    #[default]
    Simple,
    Initial,
    Final,
    Choice,
    Fork,
    Join,
    Composite,
}

impl StateKind {
    /// Pseudo states draw as fixed-size glyphs without a label
    pub fn is_pseudo(&self) -> bool {
        matches!(
            self,
            StateKind::Initial | StateKind::Final | StateKind::Choice | StateKind::Fork | StateKind::Join
        )
    }
}

/// A state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateNode {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub kind: StateKind,
    /// Enclosing composite state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl StateNode {
    pub fn new(id: impl Into<String>, kind: StateKind) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            kind,
            parent: None,
        }
    }

    pub fn simple(id: impl Into<String>) -> Self {
        Self::new(id, StateKind::Simple)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Label to draw; falls back to the id
    pub fn text(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

/// What fires a transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    Event {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        guard: Option<String>,
    },
    After {
        millis: u64,
    },
    Completion,
}

impl Trigger {
    /// Edge label, `None` for completion transitions
    pub fn label(&self) -> Option<String> {
        match self {
            Trigger::Event { name, guard: None } => Some(name.clone()),
            Trigger::Event {
                name,
                guard: Some(guard),
            } => Some(format!("{} [{}]", name, guard)),
            Trigger::After { millis } if millis % 1000 == 0 => Some(format!("after({}s)", millis / 1000)),
            Trigger::After { millis } => Some(format!("after({}ms)", millis)),
            Trigger::Completion => None,
        }
    }
}

/// A transition between two states
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<Trigger>,
}

impl Transition {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            trigger: None,
        }
    }

    pub fn on(mut self, event: impl Into<String>) -> Self {
        self.trigger = Some(Trigger::Event {
            name: event.into(),
            guard: None,
        });
        self
    }

    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn label(&self) -> Option<String> {
        self.trigger.as_ref().and_then(Trigger::label)
    }
}

/// A state diagram
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDiagram {
    #[serde(default)]
    pub states: Vec<StateNode>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

impl StateDiagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(mut self, state: StateNode) -> Self {
        self.states.push(state);
        self
    }

    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transitions.push(transition);
        self
    }

    pub fn state(&self, id: &str) -> Option<&StateNode> {
        self.states.iter().find(|s| s.id == id)
    }

    /// Direct children of a composite, in declaration order
    pub fn children_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a StateNode> + 'a {
        self.states
            .iter()
            .filter(move |s| s.parent.as_deref() == Some(id))
    }

    /// Composite with children; drawn as a frame instead of a node
    pub fn is_container(&self, id: &str) -> bool {
        self.children_of(id).next().is_some()
    }

    /// Id that stands in for `id` in the layout graph: containers are
    /// entered through their first (leaf) descendant
    pub fn layout_id<'a>(&'a self, id: &'a str) -> &'a str {
        let mut current = id;
        // Bounded by the state count so a parent cycle cannot spin forever
        for _ in 0..self.states.len() {
            match self.children_of(current).next() {
                Some(child) => current = &child.id,
                None => break,
            }
        }
        current
    }

    /// Transitions between known states
    pub fn valid_transitions(&self) -> impl Iterator<Item = &Transition> {
        self.transitions
            .iter()
            .filter(|t| self.state(&t.from).is_some() && self.state(&t.to).is_some())
    }
}
