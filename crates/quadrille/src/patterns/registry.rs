//! Pattern templates and their registry
//!
//! A template is a content-agnostic layout in relative coordinates: every
//! slot, waypoint and decorator lives in the unit square and is scaled onto
//! the canvas when applied. The registry is built once and only read after.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::DiagramKind;

/// A point in template space, both coordinates in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelativePoint {
    pub x: f64,
    pub y: f64,
}

/// Where one role sits. `x`/`y` are the slot centre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelativeSlot {
    pub role: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Edge between two roles with intermediate waypoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateEdge {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub waypoints: Vec<RelativePoint>,
}

/// Background or annotation box. `x`/`y` are the top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDecorator {
    pub kind: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Role that must be bound for the decorator to be drawn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub style: IndexMap<String, String>,
}

/// A named relative layout for one structural motif
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternLayout {
    pub name: String,
    pub kind: DiagramKind,
    pub slots: Vec<RelativeSlot>,
    #[serde(default)]
    pub edges: Vec<TemplateEdge>,
    #[serde(default)]
    pub decorators: Vec<TemplateDecorator>,
    pub min_width: i32,
    pub min_height: i32,
    pub padding: i32,
}

impl PatternLayout {
    pub fn new(name: impl Into<String>, kind: DiagramKind, min_width: i32, min_height: i32) -> Self {
        Self {
            name: name.into(),
            kind,
            slots: Vec::new(),
            edges: Vec::new(),
            decorators: Vec::new(),
            min_width,
            min_height,
            padding: 10,
        }
    }

    pub fn padding(mut self, padding: i32) -> Self {
        self.padding = padding;
        self
    }

    pub fn slot(mut self, role: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.slots.push(RelativeSlot {
            role: role.into(),
            x,
            y,
            width,
            height,
        });
        self
    }

    pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>, waypoints: &[(f64, f64)]) -> Self {
        self.edges.push(TemplateEdge {
            from: from.into(),
            to: to.into(),
            waypoints: waypoints
                .iter()
                .map(|&(x, y)| RelativePoint { x, y })
                .collect(),
        });
        self
    }

    pub fn decorator(
        mut self,
        kind: impl Into<String>,
        bounds: (f64, f64, f64, f64),
        role: Option<&str>,
        style: &[(&str, &str)],
    ) -> Self {
        let (x, y, width, height) = bounds;
        self.decorators.push(TemplateDecorator {
            kind: kind.into(),
            x,
            y,
            width,
            height,
            role: role.map(|r| r.to_string()),
            style: style
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        self
    }

    pub fn slot_for(&self, role: &str) -> Option<&RelativeSlot> {
        self.slots.iter().find(|s| s.role == role)
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.role.as_str())
    }
}

/// Read-only lookup of templates by name, in registration order
#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    templates: IndexMap<String, PatternLayout>,
}

impl PatternRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in template
    pub fn with_builtin() -> Self {
        builtin_templates()
            .into_iter()
            .fold(Self::new(), |registry, t| registry.register(t))
    }

    /// Add a template; a repeated name replaces the earlier one in place
    pub fn register(mut self, template: PatternLayout) -> Self {
        self.templates.insert(template.name.clone(), template);
        self
    }

    pub fn get(&self, name: &str) -> Option<&PatternLayout> {
        self.templates.get(name)
    }

    /// Registration index, used to break score ties
    pub fn position(&self, name: &str) -> Option<usize> {
        self.templates.get_index_of(name)
    }

    pub fn templates(&self) -> impl Iterator<Item = &PatternLayout> {
        self.templates.values()
    }

    pub fn for_kind(&self, kind: DiagramKind) -> impl Iterator<Item = &PatternLayout> {
        self.templates.values().filter(move |t| t.kind == kind)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

pub const INHERITANCE_TREE: &str = "Inheritance Tree";
pub const DIAMOND_INHERITANCE: &str = "Diamond Inheritance";
pub const INTERFACE_IMPLEMENTATION: &str = "Interface Implementation";
pub const COMPOSITION: &str = "Composition";
pub const IF_ELSE: &str = "If Else";
pub const WHILE_LOOP: &str = "While Loop";
pub const SEQUENTIAL_CHAIN: &str = "Sequential Chain";
pub const LINEAR_CHAIN: &str = "Linear Chain";
pub const BINARY_CHOICE: &str = "Binary Choice";
pub const STATE_LOOP: &str = "State Loop";
pub const STAR: &str = "Star";
pub const REQUEST_RESPONSE: &str = "Request Response";
pub const CALLBACK: &str = "Callback";
pub const PARTICIPANT_CHAIN: &str = "Participant Chain";

// Child slot order puts the first two children in the middle
const FAN_X: [f64; 4] = [0.38, 0.62, 0.14, 0.86];

fn fan_out(template: PatternLayout, root: &str, prefix: &str) -> PatternLayout {
    (0..4).fold(template, |t, i| {
        let role = format!("{}_{}", prefix, i);
        t.slot(role.clone(), FAN_X[i], 0.72, 0.2, 0.16)
            .edge(role, root, &[(FAN_X[i], 0.45), (0.5, 0.45)])
    })
}

fn fork_merge(name: &str, kind: DiagramKind, roles: [&str; 4]) -> PatternLayout {
    let [source, a, b, merge] = roles;
    PatternLayout::new(name, kind, 480, 440)
        .slot(source, 0.5, 0.14, 0.26, 0.14)
        .slot(a, 0.25, 0.48, 0.28, 0.14)
        .slot(b, 0.75, 0.48, 0.28, 0.14)
        .slot(merge, 0.5, 0.84, 0.28, 0.14)
        .edge(source, a, &[(0.5, 0.31), (0.25, 0.31)])
        .edge(source, b, &[(0.5, 0.31), (0.75, 0.31)])
        .edge(a, merge, &[(0.25, 0.66), (0.5, 0.66)])
        .edge(b, merge, &[(0.75, 0.66), (0.5, 0.66)])
}

fn builtin_templates() -> Vec<PatternLayout> {
    let mut templates = Vec::new();

    // Class diagrams
    templates.push(fan_out(
        PatternLayout::new(INHERITANCE_TREE, DiagramKind::Class, 600, 360).slot(
            "parent", 0.5, 0.18, 0.24, 0.16,
        ),
        "parent",
        "child",
    ));
    templates.push(
        PatternLayout::new(DIAMOND_INHERITANCE, DiagramKind::Class, 400, 400)
            .slot("top", 0.5, 0.12, 0.3, 0.12)
            .slot("left", 0.22, 0.45, 0.3, 0.12)
            .slot("right", 0.78, 0.45, 0.3, 0.12)
            .slot("bottom", 0.5, 0.82, 0.3, 0.12)
            .edge("left", "top", &[(0.22, 0.28), (0.5, 0.28)])
            .edge("right", "top", &[(0.78, 0.28), (0.5, 0.28)])
            .edge("bottom", "left", &[(0.5, 0.64), (0.22, 0.64)])
            .edge("bottom", "right", &[(0.5, 0.64), (0.78, 0.64)]),
    );
    templates.push(
        fan_out(
            PatternLayout::new(INTERFACE_IMPLEMENTATION, DiagramKind::Class, 600, 360).slot(
                "interface", 0.5, 0.18, 0.24, 0.16,
            ),
            "interface",
            "impl",
        )
        .decorator(
            "realization_group",
            (0.02, 0.58, 0.96, 0.28),
            Some("impl_1"),
            &[("outline", "dashed")],
        ),
    );
    templates.push(
        PatternLayout::new(COMPOSITION, DiagramKind::Class, 560, 400)
            .slot("owner", 0.5, 0.5, 0.22, 0.16)
            .slot("part_0", 0.15, 0.5, 0.2, 0.14)
            .slot("part_1", 0.85, 0.5, 0.2, 0.14)
            .slot("part_2", 0.5, 0.12, 0.2, 0.14)
            .slot("part_3", 0.5, 0.88, 0.2, 0.14)
            .edge("owner", "part_0", &[])
            .edge("owner", "part_1", &[])
            .edge("owner", "part_2", &[])
            .edge("owner", "part_3", &[]),
    );

    // Flow diagrams
    templates.push(fork_merge(
        IF_ELSE,
        DiagramKind::Flow,
        ["decision", "true_process", "false_process", "merge"],
    ));
    templates.push(
        PatternLayout::new(WHILE_LOOP, DiagramKind::Flow, 440, 440)
            .slot("condition", 0.4, 0.15, 0.28, 0.14)
            .slot("body", 0.4, 0.5, 0.28, 0.14)
            .slot("exit", 0.4, 0.85, 0.28, 0.14)
            .edge("condition", "body", &[])
            .edge("body", "condition", &[(0.1, 0.5), (0.1, 0.15)])
            .edge("condition", "exit", &[(0.85, 0.15), (0.85, 0.85)])
            .decorator(
                "loop_region",
                (0.04, 0.04, 0.64, 0.58),
                Some("body"),
                &[("outline", "dotted")],
            ),
    );
    templates.push((0..6).fold(
        PatternLayout::new(SEQUENTIAL_CHAIN, DiagramKind::Flow, 300, 560),
        |t, i| {
            let t = t.slot(format!("step_{}", i), 0.5, 0.08 + i as f64 * 0.168, 0.5, 0.1);
            if i > 0 {
                t.edge(format!("step_{}", i - 1), format!("step_{}", i), &[])
            } else {
                t
            }
        },
    ));

    // State diagrams
    templates.push((0..6).fold(
        PatternLayout::new(LINEAR_CHAIN, DiagramKind::State, 900, 160),
        |t, i| {
            let t = t.slot(format!("state_{}", i), 0.08 + i as f64 * 0.168, 0.5, 0.14, 0.3);
            if i > 0 {
                t.edge(format!("state_{}", i - 1), format!("state_{}", i), &[])
            } else {
                t
            }
        },
    ));
    templates.push(fork_merge(
        BINARY_CHOICE,
        DiagramKind::State,
        ["source", "option_a", "option_b", "merge"],
    ));
    templates.push(
        PatternLayout::new(STATE_LOOP, DiagramKind::State, 480, 440)
            .slot("loop_0", 0.5, 0.15, 0.26, 0.14)
            .slot("loop_1", 0.82, 0.5, 0.26, 0.14)
            .slot("loop_2", 0.5, 0.85, 0.26, 0.14)
            .slot("loop_3", 0.18, 0.5, 0.26, 0.14)
            .edge("loop_0", "loop_1", &[(0.82, 0.15)])
            .edge("loop_1", "loop_2", &[(0.82, 0.85)])
            .edge("loop_2", "loop_3", &[(0.18, 0.85)])
            .edge("loop_3", "loop_0", &[(0.18, 0.15)])
            .edge("loop_1", "loop_0", &[(0.6, 0.5), (0.6, 0.3)])
            .edge("loop_2", "loop_0", &[])
            .decorator(
                "cycle_region",
                (0.3, 0.3, 0.4, 0.4),
                None,
                &[("outline", "dotted"), ("label", "loop")],
            ),
    );
    templates.push(
        PatternLayout::new(STAR, DiagramKind::State, 520, 480)
            .slot("hub", 0.5, 0.5, 0.2, 0.12)
            .slot("spoke_0", 0.5, 0.1, 0.2, 0.1)
            .slot("spoke_1", 0.85, 0.3, 0.2, 0.1)
            .slot("spoke_2", 0.85, 0.7, 0.2, 0.1)
            .slot("spoke_3", 0.5, 0.9, 0.2, 0.1)
            .slot("spoke_4", 0.15, 0.7, 0.2, 0.1)
            .slot("spoke_5", 0.15, 0.3, 0.2, 0.1)
            .edge("hub", "spoke_0", &[])
            .edge("hub", "spoke_1", &[])
            .edge("hub", "spoke_2", &[])
            .edge("hub", "spoke_3", &[])
            .edge("hub", "spoke_4", &[])
            .edge("hub", "spoke_5", &[]),
    );

    // Sequence diagrams: slots are participant heads
    templates.push(
        PatternLayout::new(REQUEST_RESPONSE, DiagramKind::Sequence, 400, 300)
            .slot("client", 0.25, 0.08, 0.3, 0.1)
            .slot("server", 0.75, 0.08, 0.3, 0.1),
    );
    templates.push(
        PatternLayout::new(CALLBACK, DiagramKind::Sequence, 400, 340)
            .slot("caller", 0.25, 0.08, 0.3, 0.1)
            .slot("callee", 0.75, 0.08, 0.3, 0.1)
            .decorator(
                "callback_bracket",
                (0.45, 0.2, 0.1, 0.7),
                Some("callee"),
                &[("outline", "dashed")],
            ),
    );
    templates.push((0..5).fold(
        PatternLayout::new(PARTICIPANT_CHAIN, DiagramKind::Sequence, 700, 300),
        |t, i| t.slot(format!("p_{}", i), 0.1 + i as f64 * 0.2, 0.08, 0.16, 0.1),
    ));

    templates
}
