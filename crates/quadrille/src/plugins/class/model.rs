//! Class diagram model
//!
//! Classes with their members and the relations between them.

use serde::{Deserialize, Serialize};

use crate::core::EdgeKind;

/// Stereotype shown above a class name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stereotype {
    Interface,
    Abstract,
    Enumeration,
    Other(String),
}

impl Stereotype {
    /// Text shown in the header, without guillemets
    pub fn label(&self) -> &str {
        match self {
            Stereotype::Interface => "interface",
            Stereotype::Abstract => "abstract",
            Stereotype::Enumeration => "enumeration",
            Stereotype::Other(s) => s,
        }
    }
}

/// A class in the diagram
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassNode {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stereotype: Option<Stereotype>,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
}

impl ClassNode {
    /// A class whose name equals its id
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            stereotype: None,
            attributes: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_stereotype(mut self, stereotype: Stereotype) -> Self {
        self.stereotype = Some(stereotype);
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attributes.push(attribute.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.methods.push(method.into());
        self
    }

    pub fn is_interface(&self) -> bool {
        self.stereotype == Some(Stereotype::Interface)
    }
}

/// Kind of relation between two classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// `from` extends `to`
    Extends,
    /// `from` implements `to`
    Implements,
    /// `from` owns `to`
    Composition,
    /// `from` aggregates `to`
    Aggregation,
    Association,
    Dependency,
    Link,
}

impl RelationKind {
    pub fn edge_kind(&self) -> EdgeKind {
        match self {
            RelationKind::Extends => EdgeKind::Extends,
            RelationKind::Implements => EdgeKind::Implements,
            RelationKind::Composition => EdgeKind::Composition,
            RelationKind::Aggregation => EdgeKind::Aggregation,
            RelationKind::Association | RelationKind::Link => EdgeKind::Association,
            RelationKind::Dependency => EdgeKind::Dependency,
        }
    }

    /// Inheritance-like relations point child to parent
    pub fn is_inheritance(&self) -> bool {
        matches!(self, RelationKind::Extends | RelationKind::Implements)
    }

    pub fn is_ownership(&self) -> bool {
        matches!(self, RelationKind::Composition | RelationKind::Aggregation)
    }
}

/// A relation between two classes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub from: String,
    pub to: String,
    pub kind: RelationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_cardinality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_cardinality: Option<String>,
}

impl Relation {
    pub fn new(from: impl Into<String>, to: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
            label: None,
            from_cardinality: None,
            to_cardinality: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_cardinality(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.from_cardinality = Some(from.into());
        self.to_cardinality = Some(to.into());
        self
    }
}

/// A class diagram
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDiagram {
    #[serde(default)]
    pub classes: Vec<ClassNode>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl ClassDiagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(mut self, class: ClassNode) -> Self {
        self.classes.push(class);
        self
    }

    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn class(&self, id: &str) -> Option<&ClassNode> {
        self.classes.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.class(id).is_some()
    }

    /// Relations whose endpoints both exist
    pub fn valid_relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations
            .iter()
            .filter(|r| self.contains(&r.from) && self.contains(&r.to))
    }
}
