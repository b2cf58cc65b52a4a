//! Core error types for diagram layout
//!
//! Layout itself never fails: malformed input degrades to a best-effort
//! drawing. These errors only surface at the enclosing render call, when the
//! caller's chosen strategy needs something the diagram cannot provide.

use thiserror::Error;

use super::DiagramKind;

/// Errors raised by a render call
#[derive(Error, Debug)]
pub enum DiagramError {
    #[error("No structural pattern matched the {kind} diagram")]
    PatternUnavailable { kind: DiagramKind },

    #[error("Pattern template not registered: {name}")]
    TemplateMissing { name: String },

    #[error("Cannot apply a pattern layout to an empty {kind} diagram")]
    EmptyDiagram { kind: DiagramKind },

    #[error("Serialization error: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },
}

impl DiagramError {
    /// Create a new pattern-unavailable error
    pub fn pattern_unavailable(kind: DiagramKind) -> Self {
        Self::PatternUnavailable { kind }
    }

    /// Create a new missing-template error
    pub fn template_missing(name: impl Into<String>) -> Self {
        Self::TemplateMissing { name: name.into() }
    }

    /// Create a new empty-diagram error
    pub fn empty_diagram(kind: DiagramKind) -> Self {
        Self::EmptyDiagram { kind }
    }
}
