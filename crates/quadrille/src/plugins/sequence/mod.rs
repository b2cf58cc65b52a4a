//! Sequence diagrams: participants, messages, notes and activations

mod model;
mod patterns;
mod renderer;

pub use model::*;
pub use patterns::*;
pub use renderer::*;
