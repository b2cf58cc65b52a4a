//! State diagram plugin
//!
//! States, transitions with typed triggers, state-specific structural
//! patterns and the state renderer.

mod model;
mod patterns;
mod renderer;

pub use model::*;
pub use patterns::*;
pub use renderer::*;
