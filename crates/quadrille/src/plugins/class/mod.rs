//! Class diagram plugin
//!
//! Classes, inheritance and ownership relations, the class-specific
//! structural patterns and the class renderer.

mod model;
mod patterns;
mod renderer;

pub use model::*;
pub use patterns::*;
pub use renderer::*;
