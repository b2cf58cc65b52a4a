//! Flowchart plugin
//!
//! Flowchart nodes and edges, if/else, loop and chain detection, and the
//! flowchart renderer.

mod model;
mod patterns;
mod renderer;

pub use model::*;
pub use patterns::*;
pub use renderer::*;
