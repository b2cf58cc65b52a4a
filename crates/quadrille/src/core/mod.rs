//! Core abstractions shared by every layout stage and diagram kind
//!
//! Geometry, the layout graph, configuration, text measurement, the drawing
//! surface and the error type.

mod canvas;
mod config;
mod error;
mod geometry;
mod graph;
pub mod logging;
mod text;
mod types;

pub use canvas::*;
pub use config::*;
pub use error::*;
pub use geometry::*;
pub use graph::*;
pub use logging::*;
pub use text::*;
pub use types::*;
