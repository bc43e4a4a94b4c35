//! WGSL generation for the line stroke pipeline.
//!
//! The vertex stage expands each segment quad in pixel space (y-up, origin at
//! the bottom-left of the viewport) and the fragment stage shades it with
//! distance fields for the segment body, caps and joins.

mod builder;
mod chunks;
mod style;

pub use builder::{ShaderBuilder, Varying};
pub use style::{modulo, CapStyle, JoinStyle, PulseConfig};
