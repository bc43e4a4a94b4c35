//! Flowline engine crate.
//!
//! Wide, animated line rendering for map-like scenes: feature geometry is
//! encoded into flat instructions, tessellated into segment quads on a
//! background thread, and stroked on the GPU by generated WGSL.

pub mod coords;
pub mod geometry;
pub mod tessellate;
pub mod worker;

pub mod logging;
pub mod paint;
pub mod render;
pub mod shader;
pub mod time;
