//! Color model shared by stroke styling and hit detection.
//!
//! Scope:
//! - color representation (linear premultiplied alpha)
//! - WGSL literals for shader expressions
//! - feature id ↔ hit color encoding

pub mod color;

pub use color::{Color, MAX_HIT_ID};
