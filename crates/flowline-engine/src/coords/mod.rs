//! Coordinate and geometry types shared by the encoder, the tessellator and the renderer.
//!
//! Spaces:
//! - world: map units (e.g. projected meters), where join angles and arc lengths are measured
//! - local: world coordinates after the encoder's affine transform; stored in vertex rows
//! - pixel: viewport pixels, bottom-left origin, used by the generated shaders

mod affine;
mod vec2;
mod viewport;

pub use affine::Affine2;
pub use vec2::Vec2;
pub use viewport::Viewport;
