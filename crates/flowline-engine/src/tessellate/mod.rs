//! Background tessellation of encoded line instructions.
//!
//! Responsibilities:
//! - join angles, arc length and tangent sums measured in world units
//! - packed corner role / tangent sum scalar
//! - interleaved vertex rows plus a `u32` triangle list, 4 rows and 6 indices per segment
//!
//! Everything here is pure computation and safe to run off the render thread.

pub mod angle;
pub mod layout;
pub mod params;

mod error;
mod job;
mod tessellator;

pub use angle::{join_angle, LINE_ANGLE_COSINE_CUTOFF};
pub use error::TessellationError;
pub use job::{JobId, LineBuffers, TessellationJob};
pub use layout::{LineVertexLayout, VertexInput};
pub use params::{pack_vertex_params, unpack_vertex_params};
pub use tessellator::{tessellate, validate_instructions, InstructionSummary};
