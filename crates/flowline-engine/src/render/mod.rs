//! GPU side of the line pipeline.
//!
//! Tessellated buffers are uploaded through `BufferUploader` and drawn by
//! `FlowLineRenderer` with the WGSL generated by `shader::ShaderBuilder`.
//!
//! Convention:
//! - vertex rows hold positions in the job's local space
//! - the frame uniform's projection maps local space to clip space
//! - the shaders work in logical pixels with a bottom-left origin (+Y up)

mod common;
mod ctx;
mod lines;
mod upload;

pub use common::FrameUniforms;
pub use ctx::{RenderCtx, RenderTarget};
pub use lines::{FlowLineConfig, FlowLineRenderer, FrameParams};
pub use upload::{upload_line_buffers, BufferUploader, BufferUsage, LineBufferSlot, UploadedLines};
