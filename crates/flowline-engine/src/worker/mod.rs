//! Cross-thread tessellation requests.
//!
//! Responsibilities:
//! - run the tessellator on a dedicated background thread (`TessellationWorker`)
//! - correlate requests and responses by job id (`LineBufferChannel`)
//! - discard responses that are unknown, superseded, or arrive after the GPU context
//!   was released (`GpuContextGuard`)
//!
//! Buffers move between threads by ownership; nothing is shared or copied.

mod channel;
mod message;
mod thread;

pub use channel::{GpuContextGuard, GpuContextHandle, LineBufferChannel, PendingLineBuffers};
pub use message::{SubmitError, WorkerRequest, WorkerResponse};
pub use thread::{TessellationWorker, WorkerConfig};
