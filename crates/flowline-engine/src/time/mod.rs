//! Time subsystem.
//!
//! Frame timing for the render loop:
//! - one `FrameClock` per loop
//! - call `tick()` once per presented frame to obtain `FrameTime`
//! - `FrameTime::elapsed` feeds the `time` frame uniform

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
