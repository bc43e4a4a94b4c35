//! Feature line geometry and its encoding into flat render instructions.
//!
//! Responsibilities:
//! - accumulate per-feature line runs (`LineBatch`)
//! - describe custom per-vertex attributes (`CustomAttribute`)
//! - flatten both into one transport-ready `f32` buffer (`encode_line_instructions`)

mod attribute;
mod batch;
mod encode;
mod error;

pub use attribute::{custom_attributes_size, AttributeSize, AttributeValue, CustomAttribute};
pub use batch::{FeatureId, LineBatch, LineBatchEntry};
pub use encode::{encode_line_instructions, encode_line_instructions_into, instruction_count};
pub use error::BatchError;
