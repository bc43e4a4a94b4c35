use std::fmt;

/// A tessellation job that cannot be processed.
#[derive(Debug, Clone, PartialEq)]
pub enum TessellationError {
    /// Instruction strides must hold at least an `(x, y)` pair.
    InvalidStride(usize),
    /// The instruction transform has no inverse.
    SingularTransform,
    /// A run header or body extends past the end of the buffer.
    Truncated { offset: usize, needed: usize, available: usize },
    /// A run header holds something other than a non-negative integral count.
    InvalidVertexCount { offset: usize, value: f32 },
}

impl fmt::Display for TessellationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TessellationError::InvalidStride(stride) => {
                write!(f, "instruction stride must be at least 2, got {stride}")
            }
            TessellationError::SingularTransform => {
                write!(f, "instruction transform is not invertible")
            }
            TessellationError::Truncated { offset, needed, available } => write!(
                f,
                "malformed instructions at {offset}: run needs {needed} floats, {available} left"
            ),
            TessellationError::InvalidVertexCount { offset, value } => {
                write!(f, "malformed instructions at {offset}: invalid vertex count {value}")
            }
        }
    }
}

impl std::error::Error for TessellationError {}
