use std::fmt;

/// Rejected input while building a [`LineBatch`](super::LineBatch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// Strides must hold at least an `(x, y)` pair.
    InvalidStride(usize),
    /// A coordinate run was declared with a stride other than the batch's.
    StrideMismatch { expected: usize, got: usize },
    /// The flat coordinate slice is not a whole number of vertices.
    RaggedCoordinates { len: usize, stride: usize },
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchError::InvalidStride(stride) => {
                write!(f, "line stride must be at least 2, got {stride}")
            }
            BatchError::StrideMismatch { expected, got } => {
                write!(f, "line stride mismatch: batch uses {expected}, run declared {got}")
            }
            BatchError::RaggedCoordinates { len, stride } => {
                write!(f, "{len} flat coordinates do not divide into vertices of stride {stride}")
            }
        }
    }
}

impl std::error::Error for BatchError {}
