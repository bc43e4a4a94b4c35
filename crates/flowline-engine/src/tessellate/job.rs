use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::coords::Affine2;

use super::TessellationError;

static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identifier correlating a request with its response.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

impl JobId {
    /// Allocates a new id. Ids never repeat within a process, so responses from a
    /// previous channel generation cannot match a newer pending table.
    pub fn next() -> Self {
        JobId(NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "flow_line_{}", self.0)
    }
}

/// Everything the background tessellator needs for one request.
///
/// Owns the instruction buffer; submitting the job moves it to the worker.
#[derive(Debug)]
pub struct TessellationJob {
    pub id: JobId,
    pub instructions: Vec<f32>,
    /// Local → world transform used for join angles and arc lengths.
    pub inverse_transform: Affine2,
    /// Σ size of the custom attributes heading each run.
    pub custom_attribute_count: usize,
    /// Floats per vertex in the instruction buffer (`2 + extras`).
    pub stride: usize,
}

impl TessellationJob {
    pub fn new(
        instructions: Vec<f32>,
        inverse_transform: Affine2,
        custom_attribute_count: usize,
        stride: usize,
    ) -> Self {
        Self {
            id: JobId::next(),
            instructions,
            inverse_transform,
            custom_attribute_count,
            stride,
        }
    }

    /// Builds a job from the transform the encoder applied (world → local).
    pub fn from_transform(
        instructions: Vec<f32>,
        transform: &Affine2,
        custom_attribute_count: usize,
        stride: usize,
    ) -> Result<Self, TessellationError> {
        let inverse = transform.invert().ok_or(TessellationError::SingularTransform)?;
        Ok(Self::new(instructions, inverse, custom_attribute_count, stride))
    }
}

/// Tessellated output for one job.
#[derive(Debug, Clone, PartialEq)]
pub struct LineBuffers {
    pub id: JobId,
    /// Interleaved rows of `vertex_stride` floats.
    pub vertices: Vec<f32>,
    /// Triangle list, 6 indices per segment quad.
    pub indices: Vec<u32>,
    pub vertex_stride: usize,
    /// Local → world transform the rows were produced with.
    pub inverse_transform: Affine2,
    /// The job's instruction buffer, handed back for reuse.
    pub instructions: Vec<f32>,
}

impl LineBuffers {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        if self.vertex_stride == 0 { 0 } else { self.vertices.len() / self.vertex_stride }
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
