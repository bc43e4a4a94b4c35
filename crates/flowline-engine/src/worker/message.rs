use std::fmt;

use crate::tessellate::{JobId, LineBuffers, TessellationError, TessellationJob};

/// Message sent from the render side to the tessellation thread.
#[derive(Debug)]
pub enum WorkerRequest {
    GenerateLineBuffers(TessellationJob),
    Shutdown,
}

impl WorkerRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerRequest::GenerateLineBuffers(_) => "GENERATE_LINE_BUFFERS",
            WorkerRequest::Shutdown => "SHUTDOWN",
        }
    }
}

/// Reply for one job, correlated by id.
#[derive(Debug)]
pub struct WorkerResponse {
    pub id: JobId,
    pub result: Result<LineBuffers, TessellationError>,
}

/// Why a job could not be handed to the worker.
///
/// Variants that carry the job give its ownership (and its instruction buffer)
/// back to the caller.
#[derive(Debug)]
pub enum SubmitError {
    /// The bounded request queue is full.
    QueueFull(TessellationJob),
    /// The worker thread has exited.
    WorkerGone(TessellationJob),
    /// The job could not be built.
    InvalidJob(TessellationError),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::QueueFull(job) => write!(f, "tessellation queue full, {} not sent", job.id),
            SubmitError::WorkerGone(job) => {
                write!(f, "tessellation worker has exited, {} not sent", job.id)
            }
            SubmitError::InvalidJob(err) => write!(f, "invalid tessellation job: {err}"),
        }
    }
}

impl std::error::Error for SubmitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SubmitError::InvalidJob(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TessellationError> for SubmitError {
    fn from(err: TessellationError) -> Self {
        SubmitError::InvalidJob(err)
    }
}
