use std::collections::HashMap;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Weak};

use crate::coords::Affine2;
use crate::tessellate::{JobId, LineBuffers, TessellationJob};

use super::{SubmitError, TessellationWorker, WorkerConfig, WorkerResponse};

/// Liveness token for the GPU context that will receive tessellated buffers.
///
/// Held by whatever owns the device. Dropping or disposing it marks the context
/// as released; responses arriving afterwards are discarded.
#[derive(Debug, Default)]
pub struct GpuContextGuard {
    alive: Arc<()>,
}

impl GpuContextGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> GpuContextHandle {
        GpuContextHandle { alive: Arc::downgrade(&self.alive) }
    }

    /// Releases the context explicitly.
    pub fn dispose(self) {}
}

/// Weak observer of a [`GpuContextGuard`].
#[derive(Debug, Clone)]
pub struct GpuContextHandle {
    alive: Weak<()>,
}

impl GpuContextHandle {
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive.strong_count() > 0
    }
}

/// Requester-side handle for one submitted job.
///
/// Resolves at most once. A handle whose response is stale, failed, or never
/// arrives simply stays unresolved.
#[derive(Debug)]
pub struct PendingLineBuffers {
    id: JobId,
    rx: Receiver<LineBuffers>,
    resolved: bool,
}

impl PendingLineBuffers {
    #[inline]
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Takes the buffers if they have been delivered.
    pub fn try_take(&mut self) -> Option<LineBuffers> {
        if self.resolved {
            return None;
        }
        let buffers = self.rx.try_recv().ok()?;
        self.resolved = true;
        Some(buffers)
    }

    /// Whether the buffers were delivered and taken.
    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }
}

/// Request/response correlation between the render side and one tessellation worker.
///
/// The render loop calls [`pump`](Self::pump) once per frame; it never blocks.
/// A response is delivered only if its id is still pending and the GPU context
/// is still alive; anything else is dropped without touching GPU state.
pub struct LineBufferChannel {
    worker: TessellationWorker,
    pending: HashMap<JobId, Sender<LineBuffers>>,
    context: GpuContextHandle,
}

impl LineBufferChannel {
    pub fn new(config: &WorkerConfig, context: GpuContextHandle) -> io::Result<Self> {
        Ok(Self {
            worker: TessellationWorker::spawn(config)?,
            pending: HashMap::new(),
            context,
        })
    }

    /// Builds a job from the encoder's transform and submits it.
    pub fn submit(
        &mut self,
        instructions: Vec<f32>,
        transform: &Affine2,
        custom_attribute_count: usize,
        stride: usize,
    ) -> Result<PendingLineBuffers, SubmitError> {
        let job =
            TessellationJob::from_transform(instructions, transform, custom_attribute_count, stride)?;
        self.submit_job(job)
    }

    /// Moves `job` to the worker and registers its id as pending.
    pub fn submit_job(&mut self, job: TessellationJob) -> Result<PendingLineBuffers, SubmitError> {
        let id = job.id;
        self.worker.send(job)?;

        let (tx, rx) = mpsc::channel();
        self.pending.insert(id, tx);
        log::debug!("{id}: submitted ({} pending)", self.pending.len());

        Ok(PendingLineBuffers { id, rx, resolved: false })
    }

    /// Stops waiting for `id`; its response will be dropped as unknown.
    pub fn forget(&mut self, id: JobId) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Routes every response received so far. Returns how many were delivered.
    pub fn pump(&mut self) -> usize {
        let mut delivered = 0;
        while let Some(response) = self.worker.try_recv() {
            if self.route(response) {
                delivered += 1;
            }
        }
        delivered
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn route(&mut self, response: WorkerResponse) -> bool {
        let WorkerResponse { id, result } = response;

        let Some(tx) = self.pending.remove(&id) else {
            log::debug!("{id}: dropping response for unknown job");
            return false;
        };

        let buffers = match result {
            Ok(buffers) => buffers,
            Err(err) => {
                log::warn!("{id}: tessellation failed: {err}");
                return false;
            }
        };

        if !self.context.is_alive() {
            log::debug!("{id}: GPU context released, dropping buffers");
            return false;
        }

        if tx.send(buffers).is_err() {
            log::debug!("{id}: handle dropped before delivery");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::{Duration, Instant};

    use super::*;

    fn line_instructions() -> Vec<f32> {
        // one run, three (x, y) vertices
        vec![3.0, 0.0, 0.0, 10.0, 0.0, 10.0, 10.0]
    }

    /// Pumps until `pending` resolves or the pending table drains.
    fn settle(channel: &mut LineBufferChannel, pending: &mut PendingLineBuffers) -> Option<LineBuffers> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            channel.pump();
            if let Some(buffers) = pending.try_take() {
                return Some(buffers);
            }
            if channel.pending_count() == 0 || Instant::now() > deadline {
                return None;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn delivers_matching_response() {
        let guard = GpuContextGuard::new();
        let mut channel = LineBufferChannel::new(&WorkerConfig::default(), guard.handle()).unwrap();
        let mut pending = channel.submit(line_instructions(), &Affine2::IDENTITY, 0, 2).unwrap();

        let buffers = settle(&mut channel, &mut pending).expect("buffers delivered");
        assert_eq!(buffers.id, pending.id());
        assert_eq!(buffers.index_count(), 12);
        assert!(pending.is_resolved());
        assert!(pending.try_take().is_none());
        assert_eq!(channel.pending_count(), 0);
    }

    #[test]
    fn unknown_id_is_dropped() {
        let guard = GpuContextGuard::new();
        let mut channel = LineBufferChannel::new(&WorkerConfig::default(), guard.handle()).unwrap();
        let mut pending = channel.submit(line_instructions(), &Affine2::IDENTITY, 0, 2).unwrap();

        let stray = WorkerResponse {
            id: JobId::next(),
            result: Ok(LineBuffers {
                id: JobId::next(),
                vertices: vec![0.0; 8],
                indices: vec![0, 0, 0],
                vertex_stride: 8,
                inverse_transform: Affine2::IDENTITY,
                instructions: Vec::new(),
            }),
        };
        assert!(!channel.route(stray));
        assert_eq!(channel.pending_count(), 1);
        assert!(pending.try_take().is_none());
    }

    #[test]
    fn forgotten_job_never_resolves() {
        let guard = GpuContextGuard::new();
        let mut channel = LineBufferChannel::new(&WorkerConfig::default(), guard.handle()).unwrap();
        let mut first = channel.submit(line_instructions(), &Affine2::IDENTITY, 0, 2).unwrap();
        assert!(channel.forget(first.id()));

        // a later job proves the worker has answered the first one too
        let mut second = channel.submit(line_instructions(), &Affine2::IDENTITY, 0, 2).unwrap();
        assert!(settle(&mut channel, &mut second).is_some());
        assert!(first.try_take().is_none());
        assert!(!first.is_resolved());
    }

    #[test]
    fn released_context_drops_response() {
        let guard = GpuContextGuard::new();
        let mut channel = LineBufferChannel::new(&WorkerConfig::default(), guard.handle()).unwrap();
        let mut pending = channel.submit(line_instructions(), &Affine2::IDENTITY, 0, 2).unwrap();
        guard.dispose();

        assert!(settle(&mut channel, &mut pending).is_none());
        assert!(!pending.is_resolved());
        assert_eq!(channel.pending_count(), 0);
    }

    #[test]
    fn failed_job_leaves_handle_unresolved() {
        let guard = GpuContextGuard::new();
        let mut channel = LineBufferChannel::new(&WorkerConfig::default(), guard.handle()).unwrap();
        let mut pending = channel.submit(vec![7.0, 1.0], &Affine2::IDENTITY, 0, 2).unwrap();

        assert!(settle(&mut channel, &mut pending).is_none());
        assert!(!pending.is_resolved());
    }

    #[test]
    fn singular_transform_is_refused_up_front() {
        let guard = GpuContextGuard::new();
        let mut channel = LineBufferChannel::new(&WorkerConfig::default(), guard.handle()).unwrap();
        let err = channel.submit(line_instructions(), &Affine2::scale(0.0, 1.0), 0, 2).unwrap_err();
        assert!(matches!(err, SubmitError::InvalidJob(_)));
        assert_eq!(channel.pending_count(), 0);
    }
}
