use wgpu::util::DeviceExt;

use crate::coords::Affine2;
use crate::geometry::{custom_attributes_size, encode_line_instructions_into, CustomAttribute, LineBatch};
use crate::tessellate::{JobId, LineBuffers, TessellationJob};
use crate::worker::{LineBufferChannel, PendingLineBuffers, SubmitError};

use super::RenderCtx;

/// How often an uploaded buffer is expected to change.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum BufferUsage {
    /// Written once per tessellation.
    #[default]
    Static,
    /// Rewritten in place frequently.
    Dynamic,
}

impl BufferUsage {
    fn wgpu_usages(self, base: wgpu::BufferUsages) -> wgpu::BufferUsages {
        match self {
            BufferUsage::Static => base,
            BufferUsage::Dynamic => base | wgpu::BufferUsages::COPY_DST,
        }
    }
}

/// Destination of tessellated buffers.
///
/// Implemented by [`RenderCtx`] for wgpu; tests substitute a recording fake.
pub trait BufferUploader {
    type Buffer;

    fn upload_vertices(&self, label: &str, data: &[f32], usage: BufferUsage) -> Self::Buffer;
    fn upload_indices(&self, label: &str, data: &[u32], usage: BufferUsage) -> Self::Buffer;
}

impl BufferUploader for RenderCtx<'_> {
    type Buffer = wgpu::Buffer;

    fn upload_vertices(&self, label: &str, data: &[f32], usage: BufferUsage) -> wgpu::Buffer {
        self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(data),
            usage: usage.wgpu_usages(wgpu::BufferUsages::VERTEX),
        })
    }

    fn upload_indices(&self, label: &str, data: &[u32], usage: BufferUsage) -> wgpu::Buffer {
        self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(data),
            usage: usage.wgpu_usages(wgpu::BufferUsages::INDEX),
        })
    }
}

/// GPU-resident result of one tessellation job.
#[derive(Debug)]
pub struct UploadedLines<B> {
    pub id: JobId,
    pub vertices: B,
    pub indices: B,
    pub vertex_count: u32,
    pub index_count: u32,
    /// Local → world; composed into the projection at draw time.
    pub inverse_transform: Affine2,
}

/// Uploads vertex and index data and hands the instruction buffer back.
pub fn upload_line_buffers<U: BufferUploader>(
    uploader: &U,
    buffers: LineBuffers,
    usage: BufferUsage,
) -> (UploadedLines<U::Buffer>, Vec<f32>) {
    let LineBuffers { id, vertices, indices, vertex_stride, inverse_transform, instructions } = buffers;

    let vertex_count = if vertex_stride == 0 { 0 } else { vertices.len() / vertex_stride };
    let uploaded = UploadedLines {
        id,
        vertices: uploader.upload_vertices(&format!("{id} vertices"), &vertices, usage),
        indices: uploader.upload_indices(&format!("{id} indices"), &indices, usage),
        vertex_count: vertex_count as u32,
        index_count: indices.len() as u32,
        inverse_transform,
    };
    (uploaded, instructions)
}

/// One renderable set of line buffers plus its in-flight replacement.
///
/// Only the most recent request can land: a new request forgets the previous
/// one in the channel, so its response is dropped as unknown.
#[derive(Debug)]
pub struct LineBufferSlot<B> {
    usage: BufferUsage,
    pending: Option<PendingLineBuffers>,
    current: Option<UploadedLines<B>>,
    spare_instructions: Vec<f32>,
}

impl<B> LineBufferSlot<B> {
    pub fn new(usage: BufferUsage) -> Self {
        Self {
            usage,
            pending: None,
            current: None,
            spare_instructions: Vec::new(),
        }
    }

    /// Encodes `batch` and submits it for tessellation.
    pub fn request<F>(
        &mut self,
        channel: &mut LineBufferChannel,
        batch: &LineBatch<F>,
        attributes: &[CustomAttribute<F>],
        transform: &Affine2,
    ) -> Result<JobId, SubmitError> {
        if let Some(previous) = self.pending.take() {
            if channel.forget(previous.id()) {
                log::debug!("{}: superseded", previous.id());
            }
        }

        // Resolve the inverse before touching the spare allocation.
        let mut job = TessellationJob::from_transform(
            Vec::new(),
            transform,
            custom_attributes_size(attributes),
            batch.stride(),
        )
        .map_err(|err| {
            log::warn!("line buffer request failed: {err}");
            SubmitError::from(err)
        })?;

        job.instructions = std::mem::take(&mut self.spare_instructions);
        encode_line_instructions_into(batch, attributes, transform, &mut job.instructions);

        match channel.submit_job(job) {
            Ok(pending) => {
                let id = pending.id();
                self.pending = Some(pending);
                Ok(id)
            }
            Err(mut err) => {
                // The job never left this thread; keep its allocation.
                if let SubmitError::QueueFull(job) | SubmitError::WorkerGone(job) = &mut err {
                    self.spare_instructions = std::mem::take(&mut job.instructions);
                }
                log::warn!("line buffer request failed: {err}");
                Err(err)
            }
        }
    }

    /// Uploads the pending response if it has arrived. Returns whether
    /// [`current`](Self::current) changed.
    pub fn refresh<U>(&mut self, uploader: &U) -> bool
    where
        U: BufferUploader<Buffer = B>,
    {
        let Some(pending) = self.pending.as_mut() else { return false };
        let Some(buffers) = pending.try_take() else { return false };
        self.pending = None;

        let (uploaded, instructions) = upload_line_buffers(uploader, buffers, self.usage);
        log::debug!(
            "{}: uploaded {} vertices, {} indices",
            uploaded.id,
            uploaded.vertex_count,
            uploaded.index_count
        );
        self.spare_instructions = instructions;
        self.current = Some(uploaded);
        true
    }

    #[inline]
    pub fn current(&self) -> Option<&UploadedLines<B>> {
        self.current.as_ref()
    }

    #[inline]
    pub fn pending_id(&self) -> Option<JobId> {
        self.pending.as_ref().map(PendingLineBuffers::id)
    }

    /// Drops the uploaded buffers and forgets the in-flight request.
    pub fn clear(&mut self, channel: &mut LineBufferChannel) {
        if let Some(previous) = self.pending.take() {
            channel.forget(previous.id());
        }
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use super::*;
    use crate::geometry::{instruction_count, FeatureId};
    use crate::tessellate::TessellationError;
    use crate::worker::{GpuContextGuard, WorkerConfig};

    #[derive(Debug, Clone, PartialEq)]
    struct FakeBuffer {
        label: String,
        len: usize,
        usage: BufferUsage,
    }

    #[derive(Default)]
    struct FakeUploader {
        uploads: RefCell<Vec<FakeBuffer>>,
    }

    impl FakeUploader {
        fn record(&self, label: &str, len: usize, usage: BufferUsage) -> FakeBuffer {
            let buffer = FakeBuffer { label: label.to_string(), len, usage };
            self.uploads.borrow_mut().push(buffer.clone());
            buffer
        }
    }

    impl BufferUploader for FakeUploader {
        type Buffer = FakeBuffer;

        fn upload_vertices(&self, label: &str, data: &[f32], usage: BufferUsage) -> FakeBuffer {
            self.record(label, data.len(), usage)
        }

        fn upload_indices(&self, label: &str, data: &[u32], usage: BufferUsage) -> FakeBuffer {
            self.record(label, data.len(), usage)
        }
    }

    struct Road;

    fn batch(points: &[[f64; 2]]) -> LineBatch<Road> {
        let mut batch = LineBatch::new(2).unwrap();
        let flat: Vec<f64> = points.iter().flatten().copied().collect();
        batch.add_line(FeatureId(1), &Arc::new(Road), &flat, 2).unwrap();
        batch
    }

    fn channel(guard: &GpuContextGuard) -> LineBufferChannel {
        LineBufferChannel::new(&WorkerConfig::default(), guard.handle()).unwrap()
    }

    /// Pumps until the slot picks up a response or nothing is left in flight.
    fn settle(
        channel: &mut LineBufferChannel,
        slot: &mut LineBufferSlot<FakeBuffer>,
        uploader: &FakeUploader,
    ) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            channel.pump();
            if slot.refresh(uploader) {
                return true;
            }
            if channel.pending_count() == 0 || Instant::now() > deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn upload_counts_rows_and_returns_instructions() {
        let uploader = FakeUploader::default();
        let id = JobId::next();
        let buffers = LineBuffers {
            id,
            vertices: vec![0.0; 32],
            indices: vec![0, 1, 2, 1, 3, 2],
            vertex_stride: 8,
            inverse_transform: Affine2::translation(1.0, 2.0),
            instructions: vec![1.0; 5],
        };

        let (uploaded, instructions) = upload_line_buffers(&uploader, buffers, BufferUsage::Dynamic);
        assert_eq!(uploaded.id, id);
        assert_eq!(uploaded.vertex_count, 4);
        assert_eq!(uploaded.index_count, 6);
        assert_eq!(uploaded.inverse_transform, Affine2::translation(1.0, 2.0));
        assert_eq!(instructions.len(), 5);

        let uploads = uploader.uploads.borrow();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0].label, format!("{id} vertices"));
        assert_eq!(uploads[0].len, 32);
        assert_eq!(uploads[1].label, format!("{id} indices"));
        assert!(uploads.iter().all(|b| b.usage == BufferUsage::Dynamic));
    }

    #[test]
    fn slot_uploads_delivered_buffers() {
        let guard = GpuContextGuard::new();
        let mut channel = channel(&guard);
        let uploader = FakeUploader::default();
        let mut slot = LineBufferSlot::new(BufferUsage::Static);

        let lines = batch(&[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0]]);
        let id = slot.request(&mut channel, &lines, &[], &Affine2::IDENTITY).unwrap();
        assert_eq!(slot.pending_id(), Some(id));

        assert!(settle(&mut channel, &mut slot, &uploader));
        let current = slot.current().expect("uploaded");
        assert_eq!(current.id, id);
        assert_eq!(current.vertex_count, 8);
        assert_eq!(current.index_count, 12);
        assert_eq!(slot.pending_id(), None);
        // the worker handed the instruction buffer back for the next request
        assert_eq!(slot.spare_instructions.len(), instruction_count(&lines, &[]));
    }

    #[test]
    fn singular_transform_keeps_spare_instructions() {
        let guard = GpuContextGuard::new();
        let mut channel = channel(&guard);
        let uploader = FakeUploader::default();
        let mut slot = LineBufferSlot::new(BufferUsage::Static);

        let lines = batch(&[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0]]);
        slot.request(&mut channel, &lines, &[], &Affine2::IDENTITY).unwrap();
        assert!(settle(&mut channel, &mut slot, &uploader));
        let spare = slot.spare_instructions.len();
        assert!(spare > 0);

        let err = slot.request(&mut channel, &lines, &[], &Affine2::scale(0.0, 0.0)).unwrap_err();
        assert!(matches!(err, SubmitError::InvalidJob(TessellationError::SingularTransform)));
        assert_eq!(slot.spare_instructions.len(), spare);
        assert_eq!(channel.pending_count(), 0);
        assert!(slot.current().is_some());
    }

    #[test]
    fn superseded_request_never_reaches_the_gpu() {
        let guard = GpuContextGuard::new();
        let mut channel = channel(&guard);
        let uploader = FakeUploader::default();
        let mut slot = LineBufferSlot::new(BufferUsage::Static);

        let long = batch(&[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0]]);
        let short = batch(&[[0.0, 0.0], [5.0, 5.0]]);
        slot.request(&mut channel, &long, &[], &Affine2::IDENTITY).unwrap();
        let latest = slot.request(&mut channel, &short, &[], &Affine2::IDENTITY).unwrap();
        assert_eq!(channel.pending_count(), 1);

        assert!(settle(&mut channel, &mut slot, &uploader));
        let current = slot.current().expect("uploaded");
        assert_eq!(current.id, latest);
        assert_eq!(current.index_count, 6);
        assert_eq!(uploader.uploads.borrow().len(), 2);
    }

    #[test]
    fn released_context_keeps_previous_buffers() {
        let guard = GpuContextGuard::new();
        let mut channel = channel(&guard);
        let uploader = FakeUploader::default();
        let mut slot = LineBufferSlot::new(BufferUsage::Static);

        let lines = batch(&[[0.0, 0.0], [10.0, 0.0]]);
        slot.request(&mut channel, &lines, &[], &Affine2::IDENTITY).unwrap();
        guard.dispose();

        assert!(!settle(&mut channel, &mut slot, &uploader));
        assert!(slot.current().is_none());
        assert!(uploader.uploads.borrow().is_empty());
    }

    #[test]
    fn clear_forgets_in_flight_request() {
        let guard = GpuContextGuard::new();
        let mut channel = channel(&guard);
        let mut slot: LineBufferSlot<FakeBuffer> = LineBufferSlot::new(BufferUsage::Static);

        let lines = batch(&[[0.0, 0.0], [10.0, 0.0]]);
        slot.request(&mut channel, &lines, &[], &Affine2::IDENTITY).unwrap();
        slot.clear(&mut channel);

        assert_eq!(channel.pending_count(), 0);
        assert_eq!(slot.pending_id(), None);
        assert!(slot.current().is_none());
    }
}
