use std::io;
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};
use std::thread::{self, JoinHandle};

use crate::tessellate::{tessellate, TessellationJob};

use super::{SubmitError, WorkerRequest, WorkerResponse};

/// Background thread configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub thread_name: String,
    /// Requests that may wait in the queue before `submit` reports it full.
    pub queue_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            thread_name: "flowline-tessellator".to_string(),
            queue_capacity: 8,
        }
    }
}

/// Long-lived tessellation thread.
///
/// Jobs are processed one at a time in submission order; each is tessellated
/// end-to-end before its response is sent. The thread never touches GPU state.
pub struct TessellationWorker {
    requests: Option<SyncSender<WorkerRequest>>,
    responses: Receiver<WorkerResponse>,
    handle: Option<JoinHandle<()>>,
    gone: bool,
}

impl TessellationWorker {
    pub fn spawn(config: &WorkerConfig) -> io::Result<Self> {
        let (request_tx, request_rx) = mpsc::sync_channel(config.queue_capacity.max(1));
        let (response_tx, response_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || run(request_rx, response_tx))?;

        log::debug!("spawned tessellation worker '{}'", config.thread_name);

        Ok(Self {
            requests: Some(request_tx),
            responses: response_rx,
            handle: Some(handle),
            gone: false,
        })
    }

    /// Moves a job to the worker without blocking.
    pub fn send(&self, job: TessellationJob) -> Result<(), SubmitError> {
        let Some(requests) = self.requests.as_ref() else {
            return Err(SubmitError::WorkerGone(job));
        };
        match requests.try_send(WorkerRequest::GenerateLineBuffers(job)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(WorkerRequest::GenerateLineBuffers(job))) => {
                Err(SubmitError::QueueFull(job))
            }
            Err(TrySendError::Disconnected(WorkerRequest::GenerateLineBuffers(job))) => {
                Err(SubmitError::WorkerGone(job))
            }
            // Only job requests are sent through here.
            Err(_) => unreachable!("non-job request returned from try_send"),
        }
    }

    /// Next finished response, if any.
    pub fn try_recv(&mut self) -> Option<WorkerResponse> {
        match self.responses.try_recv() {
            Ok(response) => Some(response),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                if !self.gone {
                    log::error!("tessellation worker exited; pending jobs will not resolve");
                    self.gone = true;
                }
                None
            }
        }
    }
}

impl Drop for TessellationWorker {
    fn drop(&mut self) {
        if let Some(requests) = self.requests.take() {
            // If the queue is full the worker drains it and stops on disconnect.
            let _ = requests.try_send(WorkerRequest::Shutdown);
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("tessellation worker panicked");
            }
        }
    }
}

fn run(requests: Receiver<WorkerRequest>, responses: mpsc::Sender<WorkerResponse>) {
    while let Ok(request) = requests.recv() {
        let job = match request {
            WorkerRequest::GenerateLineBuffers(job) => job,
            WorkerRequest::Shutdown => break,
        };

        let id = job.id;
        log::debug!("{id}: tessellating {} instruction floats", job.instructions.len());
        let result = tessellate(job);

        if responses.send(WorkerResponse { id, result }).is_err() {
            // Requester is gone; nobody will read further results.
            break;
        }
    }
    log::debug!("tessellation worker stopped");
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::coords::Affine2;

    fn wait(worker: &mut TessellationWorker) -> WorkerResponse {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(r) = worker.try_recv() {
                return r;
            }
            assert!(Instant::now() < deadline, "worker did not answer");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn answers_each_job_with_its_id() {
        let mut worker = TessellationWorker::spawn(&WorkerConfig::default()).unwrap();
        let job = TessellationJob::new(vec![2.0, 0.0, 0.0, 1.0, 0.0], Affine2::IDENTITY, 0, 2);
        let id = job.id;
        worker.send(job).unwrap();

        let response = wait(&mut worker);
        assert_eq!(response.id, id);
        let buffers = response.result.unwrap();
        assert_eq!(buffers.vertex_count(), 4);
        // instruction buffer comes back for reuse
        assert_eq!(buffers.instructions.len(), 5);
    }

    #[test]
    fn malformed_job_reports_error() {
        let mut worker = TessellationWorker::spawn(&WorkerConfig::default()).unwrap();
        worker.send(TessellationJob::new(vec![4.0, 0.0], Affine2::IDENTITY, 0, 2)).unwrap();
        assert!(wait(&mut worker).result.is_err());
    }

    #[test]
    fn processes_in_submission_order() {
        let mut worker = TessellationWorker::spawn(&WorkerConfig::default()).unwrap();
        let ids: Vec<_> = (0..4)
            .map(|_| {
                let job = TessellationJob::new(vec![0.0], Affine2::IDENTITY, 0, 2);
                let id = job.id;
                worker.send(job).unwrap();
                id
            })
            .collect();
        let answered: Vec<_> = (0..4).map(|_| wait(&mut worker).id).collect();
        assert_eq!(answered, ids);
    }
}
