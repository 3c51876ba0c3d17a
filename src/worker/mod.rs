//! Optional background thread for line simplification and bounds.
//!
//! The worker never touches buffers. Callers submit a request, keep going, and later wait for
//! the response with a deadline; a timed-out request is abandoned on its own and its late
//! response is dropped.

use std::collections::{HashMap, HashSet};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crate::foundation::core::{Point, Rect};
use crate::foundation::error::{FxError, FxResult};
use crate::geometry::bounds_of;
use crate::geometry::simplify::douglas_peucker;

pub type RequestId = u64;

#[derive(Clone, Debug, PartialEq)]
pub enum WorkerRequest {
    SimplifyBatch { lines: Vec<Vec<Point>>, tolerance: f64 },
    Bounds { points: Vec<Point> },
}

#[derive(Clone, Debug, PartialEq)]
pub enum WorkerResponse {
    Simplified(Vec<Vec<Point>>),
    Bounds(Option<Rect>),
}

/// Default request handler.
pub fn handle_request(req: WorkerRequest) -> WorkerResponse {
    match req {
        WorkerRequest::SimplifyBatch { lines, tolerance } => WorkerResponse::Simplified(
            lines
                .iter()
                .map(|l| douglas_peucker(l, tolerance))
                .collect(),
        ),
        WorkerRequest::Bounds { points } => WorkerResponse::Bounds(bounds_of(&points)),
    }
}

type Envelope<T> = (RequestId, T);

pub struct SimplifyWorker {
    tx: Option<mpsc::Sender<Envelope<WorkerRequest>>>,
    rx: mpsc::Receiver<Envelope<WorkerResponse>>,
    handle: Option<thread::JoinHandle<()>>,
    next_id: RequestId,
    /// Responses that arrived while waiting for a different id.
    parked: HashMap<RequestId, WorkerResponse>,
    abandoned: HashSet<RequestId>,
}

impl SimplifyWorker {
    pub fn spawn() -> FxResult<Self> {
        Self::with_handler(handle_request)
    }

    /// Spawn with a custom request handler.
    pub fn with_handler(
        mut handler: impl FnMut(WorkerRequest) -> WorkerResponse + Send + 'static,
    ) -> FxResult<Self> {
        let (req_tx, req_rx) = mpsc::channel::<Envelope<WorkerRequest>>();
        let (resp_tx, resp_rx) = mpsc::channel::<Envelope<WorkerResponse>>();
        let handle = thread::Builder::new()
            .name("featurefx-simplify".into())
            .spawn(move || {
                for (id, req) in req_rx {
                    if resp_tx.send((id, handler(req))).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| FxError::worker(format!("spawn simplify worker: {e}")))?;
        Ok(Self {
            tx: Some(req_tx),
            rx: resp_rx,
            handle: Some(handle),
            next_id: 1,
            parked: HashMap::new(),
            abandoned: HashSet::new(),
        })
    }

    pub fn submit(&mut self, req: WorkerRequest) -> FxResult<RequestId> {
        let id = self.next_id;
        self.next_id += 1;
        self.tx
            .as_ref()
            .ok_or_else(|| FxError::worker("worker is shut down"))?
            .send((id, req))
            .map_err(|_| FxError::worker("worker thread exited"))?;
        Ok(id)
    }

    /// Block until the response for `id` arrives or `timeout` elapses.
    ///
    /// On timeout only `id` is abandoned. Responses for other pending ids received meanwhile
    /// are kept for their own `wait`.
    pub fn wait(&mut self, id: RequestId, timeout: Duration) -> FxResult<WorkerResponse> {
        if let Some(resp) = self.parked.remove(&id) {
            return Ok(resp);
        }
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok((rid, resp)) if rid == id => return Ok(resp),
                Ok((rid, resp)) => {
                    if !self.abandoned.remove(&rid) {
                        self.parked.insert(rid, resp);
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    self.abandoned.insert(id);
                    tracing::warn!(id, ?timeout, "simplify request timed out");
                    return Err(FxError::WorkerTimeout(id));
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    return Err(FxError::worker("worker thread exited"));
                }
            }
        }
    }

    pub fn pending_abandoned(&self) -> usize {
        self.abandoned.len()
    }
}

impl std::fmt::Debug for SimplifyWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimplifyWorker")
            .field("next_id", &self.next_id)
            .field("parked", &self.parked.len())
            .field("abandoned", &self.abandoned.len())
            .finish_non_exhaustive()
    }
}

impl Drop for SimplifyWorker {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(h) = self.handle.take()
            && h.join().is_err()
        {
            tracing::error!("simplify worker panicked");
        }
    }
}
