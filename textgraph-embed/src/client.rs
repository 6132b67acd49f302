//! Request/response client for the embedding worker.
//!
//! Every request gets a fresh `callback_id` and a pending slot; a dispatcher
//! task routes worker replies back to the slot with the same id. Requests
//! that are not answered within the configured timeout fail with
//! [`BackendError::Timeout`] and their slot is released.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use textgraph_core::config::BackendConfig;
use textgraph_core::{ComputationResult, GatError};
use tokio::sync::{OnceCell, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::BackendError;
use crate::model::EmbeddingModel;
use crate::protocol::{
    BackendStatus, TaskType, WorkerMessage, WorkerReply, WorkerRequest, WorkerResponse,
};
use crate::worker::{WorkerHandles, spawn_worker};

type ReplySender = oneshot::Sender<Result<WorkerReply, BackendError>>;
type PendingMap = Arc<Mutex<HashMap<u64, ReplySender>>>;

fn lock(
    pending: &Mutex<HashMap<u64, ReplySender>>,
) -> MutexGuard<'_, HashMap<u64, ReplySender>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Releases a pending slot when the request finishes, times out, or is
/// cancelled by the caller.
struct PendingGuard<'a> {
    pending: &'a Mutex<HashMap<u64, ReplySender>>,
    callback_id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        lock(self.pending).remove(&self.callback_id);
    }
}

/// Async handle to a running embedding worker.
pub struct EmbeddingClient {
    requests: mpsc::Sender<WorkerMessage>,
    pending: PendingMap,
    next_id: AtomicU64,
    timeout: Duration,
    status: watch::Receiver<BackendStatus>,
    device: OnceCell<String>,
    worker: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
}

impl EmbeddingClient {
    /// Start a worker for `model` and connect to it. Must be called from
    /// within a Tokio runtime.
    pub fn spawn(model: Arc<dyn EmbeddingModel>, config: &BackendConfig) -> Self {
        let WorkerHandles {
            requests,
            responses,
            status,
            task,
        } = spawn_worker(model, config.batch_size);

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let dispatcher = tokio::spawn(dispatch(responses, Arc::clone(&pending)));

        Self {
            requests,
            pending,
            next_id: AtomicU64::new(1),
            timeout: Duration::from_secs(config.timeout_secs),
            status,
            device: OnceCell::new(),
            worker: task,
            dispatcher,
        }
    }

    /// Load the model once. Concurrent callers share a single load; a failed
    /// load leaves the client uninitialized so the next call retries.
    pub async fn initialize(&self) -> Result<String, BackendError> {
        let device = self
            .device
            .get_or_try_init(|| async {
                match self.request(WorkerRequest::Load).await? {
                    (_, WorkerReply::Loaded { device }) => Ok(device),
                    (callback_id, _) => Err(BackendError::UnexpectedReply {
                        callback_id,
                        expected: "loaded",
                    }),
                }
            })
            .await?;
        Ok(device.clone())
    }

    /// Embed `texts`, loading the model first if needed.
    pub async fn embed(
        &self,
        texts: Vec<String>,
        task_type: TaskType,
    ) -> Result<Vec<Vec<f64>>, BackendError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.initialize().await?;
        match self
            .request(WorkerRequest::Embed { texts, task_type })
            .await?
        {
            (_, WorkerReply::Embeddings(embeddings)) => Ok(embeddings),
            (callback_id, _) => Err(BackendError::UnexpectedReply {
                callback_id,
                expected: "embeddings",
            }),
        }
    }

    /// Cosine-similarity attention over `tokens`, loading the model first if
    /// needed.
    pub async fn attention(
        &self,
        tokens: Vec<String>,
        task_type: TaskType,
    ) -> Result<ComputationResult, BackendError> {
        if tokens.is_empty() {
            return Err(GatError::EmptyQuery.into());
        }
        self.initialize().await?;
        match self
            .request(WorkerRequest::Attention { tokens, task_type })
            .await?
        {
            (_, WorkerReply::Attention(result)) => Ok(*result),
            (callback_id, _) => Err(BackendError::UnexpectedReply {
                callback_id,
                expected: "attention",
            }),
        }
    }

    pub fn status(&self) -> BackendStatus {
        self.status.borrow().clone()
    }

    /// Receiver that observes every status change.
    pub fn subscribe(&self) -> watch::Receiver<BackendStatus> {
        self.status.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.device.initialized()
    }

    /// Requests still waiting for a reply.
    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn request(&self, request: WorkerRequest) -> Result<(u64, WorkerReply), BackendError> {
        let callback_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(callback_id, tx);
        let _guard = PendingGuard {
            pending: &self.pending,
            callback_id,
        };

        let kind = request.kind();
        debug!(callback_id, kind, "Sending backend request");

        let exchange = async {
            self.requests
                .send(WorkerMessage {
                    callback_id,
                    request,
                })
                .await
                .map_err(|_| BackendError::WorkerClosed)?;
            rx.await.map_err(|_| BackendError::WorkerClosed)?
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result.map(|reply| (callback_id, reply)),
            Err(_) => {
                warn!(
                    callback_id,
                    kind,
                    timeout_secs = self.timeout.as_secs(),
                    "Backend request timed out"
                );
                Err(BackendError::Timeout {
                    callback_id,
                    timeout_secs: self.timeout.as_secs(),
                })
            }
        }
    }
}

impl Drop for EmbeddingClient {
    fn drop(&mut self) {
        self.dispatcher.abort();
        self.worker.abort();
    }
}

async fn dispatch(
    mut responses: mpsc::UnboundedReceiver<WorkerResponse>,
    pending: PendingMap,
) {
    while let Some(response) = responses.recv().await {
        let callback_id = response.callback_id;
        let slot = lock(&pending).remove(&callback_id);
        match slot {
            Some(tx) => {
                if tx.send(response.result).is_err() {
                    debug!(callback_id, "Requester went away before the reply");
                }
            }
            None => warn!(callback_id, "Reply for unknown or expired request"),
        }
    }
    info!("Embedding worker disconnected");
}
