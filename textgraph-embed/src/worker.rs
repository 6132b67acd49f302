//! Worker task that owns the embedding model.
//!
//! Requests arrive over an `mpsc` channel and every reply carries the
//! `callback_id` of its request. Loading runs inline so a second `Load`
//! observes the first one's result; embedding and attention requests run
//! on their own tasks once the model is loaded.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::attention::{ModelInfo, cosine_attention};
use crate::error::BackendError;
use crate::model::{EmbeddingModel, ProgressReporter};
use crate::protocol::{
    BackendStatus, TaskType, WorkerMessage, WorkerReply, WorkerRequest, WorkerResponse,
};

/// Channels connecting a client to a running worker.
pub struct WorkerHandles {
    pub requests: mpsc::Sender<WorkerMessage>,
    pub responses: mpsc::UnboundedReceiver<WorkerResponse>,
    pub status: watch::Receiver<BackendStatus>,
    pub task: JoinHandle<()>,
}

struct Worker {
    model: Arc<dyn EmbeddingModel>,
    batch_size: usize,
    status: Arc<watch::Sender<BackendStatus>>,
    device: Option<String>,
    responses: mpsc::UnboundedSender<WorkerResponse>,
}

/// Start a worker for `model`. Must be called from within a Tokio runtime.
pub fn spawn_worker(model: Arc<dyn EmbeddingModel>, batch_size: usize) -> WorkerHandles {
    let (request_tx, request_rx) = mpsc::channel(64);
    let (response_tx, response_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = watch::channel(BackendStatus::waiting(
        model.model_id(),
        model.dimensions(),
    ));

    let worker = Worker {
        model,
        batch_size: batch_size.max(1),
        status: Arc::new(status_tx),
        device: None,
        responses: response_tx,
    };
    let task = tokio::spawn(worker.run(request_rx));

    WorkerHandles {
        requests: request_tx,
        responses: response_rx,
        status: status_rx,
        task,
    }
}

impl Worker {
    async fn run(mut self, mut requests: mpsc::Receiver<WorkerMessage>) {
        while let Some(WorkerMessage {
            callback_id,
            request,
        }) = requests.recv().await
        {
            debug!(callback_id, kind = request.kind(), "Worker received request");

            if let WorkerRequest::Load = request {
                let result = self.load().await;
                self.reply(callback_id, result);
                continue;
            }

            let Some(device) = self.device.clone() else {
                self.reply(callback_id, Err(BackendError::ModelNotLoaded));
                continue;
            };

            let model = Arc::clone(&self.model);
            let status = Arc::clone(&self.status);
            let responses = self.responses.clone();
            let batch_size = self.batch_size;
            tokio::spawn(async move {
                let result = handle(model.as_ref(), &device, batch_size, request).await;
                if let Err(e) = &result {
                    record_error(&status, e);
                }
                let _ = responses.send(WorkerResponse {
                    callback_id,
                    result,
                });
            });
        }
        debug!("Embedding worker stopped");
    }

    async fn load(&mut self) -> Result<WorkerReply, BackendError> {
        if let Some(device) = &self.device {
            return Ok(WorkerReply::Loaded {
                device: device.clone(),
            });
        }

        self.status.send_modify(|s| {
            s.is_loading = true;
            s.status = "Loading model...".into();
            s.error = None;
        });

        let reporter = ProgressReporter::new(Arc::clone(&self.status));
        match self.model.load(&reporter).await {
            Ok(device) => {
                info!(model = self.model.model_id(), %device, "Embedding model loaded");
                self.status.send_modify(|s| {
                    s.is_loading = false;
                    s.is_ready = true;
                    s.progress = 100;
                    s.device = Some(device.clone());
                    s.status = format!("Ready ({device})");
                });
                self.device = Some(device.clone());
                Ok(WorkerReply::Loaded { device })
            }
            Err(e) => {
                self.status.send_modify(|s| s.is_loading = false);
                record_error(&self.status, &e);
                Err(e)
            }
        }
    }

    fn reply(&self, callback_id: u64, result: Result<WorkerReply, BackendError>) {
        if self
            .responses
            .send(WorkerResponse {
                callback_id,
                result,
            })
            .is_err()
        {
            warn!(callback_id, "Reply dropped, client is gone");
        }
    }
}

fn record_error(status: &watch::Sender<BackendStatus>, error: &BackendError) {
    warn!(error = %error, "Embedding worker error");
    status.send_modify(|s| {
        s.error = Some(error.to_string());
        s.status = "Error occurred".into();
    });
}

async fn embed_all(
    model: &dyn EmbeddingModel,
    batch_size: usize,
    texts: &[String],
    task_type: TaskType,
) -> Result<Vec<Vec<f64>>, BackendError> {
    let mut embeddings = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size) {
        let vectors = model.embed_batch(batch, task_type).await?;
        if vectors.len() != batch.len() {
            return Err(BackendError::model(format!(
                "model returned {} vectors for {} texts",
                vectors.len(),
                batch.len()
            )));
        }
        embeddings.extend(vectors);
    }
    Ok(embeddings)
}

async fn handle(
    model: &dyn EmbeddingModel,
    device: &str,
    batch_size: usize,
    request: WorkerRequest,
) -> Result<WorkerReply, BackendError> {
    match request {
        WorkerRequest::Load => Ok(WorkerReply::Loaded {
            device: device.to_string(),
        }),
        WorkerRequest::Embed { texts, task_type } => {
            let embeddings = embed_all(model, batch_size, &texts, task_type).await?;
            Ok(WorkerReply::Embeddings(embeddings))
        }
        WorkerRequest::Attention { tokens, task_type } => {
            let embeddings = embed_all(model, batch_size, &tokens, task_type).await?;
            let info = ModelInfo {
                model_id: model.model_id(),
                device,
                task_type,
            };
            let result = cosine_attention(tokens, &embeddings, &info)?;
            Ok(WorkerReply::Attention(Box::new(result)))
        }
    }
}
