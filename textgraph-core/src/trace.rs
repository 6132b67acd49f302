//! Computation trace hook.
//!
//! The pipeline reports each stage as a [`TraceEvent`] to an injected
//! [`TraceSink`]. The default sink discards everything.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// One observable step of an attention computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    Tokenized {
        query: Vec<String>,
        paragraph: Vec<String>,
    },
    Embedded {
        index: usize,
        token: String,
        dimensions: usize,
        min: f64,
        max: f64,
        mean: f64,
        magnitude: f64,
    },
    Scored {
        row: usize,
        col: usize,
        raw: f64,
    },
    Normalized {
        row: usize,
        values: Vec<f64>,
        /// The row summed to zero and was passed through unnormalized.
        degenerate: bool,
    },
    Aggregated {
        min: f64,
        max: f64,
    },
}

impl TraceEvent {
    /// Build an `Embedded` event with summary statistics of `vector`.
    pub fn embedded(index: usize, token: &str, vector: &[f64]) -> Self {
        let dimensions = vector.len();
        let (min, max) = vector
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let mean = if dimensions > 0 {
            vector.iter().sum::<f64>() / dimensions as f64
        } else {
            0.0
        };
        let magnitude = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
        Self::Embedded {
            index,
            token: token.to_string(),
            dimensions,
            min,
            max,
            mean,
            magnitude,
        }
    }
}

/// Receiver of trace events.
pub trait TraceSink: Send + Sync {
    fn record(&self, event: &TraceEvent);
}

/// Discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTrace;

impl TraceSink for NoopTrace {
    fn record(&self, _event: &TraceEvent) {}
}

/// Forwards events to `tracing` at TRACE level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTrace;

impl TraceSink for LogTrace {
    fn record(&self, event: &TraceEvent) {
        match event {
            TraceEvent::Tokenized { query, paragraph } => {
                tracing::trace!(query = ?query, paragraph_len = paragraph.len(), "tokenized");
            }
            TraceEvent::Embedded {
                index,
                token,
                dimensions,
                min,
                max,
                mean,
                magnitude,
            } => {
                tracing::trace!(index, %token, dimensions, min, max, mean, magnitude, "embedded");
            }
            TraceEvent::Scored { row, col, raw } => {
                tracing::trace!(row, col, raw, "scored");
            }
            TraceEvent::Normalized {
                row,
                values,
                degenerate,
            } => {
                tracing::trace!(row, values = ?values, degenerate, "normalized");
            }
            TraceEvent::Aggregated { min, max } => {
                tracing::trace!(min, max, "aggregated");
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingTrace {
    events: Mutex<Vec<TraceEvent>>,
}

impl RecordingTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TraceSink for RecordingTrace {
    fn record(&self, event: &TraceEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
