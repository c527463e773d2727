//! Debounced auto-save of assessment answers.
//!
//! Clients send every rating change as it happens. [`AutosaveQueue`] holds
//! the latest value per `(assessment, question)` and writes it once the key
//! has been quiet for the debounce interval. Scheduling a new value for a
//! key cancels the pending write of the previous one. Completion calls
//! [`AutosaveQueue::flush`] so no answer is left behind when the score is
//! computed.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use sqlx::PgPool;
use starthub_core::beep::Rating;
use starthub_core::types::DbId;
use starthub_db::repositories::AnswerRepo;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::is_retryable_conflict;

/// `(assessment_id, question_id)`.
type AnswerKey = (DbId, DbId);

/// Why a single answer write failed.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// A deadlock or serialization failure; worth one retry.
    #[error("Write conflict: {0}")]
    Conflict(String),

    /// The assessment is gone or no longer a draft.
    #[error("Assessment {0} no longer accepts answers")]
    Closed(DbId),

    #[error("Write failed: {0}")]
    Failed(String),
}

/// Destination of auto-saved answers.
pub trait AnswerSink: Send + Sync + 'static {
    /// Persist one answer, overwriting any previous value.
    fn write(
        &self,
        assessment_id: DbId,
        question_id: DbId,
        rating: Rating,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// [`AnswerSink`] backed by [`AnswerRepo::upsert`].
#[derive(Clone)]
pub struct PgAnswerSink {
    pool: PgPool,
}

impl PgAnswerSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl AnswerSink for PgAnswerSink {
    async fn write(
        &self,
        assessment_id: DbId,
        question_id: DbId,
        rating: Rating,
    ) -> Result<(), SinkError> {
        match AnswerRepo::upsert(&self.pool, assessment_id, question_id, rating).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(SinkError::Closed(assessment_id)),
            Err(e) if is_retryable_conflict(&e) => Err(SinkError::Conflict(e.to_string())),
            Err(e) => Err(SinkError::Failed(e.to_string())),
        }
    }
}

/// Write through `sink`, retrying once on a conflict.
pub async fn write_with_retry<S: AnswerSink>(
    sink: &S,
    assessment_id: DbId,
    question_id: DbId,
    rating: Rating,
) -> Result<(), SinkError> {
    match sink.write(assessment_id, question_id, rating).await {
        Err(SinkError::Conflict(reason)) => {
            tracing::debug!(assessment_id, question_id, %reason, "Answer write conflict, retrying");
            sink.write(assessment_id, question_id, rating).await
        }
        other => other,
    }
}

/// A scheduled write that has not finished yet.
struct PendingWrite {
    generation: u64,
    /// Cancelled when a newer value supersedes this one.
    superseded: CancellationToken,
    /// Notified to skip the remaining debounce.
    write_now: Arc<Notify>,
    handle: JoinHandle<()>,
}

/// Per-key debounced writer of answers.
pub struct AutosaveQueue<S: AnswerSink> {
    sink: Arc<S>,
    debounce: Duration,
    pending: Arc<Mutex<HashMap<AnswerKey, PendingWrite>>>,
    next_generation: AtomicU64,
}

fn lock(
    pending: &Mutex<HashMap<AnswerKey, PendingWrite>>,
) -> MutexGuard<'_, HashMap<AnswerKey, PendingWrite>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S: AnswerSink> AutosaveQueue<S> {
    pub fn new(sink: S, debounce: Duration) -> Self {
        Self {
            sink: Arc::new(sink),
            debounce,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(1),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Number of scheduled writes that have not finished yet.
    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Schedule `rating` to be written after the debounce interval,
    /// replacing any pending value for the same question.
    ///
    /// Writes for one key run in scheduling order: the new task waits for
    /// the task it replaces, so a superseded write that is already running
    /// always lands before the newer value.
    pub fn schedule(&self, assessment_id: DbId, question_id: DbId, rating: Rating) {
        let key = (assessment_id, question_id);
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let superseded = CancellationToken::new();
        let write_now = Arc::new(Notify::new());

        let mut map = lock(&self.pending);
        let previous = map.remove(&key).map(|p| {
            p.superseded.cancel();
            p.handle
        });

        let task = {
            let sink = Arc::clone(&self.sink);
            let pending = Arc::clone(&self.pending);
            let superseded = superseded.clone();
            let write_now = Arc::clone(&write_now);
            let debounce = self.debounce;

            async move {
                let due = tokio::select! {
                    _ = superseded.cancelled() => false,
                    _ = write_now.notified() => true,
                    _ = tokio::time::sleep(debounce) => true,
                };

                // Even when cancelled, finish only after the older write so
                // whoever waits on this task also waits on that one.
                if let Some(previous) = previous {
                    if let Err(e) = previous.await {
                        tracing::error!(error = %e, "Auto-save task panicked");
                    }
                }

                if !due || superseded.is_cancelled() {
                    return;
                }

                // Stay in the map while writing so a flush waits for this write.
                let outcome =
                    write_with_retry(sink.as_ref(), assessment_id, question_id, rating).await;
                {
                    let mut map = lock(&pending);
                    if map.get(&key).is_some_and(|p| p.generation == generation) {
                        map.remove(&key);
                    }
                }

                match outcome {
                    Ok(()) => {
                        tracing::debug!(assessment_id, question_id, "Auto-saved answer");
                    }
                    Err(SinkError::Closed(_)) => {
                        tracing::info!(
                            assessment_id,
                            question_id,
                            "Dropped auto-save for closed assessment"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(assessment_id, question_id, error = %e, "Auto-save failed");
                    }
                }
            }
        };

        let handle = tokio::spawn(task);
        map.insert(
            key,
            PendingWrite {
                generation,
                superseded,
                write_now,
                handle,
            },
        );
    }

    /// Write every pending answer of `assessment_id` now and wait for the writes.
    pub async fn flush(&self, assessment_id: DbId) {
        let drained: Vec<PendingWrite> = {
            let mut map = lock(&self.pending);
            let keys: Vec<AnswerKey> = map
                .keys()
                .filter(|(a, _)| *a == assessment_id)
                .copied()
                .collect();
            keys.into_iter().filter_map(|k| map.remove(&k)).collect()
        };

        if !drained.is_empty() {
            tracing::debug!(assessment_id, count = drained.len(), "Flushing auto-saves");
        }
        Self::run_now(drained).await;
    }

    /// Write everything that is pending, e.g. on shutdown.
    pub async fn flush_all(&self) {
        let drained: Vec<PendingWrite> = {
            let mut map = lock(&self.pending);
            map.drain().map(|(_, p)| p).collect()
        };
        if !drained.is_empty() {
            tracing::info!(count = drained.len(), "Flushing all pending auto-saves");
        }
        Self::run_now(drained).await;
    }

    async fn run_now(writes: Vec<PendingWrite>) {
        for write in &writes {
            write.write_now.notify_one();
        }
        for write in writes {
            if let Err(e) = write.handle.await {
                tracing::error!(error = %e, "Auto-save task panicked");
            }
        }
    }
}
