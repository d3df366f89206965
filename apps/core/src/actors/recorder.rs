use crate::actors::messages::{ActorError, AppError, QueuedInteraction, RecorderMessage};
use crate::brain::analyze_interaction_patterns;
use crate::database;
use crate::models::InteractionRecord;
use sqlx::sqlite::SqlitePool;
use std::future::Future;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

/// Retries after the first failed store attempt.
pub const MAX_STORE_RETRIES: u32 = 3;
pub const INITIAL_BACKOFF: Duration = Duration::from_millis(100);
/// How many recent interactions feed the tone, context and refinement summary.
/// `interaction_count` always covers the full history.
pub const PATTERN_WINDOW: i64 = 50;

/// A handle to the interaction recorder.
///
/// The API enqueues accepted interactions here and answers immediately; the
/// runner persists them in the background, in arrival order.
#[derive(Clone)]
pub struct RecorderHandle {
    sender: mpsc::Sender<RecorderMessage>,
}

impl RecorderHandle {
    /// Spawns the runner with a queue holding at most `capacity` pending messages.
    pub fn new(pool: SqlitePool, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let runner = RecorderRunner { receiver, pool };
        tokio::spawn(async move { runner.run().await });
        Self { sender }
    }

    /// Waits for queue capacity when the queue is full.
    pub async fn enqueue(&self, interaction: QueuedInteraction) -> Result<(), AppError> {
        self.sender
            .send(RecorderMessage::Record(interaction))
            .await
            .map_err(|_| ActorError::QueueClosed)?;
        Ok(())
    }

    /// Resolves once every message sent before it has been handled.
    pub async fn flush(&self) -> Result<(), AppError> {
        let (send, recv) = oneshot::channel();
        self.sender
            .send(RecorderMessage::Flush { responder: send })
            .await
            .map_err(|_| ActorError::QueueClosed)?;
        recv.await.map_err(|_| ActorError::QueueClosed)?;
        Ok(())
    }

    /// Stops the runner after the messages already queued.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        self.sender
            .send(RecorderMessage::Shutdown)
            .await
            .map_err(|_| ActorError::QueueClosed)?;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }
}

/// Runs `operation`, retrying up to `max_retries` times with doubling delays.
pub async fn retry_with_backoff<F, Fut, T, E>(
    mut operation: F,
    max_retries: u32,
    initial_delay: Duration,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut retry_count = 0;
    let mut delay = initial_delay;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if retry_count < max_retries => {
                retry_count += 1;
                warn!(
                    "Operation failed (attempt {}/{}): {}, retrying in {:?}",
                    retry_count,
                    max_retries + 1,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(e) => return Err(e),
        }
    }
}

struct RecorderRunner {
    receiver: mpsc::Receiver<RecorderMessage>,
    pool: SqlitePool,
}

impl RecorderRunner {
    async fn run(mut self) {
        info!("Interaction recorder started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                RecorderMessage::Record(interaction) => self.record(interaction).await,
                RecorderMessage::Flush { responder } => {
                    let _ = responder.send(());
                }
                RecorderMessage::Shutdown => {
                    info!("Interaction recorder shutting down...");
                    break;
                }
            }
        }

        info!("Interaction recorder stopped");
    }

    async fn record(&self, interaction: QueuedInteraction) {
        let record = InteractionRecord {
            interaction_id: interaction.interaction_id,
            user_id: interaction.user_id,
            situation_description: interaction.situation_description,
            detected_context: interaction.detected_context,
            selected_response: interaction.selected_response,
            selected_tone: interaction.selected_tone,
            refinement_count: i64::from(interaction.refinement_count),
            timestamp: interaction.timestamp,
        };

        let stored = retry_with_backoff(
            || database::insert_interaction(&self.pool, &record),
            MAX_STORE_RETRIES,
            INITIAL_BACKOFF,
        )
        .await;

        if let Err(e) = stored {
            error!(
                interaction_id = %record.interaction_id,
                user_id = %record.user_id,
                "Failed to store interaction: {}", e
            );
            return;
        }

        if let Err(e) = self.refresh_patterns(&record.user_id).await {
            error!(user_id = %record.user_id, "Failed to update interaction patterns: {}", e);
        }

        info!(interaction_id = %record.interaction_id, "Interaction recorded");
    }

    async fn refresh_patterns(&self, user_id: &str) -> Result<(), sqlx::Error> {
        let recent = database::get_user_interactions(&self.pool, user_id, None, PATTERN_WINDOW).await?;
        let mut patterns = analyze_interaction_patterns(&recent);
        let total = database::count_user_interactions(&self.pool, user_id).await?;
        patterns.interaction_count = usize::try_from(total).unwrap_or(patterns.interaction_count);
        database::upsert_user_patterns(&self.pool, user_id, &patterns).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_retry_succeeds_after_failures() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let result: Result<&str, String> = retry_with_backoff(
            || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err("transient".to_string())
                    } else {
                        Ok("stored")
                    }
                }
            },
            MAX_STORE_RETRIES,
            Duration::from_millis(1),
        )
        .await;

        assert_eq!(result, Ok("stored"));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_retries() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let result: Result<(), String> = retry_with_backoff(
            || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err("down".to_string())
                }
            },
            MAX_STORE_RETRIES,
            Duration::from_millis(1),
        )
        .await;

        assert_eq!(result, Err("down".to_string()));
        assert_eq!(attempts.load(Ordering::SeqCst), MAX_STORE_RETRIES + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_backoff_doubles() {
        let start = tokio::time::Instant::now();
        let _: Result<(), String> =
            retry_with_backoff(|| async { Err("down".to_string()) }, 3, INITIAL_BACKOFF).await;
        // 100 + 200 + 400 ms
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(700));
        assert!(elapsed < Duration::from_millis(800));
    }
}
