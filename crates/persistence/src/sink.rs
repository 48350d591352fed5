//! Batched persistence sink (spec §4.10, C10): `W` workers, each holding its
//! own batch of up to `B` records and a `T` flush ticker, draining one shared
//! bounded channel. Mirrors the original's per-worker `select` over the job
//! channel and a ticker (`game_save_worker_pool.go`), adapted to tokio: the
//! channel's single `Receiver` is shared behind a mutex so every worker still
//! competes for the same queue.

use crate::store::GameStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use wire::PersistedGame;

pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);
pub const BATCH_WRITE_TIMEOUT: Duration = Duration::from_secs(10);
pub const FALLBACK_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle for submitting completed games. `save_game` never blocks: a full
/// queue falls back to a detached single-record write, exactly like the
/// original's `go func() { ... }` fallback.
#[derive(Clone)]
pub struct PersistenceSink {
    jobs: mpsc::Sender<PersistedGame>,
    store: Arc<dyn GameStore>,
}

impl PersistenceSink {
    pub fn save_game(&self, game: PersistedGame) {
        if let Err(mpsc::error::TrySendError::Full(game)) = self.jobs.try_send(game) {
            tracing::warn!(game_id = %game.game_id, "persistence queue full, falling back to direct write");
            let store = self.store.clone();
            tokio::spawn(async move {
                let result =
                    tokio::time::timeout(FALLBACK_WRITE_TIMEOUT, store.save_game(&game)).await;
                match result {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        tracing::error!(game_id = %game.game_id, %err, "fallback game write failed")
                    }
                    Err(_) => {
                        tracing::error!(game_id = %game.game_id, "fallback game write timed out")
                    }
                }
            });
        }
    }
}

/// Spawns `worker_count` batching workers and returns the sink used to
/// submit games plus the task handles (for clean shutdown in tests/mains).
pub fn spawn_persistence_workers(
    store: Arc<dyn GameStore>,
    worker_count: usize,
    queue_capacity: usize,
    batch_size: usize,
    flush_interval: Duration,
) -> (PersistenceSink, Vec<JoinHandle<()>>) {
    let (tx, rx) = mpsc::channel(queue_capacity);
    let rx = Arc::new(Mutex::new(rx));

    let handles = (0..worker_count)
        .map(|worker_id| {
            let rx = rx.clone();
            let store = store.clone();
            tokio::spawn(async move {
                run_worker(worker_id, rx, store, batch_size, flush_interval).await;
            })
        })
        .collect();

    (
        PersistenceSink {
            jobs: tx,
            store,
        },
        handles,
    )
}

async fn run_worker(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::Receiver<PersistedGame>>>,
    store: Arc<dyn GameStore>,
    batch_size: usize,
    flush_interval: Duration,
) {
    let mut batch: Vec<PersistedGame> = Vec::with_capacity(batch_size);
    let mut ticker = tokio::time::interval(flush_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            job = async { rx.lock().await.recv().await } => {
                match job {
                    Some(game) => {
                        batch.push(game);
                        if batch.len() >= batch_size {
                            flush(worker_id, &store, &mut batch).await;
                        }
                    }
                    None => {
                        if !batch.is_empty() {
                            flush(worker_id, &store, &mut batch).await;
                        }
                        tracing::debug!(worker_id, "persistence job channel closed, worker exiting");
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                if !batch.is_empty() {
                    flush(worker_id, &store, &mut batch).await;
                }
            }
        }
    }
}

async fn flush(worker_id: usize, store: &Arc<dyn GameStore>, batch: &mut Vec<PersistedGame>) {
    let count = batch.len();
    let started = tokio::time::Instant::now();
    let result = tokio::time::timeout(BATCH_WRITE_TIMEOUT, store.save_games_batch(batch)).await;
    let elapsed = started.elapsed();
    match result {
        Ok(Ok(())) => {
            tracing::info!(worker_id, count, ?elapsed, "flushed game batch");
        }
        Ok(Err(err)) => {
            tracing::error!(worker_id, count, ?elapsed, %err, "batch flush failed");
        }
        Err(_) => {
            tracing::error!(worker_id, count, ?elapsed, "batch flush timed out");
        }
    }
    batch.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use async_trait::async_trait;

    #[derive(Default)]
    struct RecordingStore {
        saved: tokio::sync::Mutex<Vec<PersistedGame>>,
    }

    #[async_trait]
    impl GameStore for RecordingStore {
        async fn save_game(&self, game: &PersistedGame) -> Result<(), StoreError> {
            self.saved.lock().await.push(game.clone());
            Ok(())
        }
    }

    fn sample_game(id: &str) -> PersistedGame {
        PersistedGame {
            game_id: id.into(),
            white: wire::GameCreatePlayer { user_id: "w".into(), username: "w".into(), rating: 1200 },
            black: wire::GameCreatePlayer { user_id: "b".into(), username: "b".into(), rating: 1200 },
            moves: vec!["e4".into(), "e5".into()],
            result: "1-0".into(),
            created_at: "2026-01-01T00:00:00Z".into(),
            time_control: "3+2".into(),
            game_type: "3_2".into(),
            winner_id: "w".into(),
            white_time_left: 120,
            black_time_left: 100,
            reason: "checkmate".into(),
            last_fen: "startpos".into(),
        }
    }

    #[tokio::test]
    async fn flush_fires_on_timer_tick_with_a_nonempty_batch() {
        let recording = Arc::new(RecordingStore::default());
        let store: Arc<dyn GameStore> = recording.clone();
        let (sink, handles) =
            spawn_persistence_workers(store, 1, 16, 50, Duration::from_millis(20));

        sink.save_game(sample_game("g1"));
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(recording.saved.lock().await.len(), 1);

        drop(sink);
        for handle in handles {
            handle.abort();
        }
    }

    #[tokio::test]
    async fn flush_fires_when_batch_reaches_batch_size() {
        let recording = Arc::new(RecordingStore::default());
        let store: Arc<dyn GameStore> = recording.clone();
        let (sink, handles) =
            spawn_persistence_workers(store, 1, 16, 2, Duration::from_secs(60));

        sink.save_game(sample_game("g1"));
        sink.save_game(sample_game("g2"));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(recording.saved.lock().await.len(), 2);

        drop(sink);
        for handle in handles {
            handle.abort();
        }
    }
}
