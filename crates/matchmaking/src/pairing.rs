//! Pairing worker (spec §4.9, C9): a fixed pool of tasks draining a bounded
//! channel of join jobs, assigning colours by historical balance, and
//! emitting `game.create` envelopes onto the durable-queue substitute.

use crate::pool::{MatchmakingPool, WaitingPlayer};
use crate::player_client::{PlayerServiceClient, COLOR_BALANCE_COMBINED_TIMEOUT};
use rand::Rng;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use wire::{Color, GameCreateColors, GameCreateEnvelope, GameCreatePlayer, TimeControl};

/// One player's request to join a pool, dispatched by whatever external
/// surface accepts matchmaking requests (out of this core's scope — only the
/// job shape matters here).
#[derive(Debug, Clone)]
pub struct PairingJob {
    pub pool_key: String,
    pub user_id: String,
    pub username: String,
    pub time_control: TimeControl,
}

/// Spawns `worker_count` tasks consuming `jobs` and publishing finished
/// pairings to `create_tx`. Returns the task handles so callers can await
/// clean shutdown.
pub fn spawn_pairing_workers(
    pool: Arc<MatchmakingPool>,
    client: PlayerServiceClient,
    worker_count: usize,
    jobs: mpsc::Receiver<PairingJob>,
    create_tx: mpsc::Sender<GameCreateEnvelope>,
) -> Vec<JoinHandle<()>> {
    let jobs = Arc::new(Mutex::new(jobs));
    (0..worker_count)
        .map(|worker_id| {
            let jobs = jobs.clone();
            let pool = pool.clone();
            let client = client.clone();
            let create_tx = create_tx.clone();
            tokio::spawn(async move {
                loop {
                    let job = {
                        let mut jobs = jobs.lock().await;
                        jobs.recv().await
                    };
                    let Some(job) = job else {
                        tracing::debug!(worker_id, "pairing job channel closed, worker exiting");
                        break;
                    };
                    handle_job(&pool, &client, job, &create_tx).await;
                }
            })
        })
        .collect()
}

async fn handle_job(
    pool: &MatchmakingPool,
    client: &PlayerServiceClient,
    job: PairingJob,
    create_tx: &mpsc::Sender<GameCreateEnvelope>,
) {
    let rating = client.elo(&job.user_id, &job.pool_key).await;
    let joiner = WaitingPlayer {
        user_id: job.user_id.clone(),
        username: job.username.clone(),
        rating,
    };

    let Some(opponent) = pool.find_nearest(&job.pool_key, rating) else {
        pool.join(&job.pool_key, joiner);
        return;
    };

    // Defensive: if this job's player is somehow already sitting in the pool
    // (a stale retry), make sure pairing doesn't leave a duplicate behind.
    pool.leave(&job.pool_key, &joiner.user_id);

    let (player1_color, player2_color) =
        assign_colors(client, &joiner, &opponent, &job.pool_key).await;

    let envelope = GameCreateEnvelope {
        player1: GameCreatePlayer {
            user_id: joiner.user_id.clone(),
            username: joiner.username.clone(),
            rating: joiner.rating,
        },
        player2: GameCreatePlayer {
            user_id: opponent.user_id.clone(),
            username: opponent.username.clone(),
            rating: opponent.rating,
        },
        time_control: job.time_control,
        colors: GameCreateColors {
            player1: player1_color,
            player2: player2_color,
        },
    };

    if create_tx.send(envelope).await.is_err() {
        tracing::error!(
            pool_key = %job.pool_key,
            "game.create queue closed, pairing lost"
        );
    }
}

/// Assigns white to whichever player has the smaller (more negative)
/// historical white-minus-black balance; ties and any lookup failure fall
/// back to a coin-flip. The two balance lookups run concurrently under a
/// combined deadline (spec §4.9/§5).
async fn assign_colors(
    client: &PlayerServiceClient,
    joiner: &WaitingPlayer,
    opponent: &WaitingPlayer,
    game_type: &str,
) -> (Color, Color) {
    let combined = tokio::time::timeout(COLOR_BALANCE_COMBINED_TIMEOUT, async {
        tokio::join!(
            client.color_balance(&joiner.user_id, game_type),
            client.color_balance(&opponent.user_id, game_type),
        )
    })
    .await;

    let joiner_is_white = match combined {
        Ok((Some(joiner_balance), Some(opponent_balance))) => {
            if joiner_balance == opponent_balance {
                coin_flip()
            } else {
                joiner_balance < opponent_balance
            }
        }
        _ => {
            tracing::debug!(
                user1 = %joiner.user_id,
                user2 = %opponent.user_id,
                "colour-balance lookup incomplete, coin-flipping"
            );
            coin_flip()
        }
    };

    if joiner_is_white {
        (Color::White, Color::Black)
    } else {
        (Color::Black, Color::White)
    }
}

fn coin_flip() -> bool {
    rand::rng().random_bool(0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::MatchmakingPool;

    #[tokio::test]
    async fn solo_job_joins_the_pool_when_no_opponent() {
        let pool = Arc::new(MatchmakingPool::new());
        let client = PlayerServiceClient::new("http://127.0.0.1:1");
        let (job_tx, job_rx) = mpsc::channel(8);
        let (create_tx, mut create_rx) = mpsc::channel(8);
        let handles =
            spawn_pairing_workers(pool.clone(), client, 1, job_rx, create_tx);

        job_tx
            .send(PairingJob {
                pool_key: "3_2".into(),
                user_id: "u1".into(),
                username: "alice".into(),
                time_control: TimeControl {
                    kind: "blitz".into(),
                    initial_time: 180,
                    increment: 2,
                },
            })
            .await
            .unwrap();

        // Give the worker a tick to process before asserting.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(pool.pool_size("3_2"), 1);
        assert!(create_rx.try_recv().is_err());

        drop(job_tx);
        for handle in handles {
            let _ = handle.await;
        }
    }
}
