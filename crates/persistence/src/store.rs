//! The `GameStore` boundary (spec §4.10, §6 "persisted document") and a
//! default SQLite-backed implementation using the same sqlx stack the
//! backend's user table is built on.

use crate::error::StoreError;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use wire::PersistedGame;

/// What the batching sink needs from a persistence backend. External
/// collaborators may implement this directly against Mongo, Postgres, or
/// anything else — this crate only ships the SQLite default.
#[async_trait]
pub trait GameStore: Send + Sync + 'static {
    async fn save_game(&self, game: &PersistedGame) -> Result<(), StoreError>;

    /// Saves a batch. Implementations should tolerate partial success: a
    /// failure on one record must not prevent the others from being written.
    /// The default implementation simply loops, which is adequate for any
    /// backend whose single-record path is already transactional.
    async fn save_games_batch(&self, games: &[PersistedGame]) -> Result<(), StoreError> {
        let mut first_err = None;
        for game in games {
            if let Err(err) = self.save_game(game).await {
                tracing::warn!(game_id = %game.game_id, %err, "failed to persist game in batch");
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

pub struct SqlxGameStore {
    pool: SqlitePool,
}

impl SqlxGameStore {
    pub async fn connect(database_url: &str) -> Result<SqlxGameStore, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(StoreError::Database)?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(StoreError::Database)?;
        let store = SqlxGameStore { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn from_pool(pool: SqlitePool) -> SqlxGameStore {
        SqlxGameStore { pool }
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS games (
                game_id TEXT PRIMARY KEY,
                white_id TEXT NOT NULL,
                black_id TEXT NOT NULL,
                moves TEXT NOT NULL,
                result TEXT NOT NULL,
                created_at TEXT NOT NULL,
                time_control TEXT NOT NULL,
                game_type TEXT NOT NULL,
                winner_id TEXT NOT NULL,
                white_time_left INTEGER NOT NULL,
                black_time_left INTEGER NOT NULL,
                reason TEXT NOT NULL,
                last_fen TEXT NOT NULL
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(StoreError::Database)?;
        Ok(())
    }
}

#[async_trait]
impl GameStore for SqlxGameStore {
    async fn save_game(&self, game: &PersistedGame) -> Result<(), StoreError> {
        let moves_json = serde_json::to_string(&game.moves).unwrap_or_default();
        sqlx::query(
            "INSERT INTO games
                (game_id, white_id, black_id, moves, result, created_at,
                 time_control, game_type, winner_id, white_time_left,
                 black_time_left, reason, last_fen)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(game_id) DO UPDATE SET
                moves = excluded.moves,
                result = excluded.result,
                winner_id = excluded.winner_id,
                white_time_left = excluded.white_time_left,
                black_time_left = excluded.black_time_left,
                reason = excluded.reason,
                last_fen = excluded.last_fen",
        )
        .bind(&game.game_id)
        .bind(&game.white.user_id)
        .bind(&game.black.user_id)
        .bind(moves_json)
        .bind(&game.result)
        .bind(&game.created_at)
        .bind(&game.time_control)
        .bind(&game.game_type)
        .bind(&game.winner_id)
        .bind(game.white_time_left as i64)
        .bind(game.black_time_left as i64)
        .bind(&game.reason)
        .bind(&game.last_fen)
        .execute(&self.pool)
        .await
        .map_err(StoreError::Database)?;
        Ok(())
    }
}
