//! Batched persistence sink for completed games (spec §4.10, C10).

pub mod error;
pub mod sink;
pub mod store;

pub use error::StoreError;
pub use sink::{
    spawn_persistence_workers, PersistenceSink, BATCH_WRITE_TIMEOUT, DEFAULT_BATCH_SIZE,
    DEFAULT_FLUSH_INTERVAL, FALLBACK_WRITE_TIMEOUT,
};
pub use store::{GameStore, SqlxGameStore};
