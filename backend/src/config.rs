//! Service configuration, loaded the way the teacher's `main.rs` already
//! loaded `DATABASE_URL`: plain `std::env::var` reads with literal defaults,
//! populated from `.env` via `dotenv` before any lookup. Every default
//! matches a literal constant spec.md names (`B=50`, `T=5s`, the 5s/3s/4s
//! HTTP deadlines already live in `matchmaking::player_client`) so the
//! service runs with no environment configured.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub player_service_base_url: String,
    pub pairing_worker_count: usize,
    pub pairing_job_capacity: usize,
    pub persistence_worker_count: usize,
    pub persistence_queue_capacity: usize,
    pub persistence_batch_size: usize,
    pub persistence_flush_interval: Duration,
}

impl Config {
    pub fn from_env() -> Config {
        dotenv::dotenv().ok();
        Config {
            database_url: env_or("DATABASE_URL", "sqlite:xfchess.db"),
            player_service_base_url: env_or("PLAYER_SERVICE_URL", "http://127.0.0.1:4000"),
            pairing_worker_count: env_parsed_or("PAIRING_WORKERS", 4),
            pairing_job_capacity: env_parsed_or("PAIRING_JOB_CAPACITY", 256),
            persistence_worker_count: env_parsed_or("PERSISTENCE_WORKERS", 2),
            persistence_queue_capacity: env_parsed_or("PERSISTENCE_QUEUE_CAPACITY", 512),
            persistence_batch_size: env_parsed_or(
                "PERSISTENCE_BATCH_SIZE",
                persistence::DEFAULT_BATCH_SIZE,
            ),
            persistence_flush_interval: Duration::from_secs(env_parsed_or(
                "PERSISTENCE_FLUSH_SECS",
                persistence::DEFAULT_FLUSH_INTERVAL.as_secs(),
            )),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
