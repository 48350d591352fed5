use std::sync::Arc;

use backend::{bus, config::Config, game_manager, GameManager};
use matchmaking::{spawn_pairing_workers, MatchmakingPool, PlayerServiceClient};
use persistence::{spawn_persistence_workers, GameStore, SqlxGameStore};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    tracing::info!(database_url = %config.database_url, "starting xfchess core");

    let store: Arc<dyn GameStore> = Arc::new(
        SqlxGameStore::connect(&config.database_url)
            .await
            .expect("failed to connect to persistence store"),
    );
    let (persistence_sink, persistence_handles) = spawn_persistence_workers(
        store,
        config.persistence_worker_count,
        config.persistence_queue_capacity,
        config.persistence_batch_size,
        config.persistence_flush_interval,
    );

    let (bus_handles, bus_inbound) = bus::build();

    let manager = GameManager::new(bus_handles.move_out_tx.clone(), persistence_sink);
    let manager_handles = game_manager::spawn_listeners(
        manager,
        bus_inbound.move_in_rx,
        bus_inbound.game_action_rx,
        bus_inbound.game_create_rx,
    );

    let pool = Arc::new(MatchmakingPool::new());
    let player_client = PlayerServiceClient::new(config.player_service_base_url.clone());
    let (_pairing_job_tx, pairing_job_rx) = mpsc::channel(config.pairing_job_capacity);
    let pairing_handles = spawn_pairing_workers(
        pool,
        player_client,
        config.pairing_worker_count,
        pairing_job_rx,
        bus_handles.game_create_tx.clone(),
    );

    tracing::info!(
        "xfchess core is running; awaiting external pub/sub traffic on move_in/game_action/game.create"
    );

    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for shutdown signal");
    tracing::info!("shutdown signal received, draining workers");

    drop(bus_handles);
    for handle in manager_handles
        .into_iter()
        .chain(pairing_handles)
        .chain(persistence_handles)
    {
        handle.abort();
    }
}
