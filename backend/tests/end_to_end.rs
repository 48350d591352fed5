//! End-to-end scenarios from spec §8, driven through the real bus and game
//! manager rather than against `chess-core` directly: a `game.create`
//! envelope in, `move`/`gameAction` traffic in, `move_out` traffic out.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backend::{bus, game_manager, GameManager};
use persistence::{spawn_persistence_workers, GameStore, StoreError};
use tokio::sync::Mutex as AsyncMutex;
use wire::{
    Color, GameAction, GameActionIn, GameCreateColors, GameCreateEnvelope, GameCreatePlayer,
    MoveIn, MoveOut, PersistedGame, TimeControl,
};

#[derive(Default)]
struct RecordingStore {
    saved: AsyncMutex<Vec<PersistedGame>>,
}

#[async_trait]
impl GameStore for RecordingStore {
    async fn save_game(&self, game: &PersistedGame) -> Result<(), StoreError> {
        self.saved.lock().await.push(game.clone());
        Ok(())
    }
}

struct Harness {
    manager_handles: Vec<tokio::task::JoinHandle<()>>,
    persistence_handles: Vec<tokio::task::JoinHandle<()>>,
    move_in_tx: tokio::sync::mpsc::Sender<MoveIn>,
    game_action_tx: tokio::sync::mpsc::Sender<GameActionIn>,
    game_create_tx: tokio::sync::mpsc::Sender<GameCreateEnvelope>,
    move_out_rx: tokio::sync::broadcast::Receiver<MoveOut>,
    store: Arc<RecordingStore>,
}

impl Harness {
    async fn new() -> Harness {
        let store = Arc::new(RecordingStore::default());
        let store_dyn: Arc<dyn GameStore> = store.clone();
        let (sink, persistence_handles) =
            spawn_persistence_workers(store_dyn, 1, 16, 50, Duration::from_secs(5));

        let (bus_handles, bus_inbound) = bus::build();
        let move_out_rx = bus_handles.subscribe_move_out();
        let manager = GameManager::new(bus_handles.move_out_tx.clone(), sink);
        let manager_handles = game_manager::spawn_listeners(
            manager,
            bus_inbound.move_in_rx,
            bus_inbound.game_action_rx,
            bus_inbound.game_create_rx,
        );

        Harness {
            manager_handles,
            persistence_handles,
            move_in_tx: bus_handles.move_in_tx,
            game_action_tx: bus_handles.game_action_tx,
            game_create_tx: bus_handles.game_create_tx,
            move_out_rx,
            store,
        }
    }

    async fn create_room(&mut self, time_control: TimeControl) -> String {
        self.game_create_tx
            .send(GameCreateEnvelope {
                player1: GameCreatePlayer {
                    user_id: "white-user".into(),
                    username: "alice".into(),
                    rating: 1500,
                },
                player2: GameCreatePlayer {
                    user_id: "black-user".into(),
                    username: "bob".into(),
                    rating: 1500,
                },
                time_control,
                colors: GameCreateColors {
                    player1: Color::White,
                    player2: Color::Black,
                },
            })
            .await
            .unwrap();

        loop {
            match self.move_out_rx.recv().await.unwrap() {
                MoveOut::MatchFound { room_id, .. } => return room_id,
                _ => continue,
            }
        }
    }

    async fn send_move(
        &self,
        room_id: &str,
        player_id: &str,
        from: (u8, u8),
        to: (u8, u8),
    ) {
        self.move_in_tx
            .send(MoveIn::Move {
                room_id: room_id.to_string(),
                player_id: player_id.to_string(),
                from_row: from.0,
                from_col: from.1,
                to_row: to.0,
                to_col: to.1,
                promotion: None,
            })
            .await
            .unwrap();
    }

    async fn next_update(&mut self) -> MoveOut {
        self.move_out_rx.recv().await.unwrap()
    }

    fn shutdown(self) {
        for handle in self.manager_handles.into_iter().chain(self.persistence_handles) {
            handle.abort();
        }
    }
}

fn default_time_control() -> TimeControl {
    TimeControl {
        kind: "3_0".into(),
        initial_time: 180,
        increment: 2,
    }
}

#[tokio::test]
async fn fools_mate_ends_in_checkmate_for_black() {
    let mut harness = Harness::new().await;
    let room_id = harness.create_room(default_time_control()).await;

    harness.send_move(&room_id, "white-user", (1, 5), (2, 5)).await; // f2f3
    assert!(matches!(harness.next_update().await, MoveOut::GameUpdate { .. }));
    harness.send_move(&room_id, "black-user", (6, 4), (4, 4)).await; // e7e5
    assert!(matches!(harness.next_update().await, MoveOut::GameUpdate { .. }));
    harness.send_move(&room_id, "white-user", (1, 6), (3, 6)).await; // g2g4
    assert!(matches!(harness.next_update().await, MoveOut::GameUpdate { .. }));
    harness.send_move(&room_id, "black-user", (7, 3), (3, 7)).await; // d8h4

    let update = harness.next_update().await;
    match update {
        MoveOut::GameUpdate { move_history, .. } => {
            assert_eq!(move_history.last().unwrap(), "Qh4#");
        }
        other => panic!("expected gameUpdate, got {other:?}"),
    }

    let end = harness.next_update().await;
    match end {
        MoveOut::GameEnd { result, winner, reason, .. } => {
            assert_eq!(result, "0-1");
            assert_eq!(winner, "black");
            assert_eq!(reason, "checkmate");
        }
        other => panic!("expected gameEnd, got {other:?}"),
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(harness.store.saved.lock().await.len(), 1);
    harness.shutdown();
}

#[tokio::test]
async fn scholars_mate_ends_in_checkmate_for_white() {
    let mut harness = Harness::new().await;
    let room_id = harness.create_room(default_time_control()).await;

    let moves: [(&str, (u8, u8), (u8, u8)); 7] = [
        ("white-user", (1, 4), (3, 4)), // e2e4
        ("black-user", (6, 4), (4, 4)), // e7e5
        ("white-user", (0, 5), (3, 2)), // f1c4
        ("black-user", (7, 1), (5, 2)), // b8c6
        ("white-user", (0, 3), (4, 7)), // d1h5
        ("black-user", (7, 6), (5, 5)), // g8f6
        ("white-user", (4, 7), (6, 5)), // h5f7
    ];

    for (player, from, to) in moves {
        harness.send_move(&room_id, player, from, to).await;
        let _ = harness.next_update().await;
    }

    let end = harness.next_update().await;
    match end {
        MoveOut::GameEnd { result, winner, reason, .. } => {
            assert_eq!(result, "1-0");
            assert_eq!(winner, "white");
            assert_eq!(reason, "checkmate");
        }
        other => panic!("expected gameEnd, got {other:?}"),
    }
    harness.shutdown();
}

#[tokio::test]
async fn resignation_awards_the_opponent() {
    let mut harness = Harness::new().await;
    let room_id = harness.create_room(default_time_control()).await;

    harness
        .game_action_tx
        .send(GameActionIn {
            room_id: room_id.clone(),
            player_id: "white-user".to_string(),
            action: GameAction::Resign,
            offer_id: None,
        })
        .await
        .unwrap();

    match harness.next_update().await {
        MoveOut::GameEnd { result, winner, reason, .. } => {
            assert_eq!(result, "0-1");
            assert_eq!(winner, "black");
            assert_eq!(reason, "resignation");
        }
        other => panic!("expected gameEnd, got {other:?}"),
    }
    harness.shutdown();
}

#[tokio::test]
async fn draw_offer_accept_ends_game_as_agreement() {
    let mut harness = Harness::new().await;
    let room_id = harness.create_room(default_time_control()).await;

    harness
        .game_action_tx
        .send(GameActionIn {
            room_id: room_id.clone(),
            player_id: "white-user".to_string(),
            action: GameAction::DrawOffer,
            offer_id: None,
        })
        .await
        .unwrap();

    let offer_id = match harness.next_update().await {
        MoveOut::DrawOffer { offer_id, target_player_id, .. } => {
            assert_eq!(target_player_id, "black-user");
            offer_id
        }
        other => panic!("expected drawOffer, got {other:?}"),
    };

    harness
        .game_action_tx
        .send(GameActionIn {
            room_id: room_id.clone(),
            player_id: "black-user".to_string(),
            action: GameAction::DrawAccept,
            offer_id: Some(offer_id),
        })
        .await
        .unwrap();

    match harness.next_update().await {
        MoveOut::GameEnd { result, winner, reason, .. } => {
            assert_eq!(result, "1/2-1/2");
            assert_eq!(winner, "none");
            assert_eq!(reason, "draw by agreement");
        }
        other => panic!("expected gameEnd, got {other:?}"),
    }
    harness.shutdown();
}

#[tokio::test]
async fn move_by_non_participant_is_rejected_without_mutating_state() {
    let mut harness = Harness::new().await;
    let room_id = harness.create_room(default_time_control()).await;

    harness.send_move(&room_id, "intruder", (1, 4), (3, 4)).await;
    match harness.next_update().await {
        MoveOut::Error { error, .. } => assert_eq!(error, "not-in-room"),
        other => panic!("expected error, got {other:?}"),
    }
    harness.shutdown();
}

#[tokio::test]
async fn move_out_of_turn_is_rejected() {
    let mut harness = Harness::new().await;
    let room_id = harness.create_room(default_time_control()).await;

    harness.send_move(&room_id, "black-user", (6, 4), (4, 4)).await;
    match harness.next_update().await {
        MoveOut::Error { error, .. } => assert_eq!(error, "not-your-turn"),
        other => panic!("expected error, got {other:?}"),
    }
    harness.shutdown();
}

#[tokio::test]
async fn get_game_state_is_targeted_and_does_not_mutate() {
    let mut harness = Harness::new().await;
    let room_id = harness.create_room(default_time_control()).await;

    harness
        .move_in_tx
        .send(MoveIn::GetGameState {
            room_id: room_id.clone(),
            player_id: "white-user".to_string(),
        })
        .await
        .unwrap();

    match harness.next_update().await {
        MoveOut::GameState { target_player_id, white_time_left, black_time_left, .. } => {
            assert_eq!(target_player_id, "white-user");
            assert_eq!(white_time_left, 180);
            assert_eq!(black_time_left, 180);
        }
        other => panic!("expected gameState, got {other:?}"),
    }
    harness.shutdown();
}
