//! Game manager (spec §4.7, C7): the room registry plus the two long-running
//! listeners that consume `move_in`/`game_action` and the `game.create`
//! consumer that materializes a room. All outbound state goes out over the
//! broadcast `move_out` lane (spec §6).
//!
//! Lock ordering follows spec §5: a room's own mutex is always released
//! before the registry's `RwLock` is taken for `end_game`'s removal, and
//! before anything is published — `room::Room`'s methods never hold their
//! lock across an `.await`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;

use persistence::PersistenceSink;
use wire::{GameAction, GameActionIn, GameCreateEnvelope, MoveIn, MoveOut};

use crate::room::{MakeMoveOutcome, Player, Room, TerminalSummary, TimeControl};

pub struct GameManager {
    rooms: RwLock<HashMap<String, Arc<Room>>>,
    move_out_tx: broadcast::Sender<MoveOut>,
    persistence: PersistenceSink,
}

impl GameManager {
    pub fn new(move_out_tx: broadcast::Sender<MoveOut>, persistence: PersistenceSink) -> Arc<GameManager> {
        Arc::new(GameManager {
            rooms: RwLock::new(HashMap::new()),
            move_out_tx,
            persistence,
        })
    }

    fn publish(&self, msg: MoveOut) {
        // A broadcast send fails only when there are no subscribers; with no
        // gateway connected that's expected, not an error worth logging.
        let _ = self.move_out_tx.send(msg);
    }

    async fn room(&self, room_id: &str) -> Option<Arc<Room>> {
        self.rooms.read().await.get(room_id).cloned()
    }

    /// Consumes a `game.create` envelope: builds the room, registers it, and
    /// publishes `matchFound` so the gateway can route both players into it.
    pub async fn handle_game_create(&self, envelope: GameCreateEnvelope) {
        let now = Utc::now();
        let room_id = Room::generate_id(now);

        let initial_seconds = envelope.time_control.initial_time as u64;
        let increment_seconds = envelope.time_control.increment as u64;

        let player1 = Player {
            user_id: envelope.player1.user_id.clone(),
            username: envelope.player1.username.clone(),
            rating: envelope.player1.rating,
            color: envelope.colors.player1,
            is_online: true,
        };
        let player2 = Player {
            user_id: envelope.player2.user_id.clone(),
            username: envelope.player2.username.clone(),
            rating: envelope.player2.rating,
            color: envelope.colors.player2,
            is_online: true,
        };

        let room = Room::new(
            room_id.clone(),
            player1,
            player2,
            TimeControl {
                kind: envelope.time_control.kind.clone(),
                initial_seconds,
                increment_seconds,
            },
            now,
        );
        let room = Arc::new(room);
        let (wire_player1, wire_player2) = room.wire_players_pub();

        self.rooms.write().await.insert(room_id.clone(), room);

        tracing::info!(room_id = %room_id, "room created from game.create envelope");
        self.publish(MoveOut::MatchFound {
            room_id,
            player1: wire_player1,
            player2: wire_player2,
        });
    }

    pub async fn handle_move_in(&self, msg: MoveIn) {
        match msg {
            MoveIn::Move {
                room_id,
                player_id,
                from_row,
                from_col,
                to_row,
                to_col,
                promotion,
            } => {
                let Some(room) = self.room(&room_id).await else {
                    self.publish(MoveOut::Error {
                        room_id,
                        error: "room-not-found".to_string(),
                    });
                    return;
                };
                let now = Utc::now();
                match room.make_move(&player_id, from_row, from_col, to_row, to_col, promotion, now) {
                    Ok(MakeMoveOutcome::Moved(outcome)) => {
                        tracing::debug!(room_id = %room_id, %player_id, "move applied");
                        self.publish(MoveOut::GameUpdate {
                            room_id: room_id.clone(),
                            game_state: outcome.client_state,
                            white_time_left: outcome.white_time_left,
                            black_time_left: outcome.black_time_left,
                            move_history: outcome.move_history,
                        });
                        if let Some(summary) = outcome.terminal {
                            self.end_game(&room_id, room, summary).await;
                        }
                    }
                    Ok(MakeMoveOutcome::TimedOut(summary)) => {
                        tracing::info!(room_id = %room_id, %player_id, "clock expired on move attempt");
                        self.end_game(&room_id, room, summary).await;
                    }
                    Err(err) => {
                        tracing::debug!(room_id = %room_id, %player_id, %err, "move rejected");
                        self.publish(MoveOut::Error {
                            room_id,
                            error: err.wire_code().to_string(),
                        });
                    }
                }
            }
            MoveIn::GetGameState { room_id, player_id } => {
                let Some(room) = self.room(&room_id).await else {
                    self.publish(MoveOut::Error {
                        room_id,
                        error: "room-not-found".to_string(),
                    });
                    return;
                };
                let now = Utc::now();
                match room.snapshot(&player_id, now) {
                    Ok((client_state, white_time_left, black_time_left, player1, player2)) => {
                        self.publish(MoveOut::GameState {
                            room_id,
                            game_state: client_state,
                            player1,
                            player2,
                            white_time_left,
                            black_time_left,
                            target_player_id: player_id,
                        });
                    }
                    Err(err) => {
                        self.publish(MoveOut::Error {
                            room_id,
                            error: err.wire_code().to_string(),
                        });
                    }
                }
            }
        }
    }

    pub async fn handle_game_action(&self, msg: GameActionIn) {
        let GameActionIn { room_id, player_id, action, offer_id } = msg;
        let Some(room) = self.room(&room_id).await else {
            self.publish(MoveOut::Error {
                room_id,
                error: "room-not-found".to_string(),
            });
            return;
        };

        match action {
            GameAction::Resign => match room.resign(&player_id) {
                Ok(summary) => self.end_game(&room_id, room, summary).await,
                Err(err) => self.publish(MoveOut::Error {
                    room_id,
                    error: err.wire_code().to_string(),
                }),
            },
            GameAction::DrawOffer => match room.offer_draw(&player_id, Utc::now()) {
                Ok(record) => self.publish(MoveOut::DrawOffer {
                    room_id,
                    offer_id: record.offer_id,
                    offer_from: player_id,
                    target_player_id: record.target_player_id,
                }),
                Err(err) => self.publish(MoveOut::Error {
                    room_id,
                    error: err.wire_code().to_string(),
                }),
            },
            GameAction::DrawAccept => {
                let Some(offer_id) = offer_id else {
                    self.publish(MoveOut::Error {
                        room_id,
                        error: "invalid-request".to_string(),
                    });
                    return;
                };
                match room.accept_draw(&offer_id, &player_id) {
                    Ok(summary) => self.end_game(&room_id, room, summary).await,
                    Err(err) => self.publish(MoveOut::Error {
                        room_id,
                        error: err.wire_code().to_string(),
                    }),
                }
            }
            GameAction::DrawDecline => {
                let Some(offer_id) = offer_id else {
                    self.publish(MoveOut::Error {
                        room_id,
                        error: "invalid-request".to_string(),
                    });
                    return;
                };
                match room.decline_draw(&offer_id, &player_id) {
                    Ok(Some(())) => self.publish(MoveOut::DrawDeclined { room_id, offer_id }),
                    // Already gone: spec §8 idempotence, silently no-op.
                    Ok(None) => {}
                    Err(err) => self.publish(MoveOut::Error {
                        room_id,
                        error: err.wire_code().to_string(),
                    }),
                }
            }
        }
    }

    /// Spec §4.6 `end-game`: publish the terminal state, drop the room from
    /// the registry, and enqueue the finished record for persistence. Called
    /// only after the room's own lock has already been released.
    async fn end_game(&self, room_id: &str, room: Arc<Room>, summary: TerminalSummary) {
        let now = Utc::now();
        let record = room.persisted_record(&summary, now);

        self.publish(MoveOut::GameEnd {
            room_id: room_id.to_string(),
            result: summary.result.to_string(),
            winner: summary.winner.clone(),
            reason: summary.reason.clone(),
        });

        self.rooms.write().await.remove(room_id);
        tracing::info!(room_id, reason = %summary.reason, "room ended and removed from registry");

        self.persistence.save_game(record);
    }
}

/// Spawns the game manager's three listener tasks: `move_in`, `game_action`,
/// and the `game.create` durable-queue consumer. Each loop dispatches
/// synchronously to the owning room, matching spec §5's "moves are totally
/// ordered by arrival on `move_in`".
pub fn spawn_listeners(
    manager: Arc<GameManager>,
    mut move_in_rx: mpsc::Receiver<MoveIn>,
    mut game_action_rx: mpsc::Receiver<GameActionIn>,
    mut game_create_rx: mpsc::Receiver<GameCreateEnvelope>,
) -> Vec<JoinHandle<()>> {
    let move_in_manager = manager.clone();
    let move_in_task = tokio::spawn(async move {
        while let Some(msg) = move_in_rx.recv().await {
            move_in_manager.handle_move_in(msg).await;
        }
        tracing::debug!("move_in channel closed, listener exiting");
    });

    let game_action_manager = manager.clone();
    let game_action_task = tokio::spawn(async move {
        while let Some(msg) = game_action_rx.recv().await {
            game_action_manager.handle_game_action(msg).await;
        }
        tracing::debug!("game_action channel closed, listener exiting");
    });

    let game_create_manager = manager;
    let game_create_task = tokio::spawn(async move {
        while let Some(envelope) = game_create_rx.recv().await {
            game_create_manager.handle_game_create(envelope).await;
        }
        tracing::debug!("game.create channel closed, listener exiting");
    });

    vec![move_in_task, game_action_task, game_create_task]
}
