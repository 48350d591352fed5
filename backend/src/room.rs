//! Game room (spec §4.6, C6): per-game mutex-guarded live state. A room is
//! constructed by the game manager on `game.create` and exclusively owned by
//! its registry entry; every mutating operation here takes `inner`
//! exclusively, matching spec §5's "each room has its own mutex".
//!
//! `make_move`/`resign`/`offer_draw`/`accept_draw`/`decline_draw` are plain
//! synchronous functions — no `.await` is ever reached while the lock is
//! held, so the room lock never becomes a suspension point. Callers
//! (`game_manager`) are responsible for releasing the lock (these functions
//! already return before anything async happens) before publishing to the
//! bus or touching the registry, per spec §5's lock-ordering note.

use chess_core::{fen, terminal, Color, GameState, PieceKind, Square};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use wire::{ClientGameState, GameCreatePlayer, PersistedGame, WirePlayer};

use crate::error::RoomError;

#[derive(Debug, Clone)]
pub struct TimeControl {
    pub kind: String,
    pub initial_seconds: u64,
    pub increment_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub user_id: String,
    pub username: String,
    pub rating: i32,
    pub color: Color,
    pub is_online: bool,
}

#[derive(Debug, Clone)]
struct DrawOffer {
    from: String,
    to: String,
    #[allow(dead_code)] // carried for parity with spec §3's data model, not read internally
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoomStatus {
    Active,
    Terminal,
}

/// Result of a move that completed without the mover's clock running out.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub client_state: ClientGameState,
    pub white_time_left: u64,
    pub black_time_left: u64,
    pub move_history: Vec<String>,
    pub terminal: Option<TerminalSummary>,
}

/// `make_move` either plays a ply or discovers the mover's clock already ran
/// out; both are legitimate outcomes the game manager must turn into a
/// `gameEnd`, but only one of them actually touched the board.
#[derive(Debug, Clone)]
pub enum MakeMoveOutcome {
    Moved(MoveOutcome),
    TimedOut(TerminalSummary),
}

/// The result/winner/reason triple spec §4.6 maps every terminal transition
/// onto, ready to go straight onto an outbound `gameEnd` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalSummary {
    pub result: &'static str,
    pub winner: String,
    pub reason: String,
}

pub struct DrawOfferRecord {
    pub offer_id: String,
    pub target_player_id: String,
}

struct RoomInner {
    players: HashMap<String, Player>,
    state: GameState,
    time_control: TimeControl,
    white_seconds_remaining: f64,
    black_seconds_remaining: f64,
    last_move_time: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    draw_offers: HashMap<String, DrawOffer>,
    status: RoomStatus,
}

pub struct Room {
    pub id: String,
    pub created_at: DateTime<Utc>,
    inner: Mutex<RoomInner>,
}

impl Room {
    pub fn new(
        id: String,
        player1: Player,
        player2: Player,
        time_control: TimeControl,
        now: DateTime<Utc>,
    ) -> Room {
        let mut players = HashMap::with_capacity(2);
        players.insert(player1.user_id.clone(), player1);
        players.insert(player2.user_id.clone(), player2);
        Room {
            id,
            created_at: now,
            inner: Mutex::new(RoomInner {
                players,
                state: GameState::new(),
                white_seconds_remaining: time_control.initial_seconds as f64,
                black_seconds_remaining: time_control.initial_seconds as f64,
                time_control,
                last_move_time: now,
                updated_at: now,
                draw_offers: HashMap::new(),
                status: RoomStatus::Active,
            }),
        }
    }

    /// Generates `<unix-seconds><4-digit-zero-padded-random>` (spec §6).
    pub fn generate_id(now: DateTime<Utc>) -> String {
        use rand::Rng;
        let unix = now.timestamp().max(0);
        let suffix: u32 = rand::rng().random_range(0..10_000);
        format!("{unix}{suffix:04}")
    }

    fn player_ref<'a>(inner: &'a RoomInner, player_id: &str) -> Result<&'a Player, RoomError> {
        let player = inner.players.get(player_id).ok_or(RoomError::NotInRoom)?;
        if !player.is_online {
            return Err(RoomError::NotInRoom);
        }
        Ok(player)
    }

    fn opponent_id(inner: &RoomInner, player_id: &str) -> Option<String> {
        inner
            .players
            .keys()
            .find(|id| id.as_str() != player_id)
            .cloned()
    }

    fn seconds_remaining(inner: &RoomInner, color: Color) -> f64 {
        match color {
            Color::White => inner.white_seconds_remaining,
            Color::Black => inner.black_seconds_remaining,
        }
    }

    fn set_seconds_remaining(inner: &mut RoomInner, color: Color, value: f64) {
        match color {
            Color::White => inner.white_seconds_remaining = value,
            Color::Black => inner.black_seconds_remaining = value,
        }
    }

    fn clock_snapshot(inner: &RoomInner) -> (u64, u64) {
        (
            inner.white_seconds_remaining.max(0.0).round() as u64,
            inner.black_seconds_remaining.max(0.0).round() as u64,
        )
    }

    /// Spec §4.6 steps 1-11, run synchronously under the room lock.
    pub fn make_move(
        &self,
        player_id: &str,
        from_row: u8,
        from_col: u8,
        to_row: u8,
        to_col: u8,
        promotion: Option<PieceKind>,
        now: DateTime<Utc>,
    ) -> Result<MakeMoveOutcome, RoomError> {
        let mut inner = self.inner.lock();

        if inner.status == RoomStatus::Terminal {
            return Err(RoomError::GameOver);
        }

        let mover_color = Self::player_ref(&inner, player_id)?.color;
        if mover_color != inner.state.active_color {
            return Err(RoomError::NotYourTurn);
        }

        // Clock accounting: charge elapsed time to the mover before
        // validating the move at all (spec §4.6 step 4, ahead of step 5's
        // bounds/from==to check below — a mover whose clock already ran out
        // must time out even if the move they submitted is malformed).
        let elapsed = (now - inner.last_move_time).num_milliseconds().max(0) as f64 / 1000.0;
        let remaining = (Self::seconds_remaining(&inner, mover_color) - elapsed).max(0.0);
        Self::set_seconds_remaining(&mut inner, mover_color, remaining);

        if remaining <= 0.0 {
            let summary = Self::decisive_summary(mover_color.opposite(), "timeout");
            inner.status = RoomStatus::Terminal;
            return Ok(MakeMoveOutcome::TimedOut(summary));
        }

        if from_row >= 8 || from_col >= 8 || to_row >= 8 || to_col >= 8 {
            return Err(RoomError::IllegalMove);
        }
        let from = Square::new(from_row, from_col);
        let to = Square::new(to_row, to_col);
        if from == to {
            return Err(RoomError::IllegalMove);
        }

        let record = inner
            .state
            .make_move(from, to, promotion)
            .map_err(RoomError::from)?;
        let _ = record;

        let increment = inner.time_control.increment_seconds as f64;
        let after_increment = Self::seconds_remaining(&inner, mover_color) + increment;
        Self::set_seconds_remaining(&mut inner, mover_color, after_increment);

        inner.last_move_time = now;
        inner.updated_at = now;

        let terminal = terminal::evaluate(&inner.state).map(|(outcome, reason)| {
            inner.status = RoomStatus::Terminal;
            Self::summary_from_terminal(&inner, outcome, reason)
        });

        let (white_time_left, black_time_left) = Self::clock_snapshot(&inner);
        let client_state = ClientGameState::capture(&inner.state);
        let move_history = inner.state.move_history.clone();

        Ok(MakeMoveOutcome::Moved(MoveOutcome {
            client_state,
            white_time_left,
            black_time_left,
            move_history,
            terminal,
        }))
    }

    fn decisive_summary(winner_color: Color, reason: &str) -> TerminalSummary {
        let (result, winner) = match winner_color {
            Color::White => ("1-0", "white"),
            Color::Black => ("0-1", "black"),
        };
        TerminalSummary {
            result,
            winner: winner.to_string(),
            reason: reason.to_string(),
        }
    }

    fn summary_from_terminal(
        inner: &RoomInner,
        outcome: terminal::Outcome,
        reason: terminal::TerminalReason,
    ) -> TerminalSummary {
        match outcome {
            terminal::Outcome::Draw => TerminalSummary {
                result: "1/2-1/2",
                winner: "none".to_string(),
                reason: reason.as_str().to_string(),
            },
            terminal::Outcome::Decisive { winner } => {
                Self::decisive_summary(winner, reason.as_str())
            }
        }
    }

    /// Resignation (spec §4.10): the opponent of the resigning player wins.
    pub fn resign(&self, player_id: &str) -> Result<TerminalSummary, RoomError> {
        let mut inner = self.inner.lock();
        if inner.status == RoomStatus::Terminal {
            return Err(RoomError::GameOver);
        }
        let resigner_color = Self::player_ref(&inner, player_id)?.color;
        inner.status = RoomStatus::Terminal;
        Ok(Self::decisive_summary(resigner_color.opposite(), "resignation"))
    }

    pub fn offer_draw(
        &self,
        player_id: &str,
        now: DateTime<Utc>,
    ) -> Result<DrawOfferRecord, RoomError> {
        let mut inner = self.inner.lock();
        if inner.status == RoomStatus::Terminal {
            return Err(RoomError::GameOver);
        }
        Self::player_ref(&inner, player_id)?;
        let to = Self::opponent_id(&inner, player_id).ok_or(RoomError::NotInRoom)?;
        let offer_id = format!("{}_{}_{}", self.id, player_id, now.timestamp());
        inner.draw_offers.insert(
            offer_id.clone(),
            DrawOffer {
                from: player_id.to_string(),
                to: to.clone(),
                created_at: now,
            },
        );
        Ok(DrawOfferRecord {
            offer_id,
            target_player_id: to,
        })
    }

    /// Only the offer's `to` may accept; accepting wipes every outstanding
    /// offer in the room (spec §4.6 "offer").
    pub fn accept_draw(
        &self,
        offer_id: &str,
        player_id: &str,
    ) -> Result<TerminalSummary, RoomError> {
        let mut inner = self.inner.lock();
        if inner.status == RoomStatus::Terminal {
            return Err(RoomError::GameOver);
        }
        let offer = inner
            .draw_offers
            .get(offer_id)
            .ok_or(RoomError::DrawOfferNotFound)?;
        if offer.to != player_id {
            return Err(RoomError::NotOfferRecipient);
        }
        inner.draw_offers.clear();
        inner.status = RoomStatus::Terminal;
        Ok(TerminalSummary {
            result: "1/2-1/2",
            winner: "none".to_string(),
            reason: "draw by agreement".to_string(),
        })
    }

    /// Declining an offer that no longer exists is a no-op, not an error —
    /// spec §8 requires a repeated `drawDecline` with the same offer id to
    /// stay idempotent after the first one already removed it. Returns
    /// `Some(())` only when an offer was actually removed, so the caller
    /// knows whether to publish `drawDeclined`.
    pub fn decline_draw(
        &self,
        offer_id: &str,
        player_id: &str,
    ) -> Result<Option<()>, RoomError> {
        let mut inner = self.inner.lock();
        match inner.draw_offers.get(offer_id) {
            None => Ok(None),
            Some(offer) if offer.to != player_id => Err(RoomError::NotOfferRecipient),
            Some(_) => {
                inner.draw_offers.remove(offer_id);
                Ok(Some(()))
            }
        }
    }

    /// Client-safe snapshot for `getGameState` (spec §4.7): never mutates,
    /// so repeated calls are byte-identical while nothing else changes.
    pub fn snapshot(
        &self,
        player_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(ClientGameState, u64, u64, WirePlayer, WirePlayer), RoomError> {
        let inner = self.inner.lock();
        Self::player_ref(&inner, player_id)?;

        let elapsed = (now - inner.last_move_time).num_milliseconds().max(0) as f64 / 1000.0;
        let mut white = inner.white_seconds_remaining;
        let mut black = inner.black_seconds_remaining;
        match inner.state.active_color {
            Color::White => white = (white - elapsed).max(0.0),
            Color::Black => black = (black - elapsed).max(0.0),
        }

        let client_state = ClientGameState::capture(&inner.state);
        let (p1, p2) = Self::wire_players(&inner);
        Ok((
            client_state,
            white.round() as u64,
            black.round() as u64,
            p1,
            p2,
        ))
    }

    fn wire_players(inner: &RoomInner) -> (WirePlayer, WirePlayer) {
        let mut players: Vec<&Player> = inner.players.values().collect();
        players.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        let to_wire = |p: &Player| WirePlayer {
            user_id: p.user_id.clone(),
            username: p.username.clone(),
            rating: p.rating,
            color: p.color,
        };
        (to_wire(players[0]), to_wire(players[1]))
    }

    pub fn wire_players_pub(&self) -> (WirePlayer, WirePlayer) {
        let inner = self.inner.lock();
        Self::wire_players(&inner)
    }

    pub fn set_online(&self, player_id: &str, is_online: bool) {
        let mut inner = self.inner.lock();
        if let Some(player) = inner.players.get_mut(player_id) {
            player.is_online = is_online;
        }
    }

    /// Builds the persisted record for a just-ended game (spec §6
    /// "Persisted document"). Called once, after the room has already
    /// transitioned to terminal.
    pub fn persisted_record(&self, summary: &TerminalSummary, now: DateTime<Utc>) -> PersistedGame {
        let inner = self.inner.lock();
        let white = inner
            .players
            .values()
            .find(|p| p.color == Color::White)
            .expect("room always has a white player");
        let black = inner
            .players
            .values()
            .find(|p| p.color == Color::Black)
            .expect("room always has a black player");

        let winner_id = match summary.winner.as_str() {
            "white" => white.user_id.clone(),
            "black" => black.user_id.clone(),
            _ => "none".to_string(),
        };

        PersistedGame {
            game_id: self.id.clone(),
            white: GameCreatePlayer {
                user_id: white.user_id.clone(),
                username: white.username.clone(),
                rating: white.rating,
            },
            black: GameCreatePlayer {
                user_id: black.user_id.clone(),
                username: black.username.clone(),
                rating: black.rating,
            },
            moves: inner.state.move_history.clone(),
            result: summary.result.to_string(),
            created_at: now.to_rfc3339(),
            time_control: format!(
                "{}+{}",
                inner.time_control.initial_seconds / 60,
                inner.time_control.increment_seconds
            ),
            game_type: inner.time_control.kind.clone(),
            winner_id,
            white_time_left: inner.white_seconds_remaining.max(0.0).round() as u64,
            black_time_left: inner.black_seconds_remaining.max(0.0).round() as u64,
            reason: summary.reason.clone(),
            last_fen: fen::to_fen(&inner.state),
        }
    }
}
