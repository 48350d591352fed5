//! Wire message shapes for the game manager's pub/sub boundary (spec §6, C11).
//!
//! Two inbound channels (`move_in`, `game_action`), one outbound channel
//! (`move_out`, a tagged union over `type`), the durable `game.create`
//! envelope, and the shape of a persisted completed game. This crate has no
//! transport of its own — see `backend::bus` for the in-process channel
//! substitute the spec's design notes call out (§9 "Move suspension via
//! channels").

use chess_core::{Board, CastlingRights, Color, PieceKind, Square};
use serde::{Deserialize, Serialize};

/// Every bitboard in the position, serialized as decimal strings so a JSON
/// number can't silently lose precision on a full 64-bit value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitboardSet {
    pub white_pawns: String,
    pub white_knights: String,
    pub white_bishops: String,
    pub white_rooks: String,
    pub white_queens: String,
    pub white_king: String,
    pub black_pawns: String,
    pub black_knights: String,
    pub black_bishops: String,
    pub black_rooks: String,
    pub black_queens: String,
    pub black_king: String,
}

impl BitboardSet {
    pub fn from_board(board: &Board) -> BitboardSet {
        let bb = |color, kind| board.bitboard_for_kind(color, kind).0.to_string();
        BitboardSet {
            white_pawns: bb(Color::White, PieceKind::Pawn),
            white_knights: bb(Color::White, PieceKind::Knight),
            white_bishops: bb(Color::White, PieceKind::Bishop),
            white_rooks: bb(Color::White, PieceKind::Rook),
            white_queens: bb(Color::White, PieceKind::Queen),
            white_king: bb(Color::White, PieceKind::King),
            black_pawns: bb(Color::Black, PieceKind::Pawn),
            black_knights: bb(Color::Black, PieceKind::Knight),
            black_bishops: bb(Color::Black, PieceKind::Bishop),
            black_rooks: bb(Color::Black, PieceKind::Rook),
            black_queens: bb(Color::Black, PieceKind::Queen),
            black_king: bb(Color::Black, PieceKind::King),
        }
    }
}

/// The client-safe view of a position: FEN, bitboards, side to move,
/// castling rights, en-passant square (spec §6 "gameState for clients").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientGameState {
    pub fen: String,
    pub bitboards: BitboardSet,
    pub active_color: Color,
    pub castling_rights: CastlingRights,
    pub en_passant: Option<String>,
}

impl ClientGameState {
    pub fn capture(state: &chess_core::GameState) -> ClientGameState {
        ClientGameState {
            fen: chess_core::fen::to_fen(state),
            bitboards: BitboardSet::from_board(&state.board),
            active_color: state.active_color,
            castling_rights: state.castling_rights,
            en_passant: state.en_passant.map(|sq| sq.to_algebraic()),
        }
    }
}

/// A square addressed by row/col, the wire encoding spec §6 uses for moves
/// (`fromRow`/`fromCol`/`toRow`/`toCol`) rather than algebraic notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireSquare {
    pub row: u8,
    pub col: u8,
}

impl From<WireSquare> for Square {
    fn from(sq: WireSquare) -> Square {
        Square::new(sq.row, sq.col)
    }
}

impl From<Square> for WireSquare {
    fn from(sq: Square) -> WireSquare {
        WireSquare { row: sq.row(), col: sq.col() }
    }
}

/// Inbound `move_in` message (spec §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MoveIn {
    #[serde(rename = "move")]
    Move {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "playerId")]
        player_id: String,
        #[serde(rename = "fromRow")]
        from_row: u8,
        #[serde(rename = "fromCol")]
        from_col: u8,
        #[serde(rename = "toRow")]
        to_row: u8,
        #[serde(rename = "toCol")]
        to_col: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        promotion: Option<PieceKind>,
    },
    #[serde(rename = "getGameState")]
    GetGameState {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "playerId")]
        player_id: String,
    },
}

/// The four in-game actions carried on `game_action` (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameAction {
    Resign,
    DrawOffer,
    DrawAccept,
    DrawDecline,
}

/// Inbound `game_action` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameActionIn {
    #[serde(rename = "roomId")]
    pub room_id: String,
    #[serde(rename = "playerId")]
    pub player_id: String,
    pub action: GameAction,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "offerId")]
    pub offer_id: Option<String>,
}

/// A player as presented on the wire (spec §6 `player1`/`player2`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePlayer {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub username: String,
    pub rating: i32,
    pub color: Color,
}

/// Outbound `move_out` tagged union (spec §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MoveOut {
    #[serde(rename = "matchFound")]
    MatchFound {
        #[serde(rename = "roomId")]
        room_id: String,
        player1: WirePlayer,
        player2: WirePlayer,
    },
    #[serde(rename = "gameState")]
    GameState {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "gameState")]
        game_state: ClientGameState,
        player1: WirePlayer,
        player2: WirePlayer,
        #[serde(rename = "whiteTimeLeft")]
        white_time_left: u64,
        #[serde(rename = "blackTimeLeft")]
        black_time_left: u64,
        /// Hint for the gateway: which connected socket this snapshot is for.
        /// The core never routes sockets itself (spec §9 "Targeted messages").
        #[serde(rename = "targetPlayerId")]
        target_player_id: String,
    },
    #[serde(rename = "gameUpdate")]
    GameUpdate {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "gameState")]
        game_state: ClientGameState,
        #[serde(rename = "whiteTimeLeft")]
        white_time_left: u64,
        #[serde(rename = "blackTimeLeft")]
        black_time_left: u64,
        #[serde(rename = "moveHistory")]
        move_history: Vec<String>,
    },
    #[serde(rename = "drawOffer")]
    DrawOffer {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "offerId")]
        offer_id: String,
        #[serde(rename = "offerFrom")]
        offer_from: String,
        #[serde(rename = "targetPlayerId")]
        target_player_id: String,
    },
    #[serde(rename = "drawDeclined")]
    DrawDeclined {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "offerId")]
        offer_id: String,
    },
    #[serde(rename = "gameEnd")]
    GameEnd {
        #[serde(rename = "roomId")]
        room_id: String,
        result: String,
        winner: String,
        reason: String,
    },
    #[serde(rename = "error")]
    Error {
        #[serde(rename = "roomId")]
        room_id: String,
        error: String,
    },
}

/// A waiting or matched time control, as exchanged with matchmaking and
/// carried in the `game.create` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeControl {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "initialTime")]
    pub initial_time: u32,
    pub increment: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameCreatePlayer {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub username: String,
    pub rating: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameCreateColors {
    pub player1: Color,
    pub player2: Color,
}

/// The durable-queue `game.create` envelope (spec §6), published by the
/// pairing worker and consumed by the game manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameCreateEnvelope {
    pub player1: GameCreatePlayer,
    pub player2: GameCreatePlayer,
    #[serde(rename = "timeControl")]
    pub time_control: TimeControl,
    pub colors: GameCreateColors,
}

/// The persisted shape of a completed game (spec §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedGame {
    #[serde(rename = "gameId")]
    pub game_id: String,
    pub white: GameCreatePlayer,
    pub black: GameCreatePlayer,
    pub moves: Vec<String>,
    pub result: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "timeControl")]
    pub time_control: String,
    #[serde(rename = "gameType")]
    pub game_type: String,
    #[serde(rename = "winnerId")]
    pub winner_id: String,
    #[serde(rename = "whiteTimeLeft")]
    pub white_time_left: u64,
    #[serde(rename = "blackTimeLeft")]
    pub black_time_left: u64,
    pub reason: String,
    #[serde(rename = "lastFen")]
    pub last_fen: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_in_deserializes_from_spec_shape() {
        let json = r#"{"type":"move","roomId":"r1","playerId":"p1","fromRow":1,"fromCol":4,"toRow":3,"toCol":4}"#;
        let msg: MoveIn = serde_json::from_str(json).unwrap();
        match msg {
            MoveIn::Move { room_id, from_row, to_row, promotion, .. } => {
                assert_eq!(room_id, "r1");
                assert_eq!(from_row, 1);
                assert_eq!(to_row, 3);
                assert_eq!(promotion, None);
            }
            _ => panic!("expected Move variant"),
        }
    }

    #[test]
    fn get_game_state_tag_round_trips() {
        let json = r#"{"type":"getGameState","roomId":"r1","playerId":"p1"}"#;
        let msg: MoveIn = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, MoveIn::GetGameState { .. }));
        let reencoded = serde_json::to_string(&msg).unwrap();
        let roundtrip: MoveIn = serde_json::from_str(&reencoded).unwrap();
        assert_eq!(msg, roundtrip);
    }

    #[test]
    fn bitboard_set_preserves_full_precision_as_string() {
        let board = Board::start_position();
        let set = BitboardSet::from_board(&board);
        // White king starting bitboard has bit 4 set (e1); exercise the full
        // round of decimal-string formatting, not just "doesn't truncate".
        assert_eq!(set.white_king, (1u64 << 4).to_string());
    }

    #[test]
    fn game_end_tag_serializes_as_spec_shape() {
        let msg = MoveOut::GameEnd {
            room_id: "r1".into(),
            result: "1-0".into(),
            winner: "white".into(),
            reason: "checkmate".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "gameEnd");
        assert_eq!(json["result"], "1-0");
    }
}
