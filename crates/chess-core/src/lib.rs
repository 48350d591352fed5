//! Bitboard chess rules engine.
//!
//! Covers the authoritative-state slice of the platform: piece placement
//! (`board`, `bitboard`), the attack oracle used for check/castling legality
//! (`attacks`), pseudo-legal and legal move generation (`movegen`), the
//! per-ply state machine (`state`), FEN encode/decode (`fen`), SAN-flavoured
//! notation (`notation`), and terminal-condition detection (`terminal`).
//! Everything outside this crate — clocks, rooms, matchmaking, persistence —
//! is built on top of the types here, never inside it.

pub mod attacks;
pub mod bitboard;
pub mod board;
pub mod castling;
pub mod error;
pub mod fen;
pub mod movegen;
pub mod notation;
pub mod state;
pub mod terminal;
pub mod types;

pub use bitboard::Bitboard;
pub use board::Board;
pub use castling::CastlingRights;
pub use error::ChessError;
pub use movegen::{Move, SpecialMove};
pub use state::{GameState, MoveRecord, STARTING_FEN};
pub use types::{Color, Piece, PieceKind, Square};
