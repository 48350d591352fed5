//! Room/game-manager error taxonomy (spec §7), mapped 1:1 onto the outbound
//! `error` wire message at the game-manager boundary. A room task never
//! panics on a bad request; every rejection comes back through here.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoomError {
    #[error("malformed request: {0}")]
    InvalidRequest(String),
    #[error("player is not a participant in this room")]
    NotInRoom,
    #[error("it is not this player's turn to move")]
    NotYourTurn,
    #[error("illegal move")]
    IllegalMove,
    #[error("this player's clock has already expired")]
    ClockExpired,
    #[error("no draw offer with that id")]
    DrawOfferNotFound,
    #[error("this player is not the offer's recipient")]
    NotOfferRecipient,
    #[error("player service unavailable")]
    ExternalServiceUnavailable,
    #[error("persistence queue is full")]
    QueueFull,
    #[error("room not found")]
    RoomNotFound,
    /// Not one of spec §7's listed kinds: the spec's room state machine
    /// (§4.10) calls terminal "absorbing; no further moves or actions are
    /// processed", which needs a rejection distinct from the ten listed
    /// kinds for actions arriving after a room has already ended.
    #[error("this game has already ended")]
    GameOver,
}

impl RoomError {
    /// The wire-level error code carried on an outbound `error` message.
    pub fn wire_code(&self) -> &'static str {
        match self {
            RoomError::InvalidRequest(_) => "invalid-request",
            RoomError::NotInRoom => "not-in-room",
            RoomError::NotYourTurn => "not-your-turn",
            RoomError::IllegalMove => "illegal-move",
            RoomError::ClockExpired => "clock-expired",
            RoomError::DrawOfferNotFound => "draw-offer-not-found",
            RoomError::NotOfferRecipient => "not-offer-recipient",
            RoomError::ExternalServiceUnavailable => "external-service-unavailable",
            RoomError::QueueFull => "queue-full",
            RoomError::RoomNotFound => "room-not-found",
            RoomError::GameOver => "game-over",
        }
    }
}

impl From<chess_core::ChessError> for RoomError {
    fn from(err: chess_core::ChessError) -> RoomError {
        match err {
            chess_core::ChessError::NotYourTurn => RoomError::NotYourTurn,
            chess_core::ChessError::IllegalMove { .. } => RoomError::IllegalMove,
            chess_core::ChessError::NoPieceAtSquare(_) => RoomError::IllegalMove,
            chess_core::ChessError::InvalidFen(msg) => RoomError::InvalidRequest(msg),
        }
    }
}
