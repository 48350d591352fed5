use crate::types::Square;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChessError {
    #[error("no piece at {0}")]
    NoPieceAtSquare(Square),

    #[error("illegal move {from}-{to}")]
    IllegalMove { from: Square, to: Square },

    #[error("it is not this side's turn to move")]
    NotYourTurn,

    #[error("malformed FEN string: {0}")]
    InvalidFen(String),
}
