//! FEN encoding and decoding.
//!
//! The board field is emitted rank 8 down to rank 1, each rank scanned file
//! a through h, per standard FEN — rank 8 is internal row 7, rank 1 is row 0.

use crate::board::Board;
use crate::castling::CastlingRights;
use crate::error::ChessError;
use crate::state::GameState;
use crate::types::{Color, Piece, PieceKind, Square};

/// Just the board-placement field of a FEN string (used for the repetition key).
pub fn board_to_fen_field(board: &Board) -> String {
    let mut ranks = Vec::with_capacity(8);
    for row in (0..8).rev() {
        let mut rank = String::new();
        let mut empty_run = 0u8;
        for col in 0..8 {
            match board.piece_at(Square::new(row, col)) {
                Some(piece) => {
                    if empty_run > 0 {
                        rank.push_str(&empty_run.to_string());
                        empty_run = 0;
                    }
                    rank.push(piece.fen_letter());
                }
                None => empty_run += 1,
            }
        }
        if empty_run > 0 {
            rank.push_str(&empty_run.to_string());
        }
        ranks.push(rank);
    }
    ranks.join("/")
}

fn board_from_fen_field(field: &str) -> Result<Board, ChessError> {
    let mut board = Board::empty();
    let rows: Vec<&str> = field.split('/').collect();
    if rows.len() != 8 {
        return Err(ChessError::InvalidFen(field.to_string()));
    }
    for (rank_from_top, row_str) in rows.iter().enumerate() {
        let row = 7 - rank_from_top as u8;
        let mut col = 0u8;
        for c in row_str.chars() {
            if let Some(skip) = c.to_digit(10) {
                col += skip as u8;
            } else {
                let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
                let kind = PieceKind::from_letter(c)
                    .ok_or_else(|| ChessError::InvalidFen(field.to_string()))?;
                if col > 7 {
                    return Err(ChessError::InvalidFen(field.to_string()));
                }
                board.set(Square::new(row, col), Piece::new(kind, color));
                col += 1;
            }
        }
    }
    Ok(board)
}

/// Full FEN for a game state: board, active color, castling rights,
/// en-passant target, halfmove clock, fullmove number.
pub fn to_fen(state: &GameState) -> String {
    let active = if state.active_color == Color::White { "w" } else { "b" };
    let ep = state
        .en_passant
        .map(|sq| sq.to_algebraic())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{} {} {} {} {} {}",
        board_to_fen_field(&state.board),
        active,
        state.castling_rights.to_fen_fragment(),
        ep,
        state.halfmove_clock,
        state.fullmove_number,
    )
}

/// Parses a full FEN string into a fresh `GameState` with empty move
/// history and a position-count table seeded with this one position.
pub fn from_fen(fen: &str) -> Result<GameState, ChessError> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    if fields.len() != 6 {
        return Err(ChessError::InvalidFen(fen.to_string()));
    }
    let board = board_from_fen_field(fields[0])?;
    let active_color = match fields[1] {
        "w" => Color::White,
        "b" => Color::Black,
        _ => return Err(ChessError::InvalidFen(fen.to_string())),
    };
    let castling_rights = CastlingRights::from_fen_fragment(fields[2]);
    let en_passant = if fields[3] == "-" {
        None
    } else {
        Some(
            Square::from_algebraic(fields[3])
                .ok_or_else(|| ChessError::InvalidFen(fen.to_string()))?,
        )
    };
    let halfmove_clock: u32 = fields[4]
        .parse()
        .map_err(|_| ChessError::InvalidFen(fen.to_string()))?;
    let fullmove_number: u32 = fields[5]
        .parse()
        .map_err(|_| ChessError::InvalidFen(fen.to_string()))?;

    Ok(GameState::from_parts(
        board,
        active_color,
        castling_rights,
        en_passant,
        halfmove_clock,
        fullmove_number,
    ))
}
