//! Pseudo-legal move generation per piece, plus legality filtering.
//!
//! Legality is checked the blunt way: clone the board, play the move, see if
//! the mover's own king ends up attacked. No legality bitboards, no pinned-piece
//! precomputation — this mirrors how the original engine validates moves and is
//! fast enough at these small branching factors.

use crate::attacks::is_square_attacked_by;
use crate::board::Board;
use crate::castling::CastlingRights;
use crate::types::{Color, Piece, PieceKind, Square};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecialMove {
    None,
    DoublePawnPush,
    EnPassant,
    CastleKingside,
    CastleQueenside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
    pub special: SpecialMove,
}

impl Move {
    pub fn quiet(from: Square, to: Square) -> Move {
        Move {
            from,
            to,
            promotion: None,
            special: SpecialMove::None,
        }
    }

    pub fn is_castle(self) -> bool {
        matches!(
            self.special,
            SpecialMove::CastleKingside | SpecialMove::CastleQueenside
        )
    }
}

const KNIGHT_DELTAS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];
const KING_DELTAS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const ROOK_DIRECTIONS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

const PROMOTION_KINDS: [PieceKind; 4] = [
    PieceKind::Queen,
    PieceKind::Rook,
    PieceKind::Bishop,
    PieceKind::Knight,
];

/// All squares from which `color` could in principle move, restated: every
/// square holding one of `color`'s pieces.
fn color_piece_squares(board: &Board, color: Color) -> Vec<Square> {
    board.color_occupied(color).squares()
}

/// Pseudo-legal moves for the piece at `from`, or an empty vec if there is no
/// piece of `color` there.
pub fn pseudo_legal_moves_for_piece(
    board: &Board,
    color: Color,
    castling: CastlingRights,
    en_passant: Option<Square>,
    from: Square,
) -> Vec<Move> {
    let Some(piece) = board.piece_at(from) else {
        return Vec::new();
    };
    if piece.color != color {
        return Vec::new();
    }
    match piece.kind {
        PieceKind::Pawn => pawn_moves(board, color, en_passant, from),
        PieceKind::Knight => step_moves(board, color, from, &KNIGHT_DELTAS),
        PieceKind::Bishop => sliding_moves(board, color, from, &BISHOP_DIRECTIONS),
        PieceKind::Rook => sliding_moves(board, color, from, &ROOK_DIRECTIONS),
        PieceKind::Queen => {
            let mut moves = sliding_moves(board, color, from, &BISHOP_DIRECTIONS);
            moves.extend(sliding_moves(board, color, from, &ROOK_DIRECTIONS));
            moves
        }
        PieceKind::King => king_moves(board, color, castling, from),
    }
}

/// Legal moves for the piece at `from`: pseudo-legal moves filtered to those
/// that do not leave the mover's own king in check.
pub fn legal_moves_for_piece(
    board: &Board,
    color: Color,
    castling: CastlingRights,
    en_passant: Option<Square>,
    from: Square,
) -> Vec<Move> {
    pseudo_legal_moves_for_piece(board, color, castling, en_passant, from)
        .into_iter()
        .filter(|mv| {
            let mut after = *board;
            apply_to_board(&mut after, *mv);
            !is_square_attacked_by(
                &after,
                after
                    .king_square(color)
                    .expect("mover's king must remain on board"),
                color.opposite(),
            )
        })
        .collect()
}

/// Every legal move available to `color` in this position.
pub fn all_legal_moves(
    board: &Board,
    color: Color,
    castling: CastlingRights,
    en_passant: Option<Square>,
) -> Vec<Move> {
    color_piece_squares(board, color)
        .into_iter()
        .flat_map(|from| legal_moves_for_piece(board, color, castling, en_passant, from))
        .collect()
}

fn step_moves(board: &Board, color: Color, from: Square, deltas: &[(i8, i8)]) -> Vec<Move> {
    let own = board.color_occupied(color);
    let mut moves = Vec::new();
    let row = from.row() as i8;
    let col = from.col() as i8;
    for (dr, dc) in deltas {
        let r = row + dr;
        let c = col + dc;
        if Square::in_bounds(r, c) {
            let to = Square::new(r as u8, c as u8);
            if !own.has_square(to) {
                moves.push(Move::quiet(from, to));
            }
        }
    }
    moves
}

fn sliding_moves(board: &Board, color: Color, from: Square, directions: &[(i8, i8)]) -> Vec<Move> {
    let occupied = board.occupied();
    let own = board.color_occupied(color);
    let mut moves = Vec::new();
    let row = from.row() as i8;
    let col = from.col() as i8;
    for (dr, dc) in directions {
        let mut r = row + dr;
        let mut c = col + dc;
        while Square::in_bounds(r, c) {
            let to = Square::new(r as u8, c as u8);
            if occupied.has_square(to) {
                if !own.has_square(to) {
                    moves.push(Move::quiet(from, to));
                }
                break;
            }
            moves.push(Move::quiet(from, to));
            r += dr;
            c += dc;
        }
    }
    moves
}

fn king_moves(board: &Board, color: Color, castling: CastlingRights, from: Square) -> Vec<Move> {
    let mut moves = step_moves(board, color, from, &KING_DELTAS);

    let enemy = color.opposite();
    if is_square_attacked_by(board, from, enemy) {
        return moves;
    }

    let row = from.row();
    if castling.kingside(color)
        && squares_empty(board, &[Square::new(row, 5), Square::new(row, 6)])
        && rook_in_place(board, color, row, 7)
        && !squares_attacked(board, enemy, &[Square::new(row, 5), Square::new(row, 6)])
    {
        moves.push(Move {
            from,
            to: Square::new(row, 6),
            promotion: None,
            special: SpecialMove::CastleKingside,
        });
    }
    if castling.queenside(color)
        && squares_empty(board, &[Square::new(row, 1), Square::new(row, 2), Square::new(row, 3)])
        && rook_in_place(board, color, row, 0)
        && !squares_attacked(board, enemy, &[Square::new(row, 2), Square::new(row, 3)])
    {
        moves.push(Move {
            from,
            to: Square::new(row, 2),
            promotion: None,
            special: SpecialMove::CastleQueenside,
        });
    }

    moves
}

fn squares_empty(board: &Board, squares: &[Square]) -> bool {
    let occupied = board.occupied();
    squares.iter().all(|&sq| !occupied.has_square(sq))
}

fn rook_in_place(board: &Board, color: Color, row: u8, col: u8) -> bool {
    board.piece_at(Square::new(row, col)) == Some(Piece::new(PieceKind::Rook, color))
}

fn squares_attacked(board: &Board, attacker: Color, squares: &[Square]) -> bool {
    squares.iter().any(|&sq| is_square_attacked_by(board, sq, attacker))
}

fn pawn_moves(
    board: &Board,
    color: Color,
    en_passant: Option<Square>,
    from: Square,
) -> Vec<Move> {
    let mut moves = Vec::new();
    let occupied = board.occupied();
    let enemy = board.color_occupied(color.opposite());
    let direction: i8 = match color {
        Color::White => 1,
        Color::Black => -1,
    };
    let start_row: u8 = match color {
        Color::White => 1,
        Color::Black => 6,
    };
    let promotion_row: u8 = match color {
        Color::White => 7,
        Color::Black => 0,
    };
    let row = from.row() as i8;
    let col = from.col() as i8;

    let push_one_row = row + direction;
    if Square::in_bounds(push_one_row, col) {
        let one_forward = Square::new(push_one_row as u8, col as u8);
        if !occupied.has_square(one_forward) {
            push_pawn_move(&mut moves, from, one_forward, promotion_row, SpecialMove::None);

            if from.row() == start_row {
                let push_two_row = row + 2 * direction;
                let two_forward = Square::new(push_two_row as u8, col as u8);
                if !occupied.has_square(two_forward) {
                    moves.push(Move {
                        from,
                        to: two_forward,
                        promotion: None,
                        special: SpecialMove::DoublePawnPush,
                    });
                }
            }
        }
    }

    for dc in [-1i8, 1i8] {
        let c = col + dc;
        let r = row + direction;
        if !Square::in_bounds(r, c) {
            continue;
        }
        let to = Square::new(r as u8, c as u8);
        if enemy.has_square(to) {
            push_pawn_move(&mut moves, from, to, promotion_row, SpecialMove::None);
        } else if Some(to) == en_passant {
            moves.push(Move {
                from,
                to,
                promotion: None,
                special: SpecialMove::EnPassant,
            });
        }
    }

    moves
}

fn push_pawn_move(
    moves: &mut Vec<Move>,
    from: Square,
    to: Square,
    promotion_row: u8,
    special: SpecialMove,
) {
    if to.row() == promotion_row {
        for kind in PROMOTION_KINDS {
            moves.push(Move {
                from,
                to,
                promotion: Some(kind),
                special,
            });
        }
    } else {
        moves.push(Move {
            from,
            to,
            promotion: None,
            special,
        });
    }
}

/// Mutates `board` in place to reflect playing `mv`. Pure piece-placement
/// semantics only: callers that track castling rights, en-passant target, or
/// move clocks update those separately (see `state::GameState::make_move`).
pub fn apply_to_board(board: &mut Board, mv: Move) {
    let Some(mover) = board.piece_at(mv.from) else {
        return;
    };

    match mv.special {
        SpecialMove::EnPassant => {
            board.move_piece(mv.from, mv.to);
            let captured_row = mv.from.row();
            board.clear(Square::new(captured_row, mv.to.col()));
        }
        SpecialMove::CastleKingside => {
            board.move_piece(mv.from, mv.to);
            let row = mv.from.row();
            board.move_piece(Square::new(row, 7), Square::new(row, 5));
        }
        SpecialMove::CastleQueenside => {
            board.move_piece(mv.from, mv.to);
            let row = mv.from.row();
            board.move_piece(Square::new(row, 0), Square::new(row, 3));
        }
        SpecialMove::None | SpecialMove::DoublePawnPush => {
            board.move_piece(mv.from, mv.to);
        }
    }

    if let Some(promoted_kind) = mv.promotion {
        board.clear(mv.to);
        board.set(mv.to, Piece::new(promoted_kind, mover.color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knight_from_start_has_two_moves() {
        let board = Board::start_position();
        let b1 = Square::from_algebraic("b1").unwrap();
        let moves =
            legal_moves_for_piece(&board, Color::White, CastlingRights::ALL, None, b1);
        assert_eq!(moves.len(), 2);
    }

    #[test]
    fn pawn_double_push_from_start_row() {
        let board = Board::start_position();
        let e2 = Square::from_algebraic("e2").unwrap();
        let moves =
            legal_moves_for_piece(&board, Color::White, CastlingRights::ALL, None, e2);
        assert_eq!(moves.len(), 2);
        assert!(moves
            .iter()
            .any(|m| m.special == SpecialMove::DoublePawnPush));
    }

    #[test]
    fn king_cannot_castle_through_attacked_square() {
        let mut board = Board::empty();
        board.set(Square::new(0, 4), Piece::new(PieceKind::King, Color::White));
        board.set(Square::new(0, 7), Piece::new(PieceKind::Rook, Color::White));
        board.set(Square::new(7, 5), Piece::new(PieceKind::Rook, Color::Black));
        let moves = legal_moves_for_piece(
            &board,
            Color::White,
            CastlingRights::ALL,
            None,
            Square::new(0, 4),
        );
        assert!(!moves.iter().any(|m| m.is_castle()));
    }

    #[test]
    fn king_can_castle_kingside_when_clear() {
        let mut board = Board::empty();
        board.set(Square::new(0, 4), Piece::new(PieceKind::King, Color::White));
        board.set(Square::new(0, 7), Piece::new(PieceKind::Rook, Color::White));
        board.set(Square::new(7, 4), Piece::new(PieceKind::King, Color::Black));
        let moves = legal_moves_for_piece(
            &board,
            Color::White,
            CastlingRights::ALL,
            None,
            Square::new(0, 4),
        );
        assert!(moves
            .iter()
            .any(|m| m.special == SpecialMove::CastleKingside));
    }

    #[test]
    fn pinned_piece_cannot_move_off_the_pin_line() {
        let mut board = Board::empty();
        board.set(Square::new(0, 4), Piece::new(PieceKind::King, Color::White));
        board.set(Square::new(3, 4), Piece::new(PieceKind::Rook, Color::White));
        board.set(Square::new(7, 4), Piece::new(PieceKind::Rook, Color::Black));
        let moves = legal_moves_for_piece(
            &board,
            Color::White,
            CastlingRights::NONE,
            None,
            Square::new(3, 4),
        );
        assert!(moves.iter().all(|m| m.to.col() == 4));
    }
}
