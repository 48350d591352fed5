//! Square-attacked-by queries: the basis for check detection and castling
//! legality. Every slider scan stops at the first occupied square, same as
//! the rest of the move generator.

use crate::board::Board;
use crate::types::{Color, PieceKind, Square};

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

/// True if any piece of `attacker` color attacks `target`.
pub fn is_square_attacked_by(board: &Board, target: Square, attacker: Color) -> bool {
    is_pawn_attack(board, target, attacker)
        || is_knight_attack(board, target, attacker)
        || is_sliding_attack(board, target, attacker, PieceKind::Bishop, &BISHOP_DIRECTIONS)
        || is_sliding_attack(board, target, attacker, PieceKind::Rook, &ROOK_DIRECTIONS)
        || is_sliding_attack(board, target, attacker, PieceKind::Queen, &BISHOP_DIRECTIONS)
        || is_sliding_attack(board, target, attacker, PieceKind::Queen, &ROOK_DIRECTIONS)
        || is_king_attack(board, target, attacker)
}

/// True if `color`'s king is presently attacked. False if it has no king
/// (should not happen in a valid game, but callers should not panic on it).
pub fn is_in_check(board: &Board, color: Color) -> bool {
    match board.king_square(color) {
        Some(king_sq) => is_square_attacked_by(board, king_sq, color.opposite()),
        None => false,
    }
}

fn is_pawn_attack(board: &Board, target: Square, attacker: Color) -> bool {
    let row = target.row() as i8;
    let col = target.col() as i8;
    // A pawn of `attacker` color attacks `target` if it sits one row behind
    // (from the attacker's perspective) on an adjacent file.
    let behind_row = match attacker {
        Color::White => row - 1,
        Color::Black => row + 1,
    };
    let pawns = board.bitboard_for_kind(attacker, PieceKind::Pawn);
    for dc in [-1i8, 1i8] {
        let c = col + dc;
        if Square::in_bounds(behind_row, c) {
            if pawns.has_square(Square::new(behind_row as u8, c as u8)) {
                return true;
            }
        }
    }
    false
}

fn is_knight_attack(board: &Board, target: Square, attacker: Color) -> bool {
    let knights = board.bitboard_for_kind(attacker, PieceKind::Knight);
    step_attack(knights, target, &KNIGHT_DELTAS)
}

fn is_king_attack(board: &Board, target: Square, attacker: Color) -> bool {
    let king = board.bitboard_for_kind(attacker, PieceKind::King);
    step_attack(king, target, &KING_DELTAS)
}

fn step_attack(
    piece_bb: crate::bitboard::Bitboard,
    target: Square,
    deltas: &[(i8, i8)],
) -> bool {
    let row = target.row() as i8;
    let col = target.col() as i8;
    for (dr, dc) in deltas {
        let r = row + dr;
        let c = col + dc;
        if Square::in_bounds(r, c) && piece_bb.has_square(Square::new(r as u8, c as u8)) {
            return true;
        }
    }
    false
}

fn is_sliding_attack(
    board: &Board,
    target: Square,
    attacker: Color,
    kind: PieceKind,
    directions: &[(i8, i8)],
) -> bool {
    let sliders = board.bitboard_for_kind(attacker, kind);
    if sliders.is_empty() {
        return false;
    }
    let occupied = board.occupied();
    let row = target.row() as i8;
    let col = target.col() as i8;
    for (dr, dc) in directions {
        let mut r = row + dr;
        let mut c = col + dc;
        while Square::in_bounds(r, c) {
            let sq = Square::new(r as u8, c as u8);
            if occupied.has_square(sq) {
                if sliders.has_square(sq) {
                    return true;
                }
                break;
            }
            r += dr;
            c += dc;
        }
    }
    false
}
