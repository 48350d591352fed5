//! A complete game position: board, whose turn it is, castling rights, the
//! en-passant target square, and the counters terminal detection needs.

use crate::attacks::is_in_check;
use crate::board::Board;
use crate::castling::CastlingRights;
use crate::error::ChessError;
use crate::fen;
use crate::movegen::{self, Move, SpecialMove};
use crate::notation;
use crate::types::{Color, PieceKind, Square};
use std::collections::HashMap;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// The outcome of a single applied move: the SAN-like notation for it and
/// whatever capture happened, for callers (persistence, material tracking)
/// that want it without recomputing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub san: String,
    pub captured: Option<PieceKind>,
    pub mv: Move,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub board: Board,
    pub active_color: Color,
    pub castling_rights: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
    /// One SAN-like string per ply played so far.
    pub move_history: Vec<String>,
    /// Repetition key (board + side to move + castling + en-passant file,
    /// explicitly excluding the move clocks) mapped to how many times that
    /// exact position has occurred.
    position_counts: HashMap<String, u32>,
}

impl GameState {
    pub fn new() -> GameState {
        let mut state = GameState {
            board: Board::start_position(),
            active_color: Color::White,
            castling_rights: CastlingRights::ALL,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            move_history: Vec::new(),
            position_counts: HashMap::new(),
        };
        let key = state.repetition_key();
        state.position_counts.insert(key, 1);
        state
    }

    pub fn is_in_check(&self, color: Color) -> bool {
        is_in_check(&self.board, color)
    }

    pub fn legal_moves_for(&self, from: Square) -> Vec<Move> {
        movegen::legal_moves_for_piece(
            &self.board,
            self.active_color,
            self.castling_rights,
            self.en_passant,
            from,
        )
    }

    pub fn all_legal_moves(&self) -> Vec<Move> {
        movegen::all_legal_moves(
            &self.board,
            self.active_color,
            self.castling_rights,
            self.en_passant,
        )
    }

    /// The FEN-derived key used for threefold-repetition counting: board
    /// placement, side to move, castling rights, and en-passant file, with
    /// the halfmove/fullmove counters deliberately left out so that
    /// transpositions across different clock values still count as repeats.
    pub fn repetition_key(&self) -> String {
        let ep = self
            .en_passant
            .map(|sq| sq.to_algebraic())
            .unwrap_or_else(|| "-".to_string());
        format!(
            "{} {} {} {}",
            fen::board_to_fen_field(&self.board),
            if self.active_color == Color::White { "w" } else { "b" },
            self.castling_rights.to_fen_fragment(),
            ep
        )
    }

    pub fn repetition_count(&self) -> u32 {
        self.position_counts
            .get(&self.repetition_key())
            .copied()
            .unwrap_or(0)
    }

    /// Two plies per row, matching how the original groups a move number with
    /// its white and black half-moves; the flat `move_history` above remains
    /// the authoritative in-memory record.
    pub fn paired_history(&self) -> Vec<(u32, String, Option<String>)> {
        let mut rows = Vec::with_capacity(self.move_history.len().div_ceil(2));
        for (ply, san) in self.move_history.iter().enumerate() {
            let move_number = (ply / 2) as u32 + 1;
            if ply % 2 == 0 {
                rows.push((move_number, san.clone(), None));
            } else if let Some(last) = rows.last_mut() {
                last.2 = Some(san.clone());
            }
        }
        rows
    }

    /// Validate and play a single ply. `promotion` is required exactly when
    /// the move is a pawn reaching the back rank, and is ignored otherwise.
    pub fn make_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Result<MoveRecord, ChessError> {
        if from == to {
            return Err(ChessError::IllegalMove { from, to });
        }
        let mover = self
            .board
            .piece_at(from)
            .ok_or(ChessError::NoPieceAtSquare(from))?;
        if mover.color != self.active_color {
            return Err(ChessError::NotYourTurn);
        }

        // `movegen` only ever produces `Some(kind)` promotion candidates for a
        // promotion-rank destination (never a bare `None` one), so a caller
        // omitting `promotion` must be matched against the default-to-queen
        // candidate rather than an exact `None` that doesn't exist.
        let candidates = self.legal_moves_for(from);
        let chosen = candidates
            .into_iter()
            .find(|mv| {
                mv.to == to
                    && (mv.promotion == promotion
                        || (promotion.is_none() && mv.promotion == Some(PieceKind::Queen)))
            })
            .ok_or(ChessError::IllegalMove { from, to })?;

        let record = self.apply(chosen, mover.kind);
        Ok(record)
    }

    fn apply(&mut self, mv: Move, mover_kind: PieceKind) -> MoveRecord {
        let board_before = self.board;
        let state_before_ep = self.en_passant;
        let castling_before = self.castling_rights;
        let captured = self.board.piece_at(mv.to).map(|p| p.kind);
        let is_en_passant_capture = mv.special == SpecialMove::EnPassant;

        movegen::apply_to_board(&mut self.board, mv);

        self.halfmove_clock = if mover_kind == PieceKind::Pawn || captured.is_some() {
            0
        } else {
            self.halfmove_clock + 1
        };

        self.castling_rights = self.castling_rights.after_move(mv.from, mv.to);
        if mover_kind == PieceKind::King {
            self.castling_rights = self.castling_rights.clear_color(self.active_color);
        }

        self.en_passant = match mv.special {
            SpecialMove::DoublePawnPush => {
                let midpoint_row = (mv.from.row() + mv.to.row()) / 2;
                Some(Square::new(midpoint_row, mv.from.col()))
            }
            _ => None,
        };

        let mover_color = self.active_color;
        self.active_color = self.active_color.opposite();
        if self.active_color == Color::White {
            self.fullmove_number += 1;
        }

        let san = notation::build_san(
            &board_before,
            castling_before,
            state_before_ep,
            mover_kind,
            mover_color,
            mv,
            captured.is_some() || is_en_passant_capture,
            self,
        );
        self.move_history.push(san.clone());

        let key = self.repetition_key();
        *self.position_counts.entry(key).or_insert(0) += 1;

        MoveRecord {
            san,
            captured,
            mv,
        }
    }

    /// Reconstructs a `GameState` from already-parsed FEN fields. Move
    /// history and repetition counts start empty/fresh for this one position,
    /// since FEN carries no history of how the position was reached.
    pub fn from_parts(
        board: Board,
        active_color: Color,
        castling_rights: CastlingRights,
        en_passant: Option<Square>,
        halfmove_clock: u32,
        fullmove_number: u32,
    ) -> GameState {
        let mut state = GameState {
            board,
            active_color,
            castling_rights,
            en_passant,
            halfmove_clock,
            fullmove_number,
            move_history: Vec::new(),
            position_counts: HashMap::new(),
        };
        let key = state.repetition_key();
        state.position_counts.insert(key, 1);
        state
    }
}

impl Default for GameState {
    fn default() -> GameState {
        GameState::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_position_has_twenty_legal_moves() {
        let state = GameState::new();
        assert_eq!(state.all_legal_moves().len(), 20);
    }

    #[test]
    fn pawn_move_resets_halfmove_clock() {
        let mut state = GameState::new();
        let e2 = Square::from_algebraic("e2").unwrap();
        let e4 = Square::from_algebraic("e4").unwrap();
        state.make_move(e2, e4, None).unwrap();
        assert_eq!(state.halfmove_clock, 0);
        assert_eq!(state.en_passant, Square::from_algebraic("e3"));
    }

    #[test]
    fn fullmove_number_increments_after_black_moves() {
        let mut state = GameState::new();
        state
            .make_move(
                Square::from_algebraic("e2").unwrap(),
                Square::from_algebraic("e4").unwrap(),
                None,
            )
            .unwrap();
        assert_eq!(state.fullmove_number, 1);
        state
            .make_move(
                Square::from_algebraic("e7").unwrap(),
                Square::from_algebraic("e5").unwrap(),
                None,
            )
            .unwrap();
        assert_eq!(state.fullmove_number, 2);
    }

    #[test]
    fn illegal_move_is_rejected_without_mutating_state() {
        let mut state = GameState::new();
        let before = state.board;
        let result = state.make_move(
            Square::from_algebraic("e2").unwrap(),
            Square::from_algebraic("e5").unwrap(),
            None,
        );
        assert!(result.is_err());
        assert_eq!(state.board, before);
    }

    #[test]
    fn pawn_reaching_back_rank_defaults_to_queen_when_promotion_omitted() {
        let mut state = fen::from_fen("8/4P3/8/8/8/8/8/4k2K w - - 0 1").unwrap();
        let record = state
            .make_move(
                Square::from_algebraic("e7").unwrap(),
                Square::from_algebraic("e8").unwrap(),
                None,
            )
            .unwrap();
        assert_eq!(record.san, "e8=Q");
        assert_eq!(
            state.board.piece_at(Square::from_algebraic("e8").unwrap()),
            Some(crate::types::Piece::new(PieceKind::Queen, Color::White))
        );
    }

    #[test]
    fn pawn_promotion_honors_explicit_piece_choice() {
        let mut state = fen::from_fen("8/4P3/8/8/8/8/8/4k2K w - - 0 1").unwrap();
        let record = state
            .make_move(
                Square::from_algebraic("e7").unwrap(),
                Square::from_algebraic("e8").unwrap(),
                Some(PieceKind::Knight),
            )
            .unwrap();
        assert_eq!(record.san, "e8=N");
        assert_eq!(
            state.board.piece_at(Square::from_algebraic("e8").unwrap()),
            Some(crate::types::Piece::new(PieceKind::Knight, Color::White))
        );
    }

    #[test]
    fn castling_rights_clear_when_king_moves() {
        let mut state = GameState::new();
        // Clear the back rank between king and rook to make g1/f1 available,
        // then walk the king one step to confirm rights drop even off-corner.
        state.board.clear(Square::from_algebraic("f1").unwrap());
        state.board.clear(Square::from_algebraic("g1").unwrap());
        state
            .make_move(
                Square::from_algebraic("e1").unwrap(),
                Square::from_algebraic("f1").unwrap(),
                None,
            )
            .unwrap();
        assert!(!state.castling_rights.white_kingside);
        assert!(!state.castling_rights.white_queenside);
    }
}
