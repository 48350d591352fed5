//! Castling rights bookkeeping, independent of any particular game position.

use crate::types::{Color, Square};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastlingRights {
    pub const ALL: CastlingRights = CastlingRights {
        white_kingside: true,
        white_queenside: true,
        black_kingside: true,
        black_queenside: true,
    };

    pub const NONE: CastlingRights = CastlingRights {
        white_kingside: false,
        white_queenside: false,
        black_kingside: false,
        black_queenside: false,
    };

    pub fn kingside(self, color: Color) -> bool {
        match color {
            Color::White => self.white_kingside,
            Color::Black => self.black_kingside,
        }
    }

    pub fn queenside(self, color: Color) -> bool {
        match color {
            Color::White => self.white_queenside,
            Color::Black => self.black_queenside,
        }
    }

    /// Revoke rights implicated by a piece departing `from` or landing on
    /// `to` this ply: the king's own rights (if it moved) and whichever
    /// corner rook right is touched at either end of the move.
    pub fn after_move(mut self, from: Square, to: Square) -> CastlingRights {
        for sq in [from, to] {
            match sq.index() {
                0 => self.white_queenside = false,  // a1
                7 => self.white_kingside = false,   // h1
                56 => self.black_queenside = false, // a8
                63 => self.black_kingside = false,  // h8
                _ => {}
            }
        }
        self
    }

    pub fn clear_color(mut self, color: Color) -> CastlingRights {
        match color {
            Color::White => {
                self.white_kingside = false;
                self.white_queenside = false;
            }
            Color::Black => {
                self.black_kingside = false;
                self.black_queenside = false;
            }
        }
        self
    }

    pub fn to_fen_fragment(self) -> String {
        let mut s = String::new();
        if self.white_kingside {
            s.push('K');
        }
        if self.white_queenside {
            s.push('Q');
        }
        if self.black_kingside {
            s.push('k');
        }
        if self.black_queenside {
            s.push('q');
        }
        if s.is_empty() {
            s.push('-');
        }
        s
    }

    pub fn from_fen_fragment(s: &str) -> CastlingRights {
        CastlingRights {
            white_kingside: s.contains('K'),
            white_queenside: s.contains('Q'),
            black_kingside: s.contains('k'),
            black_queenside: s.contains('q'),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rook_move_off_corner_clears_right() {
        let rights = CastlingRights::ALL.after_move(Square::new(0, 7), Square::new(0, 5));
        assert!(!rights.white_kingside);
        assert!(rights.white_queenside);
    }

    #[test]
    fn fen_fragment_round_trip() {
        let rights = CastlingRights {
            white_kingside: true,
            white_queenside: false,
            black_kingside: true,
            black_queenside: false,
        };
        let fragment = rights.to_fen_fragment();
        assert_eq!(fragment, "Kk");
        assert_eq!(CastlingRights::from_fen_fragment(&fragment), rights);
    }

    #[test]
    fn no_rights_renders_dash() {
        assert_eq!(CastlingRights::NONE.to_fen_fragment(), "-");
    }
}
