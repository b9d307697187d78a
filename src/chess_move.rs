use std::fmt;

use crate::board::{Board, Color, Piece, Square};

/// A single ply.
///
/// Equality is structural over every field, so two moves compare equal only
/// when their endpoints, pieces and special-move flags all agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub start: Square,
    pub end: Square,
    pub piece_moved: (Piece, Color),
    /// For en passant this is the passed pawn, not the (empty) landing square.
    pub piece_captured: Option<(Piece, Color)>,
    pub is_en_passant: bool,
    pub is_castle: bool,
    pub is_promotion: bool,
}

impl Move {
    /// Ordinary move or capture; the captured piece is read from `board`.
    pub fn new(start: Square, end: Square, piece_moved: (Piece, Color), board: &Board) -> Self {
        let (piece, color) = piece_moved;
        Self {
            start,
            end,
            piece_moved,
            piece_captured: board.get(end),
            is_en_passant: false,
            is_castle: false,
            is_promotion: piece == Piece::Pawn && end.row == color.opposite().home_row(),
        }
    }

    pub fn new_en_passant(start: Square, end: Square, color: Color) -> Self {
        Self {
            start,
            end,
            piece_moved: (Piece::Pawn, color),
            piece_captured: Some((Piece::Pawn, color.opposite())),
            is_en_passant: true,
            is_castle: false,
            is_promotion: false,
        }
    }

    pub fn new_castle(start: Square, end: Square, color: Color) -> Self {
        Self {
            start,
            end,
            piece_moved: (Piece::King, color),
            piece_captured: None,
            is_en_passant: false,
            is_castle: true,
            is_promotion: false,
        }
    }

    pub fn is_capture(&self) -> bool {
        self.piece_captured.is_some()
    }

    pub fn is_kingside_castle(&self) -> bool {
        self.is_castle && self.end.col > self.start.col
    }

    /// Square the captured piece actually stood on.
    pub fn capture_square(&self) -> Square {
        if self.is_en_passant {
            Square::new(self.start.row, self.end.col)
        } else {
            self.end
        }
    }

    /// Coordinate notation, e.g. `e2e4`.
    pub fn chess_notation(&self) -> String {
        format!("{}{}", self.start, self.end)
    }

    /// Coordinate notation with the promotion suffix UCI expects.
    pub fn uci_notation(&self) -> String {
        let mut notation = self.chess_notation();
        if self.is_promotion {
            notation.push('q');
        }
        notation
    }

    pub fn matches(&self, start: Square, end: Square) -> bool {
        self.start == start && self.end == end
    }
}

/// SAN-like rendering. No disambiguation and no check suffixes.
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_castle {
            return if self.is_kingside_castle() {
                write!(f, "O-O")
            } else {
                write!(f, "O-O-O")
            };
        }

        let (piece, _) = self.piece_moved;
        if piece == Piece::Pawn {
            if self.is_capture() {
                write!(f, "{}x{}", self.start.file(), self.end)
            } else {
                write!(f, "{}", self.end)
            }
        } else if self.is_capture() {
            write!(f, "{}x{}", piece.symbol(), self.end)
        } else {
            write!(f, "{}{}", piece.symbol(), self.end)
        }
    }
}

/// Numbered move pairs, e.g. `["1. e4 e5", "2. Nf3"]`.
pub fn format_move_log(moves: &[Move]) -> Vec<String> {
    moves
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| match pair {
            [white, black] => format!("{}. {} {}", i + 1, white, black),
            [white] => format!("{}. {}", i + 1, white),
            _ => unreachable!("chunks(2) yields one or two moves"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn test_coordinate_notation() {
        let board = Board::starting();
        let mv = Move::new(sq("e2"), sq("e4"), (Piece::Pawn, Color::White), &board);
        assert_eq!(mv.chess_notation(), "e2e4");
        assert_eq!(mv.uci_notation(), "e2e4");
        assert_eq!(mv.to_string(), "e4");
        assert!(!mv.is_capture());
    }

    #[test]
    fn test_capture_notation() {
        let board = Board::from_fen_placement("4k3/8/8/3p4/4P3/8/8/4K1N1").unwrap();
        let pawn = Move::new(sq("e4"), sq("d5"), (Piece::Pawn, Color::White), &board);
        assert_eq!(pawn.piece_captured, Some((Piece::Pawn, Color::Black)));
        assert_eq!(pawn.to_string(), "exd5");

        let knight = Move::new(sq("g1"), sq("f3"), (Piece::Knight, Color::White), &board);
        assert_eq!(knight.to_string(), "Nf3");

        let board = Board::from_fen_placement("4k3/8/8/3p4/8/8/8/3QK3").unwrap();
        let queen = Move::new(sq("d1"), sq("d5"), (Piece::Queen, Color::White), &board);
        assert_eq!(queen.to_string(), "Qxd5");
    }

    #[test]
    fn test_castle_notation() {
        let kingside = Move::new_castle(sq("e1"), sq("g1"), Color::White);
        let queenside = Move::new_castle(sq("e8"), sq("c8"), Color::Black);
        assert_eq!(kingside.to_string(), "O-O");
        assert_eq!(queenside.to_string(), "O-O-O");
        assert!(kingside.is_kingside_castle());
        assert!(!queenside.is_kingside_castle());
    }

    #[test]
    fn test_en_passant_captures_passed_pawn() {
        let mv = Move::new_en_passant(sq("e5"), sq("d6"), Color::White);
        assert_eq!(mv.piece_captured, Some((Piece::Pawn, Color::Black)));
        assert_eq!(mv.capture_square(), sq("d5"));
        assert_eq!(mv.to_string(), "exd6");
    }

    #[test]
    fn test_promotion_flag() {
        let board = Board::from_fen_placement("4k3/P7/8/8/8/8/7p/4K3").unwrap();
        let white = Move::new(sq("a7"), sq("a8"), (Piece::Pawn, Color::White), &board);
        let black = Move::new(sq("h2"), sq("h1"), (Piece::Pawn, Color::Black), &board);
        assert!(white.is_promotion);
        assert!(black.is_promotion);
        assert_eq!(white.uci_notation(), "a7a8q");
    }

    #[test]
    fn test_equality_includes_flags() {
        let board = Board::empty();
        let plain = Move::new(sq("e5"), sq("d6"), (Piece::Pawn, Color::White), &board);
        let en_passant = Move::new_en_passant(sq("e5"), sq("d6"), Color::White);
        assert!(plain.matches(en_passant.start, en_passant.end));
        assert_ne!(plain, en_passant);
    }

    #[test]
    fn test_format_move_log() {
        let board = Board::starting();
        let moves = [
            Move::new(sq("e2"), sq("e4"), (Piece::Pawn, Color::White), &board),
            Move::new(sq("e7"), sq("e5"), (Piece::Pawn, Color::Black), &board),
            Move::new(sq("g1"), sq("f3"), (Piece::Knight, Color::White), &board),
        ];
        assert_eq!(format_move_log(&moves), vec!["1. e4 e5", "2. Nf3"]);
        assert!(format_move_log(&[]).is_empty());
    }
}
