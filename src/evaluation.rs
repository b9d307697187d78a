use crate::board::{Board, Color, Piece, Square};
use crate::state::GameState;

/// Score for a delivered checkmate, well above any material total.
pub const CHECKMATE_SCORE: i32 = 100_000;
pub const STALEMATE_SCORE: i32 = 0;

const CENTER_SQUARES: [Square; 4] = [
    Square::new(3, 3),
    Square::new(3, 4),
    Square::new(4, 3),
    Square::new(4, 4),
];

/// Static evaluation in centipawns, always from white's point of view.
#[derive(Debug, Clone)]
pub struct Evaluator {
    // Piece values
    pub pawn_value: i32,
    pub knight_value: i32,
    pub bishop_value: i32,
    pub rook_value: i32,
    pub queen_value: i32,
    pub king_value: i32,

    // Positional bonuses, written from white's side (row 0 = rank 8)
    pub pawn_position_bonus: [[i32; 8]; 8],
    pub knight_position_bonus: [[i32; 8]; 8],
    pub bishop_position_bonus: [[i32; 8]; 8],
    pub rook_position_bonus: [[i32; 8]; 8],
    pub queen_position_bonus: [[i32; 8]; 8],

    /// Flat bonus for a non-king piece on d4, e4, d5 or e5.
    pub center_bonus: i32,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            pawn_value: 100,
            knight_value: 305,
            bishop_value: 333,
            rook_value: 563,
            queen_value: 950,
            king_value: 0,

            // Pawns are pulled forward, with the d and e files favoured
            pawn_position_bonus: [
                [80, 80, 80, 80, 80, 80, 80, 80],
                [70, 70, 70, 70, 70, 70, 70, 70],
                [30, 30, 40, 50, 50, 40, 30, 30],
                [25, 25, 30, 45, 45, 30, 25, 25],
                [20, 20, 20, 40, 40, 20, 20, 20],
                [25, 15, 10, 20, 20, 10, 15, 25],
                [25, 30, 30, 0, 0, 30, 30, 25],
                [20, 20, 20, 20, 20, 20, 20, 20],
            ],

            knight_position_bonus: [
                [0, 10, 20, 20, 20, 20, 10, 0],
                [10, 30, 50, 50, 50, 50, 30, 10],
                [20, 50, 60, 65, 65, 60, 50, 20],
                [20, 55, 65, 70, 70, 65, 55, 20],
                [20, 50, 65, 70, 70, 65, 50, 20],
                [20, 55, 60, 65, 65, 60, 55, 20],
                [10, 30, 50, 55, 55, 50, 30, 10],
                [0, 10, 20, 20, 20, 20, 10, 0],
            ],

            bishop_position_bonus: [
                [0, 20, 20, 20, 20, 20, 20, 0],
                [20, 40, 40, 40, 40, 40, 40, 20],
                [20, 40, 50, 60, 60, 50, 40, 20],
                [20, 50, 50, 60, 60, 50, 50, 20],
                [20, 40, 60, 60, 60, 60, 40, 20],
                [20, 60, 60, 60, 60, 60, 60, 20],
                [20, 50, 40, 40, 40, 40, 50, 20],
                [0, 20, 20, 20, 20, 20, 20, 0],
            ],

            // Rooks like the seventh rank and the central files of the back rank
            rook_position_bonus: [
                [25, 25, 25, 25, 25, 25, 25, 25],
                [50, 75, 75, 75, 75, 75, 75, 50],
                [0, 25, 25, 25, 25, 25, 25, 0],
                [0, 25, 25, 25, 25, 25, 25, 0],
                [0, 25, 25, 25, 25, 25, 25, 0],
                [0, 25, 25, 25, 25, 25, 25, 0],
                [0, 25, 25, 25, 25, 25, 25, 0],
                [25, 25, 25, 50, 50, 25, 25, 25],
            ],

            queen_position_bonus: [
                [0, 20, 20, 30, 30, 20, 20, 0],
                [20, 40, 40, 40, 40, 40, 40, 20],
                [20, 40, 50, 50, 50, 50, 40, 20],
                [30, 40, 50, 50, 50, 50, 40, 30],
                [40, 40, 50, 50, 50, 50, 40, 30],
                [20, 50, 50, 50, 50, 50, 40, 20],
                [20, 40, 50, 40, 40, 40, 40, 20],
                [0, 20, 20, 30, 30, 20, 20, 0],
            ],

            center_bonus: 50,
        }
    }

    /// Full evaluation of a position. Terminal positions score as a mate for
    /// the side that delivered it, or as a draw; the flags must come from a
    /// fresh `get_valid_moves` call.
    pub fn score_board(&self, state: &GameState) -> i32 {
        if state.is_checkmate() {
            return match state.side_to_move() {
                Color::White => -CHECKMATE_SCORE,
                Color::Black => CHECKMATE_SCORE,
            };
        }
        if state.is_stalemate() {
            return STALEMATE_SCORE;
        }

        let board = state.board();
        let mut score = 0;
        for (square, piece, color) in board.pieces() {
            let value = self.piece_value(piece) + self.position_bonus(piece, color, square);
            score += color.multiplier() * value;
        }
        score
    }

    /// Material balance only, ignoring placement.
    pub fn score_material(&self, board: &Board) -> i32 {
        board
            .pieces()
            .map(|(_, piece, color)| color.multiplier() * self.piece_value(piece))
            .sum()
    }

    pub fn piece_value(&self, piece: Piece) -> i32 {
        match piece {
            Piece::Pawn => self.pawn_value,
            Piece::Knight => self.knight_value,
            Piece::Bishop => self.bishop_value,
            Piece::Rook => self.rook_value,
            Piece::Queen => self.queen_value,
            Piece::King => self.king_value,
        }
    }

    /// Table bonus plus the centre bonus. Kings get neither.
    fn position_bonus(&self, piece: Piece, color: Color, square: Square) -> i32 {
        let table = match piece {
            Piece::Pawn => &self.pawn_position_bonus,
            Piece::Knight => &self.knight_position_bonus,
            Piece::Bishop => &self.bishop_position_bonus,
            Piece::Rook => &self.rook_position_bonus,
            Piece::Queen => &self.queen_position_bonus,
            Piece::King => return 0,
        };

        // black reads the tables upside down
        let row = match color {
            Color::White => square.row as usize,
            Color::Black => 7 - square.row as usize,
        };
        let mut bonus = table[row][square.col as usize];
        if CENTER_SQUARES.contains(&square) {
            bonus += self.center_bonus;
        }
        bonus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(fen: &str) -> GameState {
        GameState::from_fen(fen).unwrap()
    }

    #[test]
    fn test_starting_position_is_balanced() {
        let evaluator = Evaluator::new();
        let state = GameState::new();
        assert_eq!(evaluator.score_board(&state), 0);
        assert_eq!(evaluator.score_material(state.board()), 0);
    }

    #[test]
    fn test_mirrored_positions_cancel() {
        let evaluator = Evaluator::new();
        let state = state("4k3/3pn3/8/8/8/8/3PN3/4K3 w - -");
        assert_eq!(evaluator.score_board(&state), 0);
    }

    #[test]
    fn test_material_advantage() {
        let evaluator = Evaluator::new();
        let state = state("4k3/8/8/8/8/8/8/3QK3 w - -");
        assert_eq!(evaluator.score_material(state.board()), 950);
        assert_eq!(evaluator.score_board(&state), 950 + 30);
    }

    #[test]
    fn test_center_bonus() {
        let evaluator = Evaluator::new();
        let on_e4 = state("4k3/8/8/8/4N3/8/8/4K3 w - -");
        let on_h4 = state("4k3/8/8/8/7N/8/8/4K3 w - -");
        assert_eq!(evaluator.score_board(&on_e4), 305 + 70 + 50);
        assert_eq!(evaluator.score_board(&on_h4), 305 + 20);
    }

    #[test]
    fn test_black_tables_are_mirrored() {
        let evaluator = Evaluator::new();
        // a black pawn on its seventh rank (row 6) reads white's row 1
        let state = state("4k3/8/8/8/8/8/p7/4K3 w - -");
        assert_eq!(evaluator.score_board(&state), -(100 + 70));
    }

    #[test]
    fn test_terminal_scores() {
        let evaluator = Evaluator::new();

        let mut mated = state("R5k1/5ppp/8/8/8/8/8/6K1 b - -");
        mated.get_valid_moves();
        assert_eq!(evaluator.score_board(&mated), CHECKMATE_SCORE);

        let mut stalemate = state("7k/5Q2/6K1/8/8/8/8/8 b - -");
        stalemate.get_valid_moves();
        assert_eq!(evaluator.score_board(&stalemate), STALEMATE_SCORE);
    }
}
