//! Game state: board, turn, history and the make/undo protocol.
//!
//! `GameState` is mutated in place. Every `make_move` pushes one entry onto the
//! move log and one snapshot onto each of the castle-rights and en-passant
//! logs; `undo_move` pops all three. The snapshot logs are seeded with the
//! initial state, so they are always one entry longer than the move log.

use std::fmt;

use crate::board::{Board, Color, Piece, Square};
use crate::chess_move::Move;
use crate::error::{ChessError, ChessResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastleRights {
    pub white_kingside: bool,
    pub black_kingside: bool,
    pub white_queenside: bool,
    pub black_queenside: bool,
}

impl CastleRights {
    pub fn all() -> Self {
        Self {
            white_kingside: true,
            black_kingside: true,
            white_queenside: true,
            black_queenside: true,
        }
    }

    pub fn none() -> Self {
        Self {
            white_kingside: false,
            black_kingside: false,
            white_queenside: false,
            black_queenside: false,
        }
    }

    pub fn kingside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_kingside,
            Color::Black => self.black_kingside,
        }
    }

    pub fn queenside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_queenside,
            Color::Black => self.black_queenside,
        }
    }

    pub fn revoke_kingside(&mut self, color: Color) {
        match color {
            Color::White => self.white_kingside = false,
            Color::Black => self.black_kingside = false,
        }
    }

    pub fn revoke_queenside(&mut self, color: Color) {
        match color {
            Color::White => self.white_queenside = false,
            Color::Black => self.black_queenside = false,
        }
    }

    /// Revokes the right tied to a rook's home square, if `square` is one.
    fn revoke_for_rook_square(&mut self, color: Color, square: Square) {
        if square.row != color.home_row() {
            return;
        }
        match square.col {
            0 => self.revoke_queenside(color),
            7 => self.revoke_kingside(color),
            _ => {}
        }
    }

    fn from_fen_field(field: &str) -> ChessResult<Self> {
        let mut rights = CastleRights::none();
        if field == "-" {
            return Ok(rights);
        }
        for c in field.chars() {
            match c {
                'K' => rights.white_kingside = true,
                'Q' => rights.white_queenside = true,
                'k' => rights.black_kingside = true,
                'q' => rights.black_queenside = true,
                _ => return Err(ChessError::InvalidFen(format!("castling field {}", field))),
            }
        }
        Ok(rights)
    }
}

/// Terminal status of a position for the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Ongoing,
    Checkmate { winner: Color },
    Stalemate,
}

impl GameOutcome {
    pub fn is_over(&self) -> bool {
        !matches!(self, GameOutcome::Ongoing)
    }
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GameOutcome::Ongoing => write!(f, "Game in progress"),
            GameOutcome::Checkmate { winner } => write!(f, "{} wins by checkmate", winner),
            GameOutcome::Stalemate => write!(f, "Stalemate"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GameState {
    pub(crate) board: Board,
    pub(crate) side_to_move: Color,
    pub(crate) move_log: Vec<Move>,
    pub(crate) king_locations: [Square; 2],
    pub(crate) castle_rights: CastleRights,
    pub(crate) en_passant_target: Option<Square>,
    pub(crate) checkmate: bool,
    pub(crate) stalemate: bool,
    castle_rights_log: Vec<CastleRights>,
    en_passant_log: Vec<Option<Square>>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Standard initial position, white to move.
    pub fn new() -> Self {
        Self::from_parts(
            Board::starting(),
            Color::White,
            [Square::new(7, 4), Square::new(0, 4)],
            CastleRights::all(),
            None,
        )
    }

    fn from_parts(
        board: Board,
        side_to_move: Color,
        king_locations: [Square; 2],
        castle_rights: CastleRights,
        en_passant_target: Option<Square>,
    ) -> Self {
        Self {
            board,
            side_to_move,
            move_log: Vec::new(),
            king_locations,
            castle_rights,
            en_passant_target,
            checkmate: false,
            stalemate: false,
            castle_rights_log: vec![castle_rights],
            en_passant_log: vec![en_passant_target],
        }
    }

    /// Builds a position from FEN. Clock fields are optional and ignored.
    ///
    /// Castling rights whose king or rook is not on its home square are
    /// dropped, and each side must have exactly one king.
    pub fn from_fen(fen: &str) -> ChessResult<Self> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 2 {
            return Err(ChessError::InvalidFen(fen.to_string()));
        }

        let board = Board::from_fen_placement(fields[0])?;
        let side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(ChessError::InvalidFen(format!("side to move {}", other))),
        };

        let mut king_locations = [Square::new(0, 0); 2];
        for color in [Color::White, Color::Black] {
            match board.find_all(Piece::King, color).as_slice() {
                [king] => king_locations[color.index()] = *king,
                kings => {
                    return Err(ChessError::InvalidFen(format!(
                        "{} has {} kings",
                        color,
                        kings.len()
                    )))
                }
            }
        }

        let mut castle_rights = match fields.get(2) {
            Some(field) => CastleRights::from_fen_field(field)?,
            None => CastleRights::none(),
        };
        for color in [Color::White, Color::Black] {
            let row = color.home_row();
            let has = |col: u8, piece: Piece| board.get(Square::new(row, col)) == Some((piece, color));
            if !has(4, Piece::King) {
                castle_rights.revoke_kingside(color);
                castle_rights.revoke_queenside(color);
            }
            if !has(7, Piece::Rook) {
                castle_rights.revoke_kingside(color);
            }
            if !has(0, Piece::Rook) {
                castle_rights.revoke_queenside(color);
            }
        }

        let en_passant_target = match fields.get(3) {
            None | Some(&"-") => None,
            Some(field) => Some(
                field
                    .parse::<Square>()
                    .map_err(|_| ChessError::InvalidFen(format!("en passant field {}", field)))?,
            ),
        }
        .filter(|&target| en_passant_fits(&board, side_to_move, target));

        let state = Self::from_parts(
            board,
            side_to_move,
            king_locations,
            castle_rights,
            en_passant_target,
        );
        let waiting = side_to_move.opposite();
        if state.is_attacked_by(state.king_location(waiting), side_to_move) {
            return Err(ChessError::InvalidFen(format!(
                "{} is in check but not to move",
                waiting
            )));
        }
        Ok(state)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn white_to_move(&self) -> bool {
        self.side_to_move == Color::White
    }

    pub fn move_log(&self) -> &[Move] {
        &self.move_log
    }

    pub fn king_location(&self, color: Color) -> Square {
        self.king_locations[color.index()]
    }

    pub fn castle_rights(&self) -> CastleRights {
        self.castle_rights
    }

    pub fn en_passant_target(&self) -> Option<Square> {
        self.en_passant_target
    }

    /// Set by the most recent `get_valid_moves` call.
    pub fn is_checkmate(&self) -> bool {
        self.checkmate
    }

    /// Set by the most recent `get_valid_moves` call.
    pub fn is_stalemate(&self) -> bool {
        self.stalemate
    }

    /// Applies `mv`, which must come from the latest `get_valid_moves()`.
    pub fn make_move(&mut self, mv: Move) {
        debug_assert_eq!(
            self.board.get(mv.start),
            Some(mv.piece_moved),
            "move {} does not start from the moved piece",
            mv.chess_notation()
        );
        debug_assert_eq!(
            mv.piece_moved.1, self.side_to_move,
            "move {} played out of turn",
            mv.chess_notation()
        );

        let (piece, color) = mv.piece_moved;
        self.board.set(mv.start, None);
        self.board.set(mv.end, Some(mv.piece_moved));
        self.move_log.push(mv);
        self.side_to_move = self.side_to_move.opposite();

        if piece == Piece::King {
            self.king_locations[color.index()] = mv.end;
        }

        if mv.is_promotion {
            self.board.set(mv.end, Some((Piece::Queen, color)));
        }

        self.en_passant_target = if piece == Piece::Pawn && mv.start.row.abs_diff(mv.end.row) == 2 {
            Some(Square::new((mv.start.row + mv.end.row) / 2, mv.start.col))
        } else {
            None
        };

        if mv.is_en_passant {
            self.board.set(mv.capture_square(), None);
        }

        self.update_castle_rights(&mv);
        self.castle_rights_log.push(self.castle_rights);

        if mv.is_castle {
            let (rook_from, rook_to) = castle_rook_squares(&mv);
            let rook = self.board.get(rook_from);
            self.board.set(rook_to, rook);
            self.board.set(rook_from, None);
        }

        self.en_passant_log.push(self.en_passant_target);
        self.checkmate = false;
        self.stalemate = false;
    }

    /// Reverts the last move. Returns `None` (and does nothing) when there is
    /// no history.
    pub fn undo_move(&mut self) -> Option<Move> {
        let mv = self.move_log.pop()?;
        let (piece, color) = mv.piece_moved;

        self.board.set(mv.start, Some(mv.piece_moved));
        self.board.set(mv.end, mv.piece_captured);
        self.side_to_move = self.side_to_move.opposite();

        if piece == Piece::King {
            self.king_locations[color.index()] = mv.start;
        }

        if mv.is_en_passant {
            self.board.set(mv.end, None);
            self.board.set(mv.capture_square(), mv.piece_captured);
        }

        self.en_passant_log.pop();
        self.en_passant_target = self.en_passant_log.last().copied().flatten();

        self.castle_rights_log.pop();
        if let Some(rights) = self.castle_rights_log.last() {
            self.castle_rights = *rights;
        }

        if mv.is_castle {
            let (rook_from, rook_to) = castle_rook_squares(&mv);
            let rook = self.board.get(rook_to);
            self.board.set(rook_from, rook);
            self.board.set(rook_to, None);
        }

        self.checkmate = false;
        self.stalemate = false;
        Some(mv)
    }

    fn update_castle_rights(&mut self, mv: &Move) {
        let (piece, color) = mv.piece_moved;
        match piece {
            Piece::King => {
                self.castle_rights.revoke_kingside(color);
                self.castle_rights.revoke_queenside(color);
            }
            Piece::Rook => self.castle_rights.revoke_for_rook_square(color, mv.start),
            _ => {}
        }

        if let Some((Piece::Rook, captured_color)) = mv.piece_captured {
            self.castle_rights.revoke_for_rook_square(captured_color, mv.end);
        }
    }

    /// Placement and side to move; the remaining fields are a fixed placeholder.
    pub fn get_fen(&self) -> String {
        format!("{} {} KQkq - 0 1", self.board.fen_placement(), self.side_to_move.letter())
    }

    /// Computes the valid moves and reports whether the side to move is mated
    /// or stalemated.
    pub fn is_game_over(&mut self) -> GameOutcome {
        self.get_valid_moves();
        self.outcome()
    }

    /// Outcome as recorded by the most recent `get_valid_moves` call.
    pub fn outcome(&self) -> GameOutcome {
        if self.checkmate {
            GameOutcome::Checkmate {
                winner: self.side_to_move.opposite(),
            }
        } else if self.stalemate {
            GameOutcome::Stalemate
        } else {
            GameOutcome::Ongoing
        }
    }

    #[cfg(test)]
    pub(crate) fn history_lengths(&self) -> (usize, usize, usize) {
        (
            self.move_log.len(),
            self.castle_rights_log.len(),
            self.en_passant_log.len(),
        )
    }
}

/// An en-passant target must sit right behind an enemy pawn that could have
/// just made a double push: on the third rank from the mover's side, with
/// the target and the pawn's origin both empty.
fn en_passant_fits(board: &Board, side_to_move: Color, target: Square) -> bool {
    let pusher = side_to_move.opposite();
    let expected_row = pusher.home_row() as i8 + 2 * pusher.pawn_direction();
    if target.row as i8 != expected_row {
        return false;
    }
    let origin = target.offset((-pusher.pawn_direction(), 0), 1);
    let pawn = target.offset((pusher.pawn_direction(), 0), 1);
    match (origin, pawn) {
        (Some(origin), Some(pawn)) => {
            board.is_empty(target) && board.is_empty(origin) && board.get(pawn) == Some((Piece::Pawn, pusher))
        }
        _ => false,
    }
}

/// Rook origin and destination for a castle move.
fn castle_rook_squares(mv: &Move) -> (Square, Square) {
    let row = mv.end.row;
    if mv.is_kingside_castle() {
        (Square::new(row, mv.end.col + 1), Square::new(row, mv.end.col - 1))
    } else {
        (Square::new(row, mv.end.col - 2), Square::new(row, mv.end.col + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn play(state: &mut GameState, notation: &str) -> Move {
        let mv = state.find_move(notation).unwrap();
        state.make_move(mv);
        mv
    }

    #[test]
    fn test_new_game() {
        let state = GameState::new();
        assert!(state.white_to_move());
        assert_eq!(state.king_location(Color::White), sq("e1"));
        assert_eq!(state.king_location(Color::Black), sq("e8"));
        assert_eq!(state.castle_rights(), CastleRights::all());
        assert_eq!(state.en_passant_target(), None);
        assert_eq!(state.history_lengths(), (0, 1, 1));
        assert_eq!(
            state.get_fen(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
    }

    #[test]
    fn test_make_move_sets_en_passant_target() {
        let mut state = GameState::new();
        play(&mut state, "e2e4");
        assert_eq!(state.en_passant_target(), Some(sq("e3")));
        assert_eq!(state.side_to_move(), Color::Black);
        play(&mut state, "g8f6");
        assert_eq!(state.en_passant_target(), None);
        assert_eq!(state.history_lengths(), (2, 3, 3));
        assert_eq!(
            state.get_fen(),
            "rnbqkb1r/pppppppp/5n2/8/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 1"
        );
    }

    #[test]
    fn test_undo_restores_everything() {
        let mut state = GameState::new();
        let before = state.clone();
        play(&mut state, "e2e4");
        play(&mut state, "e7e5");
        play(&mut state, "e1e2");
        assert!(!state.castle_rights().white_kingside);
        assert_eq!(state.king_location(Color::White), sq("e2"));

        for _ in 0..3 {
            assert!(state.undo_move().is_some());
        }
        assert_eq!(state.board(), before.board());
        assert_eq!(state.side_to_move(), before.side_to_move());
        assert_eq!(state.castle_rights(), CastleRights::all());
        assert_eq!(state.king_location(Color::White), sq("e1"));
        assert_eq!(state.en_passant_target(), None);
        assert_eq!(state.history_lengths(), (0, 1, 1));
    }

    #[test]
    fn test_undo_on_empty_history_is_noop() {
        let mut state = GameState::new();
        assert_eq!(state.undo_move(), None);
        assert_eq!(state.board(), &Board::starting());
        assert_eq!(state.history_lengths(), (0, 1, 1));
    }

    #[test]
    fn test_rook_move_revokes_one_side() {
        let mut state = GameState::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq -").unwrap();
        play(&mut state, "h1h4");
        let rights = state.castle_rights();
        assert!(!rights.white_kingside);
        assert!(rights.white_queenside);
        play(&mut state, "a8a5");
        let rights = state.castle_rights();
        assert!(!rights.black_queenside);
        assert!(rights.black_kingside);
    }

    #[test]
    fn test_capturing_home_rook_revokes_owner_right() {
        let mut state = GameState::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq -").unwrap();
        play(&mut state, "a1a8");
        let rights = state.castle_rights();
        assert!(!rights.white_queenside);
        assert!(!rights.black_queenside);
        assert!(rights.black_kingside);
        assert!(rights.white_kingside);

        state.undo_move();
        assert_eq!(state.castle_rights(), CastleRights::all());
        assert_eq!(state.board().get(sq("a8")), Some((Piece::Rook, Color::Black)));
    }

    #[test]
    fn test_promotion_to_queen_and_back() {
        let mut state = GameState::from_fen("8/P6k/8/8/8/8/8/K7 w - -").unwrap();
        let mv = play(&mut state, "a7a8q");
        assert!(mv.is_promotion);
        assert_eq!(state.board().get(sq("a8")), Some((Piece::Queen, Color::White)));
        state.undo_move();
        assert_eq!(state.board().get(sq("a7")), Some((Piece::Pawn, Color::White)));
        assert!(state.board().is_empty(sq("a8")));
    }

    #[test]
    fn test_from_fen_drops_inconsistent_rights() {
        let state = GameState::from_fen("4k3/8/8/8/8/8/8/4K2R w KQkq - 0 1").unwrap();
        let rights = state.castle_rights();
        assert!(rights.white_kingside);
        assert!(!rights.white_queenside);
        assert!(!rights.black_kingside);
        assert!(!rights.black_queenside);
    }

    #[test]
    fn test_from_fen_rejects_bad_input() {
        assert!(GameState::from_fen("8/8/8/8/8/8/8/8 w - -").is_err());
        assert!(GameState::from_fen("4k3/8/8/8/8/8/8/4KK2 w - -").is_err());
        assert!(GameState::from_fen("4k3/8/8/8/8/8/8/4K3 x - -").is_err());
        assert!(GameState::from_fen("4k3/8/8/8/8/8/8/4K3 w Z -").is_err());
        assert!(GameState::from_fen("4k3/8/8/8/8/8/8/4K3 w - z9").is_err());
        assert!(GameState::from_fen("4k3/8/8/8/8/8/8/4K3").is_err());
    }

    #[test]
    fn test_from_fen_drops_impossible_en_passant_target() {
        // e4 is occupied and on the wrong rank for white to move
        let state = GameState::from_fen("4k3/8/8/8/4N3/3Pp3/8/4K3 w - e4").unwrap();
        assert_eq!(state.en_passant_target(), None);

        // no black pawn in front of e6
        let state = GameState::from_fen("4k3/8/8/3P4/8/8/8/4K3 w - e6").unwrap();
        assert_eq!(state.en_passant_target(), None);

        // the pawn's origin square is occupied
        let state = GameState::from_fen("4k3/4n3/8/3Pp3/8/8/8/4K3 w - e6").unwrap();
        assert_eq!(state.en_passant_target(), None);

        let state = GameState::from_fen("4k3/8/8/3Pp3/8/8/8/4K3 w - e6").unwrap();
        assert_eq!(state.en_passant_target(), Some(sq("e6")));
        let state = GameState::from_fen("4k3/8/8/8/3pP3/8/8/4K3 b - e3").unwrap();
        assert_eq!(state.en_passant_target(), Some(sq("e3")));
    }

    #[test]
    fn test_from_fen_rejects_waiting_side_in_check() {
        assert!(matches!(
            GameState::from_fen("4k3/8/8/8/8/8/8/4R1K1 w - -"),
            Err(ChessError::InvalidFen(_))
        ));
        assert!(GameState::from_fen("4k3/8/8/8/8/8/8/4R1K1 b - -").is_ok());
    }

    #[test]
    fn test_outcome_follows_last_generation() {
        let mut state = GameState::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - -").unwrap();
        assert_eq!(state.outcome(), GameOutcome::Ongoing);
        state.get_valid_moves();
        assert_eq!(state.outcome(), GameOutcome::Stalemate);
        assert_eq!(state.is_game_over(), state.outcome());
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(
            GameOutcome::Checkmate { winner: Color::Black }.to_string(),
            "Black wins by checkmate"
        );
        assert_eq!(GameOutcome::Stalemate.to_string(), "Stalemate");
        assert!(!GameOutcome::Ongoing.is_over());
    }
}
