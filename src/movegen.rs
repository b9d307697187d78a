//! Legal move generation.
//!
//! Legality is decided from a single scan outward from the king of the side to
//! move: the first friendly piece on a ray is a pin candidate, and an enemy
//! piece that attacks along that ray turns it into either a pin or a check.
//! Per-piece generators then respect the pin table, and the check list filters
//! the result down to evasions.

use std::collections::HashMap;

use tracing::debug;

use crate::board::{Color, Direction, Piece, Square};
use crate::chess_move::Move;
use crate::error::{ChessError, ChessResult};
use crate::state::GameState;

const ORTHOGONAL: [Direction; 4] = [(-1, 0), (0, -1), (1, 0), (0, 1)];
const DIAGONAL: [Direction; 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const KNIGHT_OFFSETS: [Direction; 8] = [
    (-2, -1), (-2, 1), (-1, -2), (-1, 2),
    (1, -2), (1, 2), (2, -1), (2, 1),
];
const KING_OFFSETS: [Direction; 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1), (0, 1),
    (1, -1), (1, 0), (1, 1),
];

/// An enemy piece giving check, and the ray (or knight offset) from the king
/// to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Check {
    pub attacker: Square,
    pub direction: Direction,
}

#[derive(Debug, Clone, Default)]
pub struct PinsAndChecks {
    pub in_check: bool,
    /// Pinned square -> direction from the king toward the pinning piece.
    pub pins: HashMap<Square, Direction>,
    pub checks: Vec<Check>,
}

impl PinsAndChecks {
    pub fn is_pinned(&self, square: Square) -> bool {
        self.pins.contains_key(&square)
    }

    /// A pinned piece may only travel along its pin axis, in either direction.
    pub fn allows(&self, square: Square, (dr, dc): Direction) -> bool {
        match self.pins.get(&square) {
            None => true,
            Some(&pin) => pin == (dr, dc) || pin == (-dr, -dc),
        }
    }
}

impl GameState {
    /// All legal moves for the side to move.
    ///
    /// Also recomputes the checkmate and stalemate flags; they are never
    /// carried over from an earlier call.
    pub fn get_valid_moves(&mut self) -> Vec<Move> {
        let color = self.side_to_move;
        let king = self.king_location(color);
        let scan = self.scan_pins_and_checks(king, color);

        let mut moves;
        if scan.in_check {
            if scan.checks.len() == 1 {
                moves = self.get_all_possible_moves(&scan);
                let check = scan.checks[0];
                let valid_squares = self.check_block_squares(king, check);
                moves.retain(|mv| {
                    mv.piece_moved.0 == Piece::King
                        || valid_squares.contains(&mv.end)
                        || (mv.is_en_passant && mv.capture_square() == check.attacker)
                });
            } else {
                // double check: only the king can move
                moves = Vec::new();
                self.get_king_moves(king, color, &mut moves);
            }
        } else {
            moves = self.get_all_possible_moves(&scan);
            self.get_castle_moves(king, color, &mut moves);
        }

        self.checkmate = moves.is_empty() && scan.in_check;
        self.stalemate = moves.is_empty() && !scan.in_check;
        if self.checkmate || self.stalemate {
            debug!(
                checkmate = self.checkmate,
                stalemate = self.stalemate,
                "no legal moves for {}",
                color
            );
        }
        moves
    }

    /// Pins and checks against the king of the side to move.
    pub fn check_for_pins_and_checks(&self) -> PinsAndChecks {
        let color = self.side_to_move;
        self.scan_pins_and_checks(self.king_location(color), color)
    }

    /// Scans outward from `king` as if `color`'s king stood there. The real
    /// king is transparent to the scan, so a hypothetical square can be probed
    /// without touching the board.
    fn scan_pins_and_checks(&self, king: Square, color: Color) -> PinsAndChecks {
        let enemy = color.opposite();
        let mut result = PinsAndChecks::default();

        for (j, &direction) in ORTHOGONAL.iter().chain(DIAGONAL.iter()).enumerate() {
            let orthogonal = j < 4;
            let mut possible_pin: Option<Square> = None;
            for distance in 1..8 {
                let square = match king.offset(direction, distance) {
                    Some(square) => square,
                    None => break,
                };
                match self.board.get(square) {
                    None => {}
                    Some((Piece::King, c)) if c == color => {}
                    Some((_, c)) if c == color => {
                        if possible_pin.is_some() {
                            break;
                        }
                        possible_pin = Some(square);
                    }
                    Some((piece, _)) => {
                        let attacks = match piece {
                            Piece::Rook => orthogonal,
                            Piece::Bishop => !orthogonal,
                            Piece::Queen => true,
                            Piece::King => distance == 1,
                            Piece::Pawn => {
                                distance == 1 && !orthogonal && direction.0 == -enemy.pawn_direction()
                            }
                            Piece::Knight => false,
                        };
                        if attacks {
                            match possible_pin {
                                None => {
                                    result.in_check = true;
                                    result.checks.push(Check {
                                        attacker: square,
                                        direction,
                                    });
                                }
                                Some(pinned) => {
                                    result.pins.insert(pinned, direction);
                                }
                            }
                        }
                        break;
                    }
                }
            }
        }

        for &offset in &KNIGHT_OFFSETS {
            if let Some(square) = king.offset(offset, 1) {
                if self.board.get(square) == Some((Piece::Knight, enemy)) {
                    result.in_check = true;
                    result.checks.push(Check {
                        attacker: square,
                        direction: offset,
                    });
                }
            }
        }

        result
    }

    /// Squares a non-king move may land on to answer a single check: the
    /// attacker itself, plus the ray between it and the king for sliders.
    fn check_block_squares(&self, king: Square, check: Check) -> Vec<Square> {
        if let Some((Piece::Knight, _)) = self.board.get(check.attacker) {
            return vec![check.attacker];
        }
        let mut squares = Vec::new();
        for distance in 1..8 {
            match king.offset(check.direction, distance) {
                Some(square) => {
                    squares.push(square);
                    if square == check.attacker {
                        break;
                    }
                }
                None => break,
            }
        }
        squares
    }

    /// Moves for every piece of the side to move, with pins enforced but
    /// without check evasion filtering or castling.
    fn get_all_possible_moves(&self, scan: &PinsAndChecks) -> Vec<Move> {
        let color = self.side_to_move;
        let mut moves = Vec::new();
        for (square, piece, c) in self.board.pieces() {
            if c != color {
                continue;
            }
            match piece {
                Piece::Pawn => self.get_pawn_moves(square, color, scan, &mut moves),
                Piece::Knight => self.get_knight_moves(square, color, scan, &mut moves),
                Piece::Bishop => self.get_sliding_moves(square, Piece::Bishop, color, &DIAGONAL, scan, &mut moves),
                Piece::Rook => self.get_sliding_moves(square, Piece::Rook, color, &ORTHOGONAL, scan, &mut moves),
                Piece::Queen => {
                    self.get_sliding_moves(square, Piece::Queen, color, &ORTHOGONAL, scan, &mut moves);
                    self.get_sliding_moves(square, Piece::Queen, color, &DIAGONAL, scan, &mut moves);
                }
                Piece::King => self.get_king_moves(square, color, &mut moves),
            }
        }
        moves
    }

    fn get_pawn_moves(&self, square: Square, color: Color, scan: &PinsAndChecks, moves: &mut Vec<Move>) {
        let forward = color.pawn_direction();
        let start_row = (color.home_row() as i8 + forward) as u8;
        let pawn = (Piece::Pawn, color);

        if let Some(one) = square.offset((forward, 0), 1) {
            if self.board.is_empty(one) && scan.allows(square, (forward, 0)) {
                moves.push(Move::new(square, one, pawn, &self.board));
                if square.row == start_row {
                    if let Some(two) = square.offset((forward, 0), 2) {
                        if self.board.is_empty(two) {
                            moves.push(Move::new(square, two, pawn, &self.board));
                        }
                    }
                }
            }
        }

        for dc in [-1, 1] {
            let direction = (forward, dc);
            let target = match square.offset(direction, 1) {
                Some(target) => target,
                None => continue,
            };
            if !scan.allows(square, direction) {
                continue;
            }
            if self.board.color_at(target) == Some(color.opposite()) {
                moves.push(Move::new(square, target, pawn, &self.board));
            }
            if self.en_passant_target == Some(target)
                && self.board.is_empty(target)
                && self.board.get(Square::new(square.row, target.col)) == Some((Piece::Pawn, color.opposite()))
                && self.en_passant_keeps_rank_closed(square, target.col, color)
            {
                moves.push(Move::new_en_passant(square, target, color));
            }
        }
    }

    /// En passant empties two squares of the capturing pawn's rank at once.
    /// When the king shares that rank, make sure no enemy rook or queen sees
    /// the king through the gap.
    fn en_passant_keeps_rank_closed(&self, pawn: Square, captured_col: u8, color: Color) -> bool {
        let king = self.king_location(color);
        if king.row != pawn.row {
            return true;
        }
        let step: i8 = if king.col < pawn.col { 1 } else { -1 };
        for distance in 1..8 {
            let square = match king.offset((0, step), distance) {
                Some(square) => square,
                None => return true,
            };
            if square.col == pawn.col || square.col == captured_col {
                continue;
            }
            match self.board.get(square) {
                None => {}
                Some((Piece::Rook, c)) | Some((Piece::Queen, c)) if c != color => return false,
                Some(_) => return true,
            }
        }
        true
    }

    fn get_knight_moves(&self, square: Square, color: Color, scan: &PinsAndChecks, moves: &mut Vec<Move>) {
        if scan.is_pinned(square) {
            return;
        }
        for &offset in &KNIGHT_OFFSETS {
            if let Some(target) = square.offset(offset, 1) {
                if self.board.color_at(target) != Some(color) {
                    moves.push(Move::new(square, target, (Piece::Knight, color), &self.board));
                }
            }
        }
    }

    /// Rays for rooks, bishops and both halves of the queen. The pin lookup is
    /// read-only, so a queen checks the same entry on each pass.
    fn get_sliding_moves(
        &self,
        square: Square,
        piece: Piece,
        color: Color,
        directions: &[Direction],
        scan: &PinsAndChecks,
        moves: &mut Vec<Move>,
    ) {
        for &direction in directions {
            if !scan.allows(square, direction) {
                continue;
            }
            for distance in 1..8 {
                let target = match square.offset(direction, distance) {
                    Some(target) => target,
                    None => break,
                };
                match self.board.color_at(target) {
                    None => moves.push(Move::new(square, target, (piece, color), &self.board)),
                    Some(c) if c != color => {
                        moves.push(Move::new(square, target, (piece, color), &self.board));
                        break;
                    }
                    Some(_) => break,
                }
            }
        }
    }

    /// King steps, each probed by re-running the check scan from the
    /// destination. This also keeps the two kings apart.
    fn get_king_moves(&self, square: Square, color: Color, moves: &mut Vec<Move>) {
        for &offset in &KING_OFFSETS {
            let target = match square.offset(offset, 1) {
                Some(target) => target,
                None => continue,
            };
            if self.board.color_at(target) == Some(color) {
                continue;
            }
            if !self.scan_pins_and_checks(target, color).in_check {
                moves.push(Move::new(square, target, (Piece::King, color), &self.board));
            }
        }
    }

    /// Castling requires the right, an empty path to the rook and no attacked
    /// square under the king's path. Callers only ask when not in check.
    fn get_castle_moves(&self, king: Square, color: Color, moves: &mut Vec<Move>) {
        let row = color.home_row();
        if king != Square::new(row, 4) {
            return;
        }
        let at = |col: u8| Square::new(row, col);

        if self.castle_rights.kingside(color)
            && self.board.is_empty(at(5))
            && self.board.is_empty(at(6))
            && !self.square_under_attack(at(5))
            && !self.square_under_attack(at(6))
        {
            moves.push(Move::new_castle(king, at(6), color));
        }

        if self.castle_rights.queenside(color)
            && self.board.is_empty(at(3))
            && self.board.is_empty(at(2))
            && self.board.is_empty(at(1))
            && !self.square_under_attack(at(3))
            && !self.square_under_attack(at(2))
        {
            moves.push(Move::new_castle(king, at(2), color));
        }
    }

    /// Whether the opponent of the side to move attacks `square`.
    pub fn square_under_attack(&self, square: Square) -> bool {
        self.is_attacked_by(square, self.side_to_move.opposite())
    }

    /// Raw attack map: pins and the attacker's own king safety are ignored.
    pub fn is_attacked_by(&self, square: Square, attacker: Color) -> bool {
        // an attacking pawn sits one row behind the square, relative to its own push direction
        let pawn_row = -attacker.pawn_direction();
        for dc in [-1, 1] {
            if let Some(from) = square.offset((pawn_row, dc), 1) {
                if self.board.get(from) == Some((Piece::Pawn, attacker)) {
                    return true;
                }
            }
        }

        for &offset in &KNIGHT_OFFSETS {
            if let Some(from) = square.offset(offset, 1) {
                if self.board.get(from) == Some((Piece::Knight, attacker)) {
                    return true;
                }
            }
        }

        for &offset in &KING_OFFSETS {
            if let Some(from) = square.offset(offset, 1) {
                if self.board.get(from) == Some((Piece::King, attacker)) {
                    return true;
                }
            }
        }

        for (directions, slider) in [(&DIAGONAL, Piece::Bishop), (&ORTHOGONAL, Piece::Rook)] {
            for &direction in directions {
                for distance in 1..8 {
                    let from = match square.offset(direction, distance) {
                        Some(from) => from,
                        None => break,
                    };
                    match self.board.get(from) {
                        None => {}
                        Some((piece, c)) => {
                            if c == attacker && (piece == slider || piece == Piece::Queen) {
                                return true;
                            }
                            break;
                        }
                    }
                }
            }
        }

        false
    }

    /// Looks up a valid move from coordinate notation (`e2e4`, `e7e8q`).
    pub fn find_move(&mut self, notation: &str) -> ChessResult<Move> {
        let moves = self.get_valid_moves();
        match_move(&moves, notation)
    }
}

/// Picks the move written in coordinate notation out of `valid_moves`.
/// Promotions always yield a queen, so the `q` suffix may be omitted.
pub fn match_move(valid_moves: &[Move], notation: &str) -> ChessResult<Move> {
    let notation = notation.trim();
    let invalid = || ChessError::InvalidMoveNotation(notation.to_string());
    if !notation.is_ascii() || !(4..=5).contains(&notation.len()) {
        return Err(invalid());
    }
    let start: Square = notation[0..2].parse().map_err(|_| invalid())?;
    let end: Square = notation[2..4].parse().map_err(|_| invalid())?;
    let wants_promotion = match &notation[4..] {
        "" => false,
        "q" => true,
        _ => return Err(invalid()),
    };

    valid_moves
        .iter()
        .copied()
        .find(|mv| mv.matches(start, end) && (!wants_promotion || mv.is_promotion))
        .ok_or_else(|| ChessError::IllegalMove(notation.to_string()))
}

/// Counts leaf nodes of the legal move tree, using make/undo.
pub fn perft(state: &mut GameState, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = state.get_valid_moves();
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut nodes = 0;
    for mv in moves {
        state.make_move(mv);
        nodes += perft(state, depth - 1);
        state.undo_move();
    }
    nodes
}
