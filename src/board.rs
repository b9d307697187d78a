use std::fmt;
use std::str::FromStr;

use crate::error::{ChessError, ChessResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Piece {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl Piece {
    /// Upper-case letter used in FEN and move notation.
    pub fn symbol(&self) -> char {
        match self {
            Piece::Pawn => 'P',
            Piece::Knight => 'N',
            Piece::Bishop => 'B',
            Piece::Rook => 'R',
            Piece::Queen => 'Q',
            Piece::King => 'K',
        }
    }

    pub fn from_symbol(c: char) -> Option<Piece> {
        match c.to_ascii_uppercase() {
            'P' => Some(Piece::Pawn),
            'N' => Some(Piece::Knight),
            'B' => Some(Piece::Bishop),
            'R' => Some(Piece::Rook),
            'Q' => Some(Piece::Queen),
            'K' => Some(Piece::King),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// +1 for white, -1 for black. Scores are always from white's point of view,
    /// so the search multiplies by this to get the side-to-move's view.
    pub fn multiplier(&self) -> i32 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }

    /// Row holding this color's king and rooks at the start of the game.
    pub fn home_row(&self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    /// Row delta of a single pawn push.
    pub fn pawn_direction(&self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    pub fn letter(&self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}

/// A (row, col) step on the board.
pub type Direction = (i8, i8);

/// Board coordinate. Row 0 is rank 8, row 7 is rank 1; col 0 is the a-file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Square {
    pub row: u8,
    pub col: u8,
}

impl Square {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// Returns the square at signed coordinates, or `None` off the board.
    pub fn try_new(row: i8, col: i8) -> Option<Square> {
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Some(Square::new(row as u8, col as u8))
        } else {
            None
        }
    }

    pub fn offset(&self, (dr, dc): Direction, distance: i8) -> Option<Square> {
        Square::try_new(self.row as i8 + dr * distance, self.col as i8 + dc * distance)
    }

    pub fn file(&self) -> char {
        (b'a' + self.col) as char
    }

    pub fn rank(&self) -> char {
        (b'8' - self.row) as char
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.file(), self.rank())
    }
}

impl FromStr for Square {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(ChessError::InvalidSquare(s.to_string()));
        }
        let (file, rank) = (bytes[0], bytes[1]);
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return Err(ChessError::InvalidSquare(s.to_string()));
        }
        Ok(Square::new(b'8' - rank, file - b'a'))
    }
}

/// Fixed 8x8 mailbox grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    squares: [[Option<(Piece, Color)>; 8]; 8],
}

const BACK_RANK: [Piece; 8] = [
    Piece::Rook,
    Piece::Knight,
    Piece::Bishop,
    Piece::Queen,
    Piece::King,
    Piece::Bishop,
    Piece::Knight,
    Piece::Rook,
];

impl Board {
    pub fn empty() -> Self {
        Self {
            squares: [[None; 8]; 8],
        }
    }

    /// Standard initial position.
    pub fn starting() -> Self {
        let mut board = Board::empty();
        for col in 0..8 {
            board.squares[0][col] = Some((BACK_RANK[col], Color::Black));
            board.squares[1][col] = Some((Piece::Pawn, Color::Black));
            board.squares[6][col] = Some((Piece::Pawn, Color::White));
            board.squares[7][col] = Some((BACK_RANK[col], Color::White));
        }
        board
    }

    pub fn get(&self, square: Square) -> Option<(Piece, Color)> {
        self.squares[square.row as usize][square.col as usize]
    }

    pub fn set(&mut self, square: Square, piece: Option<(Piece, Color)>) {
        self.squares[square.row as usize][square.col as usize] = piece;
    }

    pub fn is_empty(&self, square: Square) -> bool {
        self.get(square).is_none()
    }

    /// Color of the piece on `square`, if any.
    pub fn color_at(&self, square: Square) -> Option<Color> {
        self.get(square).map(|(_, color)| color)
    }

    /// Every occupied square, row by row from rank 8.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece, Color)> + '_ {
        (0..8u8).flat_map(move |row| {
            (0..8u8).filter_map(move |col| {
                let square = Square::new(row, col);
                self.get(square).map(|(piece, color)| (square, piece, color))
            })
        })
    }

    pub fn find_all(&self, piece: Piece, color: Color) -> Vec<Square> {
        self.pieces()
            .filter(|&(_, p, c)| p == piece && c == color)
            .map(|(square, _, _)| square)
            .collect()
    }

    /// Piece-placement field of a FEN string.
    pub fn fen_placement(&self) -> String {
        let mut fen = String::new();
        for row in 0..8 {
            let mut empty = 0;
            for col in 0..8 {
                match self.squares[row][col] {
                    None => empty += 1,
                    Some((piece, color)) => {
                        if empty > 0 {
                            fen.push_str(&empty.to_string());
                            empty = 0;
                        }
                        fen.push(fen_char(piece, color));
                    }
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if row < 7 {
                fen.push('/');
            }
        }
        fen
    }

    pub fn from_fen_placement(placement: &str) -> ChessResult<Board> {
        let invalid = || ChessError::InvalidFen(placement.to_string());
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(invalid());
        }

        let mut board = Board::empty();
        for (row, rank) in ranks.iter().enumerate() {
            let mut col = 0usize;
            for c in rank.chars() {
                if let Some(run) = c.to_digit(10) {
                    if run == 0 || run > 8 {
                        return Err(invalid());
                    }
                    col += run as usize;
                } else {
                    let piece = Piece::from_symbol(c).ok_or_else(invalid)?;
                    let color = if c.is_ascii_uppercase() {
                        Color::White
                    } else {
                        Color::Black
                    };
                    if col >= 8 {
                        return Err(invalid());
                    }
                    board.squares[row][col] = Some((piece, color));
                    col += 1;
                }
                if col > 8 {
                    return Err(invalid());
                }
            }
            if col != 8 {
                return Err(invalid());
            }
        }
        Ok(board)
    }
}

fn fen_char(piece: Piece, color: Color) -> char {
    match color {
        Color::White => piece.symbol(),
        Color::Black => piece.symbol().to_ascii_lowercase(),
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut result = String::new();
        for row in 0..8 {
            result.push((b'8' - row as u8) as char);
            result.push(' ');
            for col in 0..8 {
                match self.squares[row][col] {
                    Some((piece, color)) => result.push(fen_char(piece, color)),
                    None => result.push('.'),
                }
                if col < 7 {
                    result.push(' ');
                }
            }
            result.push('\n');
        }
        result.push_str("  a b c d e f g h\n");
        write!(f, "{}", result)
    }
}
