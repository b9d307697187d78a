//! Error types for the engine.
//!
//! Move generation itself never fails; errors only come from parsing
//! untrusted text (squares, moves, FEN) and from rejecting moves that are
//! not legal in the current position.

/// Errors raised while interpreting input for the engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChessError {
    /// Square notation outside `a1`..`h8`.
    #[error("invalid square: {0}")]
    InvalidSquare(String),

    /// Move text that is not coordinate notation.
    #[error("invalid move notation: {0}")]
    InvalidMoveNotation(String),

    /// Well-formed move that is not among the current valid moves.
    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// FEN string that cannot describe a playable position.
    #[error("invalid FEN: {0}")]
    InvalidFen(String),
}

/// Result type alias for engine operations.
pub type ChessResult<T> = Result<T, ChessError>;
