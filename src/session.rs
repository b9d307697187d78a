//! A single game between two players, either of which may be the bot.
//!
//! The session owns the `GameState` and keeps the valid moves of the current
//! position cached; the cache is refreshed after every move, undo or reset,
//! which also keeps the checkmate/stalemate flags current.

use tracing::info;

use crate::board::Color;
use crate::chess_move::{format_move_log, Move};
use crate::error::ChessResult;
use crate::movegen::match_move;
use crate::search::{Search, SearchConfig};
use crate::state::{GameOutcome, GameState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PlayerKind {
    Human,
    Bot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Players {
    pub white: PlayerKind,
    pub black: PlayerKind,
}

impl Default for Players {
    fn default() -> Self {
        Self {
            white: PlayerKind::Human,
            black: PlayerKind::Bot,
        }
    }
}

impl Players {
    pub fn kind(&self, color: Color) -> PlayerKind {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }
}

pub struct Session {
    state: GameState,
    players: Players,
    search: Search,
    valid_moves: Vec<Move>,
}

impl Session {
    pub fn new(players: Players, config: SearchConfig) -> Self {
        Self::from_state(GameState::new(), players, config)
    }

    /// Starts from an arbitrary position instead of the initial one.
    pub fn from_state(mut state: GameState, players: Players, config: SearchConfig) -> Self {
        let valid_moves = state.get_valid_moves();
        info!(?players, depth = config.depth, "new session");
        Self {
            state,
            players,
            search: Search::new(config),
            valid_moves,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn players(&self) -> Players {
        self.players
    }

    pub fn valid_moves(&self) -> &[Move] {
        &self.valid_moves
    }

    pub fn is_human_turn(&self) -> bool {
        self.players.kind(self.state.side_to_move()) == PlayerKind::Human
    }

    pub fn outcome(&self) -> GameOutcome {
        self.state.outcome()
    }

    /// Plays a move typed in coordinate notation. The position is left
    /// untouched when the text does not name a valid move.
    pub fn play_human(&mut self, notation: &str) -> ChessResult<Move> {
        let mv = match_move(&self.valid_moves, notation)?;
        self.apply(mv);
        Ok(mv)
    }

    /// Lets the search pick and play a move. `None` once the game is over.
    pub fn play_bot(&mut self) -> Option<Move> {
        if self.valid_moves.is_empty() {
            return None;
        }
        let mv = self.search.choose_move(&mut self.state)?;
        info!(
            "bot plays {} after checking {} positions",
            mv,
            self.search.nodes_searched()
        );
        self.apply(mv);
        Some(mv)
    }

    /// Takes back one ply.
    pub fn undo(&mut self) -> Option<Move> {
        let undone = self.state.undo_move();
        if undone.is_some() {
            self.refresh();
        }
        undone
    }

    pub fn reset(&mut self) {
        info!("session reset");
        self.state = GameState::new();
        self.refresh();
    }

    /// Numbered move pairs for the game so far.
    pub fn move_log(&self) -> Vec<String> {
        format_move_log(self.state.move_log())
    }

    fn apply(&mut self, mv: Move) {
        self.state.make_move(mv);
        self.refresh();
    }

    fn refresh(&mut self) {
        self.valid_moves = self.state.get_valid_moves();
    }
}
