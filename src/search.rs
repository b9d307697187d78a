use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::chess_move::Move;
use crate::evaluation::Evaluator;
use crate::state::GameState;

/// Bound for the alpha-beta window; larger than any reachable score.
pub const INFINITY: i32 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Plies searched below the root. Zero is treated as one.
    pub depth: u32,
    /// Shuffle move order at every node so equal-scoring moves vary between games.
    pub shuffle_moves: bool,
    /// Seed for the shuffle; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: 3,
            shuffle_moves: true,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    /// Score from the side to move's point of view.
    pub score: i32,
    pub nodes: u64,
}

pub struct Search {
    evaluator: Evaluator,
    config: SearchConfig,
    rng: StdRng,
    nodes_searched: u64,
}

impl Default for Search {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

impl Search {
    pub fn new(config: SearchConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            evaluator: Evaluator::new(),
            config,
            rng,
            nodes_searched: 0,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Negamax with alpha-beta over `valid_moves`, which must be the current
    /// valid moves of `state`. The state is mutated during the search and
    /// handed back unchanged.
    pub fn search(&mut self, state: &mut GameState, valid_moves: &[Move]) -> SearchResult {
        self.nodes_searched = 0;
        let depth = self.config.depth.max(1);
        let turn = state.side_to_move().multiplier();

        if valid_moves.is_empty() {
            // refresh the terminal flags before scoring
            state.get_valid_moves();
            return SearchResult {
                best_move: None,
                score: turn * self.evaluator.score_board(state),
                nodes: 0,
            };
        }

        let mut moves = valid_moves.to_vec();
        self.order_moves(&mut moves);

        let mut best_move = None;
        let mut best_score = -INFINITY;
        let mut alpha = -INFINITY;
        let beta = INFINITY;

        for mv in moves {
            state.make_move(mv);
            let score = -self.negamax(state, depth - 1, -beta, -alpha, -turn);
            state.undo_move();

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
            alpha = alpha.max(best_score);
            if alpha >= beta {
                break;
            }
        }

        debug!(
            depth,
            nodes = self.nodes_searched,
            score = best_score,
            best = ?best_move.map(|mv| mv.chess_notation()),
            "search finished"
        );

        SearchResult {
            best_move,
            score: best_score,
            nodes: self.nodes_searched,
        }
    }

    pub fn find_best_move(&mut self, state: &mut GameState, valid_moves: &[Move]) -> Option<Move> {
        self.search(state, valid_moves).best_move
    }

    /// Picks a move for the side to move, falling back to a random valid move
    /// if the search comes back empty-handed. `None` only when the game is over.
    pub fn choose_move(&mut self, state: &mut GameState) -> Option<Move> {
        let valid_moves = state.get_valid_moves();
        if valid_moves.is_empty() {
            return None;
        }
        match self.find_best_move(state, &valid_moves) {
            Some(mv) => Some(mv),
            None => {
                warn!("search returned no move, playing a random one");
                find_random_move(&valid_moves, &mut self.rng)
            }
        }
    }

    /// Every node asks for its valid moves first, so terminal positions are
    /// scored with fresh checkmate/stalemate flags at any depth.
    fn negamax(&mut self, state: &mut GameState, depth: u32, mut alpha: i32, beta: i32, turn: i32) -> i32 {
        self.nodes_searched += 1;

        let mut moves = state.get_valid_moves();
        if depth == 0 || moves.is_empty() {
            return turn * self.evaluator.score_board(state);
        }
        self.order_moves(&mut moves);

        let mut max_score = -INFINITY;
        for mv in moves {
            state.make_move(mv);
            let score = -self.negamax(state, depth - 1, -beta, -alpha, -turn);
            state.undo_move();

            if score > max_score {
                max_score = score;
            }
            alpha = alpha.max(max_score);

            // Alpha-beta pruning
            if alpha >= beta {
                break;
            }
        }
        max_score
    }

    fn order_moves(&mut self, moves: &mut [Move]) {
        if self.config.shuffle_moves {
            moves.shuffle(&mut self.rng);
        }
    }

    pub fn set_max_depth(&mut self, depth: u32) {
        self.config.depth = depth;
    }

    pub fn nodes_searched(&self) -> u64 {
        self.nodes_searched
    }
}

/// Uniformly random choice among `moves`.
pub fn find_random_move<R: Rng + ?Sized>(moves: &[Move], rng: &mut R) -> Option<Move> {
    moves.choose(rng).copied()
}
