pub mod board;
pub mod chess_move;
pub mod error;
pub mod evaluation;
pub mod movegen;
pub mod search;
pub mod session;
pub mod state;
pub mod uci;

pub use board::{Board, Color, Piece, Square};
pub use chess_move::{format_move_log, Move};
pub use error::{ChessError, ChessResult};
pub use evaluation::{Evaluator, CHECKMATE_SCORE};
pub use movegen::perft;
pub use search::{find_random_move, Search, SearchConfig, SearchResult};
pub use session::{PlayerKind, Players, Session};
pub use state::{CastleRights, GameOutcome, GameState};
pub use uci::UciHandler;

#[cfg(test)]
mod tests {
    use super::*;

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -";
    const POSITION_3: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - -";

    #[test]
    fn test_perft_initial_position() {
        let mut state = GameState::new();
        assert_eq!(perft(&mut state, 1), 20);
        assert_eq!(perft(&mut state, 2), 400);
        assert_eq!(perft(&mut state, 3), 8902);
        assert_eq!(state.get_fen(), GameState::new().get_fen());
    }

    #[test]
    fn test_perft_kiwipete() {
        let mut state = GameState::from_fen(KIWIPETE).unwrap();
        assert_eq!(perft(&mut state, 1), 48);
        assert_eq!(perft(&mut state, 2), 2039);
    }

    #[test]
    fn test_perft_position_3() {
        let mut state = GameState::from_fen(POSITION_3).unwrap();
        assert_eq!(perft(&mut state, 1), 14);
        assert_eq!(perft(&mut state, 2), 191);
        assert_eq!(perft(&mut state, 3), 2812);
    }

    #[test]
    fn test_scholars_mate() {
        let mut state = GameState::new();
        for notation in ["e2e4", "e7e5", "f1c4", "b8c6", "d1h5", "g8f6", "h5f7"] {
            let mv = state.find_move(notation).unwrap();
            state.make_move(mv);
        }
        assert_eq!(state.is_game_over(), GameOutcome::Checkmate { winner: Color::White });
        assert_eq!(state.is_game_over().to_string(), "White wins by checkmate");
        assert_eq!(
            format_move_log(state.move_log()),
            vec!["1. e4 e5", "2. Bc4 Nc6", "3. Qh5 Nf6", "4. Qxf7"]
        );
    }

    #[test]
    fn test_bot_finds_mate_from_uci_position() {
        let mut uci = UciHandler::new(SearchConfig {
            depth: 2,
            shuffle_moves: true,
            seed: Some(11),
        });
        uci.handle_command("position startpos moves e2e4 e7e5 f1c4 b8c6 d1h5 g8f6")
            .unwrap();
        let response = uci.handle_command("go").unwrap();
        assert!(response.ends_with("bestmove h5f7\n"));
    }

    #[test]
    fn test_full_undo_returns_to_start() {
        let mut state = GameState::new();
        let mut search = Search::new(SearchConfig {
            depth: 1,
            shuffle_moves: true,
            seed: Some(5),
        });
        for _ in 0..16 {
            match search.choose_move(&mut state) {
                Some(mv) => state.make_move(mv),
                None => break,
            }
        }
        while state.undo_move().is_some() {}
        assert_eq!(state.board(), &Board::starting());
        assert_eq!(state.castle_rights(), CastleRights::all());
        assert_eq!(state.en_passant_target(), None);
        assert_eq!(state.get_valid_moves().len(), 20);
    }
}
