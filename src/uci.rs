use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::search::{Search, SearchConfig};
use crate::state::GameState;

pub struct UciHandler {
    state: GameState,
    search: Search,
    default_depth: u32,
}

impl UciHandler {
    pub fn new(config: SearchConfig) -> Self {
        UciHandler {
            state: GameState::new(),
            default_depth: config.depth,
            search: Search::new(config),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run_with(stdin.lock(), stdout.lock())
    }

    /// Reads commands line by line until `quit` or end of input. A bad
    /// command is logged and skipped; only I/O failures end the loop early.
    pub fn run_with<R: BufRead, W: Write>(&mut self, mut reader: R, mut writer: W) -> Result<()> {
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).context("reading command")? == 0 {
                break;
            }
            let command = line.trim();
            if command == "quit" {
                break;
            }
            match self.handle_command(command) {
                Ok(response) => {
                    writer.write_all(response.as_bytes())?;
                    writer.flush()?;
                }
                Err(err) => warn!("{:#}", err),
            }
        }
        info!("uci loop finished");
        Ok(())
    }

    pub fn handle_command(&mut self, command: &str) -> Result<String> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(String::new());
        }

        match parts[0] {
            "uci" => Ok(self.handle_uci()),
            "isready" => Ok("readyok\n".to_string()),
            "ucinewgame" => Ok(self.handle_ucinewgame()),
            "position" => self.handle_position(&parts[1..]),
            "go" => self.handle_go(&parts[1..]),
            "d" => Ok(self.handle_display()),
            other => {
                warn!("unknown command: {}", other);
                Ok(String::new())
            }
        }
    }

    fn handle_uci(&self) -> String {
        format!(
            "id name Salmon Chess {}\nid author Salmon Chess developers\nuciok\n",
            env!("CARGO_PKG_VERSION")
        )
    }

    fn handle_ucinewgame(&mut self) -> String {
        self.state = GameState::new();
        String::new()
    }

    /// `position startpos [moves ...]` or `position fen <fields> [moves ...]`.
    /// The current position is only replaced once every move has applied.
    fn handle_position(&mut self, parts: &[&str]) -> Result<String> {
        let moves_at = parts.iter().position(|&part| part == "moves");
        let (setup, moves) = match moves_at {
            Some(i) => (&parts[..i], &parts[i + 1..]),
            None => (parts, &parts[parts.len()..]),
        };

        let mut state = match setup.first() {
            Some(&"startpos") => GameState::new(),
            Some(&"fen") => {
                let fen = setup[1..].join(" ");
                GameState::from_fen(&fen).with_context(|| format!("position fen {}", fen))?
            }
            _ => bail!("position needs startpos or fen"),
        };

        for notation in moves {
            let mv = state
                .find_move(notation)
                .with_context(|| format!("applying {} in position {}", notation, state.get_fen()))?;
            state.make_move(mv);
        }

        self.state = state;
        Ok(String::new())
    }

    fn handle_go(&mut self, parts: &[&str]) -> Result<String> {
        let mut depth = self.default_depth;
        for i in 0..parts.len() {
            if parts[i] == "depth" {
                let value = parts.get(i + 1).context("go depth needs a value")?;
                depth = value
                    .parse::<u32>()
                    .with_context(|| format!("invalid depth {}", value))?;
            }
        }

        self.search.set_max_depth(depth);
        let valid_moves = self.state.get_valid_moves();
        let result = self.search.search(&mut self.state, &valid_moves);
        self.search.set_max_depth(self.default_depth);

        let mut response = format!(
            "info depth {} score cp {} nodes {}\n",
            depth.max(1),
            result.score,
            result.nodes
        );
        match result.best_move {
            Some(mv) => response.push_str(&format!("bestmove {}\n", mv.uci_notation())),
            None => response.push_str("bestmove (none)\n"),
        }
        Ok(response)
    }

    fn handle_display(&self) -> String {
        format!("{}\nFen: {}\n", self.state.board(), self.state.get_fen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> UciHandler {
        UciHandler::new(SearchConfig {
            depth: 2,
            shuffle_moves: false,
            seed: Some(0),
        })
    }

    #[test]
    fn test_uci_handshake() {
        let mut uci = handler();
        let response = uci.handle_command("uci").unwrap();
        assert!(response.starts_with("id name Salmon Chess"));
        assert!(response.ends_with("uciok\n"));
        assert_eq!(uci.handle_command("isready").unwrap(), "readyok\n");
        assert_eq!(uci.handle_command("").unwrap(), "");
    }

    #[test]
    fn test_position_startpos_with_moves() {
        let mut uci = handler();
        uci.handle_command("position startpos moves e2e4 e7e5 g1f3").unwrap();
        assert_eq!(uci.state().move_log().len(), 3);
        assert_eq!(
            uci.state().get_fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 0 1"
        );
    }

    #[test]
    fn test_position_fen() {
        let mut uci = handler();
        uci.handle_command("position fen 6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
        assert_eq!(uci.state().board().fen_placement(), "6k1/5ppp/8/8/8/8/8/R5K1");
    }

    #[test]
    fn test_bad_position_keeps_previous_state() {
        let mut uci = handler();
        uci.handle_command("position startpos moves e2e4").unwrap();
        assert!(uci.handle_command("position startpos moves e2e4 e2e4").is_err());
        assert!(uci.handle_command("position fen not/a/fen w").is_err());
        assert!(uci.handle_command("position").is_err());
        assert_eq!(uci.state().move_log().len(), 1);
    }

    #[test]
    fn test_go_finds_mate() {
        let mut uci = handler();
        uci.handle_command("position fen 6k1/5ppp/8/8/8/8/8/R5K1 w - -").unwrap();
        let response = uci.handle_command("go depth 2").unwrap();
        assert!(response.contains("score cp 100000"));
        assert!(response.ends_with("bestmove a1a8\n"));
        assert!(uci.handle_command("go depth x").is_err());
    }

    #[test]
    fn test_go_when_mated() {
        let mut uci = handler();
        uci.handle_command("position fen R5k1/5ppp/8/8/8/8/8/6K1 b - -").unwrap();
        let response = uci.handle_command("go").unwrap();
        assert!(response.ends_with("bestmove (none)\n"));
    }

    #[test]
    fn test_promotion_move_format() {
        let mut uci = handler();
        uci.handle_command("position fen 7k/P7/8/8/8/8/8/K7 w - -").unwrap();
        let response = uci.handle_command("go depth 1").unwrap();
        assert!(response.ends_with("bestmove a7a8q\n"));
    }

    #[test]
    fn test_run_loop() {
        let mut uci = handler();
        let input = "uci\nisready\nbogus\nposition startpos moves e2e4\nd\nquit\nisready\n";
        let mut output = Vec::new();
        uci.run_with(input.as_bytes(), &mut output).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("uciok\n"));
        assert_eq!(output.matches("readyok").count(), 1);
        assert!(output.contains("Fen: rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"));
    }
}
