use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use salmon_chess::{PlayerKind, Players, SearchConfig, Session, UciHandler};

#[derive(Debug, Parser)]
#[command(name = "salmon-chess", version, about = "Chess engine with a negamax alpha-beta bot")]
struct Cli {
    #[command(flatten)]
    search: SearchArgs,

    /// Log filter, e.g. `debug` or `salmon_chess=trace`. Falls back to RUST_LOG, then `info`.
    #[arg(long, env = "SALMON_LOG", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Search depth in plies
    #[arg(long, env = "SALMON_DEPTH", default_value_t = 3, global = true)]
    depth: u32,

    /// Seed for move-order shuffling
    #[arg(long, env = "SALMON_SEED", global = true)]
    seed: Option<u64>,

    /// Search moves in generation order
    #[arg(long, global = true)]
    no_shuffle: bool,
}

impl SearchArgs {
    fn config(&self) -> SearchConfig {
        SearchConfig {
            depth: self.depth,
            shuffle_moves: !self.no_shuffle,
            seed: self.seed,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Talk UCI over stdin/stdout (the default)
    Uci,
    /// Play a game in the terminal
    Play {
        #[arg(long, value_enum, default_value_t = PlayerKind::Human)]
        white: PlayerKind,
        #[arg(long, value_enum, default_value_t = PlayerKind::Bot)]
        black: PlayerKind,
        /// Stop after this many plies
        #[arg(long)]
        max_plies: Option<usize>,
    },
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    // stdout belongs to the protocol
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());
    let config = cli.search.config();

    match cli.command.unwrap_or(Command::Uci) {
        Command::Uci => UciHandler::new(config).run(),
        Command::Play {
            white,
            black,
            max_plies,
        } => {
            let mut session = Session::new(Players { white, black }, config);
            play(&mut session, max_plies)
        }
    }
}

fn play(session: &mut Session, max_plies: Option<usize>) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut stdout = io::stdout();

    loop {
        println!("{}", session.state().board());
        if session.outcome().is_over() {
            break;
        }
        if let Some(max) = max_plies {
            if session.state().move_log().len() >= max {
                println!("Stopping after {} plies", max);
                break;
            }
        }

        let side = session.state().side_to_move();
        if !session.is_human_turn() {
            match session.play_bot() {
                Some(mv) => println!("{} plays {}", side, mv),
                None => break,
            }
            continue;
        }

        print!("{} to move (e.g. e2e4, undo, reset, quit): ", side);
        stdout.flush()?;
        let line = match lines.next() {
            Some(line) => line.context("reading move from stdin")?,
            None => break,
        };
        match line.trim() {
            "" => {}
            "quit" => break,
            "reset" => session.reset(),
            "undo" => {
                // take back the bot's reply too, so the human moves again
                if session.undo().is_some() {
                    while !session.is_human_turn() && session.undo().is_some() {}
                }
            }
            notation => {
                if let Err(err) = session.play_human(notation) {
                    println!("{}", err);
                }
            }
        }
    }

    let outcome = session.outcome();
    if outcome.is_over() {
        println!("{}", outcome);
    }
    for line in session.move_log() {
        println!("{}", line);
    }
    Ok(())
}
