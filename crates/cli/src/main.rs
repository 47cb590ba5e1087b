//! pgn-annotate: annotate PGN games with engine evaluations
//!
//! Subcommands:
//! - `annotate` replays a game through a UCI engine and marks the mistakes
//! - `translate` prints the coordinate moves of a game
//! - `to-pgn` turns a coordinate line into numbered PGN

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pgn_annotator_core::parser::scanner::line_col;
use pgn_annotator_core::{
    format_variation, parse_pgn_string, translate_game, Annotator, AnnotatorConfig, Board, Color,
    Game, Sides, UciEngine,
};

#[derive(Parser)]
#[command(name = "pgn-annotate", version, about = "Annotate PGN games with a UCI engine")]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze every move of a game and annotate the mistakes
    Annotate {
        /// PGN file to annotate
        pgn: PathBuf,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Path to the UCI engine binary
        #[arg(long)]
        engine: Option<String>,

        /// Search time per position, in seconds
        #[arg(long)]
        seconds: Option<f64>,

        /// Centipawn loss above which a move is annotated
        #[arg(long)]
        threshold: Option<i32>,

        /// Whose moves to annotate
        #[arg(long, value_enum)]
        sides: Option<SidesArg>,

        #[arg(long, value_enum, default_value_t = Format::Pgn)]
        format: Format,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the coordinate moves of a game
    Translate {
        /// PGN file to translate
        pgn: PathBuf,
    },

    /// Translate coordinate moves into numbered PGN
    ToPgn {
        /// Starting position (default: standard start)
        #[arg(long)]
        fen: Option<String>,

        /// Black moves first
        #[arg(long)]
        black: bool,

        /// Number of the first move
        #[arg(long, default_value_t = 1)]
        number: u32,

        /// Moves such as e2e4 e7e5 g1f3
        #[arg(required = true)]
        moves: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SidesArg {
    White,
    Black,
    Both,
}

impl From<SidesArg> for Sides {
    fn from(sides: SidesArg) -> Self {
        match sides {
            SidesArg::White => Sides::White,
            SidesArg::Black => Sides::Black,
            SidesArg::Both => Sides::Both,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Pgn,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Annotate {
            pgn,
            config,
            engine,
            seconds,
            threshold,
            sides,
            format,
            output,
        } => {
            let mut config = match config {
                Some(path) => AnnotatorConfig::from_file(&path)
                    .with_context(|| format!("failed to load config {}", path.display()))?,
                None => AnnotatorConfig::default(),
            };
            if let Some(engine) = engine {
                config.engine_path = engine;
            }
            if let Some(seconds) = seconds {
                config.seconds_per_move = seconds;
            }
            if let Some(threshold) = threshold {
                config.threshold_cp = threshold;
            }
            if let Some(sides) = sides {
                config.sides = sides.into();
            }
            config.validate()?;

            let mut game = read_game(&pgn)?;
            let engine = UciEngine::new(&config.engine_path, config.move_time(), config.response_grace())
                .with_context(|| format!("failed to start engine {}", config.engine_path))?;
            let mut annotator = Annotator::new(engine, config);
            let summary = annotator.annotate(&mut game)?;
            info!(
                "{} plies, {} annotated, {} unanswered",
                summary.plies, summary.annotated, summary.unanswered
            );

            let rendered = match format {
                Format::Pgn => game.to_string(),
                Format::Json => serde_json::to_string_pretty(&game)? + "\n",
            };
            match output {
                Some(path) => fs::write(&path, rendered)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => print!("{}", rendered),
            }
        }

        Commands::Translate { pgn } => {
            let game = read_game(&pgn)?;
            let moves = translate_game(&game)?;
            println!("{}", moves.join(" "));
        }

        Commands::ToPgn {
            fen,
            black,
            number,
            moves,
        } => {
            let mut board = match fen {
                Some(fen) => Board::from_fen(&fen)?,
                None => Board::start_position(),
            };
            let color = if black { Color::Black } else { Color::White };
            let sans = board.coordinates_line_to_pgn(&moves, color)?;
            println!("{}", format_variation(number, color, &sans));
        }
    }

    Ok(())
}

/// Reads and parses a PGN file, reporting syntax errors by line and column
fn read_game(path: &Path) -> Result<Game> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    match parse_pgn_string(&text) {
        Ok(game) => Ok(game),
        Err(e) => {
            let (line, column) = line_col(&text, e.position());
            bail!("{}:{}:{}: {}", path.display(), line, column, e)
        }
    }
}
