//! PGN Annotator Core Library
//!
//! Parses PGN movetext, replays it on a geometry-only board that translates
//! between PGN and coordinate notation, and annotates mistakes found by a UCI
//! engine.

pub mod annotate;
pub mod board;
pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod parser;

pub use annotate::{translate_game, AnnotationSummary, Annotator, OrderingError};
pub use board::{format_variation, Board, Color, Figure, NotationError, Piece, Position};
pub use config::{AnnotatorConfig, Sides};
pub use engine::{AnalysisEngine, EngineError, Evaluation, PositionAnalysis, UciEngine};
pub use error::{Error, Result};
pub use game::{ChessMove, ChessMovePair, CommentPlace, Game};
pub use parser::{parse_pgn_file, parse_pgn_string, PgnParser, SyntaxError};
