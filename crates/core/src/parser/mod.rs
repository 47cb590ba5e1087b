//! Parser module for reading chess game formats
//!
//! Currently supports:
//! - PGN movetext, including nested comments and variations

pub mod pgn;
pub mod scanner;

pub use pgn::{parse_pgn_file, parse_pgn_string, PgnParser};
pub use scanner::{Scanner, SyntaxError, Token};
