//! Error types for pgn-annotator-core

use thiserror::Error;

use crate::annotate::OrderingError;
use crate::board::NotationError;
use crate::engine::EngineError;
use crate::parser::SyntaxError;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("notation error: {0}")]
    Notation(#[from] NotationError),

    #[error("move order error: {0}")]
    Ordering(#[from] OrderingError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
