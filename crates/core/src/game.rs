//! Parsed and annotated game representation

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::engine::analysis::format_pawns;

const LINE_WIDTH: usize = 79;

static TAG_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\[\s*([A-Za-z0-9_]+)\s+"((?:[^"\\]|\\.)*)"\s*\]$"#)
        .expect("tag pattern is a valid regular expression")
});

/// One ply as recorded in the movetext
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChessMove {
    /// Move in PGN notation, exactly as written
    pub notation: String,
    /// Evaluation after the move, in centipawns from the mover's point of view
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
    /// Suggested line in PGN notation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation: Option<String>,
    /// Comments and variations that followed the move in the source
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
}

impl ChessMove {
    pub fn new(notation: impl Into<String>) -> Self {
        Self {
            notation: notation.into(),
            ..Self::default()
        }
    }

    pub fn is_annotated(&self) -> bool {
        self.score.is_some() || self.variation.is_some()
    }

    fn has_trailer(&self) -> bool {
        self.is_annotated() || !self.comments.is_empty()
    }

    fn write_tokens(&self, tokens: &mut Vec<String>) {
        tokens.push(self.notation.clone());
        tokens.extend(self.comments.iter().cloned());
        if let Some(score) = self.score {
            tokens.push(format!("{{{}}}", format_pawns(score)));
        }
        if let Some(variation) = &self.variation {
            tokens.push(format!("({})", variation));
        }
    }
}

/// Where a comment sat relative to the move number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentPlace {
    /// Right after `12.`
    MoveNumber,
    /// Right after the `..` of `12...`
    Placeholder,
}

/// One full move: white's ply and black's reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChessMovePair {
    pub number: u32,
    pub white: Option<ChessMove>,
    pub black: Option<ChessMove>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub comments: BTreeMap<CommentPlace, String>,
}

impl ChessMovePair {
    pub fn new(number: u32, white: Option<ChessMove>, black: Option<ChessMove>) -> Self {
        Self {
            number,
            white,
            black,
            comments: BTreeMap::new(),
        }
    }

    pub fn set_comment(&mut self, place: CommentPlace, comment: impl Into<String>) {
        self.comments.insert(place, comment.into());
    }

    pub fn is_complete(&self) -> bool {
        self.white.is_some() && self.black.is_some()
    }

    fn write_tokens(&self, tokens: &mut Vec<String>) {
        let number_comment = self.comments.get(&CommentPlace::MoveNumber);
        let placeholder_comment = self.comments.get(&CommentPlace::Placeholder);

        match &self.white {
            Some(white) => {
                tokens.push(format!("{}.", self.number));
                tokens.extend(number_comment.cloned());
                white.write_tokens(tokens);
                if let Some(black) = &self.black {
                    if white.has_trailer() {
                        tokens.push(format!("{}...", self.number));
                        tokens.extend(placeholder_comment.cloned());
                    }
                    black.write_tokens(tokens);
                }
            }
            None => {
                match number_comment {
                    Some(comment) => {
                        tokens.push(format!("{}.", self.number));
                        tokens.push(comment.clone());
                        tokens.push("..".to_string());
                    }
                    None => tokens.push(format!("{}...", self.number)),
                }
                tokens.extend(placeholder_comment.cloned());
                if let Some(black) = &self.black {
                    black.write_tokens(tokens);
                }
            }
        }
    }
}

/// A parsed game: tag pairs, move pairs and the result token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    /// Raw tag pairs, e.g. `[White "Alice"]`
    pub tags: Vec<String>,
    pub moves: Vec<ChessMovePair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Comments between the tag pairs and the first move
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leading_comment: Option<String>,
    /// Comments after the result token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_comment: Option<String>,
}

impl Game {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.tags.push(tag.into());
    }

    /// Value of the `[name "value"]` tag pair, if present
    pub fn tag(&self, name: &str) -> Option<String> {
        self.tags.iter().find_map(|tag| {
            let caps = TAG_VALUE.captures(tag.trim())?;
            (&caps[1] == name).then(|| caps[2].replace("\\\"", "\"").replace("\\\\", "\\"))
        })
    }

    /// Adds a ply (or both plies) for move `number`.
    ///
    /// A number equal to the last pair's merges into that pair, filling in
    /// whichever side is given.
    pub fn add_move(&mut self, number: u32, white: Option<ChessMove>, black: Option<ChessMove>) {
        if let Some(last) = self.moves.last_mut().filter(|last| last.number == number) {
            if white.is_some() {
                last.white = white;
            }
            if black.is_some() {
                last.black = black;
            }
            return;
        }
        self.moves.push(ChessMovePair::new(number, white, black));
    }

    pub fn last_pair_mut(&mut self) -> Option<&mut ChessMovePair> {
        self.moves.last_mut()
    }

    /// Number of recorded plies
    pub fn ply_count(&self) -> usize {
        self.moves
            .iter()
            .map(|pair| pair.white.is_some() as usize + pair.black.is_some() as usize)
            .sum()
    }

    /// All plies in order, in PGN notation
    pub fn notations(&self) -> Vec<&str> {
        self.moves
            .iter()
            .flat_map(|pair| [pair.white.as_ref(), pair.black.as_ref()])
            .flatten()
            .map(|m| m.notation.as_str())
            .collect()
    }

    /// Number of plies carrying a score or variation
    pub fn annotated_count(&self) -> usize {
        self.moves
            .iter()
            .flat_map(|pair| [pair.white.as_ref(), pair.black.as_ref()])
            .flatten()
            .filter(|m| m.is_annotated())
            .count()
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for tag in &self.tags {
            writeln!(f, "{}", tag)?;
        }
        if !self.tags.is_empty() {
            writeln!(f)?;
        }

        let mut tokens: Vec<String> = self.leading_comment.iter().cloned().collect();
        for pair in &self.moves {
            pair.write_tokens(&mut tokens);
        }
        tokens.push(self.result.clone().unwrap_or_else(|| "*".to_string()));
        tokens.extend(self.trailing_comment.iter().cloned());

        let mut width = 0;
        for token in tokens {
            if width > 0 && width + 1 + token.len() > LINE_WIDTH {
                writeln!(f)?;
                width = 0;
            }
            if width > 0 {
                write!(f, " ")?;
                width += 1;
            }
            write!(f, "{}", token)?;
            width += token.len();
        }
        writeln!(f)
    }
}
