//! Cursor-based tokenizer for PGN movetext
//!
//! The scanner never backtracks: `peek` looks at the text under the cursor,
//! `scan` consumes it. Both skip leading whitespace first.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Token classes the PGN grammar is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    TagPair,
    VariationStart,
    VariationEnd,
    CommentStart,
    CommentEnd,
    CommentText,
    Glyph,
    MoveNumber,
    PieceMove,
    Placeholder,
    GameResult,
    EndOfInput,
}

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| compile(r"\s+"));
static TAG_PAIR: LazyLock<Regex> = LazyLock::new(|| compile(r"\[[^\]]*\]"));
static VARIATION_START: LazyLock<Regex> = LazyLock::new(|| compile(r"\("));
static VARIATION_END: LazyLock<Regex> = LazyLock::new(|| compile(r"\)"));
static COMMENT_START: LazyLock<Regex> = LazyLock::new(|| compile(r"\{"));
static COMMENT_END: LazyLock<Regex> = LazyLock::new(|| compile(r"\}"));
static COMMENT_TEXT: LazyLock<Regex> = LazyLock::new(|| compile(r"[^{}()]+"));
static GLYPH: LazyLock<Regex> = LazyLock::new(|| compile(r"\$[0-9]+"));
static MOVE_NUMBER: LazyLock<Regex> = LazyLock::new(|| compile(r"[0-9]+\."));
static PIECE_MOVE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?:O-O-O|O-O)[+#]?[!?]?[!?]?|[KQBNR]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?[!?]?[!?]?")
});
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| compile(r"\.\."));
static GAME_RESULT: LazyLock<Regex> = LazyLock::new(|| compile(r"1-0|0-1|1/2-1/2|\*"));
static END_OF_INPUT: LazyLock<Regex> = LazyLock::new(|| compile(r"\z"));

/// Anchors `pattern` at the start of the haystack.
fn compile(pattern: &str) -> Regex {
    Regex::new(&format!("^(?:{pattern})")).expect("token patterns are valid regular expressions")
}

impl Token {
    fn regex(self) -> &'static Regex {
        match self {
            Token::TagPair => &TAG_PAIR,
            Token::VariationStart => &VARIATION_START,
            Token::VariationEnd => &VARIATION_END,
            Token::CommentStart => &COMMENT_START,
            Token::CommentEnd => &COMMENT_END,
            Token::CommentText => &COMMENT_TEXT,
            Token::Glyph => &GLYPH,
            Token::MoveNumber => &MOVE_NUMBER,
            Token::PieceMove => &PIECE_MOVE,
            Token::Placeholder => &PLACEHOLDER,
            Token::GameResult => &GAME_RESULT,
            Token::EndOfInput => &END_OF_INPUT,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Token::TagPair => "tag pair",
            Token::VariationStart => "'('",
            Token::VariationEnd => "')'",
            Token::CommentStart => "'{'",
            Token::CommentEnd => "'}'",
            Token::CommentText => "comment text",
            Token::Glyph => "annotation glyph",
            Token::MoveNumber => "move number",
            Token::PieceMove => "piece move",
            Token::Placeholder => "'..'",
            Token::GameResult => "game result",
            Token::EndOfInput => "end of input",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Failure to match the grammar. Always fatal to the current parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("syntax error at offset {position}: expected {expected}")]
    Unexpected { position: usize, expected: Token },

    #[error("syntax error at offset {position}: comments nested deeper than {limit} levels")]
    NestingTooDeep { position: usize, limit: usize },
}

impl SyntaxError {
    /// Byte offset into the source text
    pub fn position(&self) -> usize {
        match self {
            SyntaxError::Unexpected { position, .. } => *position,
            SyntaxError::NestingTooDeep { position, .. } => *position,
        }
    }
}

pub struct Scanner<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    /// Current cursor offset
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the text a `scan` would consume, without consuming it.
    pub fn peek(&mut self, token: Token) -> Option<&'a str> {
        self.ignore();
        token
            .regex()
            .find(&self.input[self.position..])
            .map(|m| m.as_str())
    }

    /// Consumes `token` at the cursor or fails with the cursor position.
    pub fn scan(&mut self, token: Token) -> Result<&'a str, SyntaxError> {
        match self.peek(token) {
            Some(text) => {
                self.position += text.len();
                Ok(text)
            }
            None => Err(SyntaxError::Unexpected {
                position: self.position,
                expected: token,
            }),
        }
    }

    /// Source text between two offsets previously reported by `position`.
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[start..end]
    }

    /// 1-based line and column of a byte offset
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        line_col(self.input, offset)
    }

    fn ignore(&mut self) {
        if let Some(m) = WHITESPACE.find(&self.input[self.position..]) {
            self.position += m.end();
        }
    }
}

/// 1-based line and column of a byte offset into `text`
pub fn line_col(text: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(text.len());
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let column = match before.rfind('\n') {
        Some(newline) => before[newline + 1..].chars().count() + 1,
        None => before.chars().count() + 1,
    };
    (line, column)
}
