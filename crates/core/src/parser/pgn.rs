//! PGN movetext parsing
//!
//! Recursive-descent over the [`Scanner`]: every production peeks one token
//! to pick a branch, then scans to consume it.

use std::fs;
use std::path::Path;

use tracing::debug;

use super::scanner::{Scanner, SyntaxError, Token};
use crate::error::Result;
use crate::game::{ChessMove, CommentPlace, Game};

/// Default limit on nested `{...}` / `(...)` comments
pub const DEFAULT_NESTING_LIMIT: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bracket {
    Variation,
    Comment,
}

impl Bracket {
    fn closing(self) -> Token {
        match self {
            Bracket::Variation => Token::VariationEnd,
            Bracket::Comment => Token::CommentEnd,
        }
    }
}

pub struct PgnParser<'a> {
    scanner: Scanner<'a>,
    game: Game,
    nesting_limit: usize,
}

impl<'a> PgnParser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            scanner: Scanner::new(input),
            game: Game::new(),
            nesting_limit: DEFAULT_NESTING_LIMIT,
        }
    }

    pub fn with_nesting_limit(mut self, limit: usize) -> Self {
        self.nesting_limit = limit;
        self
    }

    /// `game := tag* comments move* [result comments] EOF`
    pub fn game(mut self) -> std::result::Result<Game, SyntaxError> {
        self.tags()?;
        self.game.leading_comment = self.comments()?;
        self.moves()?;

        if self.scanner.peek(Token::GameResult).is_some() {
            let result = self.scanner.scan(Token::GameResult)?;
            debug!("Result: {}", result);
            self.game.result = Some(result.to_string());
            self.game.trailing_comment = self.comments()?;
        }
        self.scanner.scan(Token::EndOfInput)?;

        Ok(self.game)
    }

    fn tags(&mut self) -> std::result::Result<(), SyntaxError> {
        while self.scanner.peek(Token::TagPair).is_some() {
            let tag = self.scanner.scan(Token::TagPair)?;
            debug!("Tag: {}", tag);
            self.game.add_tag(tag);
        }
        Ok(())
    }

    fn moves(&mut self) -> std::result::Result<(), SyntaxError> {
        while self.move_pair()? {}
        Ok(())
    }

    /// Parses one `MOVENUMBER ...` group. Returns false when no move number follows.
    fn move_pair(&mut self) -> std::result::Result<bool, SyntaxError> {
        if self.scanner.peek(Token::MoveNumber).is_none() {
            return Ok(false);
        }
        let position = self.scanner.position();
        let text = self.scanner.scan(Token::MoveNumber)?;
        let number = parse_move_number(text).ok_or(SyntaxError::Unexpected {
            position,
            expected: Token::MoveNumber,
        })?;
        let number_comment = self.comments()?;

        if self.scanner.peek(Token::Placeholder).is_some() {
            self.scanner.scan(Token::Placeholder)?;
            let placeholder_comment = self.comments()?;
            let black = self.piece_move()?;
            debug!("Move: {} .. {}", number, black.notation);

            self.game.add_move(number, None, Some(black));
            if let Some(pair) = self.game.last_pair_mut() {
                if let Some(comment) = number_comment {
                    pair.set_comment(CommentPlace::MoveNumber, comment);
                }
                if let Some(comment) = placeholder_comment {
                    pair.set_comment(CommentPlace::Placeholder, comment);
                }
            }
        } else {
            let white = self.piece_move()?;
            let black = if self.scanner.peek(Token::PieceMove).is_some() {
                Some(self.piece_move()?)
            } else {
                None
            };
            debug!(
                "Move: {} {} {}",
                number,
                white.notation,
                black.as_ref().map_or("", |m| m.notation.as_str())
            );

            self.game.add_move(number, Some(white), black);
            if let (Some(pair), Some(comment)) = (self.game.last_pair_mut(), number_comment) {
                pair.set_comment(CommentPlace::MoveNumber, comment);
            }
        }
        Ok(true)
    }

    /// `PIECEMOVE comments`
    fn piece_move(&mut self) -> std::result::Result<ChessMove, SyntaxError> {
        let notation = self.scanner.scan(Token::PieceMove)?;
        let mut chess_move = ChessMove::new(notation);
        chess_move.comments.extend(self.comments()?);
        Ok(chess_move)
    }

    /// `comments := comment*`, concatenated
    fn comments(&mut self) -> std::result::Result<Option<String>, SyntaxError> {
        let mut text: Option<String> = None;
        while let Some(comment) = self.comment()? {
            match text.as_mut() {
                Some(existing) => {
                    existing.push(' ');
                    existing.push_str(&comment);
                }
                None => text = Some(comment),
            }
        }
        Ok(text)
    }

    /// One bracketed comment or variation, or a numeric glyph.
    ///
    /// Nested brackets are tracked on an explicit stack so adversarial input
    /// cannot grow the native call stack.
    fn comment(&mut self) -> std::result::Result<Option<String>, SyntaxError> {
        if self.scanner.peek(Token::Glyph).is_some() {
            return Ok(Some(self.scanner.scan(Token::Glyph)?.to_string()));
        }
        let Some(first) = self.open_bracket()? else {
            return Ok(None);
        };
        // The opening bracket has been consumed; its first byte is one behind.
        let start = self.scanner.position() - 1;
        let mut stack = vec![first];

        while let Some(&innermost) = stack.last() {
            if self.scanner.peek(Token::CommentText).is_some() {
                self.scanner.scan(Token::CommentText)?;
                continue;
            }
            let position = self.scanner.position();
            if let Some(bracket) = self.open_bracket()? {
                if stack.len() >= self.nesting_limit {
                    return Err(SyntaxError::NestingTooDeep {
                        position,
                        limit: self.nesting_limit,
                    });
                }
                stack.push(bracket);
                continue;
            }
            self.scanner.scan(innermost.closing())?;
            stack.pop();
        }

        Ok(Some(self.scanner.slice(start, self.scanner.position()).to_string()))
    }

    fn open_bracket(&mut self) -> std::result::Result<Option<Bracket>, SyntaxError> {
        if self.scanner.peek(Token::VariationStart).is_some() {
            self.scanner.scan(Token::VariationStart)?;
            Ok(Some(Bracket::Variation))
        } else if self.scanner.peek(Token::CommentStart).is_some() {
            self.scanner.scan(Token::CommentStart)?;
            Ok(Some(Bracket::Comment))
        } else {
            Ok(None)
        }
    }
}

fn parse_move_number(text: &str) -> Option<u32> {
    text.trim_end_matches('.')
        .parse::<u32>()
        .ok()
        .filter(|&number| number > 0)
}

/// Parses a single game from a PGN file
pub fn parse_pgn_file<P: AsRef<Path>>(path: P) -> Result<Game> {
    let contents = fs::read_to_string(path)?;
    Ok(parse_pgn_string(&contents)?)
}

/// Parses a single game from PGN text
pub fn parse_pgn_string(pgn: &str) -> std::result::Result<Game, SyntaxError> {
    PgnParser::new(pgn).game()
}
