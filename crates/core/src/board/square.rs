//! Colors, figures, pieces and board coordinates

use std::fmt;

use serde::{Deserialize, Serialize};

use super::NotationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Rank delta of a pawn push
    pub fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    pub fn home_rank(self) -> u8 {
        match self {
            Color::White => 1,
            Color::Black => 8,
        }
    }

    /// Rank a pawn lands on after its two-square advance
    pub fn double_push_rank(self) -> u8 {
        match self {
            Color::White => 4,
            Color::Black => 5,
        }
    }

    pub fn promotion_rank(self) -> u8 {
        self.opponent().home_rank()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => f.write_str("white"),
            Color::Black => f.write_str("black"),
        }
    }
}

const ORTHOGONAL: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAGONAL: [(i8, i8); 4] = [(1, 1), (-1, 1), (1, -1), (-1, -1)];
const ROYAL: [(i8, i8); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (-1, 1),
    (1, -1),
    (-1, -1),
];
const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (-1, 2),
    (1, -2),
    (-1, -2),
];
const WHITE_PAWN_CAPTURES: [(i8, i8); 2] = [(1, -1), (-1, -1)];
const WHITE_PAWN_PUSH: [(i8, i8); 1] = [(0, -1)];
const BLACK_PAWN_CAPTURES: [(i8, i8); 2] = [(1, 1), (-1, 1)];
const BLACK_PAWN_PUSH: [(i8, i8); 1] = [(0, 1)];

/// How a figure travels, seen backwards from its destination square
#[derive(Debug, Clone, Copy)]
pub struct Movement {
    pub steps: &'static [(i8, i8)],
    /// Whether a step repeats until something blocks it
    pub slides: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Figure {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl Figure {
    /// Parses an uppercase or lowercase figure letter
    pub fn from_letter(letter: char) -> Result<Self, NotationError> {
        match letter.to_ascii_uppercase() {
            'K' => Ok(Figure::King),
            'Q' => Ok(Figure::Queen),
            'R' => Ok(Figure::Rook),
            'B' => Ok(Figure::Bishop),
            'N' => Ok(Figure::Knight),
            'P' => Ok(Figure::Pawn),
            _ => Err(NotationError::UnknownFigure(letter)),
        }
    }

    /// Uppercase figure letter
    pub fn letter(self) -> char {
        match self {
            Figure::King => 'K',
            Figure::Queen => 'Q',
            Figure::Rook => 'R',
            Figure::Bishop => 'B',
            Figure::Knight => 'N',
            Figure::Pawn => 'P',
        }
    }

    /// Step vectors leading from a destination back to possible origins.
    ///
    /// Pawns differ by color and by whether they capture; the two-square
    /// advance is not listed here.
    pub fn movement(self, color: Color, captures: bool) -> Movement {
        let (steps, slides): (&'static [(i8, i8)], bool) = match self {
            Figure::King => (&ROYAL, false),
            Figure::Queen => (&ROYAL, true),
            Figure::Rook => (&ORTHOGONAL, true),
            Figure::Bishop => (&DIAGONAL, true),
            Figure::Knight => (&KNIGHT_JUMPS, false),
            Figure::Pawn => match (color, captures) {
                (Color::White, true) => (&WHITE_PAWN_CAPTURES, false),
                (Color::White, false) => (&WHITE_PAWN_PUSH, false),
                (Color::Black, true) => (&BLACK_PAWN_CAPTURES, false),
                (Color::Black, false) => (&BLACK_PAWN_PUSH, false),
            },
        };
        Movement { steps, slides }
    }
}

impl fmt::Display for Figure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
    pub figure: Figure,
}

impl Piece {
    pub fn new(color: Color, figure: Figure) -> Self {
        Self { color, figure }
    }

    /// FEN letter: uppercase for white, lowercase for black
    pub fn from_letter(letter: char) -> Result<Self, NotationError> {
        let figure = Figure::from_letter(letter)?;
        let color = if letter.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Ok(Self { color, figure })
    }

    pub fn letter(self) -> char {
        match self.color {
            Color::White => self.figure.letter(),
            Color::Black => self.figure.letter().to_ascii_lowercase(),
        }
    }
}

/// A square on the board; file 1 = a, rank 1 = white's back rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub file: u8,
    pub rank: u8,
}

impl Position {
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        ((1..=8).contains(&file) && (1..=8).contains(&rank)).then_some(Self { file, rank })
    }

    /// Parses a square name such as `e4`
    pub fn parse(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        let file = file_from_char(chars.next()?)?;
        let rank = rank_from_char(chars.next()?)?;
        if chars.next().is_some() {
            return None;
        }
        Some(Self { file, rank })
    }

    /// Index into the 64-square array
    pub fn index(self) -> usize {
        (self.rank as usize - 1) * 8 + (self.file as usize - 1)
    }

    /// The square `(df, dr)` away, if it is on the board
    pub fn offset(self, df: i8, dr: i8) -> Option<Self> {
        let file = self.file as i8 + df;
        let rank = self.rank as i8 + dr;
        if (1..=8).contains(&file) && (1..=8).contains(&rank) {
            Some(Self {
                file: file as u8,
                rank: rank as u8,
            })
        } else {
            None
        }
    }

    pub fn file_char(self) -> char {
        (b'a' + self.file - 1) as char
    }

    pub fn rank_char(self) -> char {
        (b'0' + self.rank) as char
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

fn file_from_char(c: char) -> Option<u8> {
    ('a'..='h').contains(&c).then(|| c as u8 - b'a' + 1)
}

fn rank_from_char(c: char) -> Option<u8> {
    ('1'..='8').contains(&c).then(|| c as u8 - b'0')
}

/// Partial origin square written in PGN to tell movers apart: `b`, `1`, `b1` or nothing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SquareHint {
    pub file: Option<u8>,
    pub rank: Option<u8>,
}

impl SquareHint {
    pub fn parse(text: &str) -> Self {
        let mut hint = Self::default();
        for c in text.chars() {
            if let Some(file) = file_from_char(c) {
                hint.file = Some(file);
            } else if let Some(rank) = rank_from_char(c) {
                hint.rank = Some(rank);
            }
        }
        hint
    }

    pub fn is_empty(self) -> bool {
        self.file.is_none() && self.rank.is_none()
    }

    /// True when every component the hint gives agrees with `position`
    pub fn admits(self, position: Position) -> bool {
        self.file.map_or(true, |file| file == position.file)
            && self.rank.map_or(true, |rank| rank == position.rank)
    }
}
