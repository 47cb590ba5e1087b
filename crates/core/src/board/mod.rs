//! Board state and move notation translation
//!
//! The board answers one question per move: which piece of the given type
//! and color can reach the destination square? Only movement geometry is
//! modelled. Checks, pins and other legality rules are not.

mod square;

pub use square::{Color, Figure, Movement, Piece, Position, SquareHint};

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, trace};

pub const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

const BACK_RANK: [Figure; 8] = [
    Figure::Rook,
    Figure::Knight,
    Figure::Bishop,
    Figure::Queen,
    Figure::King,
    Figure::Bishop,
    Figure::Knight,
    Figure::Rook,
];

static PGN_MOVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([KQBNR]?)([a-h]?[1-8]?)(x?)([a-h][1-8])(?:=?([QRBN]))?[+#]?[!?]{0,2}$")
        .expect("move pattern is a valid regular expression")
});
static PGN_CASTLING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(O-O-O|O-O)[+#]?[!?]{0,2}$").expect("castling pattern is a valid regular expression")
});
static COORDINATE_MOVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-h][1-8])([a-h][1-8])([qrbnQRBN])?$")
        .expect("coordinate pattern is a valid regular expression")
});

/// Why a move could not be translated
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotationError {
    #[error("unknown figure '{0}'")]
    UnknownFigure(char),

    #[error("no {color} {figure:?} can reach {destination}")]
    NoMover {
        figure: Figure,
        color: Color,
        destination: Position,
    },

    #[error("no {color} piece stands on {square}")]
    NoPieceAt { square: Position, color: Color },

    #[error("unrecognized move '{0}'")]
    UnrecognizedMove(String),

    #[error("{color} cannot castle with '{notation}' in this position")]
    CastlingUnavailable { notation: String, color: Color },

    #[error("invalid FEN: {0}")]
    InvalidFen(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CastlingSide {
    King,
    Queen,
}

#[derive(Debug, Clone, Copy)]
struct Castling {
    color: Color,
    side: CastlingSide,
    king_from: Position,
    king_to: Position,
    rook_from: Position,
    rook_to: Position,
}

impl Castling {
    fn new(color: Color, side: CastlingSide) -> Self {
        let rank = color.home_rank();
        let (king_to, rook_from, rook_to) = match side {
            CastlingSide::King => (7, 8, 6),
            CastlingSide::Queen => (3, 1, 4),
        };
        Self {
            color,
            side,
            king_from: Position { file: 5, rank },
            king_to: Position { file: king_to, rank },
            rook_from: Position { file: rook_from, rank },
            rook_to: Position { file: rook_to, rank },
        }
    }

    /// Castling written as the king's coordinate move (`e1g1`, `e8c8`, ...)
    fn from_coordinates(origin: Position, destination: Position) -> Option<Self> {
        let color = match origin.rank {
            1 => Color::White,
            8 => Color::Black,
            _ => return None,
        };
        [CastlingSide::King, CastlingSide::Queen]
            .into_iter()
            .map(|side| Castling::new(color, side))
            .find(|castling| castling.king_from == origin && castling.king_to == destination)
    }

    fn notation(self) -> &'static str {
        match self.side {
            CastlingSide::King => "O-O",
            CastlingSide::Queen => "O-O-O",
        }
    }

    fn coordinates(self) -> String {
        format!("{}{}", self.king_from, self.king_to)
    }
}

/// 8x8 grid of pieces, indexed `(rank - 1) * 8 + (file - 1)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    squares: [Option<Piece>; 64],
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    pub fn empty() -> Self {
        Self { squares: [None; 64] }
    }

    pub fn start_position() -> Self {
        let mut board = Self::empty();
        for (file, figure) in (1..=8).zip(BACK_RANK) {
            board.set(Position { file, rank: 1 }, Some(Piece::new(Color::White, figure)));
            board.set(Position { file, rank: 2 }, Some(Piece::new(Color::White, Figure::Pawn)));
            board.set(Position { file, rank: 7 }, Some(Piece::new(Color::Black, Figure::Pawn)));
            board.set(Position { file, rank: 8 }, Some(Piece::new(Color::Black, figure)));
        }
        board
    }

    pub fn from_fen(fen: &str) -> Result<Self, NotationError> {
        let mut board = Self::empty();
        board.read_fen(fen)?;
        Ok(board)
    }

    /// Replaces the position with the piece-placement field of `fen`.
    ///
    /// The remaining FEN fields are ignored. On error the board is left untouched.
    pub fn read_fen(&mut self, fen: &str) -> Result<(), NotationError> {
        let placement = fen
            .split_whitespace()
            .next()
            .ok_or_else(|| NotationError::InvalidFen(fen.to_string()))?;
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(NotationError::InvalidFen(format!(
                "expected 8 ranks, found {} in '{}'",
                ranks.len(),
                placement
            )));
        }

        let mut squares = [None; 64];
        for (row, text) in ranks.iter().enumerate() {
            let rank = 8 - row as u8;
            let mut file = 1u8;
            for c in text.chars() {
                match c {
                    '1'..='8' => file += c as u8 - b'0',
                    _ => {
                        let piece = Piece::from_letter(c)?;
                        let position = Position::new(file, rank).ok_or_else(|| {
                            NotationError::InvalidFen(format!("rank {} overflows in '{}'", rank, placement))
                        })?;
                        squares[position.index()] = Some(piece);
                        file += 1;
                    }
                }
                if file > 9 {
                    break;
                }
            }
            if file != 9 {
                return Err(NotationError::InvalidFen(format!(
                    "rank {} does not cover 8 files in '{}'",
                    rank, placement
                )));
            }
        }

        self.squares = squares;
        Ok(())
    }

    /// Piece-placement field of the current position
    pub fn to_fen(&self) -> String {
        let mut fen = String::new();
        for rank in (1..=8).rev() {
            let mut empty = 0;
            for file in 1..=8 {
                match self.piece_at(Position { file, rank }) {
                    Some(piece) => {
                        if empty > 0 {
                            fen.push_str(&empty.to_string());
                            empty = 0;
                        }
                        fen.push(piece.letter());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if rank > 1 {
                fen.push('/');
            }
        }
        fen
    }

    pub fn piece_at(&self, position: Position) -> Option<Piece> {
        self.squares[position.index()]
    }

    pub fn set(&mut self, position: Position, piece: Option<Piece>) {
        self.squares[position.index()] = piece;
    }

    pub fn piece_count(&self) -> usize {
        self.squares.iter().flatten().count()
    }

    /// Squares holding a `color` `figure` that could move to `destination`.
    ///
    /// Walks every step vector outward from the destination; the first
    /// occupied square on each line is a candidate if it holds the piece.
    /// Candidates come back in step-table order.
    pub fn reachability(
        &self,
        figure: Figure,
        destination: Position,
        color: Color,
        captures: bool,
    ) -> Vec<Position> {
        let target = Piece::new(color, figure);
        let movement = figure.movement(color, captures);
        let mut candidates = Vec::new();

        for &(df, dr) in movement.steps {
            let mut current = destination;
            while let Some(next) = current.offset(df, dr) {
                match self.piece_at(next) {
                    Some(piece) => {
                        if piece == target {
                            candidates.push(next);
                        }
                        break;
                    }
                    None if movement.slides => current = next,
                    None => break,
                }
            }
        }

        if figure == Figure::Pawn && !captures && destination.rank == color.double_push_rank() {
            let back = -color.forward();
            let between = destination.offset(0, back);
            let origin = destination.offset(0, 2 * back);
            if let (Some(between), Some(origin)) = (between, origin) {
                if self.piece_at(between).is_none() && self.piece_at(origin) == Some(target) {
                    candidates.push(origin);
                }
            }
        }

        trace!(
            "{} {:?} reaching {}: {:?}",
            color,
            figure,
            destination,
            candidates
        );
        candidates
    }

    /// Translates a PGN move (`Nbd7`, `exd6`, `O-O`) into coordinates (`b8d7`)
    /// and plays it on the board.
    pub fn translate_pgn_to_coordinates(
        &mut self,
        notation: &str,
        color: Color,
    ) -> Result<String, NotationError> {
        if let Some(caps) = PGN_CASTLING.captures(notation) {
            let side = if &caps[1] == "O-O-O" {
                CastlingSide::Queen
            } else {
                CastlingSide::King
            };
            let castling = self.castle(Castling::new(color, side), notation)?;
            return Ok(castling.coordinates());
        }

        let unrecognized = || NotationError::UnrecognizedMove(notation.to_string());
        let caps = PGN_MOVE.captures(notation).ok_or_else(unrecognized)?;
        let figure = match caps[1].chars().next() {
            Some(letter) => Figure::from_letter(letter)?,
            None => Figure::Pawn,
        };
        let hint = SquareHint::parse(&caps[2]);
        let captures = &caps[3] == "x";
        let destination = Position::parse(&caps[4]).ok_or_else(unrecognized)?;
        let promotion = match caps.get(5).and_then(|m| m.as_str().chars().next()) {
            Some(letter) => Some(Figure::from_letter(letter)?),
            None => None,
        };
        let promotion = promotion_for(figure, destination, color, promotion).ok_or_else(unrecognized)?;

        let candidates = self.reachability(figure, destination, color, captures);
        let origin = select_origin(&candidates, hint)
            .filter(|&origin| !self.captures_nothing(figure, origin, destination, color))
            .ok_or(NotationError::NoMover {
                figure,
                color,
                destination,
            })?;

        self.apply(origin, destination, promotion);
        let coordinates = coordinate_string(origin, destination, promotion);
        debug!("{} {} -> {}", color, notation, coordinates);
        Ok(coordinates)
    }

    /// Translates a coordinate move (`e5d6`, `e1g1`, `e7e8q`) into PGN and
    /// plays it on the board.
    pub fn translate_coordinates_to_pgn(
        &mut self,
        coordinates: &str,
        color: Color,
    ) -> Result<String, NotationError> {
        let unrecognized = || NotationError::UnrecognizedMove(coordinates.to_string());
        let caps = COORDINATE_MOVE.captures(coordinates).ok_or_else(unrecognized)?;
        let origin = Position::parse(&caps[1]).ok_or_else(unrecognized)?;
        let destination = Position::parse(&caps[2]).ok_or_else(unrecognized)?;
        let promotion = match caps.get(3).and_then(|m| m.as_str().chars().next()) {
            Some(letter) => Some(Figure::from_letter(letter)?),
            None => None,
        };

        if let Some(castling) = Castling::from_coordinates(origin, destination) {
            let moving = self.piece_at(origin);
            if moving.is_none() || moving.map(|piece| piece.figure) == Some(Figure::King) {
                if castling.color != color {
                    return Err(NotationError::CastlingUnavailable {
                        notation: coordinates.to_string(),
                        color,
                    });
                }
                let castling = self.castle(castling, coordinates)?;
                debug!("{} {} -> {}", color, coordinates, castling.notation());
                return Ok(castling.notation().to_string());
            }
        }

        let piece = self
            .piece_at(origin)
            .filter(|piece| piece.color == color)
            .ok_or(NotationError::NoPieceAt {
                square: origin,
                color,
            })?;
        let figure = piece.figure;
        let captures = self.piece_at(destination).is_some()
            || (figure == Figure::Pawn && origin.file != destination.file);

        let candidates = self.reachability(figure, destination, color, captures);
        if !candidates.contains(&origin)
            || self.captures_nothing(figure, origin, destination, color)
        {
            return Err(NotationError::NoMover {
                figure,
                color,
                destination,
            });
        }
        let promotion = promotion_for(figure, destination, color, promotion).ok_or_else(unrecognized)?;

        let mut pgn = String::new();
        if figure == Figure::Pawn {
            if captures {
                pgn.push(origin.file_char());
            }
        } else {
            pgn.push(figure.letter());
            pgn.push_str(&disambiguation(origin, &candidates));
        }
        if captures {
            pgn.push('x');
        }
        pgn.push_str(&destination.to_string());
        if let Some(promoted) = promotion {
            pgn.push('=');
            pgn.push(promoted.letter());
        }

        self.apply(origin, destination, promotion);
        debug!("{} {} -> {}", color, coordinates, pgn);
        Ok(pgn)
    }

    /// Translates a line of coordinate moves, alternating colors from `color`.
    pub fn coordinates_line_to_pgn<S: AsRef<str>>(
        &mut self,
        moves: &[S],
        color: Color,
    ) -> Result<Vec<String>, NotationError> {
        let mut mover = color;
        moves
            .iter()
            .map(|m| {
                let pgn = self.translate_coordinates_to_pgn(m.as_ref(), mover)?;
                mover = mover.opponent();
                Ok(pgn)
            })
            .collect()
    }

    /// Moves king and rook after checking both stand on their home squares.
    fn castle(&mut self, castling: Castling, notation: &str) -> Result<Castling, NotationError> {
        let king = Piece::new(castling.color, Figure::King);
        let rook = Piece::new(castling.color, Figure::Rook);
        if self.piece_at(castling.king_from) != Some(king)
            || self.piece_at(castling.rook_from) != Some(rook)
        {
            return Err(NotationError::CastlingUnavailable {
                notation: notation.to_string(),
                color: castling.color,
            });
        }
        self.set(castling.king_from, None);
        self.set(castling.rook_from, None);
        self.set(castling.king_to, Some(king));
        self.set(castling.rook_to, Some(rook));
        Ok(castling)
    }

    /// Square of the enemy pawn a `color` pawn takes en passant by moving
    /// diagonally from `origin` onto the empty `destination`
    fn en_passant_victim(
        &self,
        origin: Position,
        destination: Position,
        color: Color,
    ) -> Option<Position> {
        if origin.file == destination.file || self.piece_at(destination).is_some() {
            return None;
        }
        let passed = Position::new(destination.file, origin.rank)?;
        let victim = Piece::new(color.opponent(), Figure::Pawn);
        (self.piece_at(passed) == Some(victim)).then_some(passed)
    }

    /// A pawn capture onto an empty square is only playable en passant.
    fn captures_nothing(
        &self,
        figure: Figure,
        origin: Position,
        destination: Position,
        color: Color,
    ) -> bool {
        figure == Figure::Pawn
            && origin.file != destination.file
            && self.piece_at(destination).is_none()
            && self.en_passant_victim(origin, destination, color).is_none()
    }

    /// Moves the piece on `origin`, removing a pawn taken en passant.
    fn apply(&mut self, origin: Position, destination: Position, promotion: Option<Figure>) {
        let Some(piece) = self.piece_at(origin) else {
            return;
        };
        if piece.figure == Figure::Pawn {
            if let Some(passed) = self.en_passant_victim(origin, destination, piece.color) {
                self.set(passed, None);
            }
        }
        self.set(origin, None);
        let figure = promotion.unwrap_or(piece.figure);
        self.set(destination, Some(Piece::new(piece.color, figure)));
    }
}

/// Picks the first candidate that agrees with every component of the hint.
///
/// A hint that excludes all candidates yields `None`. When several remain the
/// first one wins without looking at pins, so it can pick a piece that could
/// not legally move.
pub fn select_origin(candidates: &[Position], hint: SquareHint) -> Option<Position> {
    candidates.iter().copied().find(|&c| hint.admits(c))
}

/// Minimal origin qualifier for a non-pawn move
fn disambiguation(origin: Position, candidates: &[Position]) -> String {
    let others: Vec<&Position> = candidates.iter().filter(|&&c| c != origin).collect();
    if others.is_empty() {
        String::new()
    } else if others.iter().all(|c| c.file != origin.file) {
        origin.file_char().to_string()
    } else if others.iter().all(|c| c.rank != origin.rank) {
        origin.rank_char().to_string()
    } else {
        origin.to_string()
    }
}

/// Promotion piece for the move, or `None` (outer) if the request is invalid.
///
/// Pawns reaching the last rank default to a queen.
fn promotion_for(
    figure: Figure,
    destination: Position,
    color: Color,
    requested: Option<Figure>,
) -> Option<Option<Figure>> {
    let promotes = figure == Figure::Pawn && destination.rank == color.promotion_rank();
    match (promotes, requested) {
        (true, None) => Some(Some(Figure::Queen)),
        (true, Some(Figure::King | Figure::Pawn)) => None,
        (true, Some(promoted)) => Some(Some(promoted)),
        (false, None) => Some(None),
        (false, Some(_)) => None,
    }
}

fn coordinate_string(origin: Position, destination: Position, promotion: Option<Figure>) -> String {
    let mut text = format!("{}{}", origin, destination);
    if let Some(promoted) = promotion {
        text.push(promoted.letter().to_ascii_lowercase());
    }
    text
}

/// Numbers a PGN line starting at move `number` with `color` to move:
/// `12. Nf3 Nc6 13. d4` or `12... Nc6 13. d4`.
pub fn format_variation<S: AsRef<str>>(number: u32, color: Color, moves: &[S]) -> String {
    let mut text = String::new();
    let mut number = number;
    let mut mover = color;
    for (i, pgn) in moves.iter().enumerate() {
        if i > 0 {
            text.push(' ');
        }
        match mover {
            Color::White => text.push_str(&format!("{}. ", number)),
            Color::Black if i == 0 => text.push_str(&format!("{}... ", number)),
            Color::Black => {}
        }
        text.push_str(pgn.as_ref());
        if mover == Color::Black {
            number += 1;
        }
        mover = mover.opponent();
    }
    text
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const RULE: &str = "  +---+---+---+---+---+---+---+---+";
        writeln!(f, "{}", RULE)?;
        for rank in (1..=8).rev() {
            write!(f, "{} ", rank)?;
            for file in 1..=8 {
                let letter = self
                    .piece_at(Position { file, rank })
                    .map_or(' ', Piece::letter);
                write!(f, "| {} ", letter)?;
            }
            writeln!(f, "|")?;
            writeln!(f, "{}", RULE)?;
        }
        writeln!(f, "    a   b   c   d   e   f   g   h")
    }
}
