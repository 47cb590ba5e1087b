//! Engine-driven game annotation
//!
//! Replays a parsed game on a board, asks the engine about every position
//! and marks the plies that lose more than the configured threshold.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::board::{format_variation, Board, Color};
use crate::config::AnnotatorConfig;
use crate::engine::{AnalysisEngine, PositionAnalysis};
use crate::error::Result;
use crate::game::{ChessMovePair, Game};

/// The move pairs do not form a single playable sequence
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderingError {
    #[error("move {number} follows move {incomplete}, which has no black move")]
    MoveAfterIncompletePair { number: u32, incomplete: u32 },

    #[error("move {number} has no white move")]
    MissingWhiteMove { number: u32 },

    #[error("move {number} comes after move {previous}")]
    MoveNumberDecreased { number: u32, previous: u32 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationSummary {
    /// Plies replayed
    pub plies: usize,
    /// Plies that received a score and variation
    pub annotated: usize,
    /// Engine queries that produced no result in time
    pub unanswered: usize,
}

/// Checks that every pair except the first has a white move, that each pair
/// follows a complete one, and that move numbers never go down.
pub fn check_move_order(moves: &[ChessMovePair]) -> std::result::Result<(), OrderingError> {
    for (index, pair) in moves.iter().enumerate() {
        if index > 0 && pair.white.is_none() {
            return Err(OrderingError::MissingWhiteMove { number: pair.number });
        }
        let Some(previous) = index.checked_sub(1).map(|i| &moves[i]) else {
            continue;
        };
        if pair.number < previous.number {
            return Err(OrderingError::MoveNumberDecreased {
                number: pair.number,
                previous: previous.number,
            });
        }
        if previous.black.is_none() {
            return Err(OrderingError::MoveAfterIncompletePair {
                number: pair.number,
                incomplete: previous.number,
            });
        }
    }
    Ok(())
}

/// Board for the game's starting position, honouring a `FEN` tag
pub fn starting_board(game: &Game) -> Result<Board> {
    match game.tag("FEN") {
        Some(fen) => Ok(Board::from_fen(&fen)?),
        None => Ok(Board::start_position()),
    }
}

/// Coordinate moves for every ply of the game, in order
pub fn translate_game(game: &Game) -> Result<Vec<String>> {
    check_move_order(&game.moves)?;
    let mut board = starting_board(game)?;
    let mut coordinates = Vec::with_capacity(game.ply_count());
    for pair in &game.moves {
        debug!("move {}", pair.number);
        for (color, ply) in [(Color::White, &pair.white), (Color::Black, &pair.black)] {
            if let Some(ply) = ply {
                coordinates.push(board.translate_pgn_to_coordinates(&ply.notation, color)?);
            }
        }
    }
    Ok(coordinates)
}

pub struct Annotator<E> {
    engine: E,
    config: AnnotatorConfig,
}

impl<E: AnalysisEngine> Annotator<E> {
    pub fn new(engine: E, config: AnnotatorConfig) -> Self {
        Self { engine, config }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    /// Annotates `game` in place.
    ///
    /// The engine scores every position from the side to move. For each ply
    /// the expected value is the score before the move; the actual value is
    /// the negated score of the position after it. When the difference
    /// exceeds the threshold the ply gets the actual score and the line the
    /// engine preferred instead.
    pub fn annotate(&mut self, game: &mut Game) -> Result<AnnotationSummary> {
        check_move_order(&game.moves)?;

        let start_fen = game.tag("FEN");
        let mut board = starting_board(game)?;
        let mut played = Vec::with_capacity(game.ply_count());
        let mut summary = AnnotationSummary::default();

        let mut previous = self.query(start_fen.as_deref(), &played, &mut summary)?;

        for pair in game.moves.iter_mut() {
            let number = pair.number;
            debug!("move {}", number);

            for (color, slot) in [(Color::White, &mut pair.white), (Color::Black, &mut pair.black)] {
                let Some(ply) = slot.as_mut() else { continue };

                let before_move = board.clone();
                played.push(board.translate_pgn_to_coordinates(&ply.notation, color)?);
                summary.plies += 1;

                let current = self.query(start_fen.as_deref(), &played, &mut summary)?;

                if let (Some(expected), Some(actual)) = (&previous, &current) {
                    let before = expected.evaluation.to_centipawns();
                    let after = -actual.evaluation.to_centipawns();
                    let loss = before - after;

                    if loss > self.config.threshold_cp && self.config.sides.includes(color) {
                        debug!("{}. {} loses {} cp", number, ply.notation, loss);
                        ply.score = Some(after);
                        ply.variation = suggested_line(before_move, &expected.pv, number, color);
                        summary.annotated += 1;
                    }
                }

                previous = current;
            }
        }

        info!(
            "annotated {} of {} plies ({} unanswered queries)",
            summary.annotated, summary.plies, summary.unanswered
        );
        Ok(summary)
    }

    fn query(
        &mut self,
        start_fen: Option<&str>,
        moves: &[String],
        summary: &mut AnnotationSummary,
    ) -> Result<Option<PositionAnalysis>> {
        let analysis = self.engine.analyze(start_fen, moves)?;
        match &analysis {
            Some(analysis) => debug!("after {} plies: {}", moves.len(), analysis.summary()),
            None => {
                warn!("no engine answer after {} plies", moves.len());
                summary.unanswered += 1;
            }
        }
        Ok(analysis)
    }
}

/// Renders the engine's line in PGN on a throwaway board
fn suggested_line(mut board: Board, pv: &[String], number: u32, color: Color) -> Option<String> {
    if pv.is_empty() {
        return None;
    }
    match board.coordinates_line_to_pgn(pv, color) {
        Ok(moves) => Some(format_variation(number, color, &moves)),
        Err(e) => {
            warn!("cannot render engine line {:?}: {}", pv, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::board::NotationError;
    use crate::config::Sides;
    use crate::engine::{EngineError, Evaluation};
    use crate::error::Error;
    use crate::game::ChessMove;
    use crate::parser::parse_pgn_string;

    /// Replays canned answers and records what it was asked
    #[derive(Default)]
    struct ScriptedEngine {
        replies: VecDeque<Option<PositionAnalysis>>,
        queries: Vec<(Option<String>, Vec<String>)>,
    }

    impl ScriptedEngine {
        fn new(replies: Vec<Option<PositionAnalysis>>) -> Self {
            Self {
                replies: replies.into(),
                queries: Vec::new(),
            }
        }
    }

    impl AnalysisEngine for ScriptedEngine {
        fn analyze(
            &mut self,
            start_fen: Option<&str>,
            moves: &[String],
        ) -> std::result::Result<Option<PositionAnalysis>, EngineError> {
            self.queries
                .push((start_fen.map(str::to_string), moves.to_vec()));
            Ok(self.replies.pop_front().flatten())
        }
    }

    fn reply(evaluation: Evaluation, pv: &[&str]) -> Option<PositionAnalysis> {
        Some(PositionAnalysis {
            best_move: pv.first().map(|m| m.to_string()).unwrap_or_default(),
            evaluation,
            pv: pv.iter().map(|m| m.to_string()).collect(),
            ..PositionAnalysis::default()
        })
    }

    fn script() -> Vec<Option<PositionAnalysis>> {
        vec![
            reply(Evaluation::Centipawns(30), &["e2e4", "e7e5"]),
            reply(Evaluation::Centipawns(50), &["e7e5"]),
            reply(Evaluation::Centipawns(-40), &["b1c3", "g8f6"]),
            reply(Evaluation::Mate(1), &["d8h4"]),
        ]
    }

    fn config(sides: Sides) -> AnnotatorConfig {
        AnnotatorConfig {
            sides,
            ..AnnotatorConfig::default()
        }
    }

    #[test]
    fn test_losing_moves_are_annotated() {
        let mut game = parse_pgn_string("1. f3 e5 2. g4 *").unwrap();
        let mut annotator = Annotator::new(ScriptedEngine::new(script()), config(Sides::Both));
        let summary = annotator.annotate(&mut game).unwrap();

        assert_eq!(
            summary,
            AnnotationSummary {
                plies: 3,
                annotated: 2,
                unanswered: 0
            }
        );

        let f3 = game.moves[0].white.as_ref().unwrap();
        assert_eq!(f3.score, Some(-50));
        assert_eq!(f3.variation.as_deref(), Some("1. e4 e5"));

        let e5 = game.moves[0].black.as_ref().unwrap();
        assert!(!e5.is_annotated());

        let g4 = game.moves[1].white.as_ref().unwrap();
        assert_eq!(g4.score, Some(-10_000));
        assert_eq!(g4.variation.as_deref(), Some("2. Nc3 Nf6"));

        assert_eq!(
            game.to_string(),
            "1. f3 {-0.50} (1. e4 e5) 1... e5 2. g4 {-100.00} (2. Nc3 Nf6) *\n"
        );
    }

    #[test]
    fn test_engine_sees_growing_move_list() {
        let mut game = parse_pgn_string("1. f3 e5 2. g4 *").unwrap();
        let mut annotator = Annotator::new(ScriptedEngine::new(script()), config(Sides::Both));
        annotator.annotate(&mut game).unwrap();

        let moves: Vec<Vec<String>> = annotator
            .engine()
            .queries
            .iter()
            .map(|(_, moves)| moves.clone())
            .collect();
        assert_eq!(
            moves,
            vec![
                vec![],
                vec!["f2f3".to_string()],
                vec!["f2f3".to_string(), "e7e5".to_string()],
                vec!["f2f3".to_string(), "e7e5".to_string(), "g2g4".to_string()],
            ]
        );
        assert!(annotator.engine().queries.iter().all(|(fen, _)| fen.is_none()));
    }

    #[test]
    fn test_only_configured_side_is_annotated() {
        let mut game = parse_pgn_string("1. f3 e5 2. g4 *").unwrap();
        let mut annotator = Annotator::new(ScriptedEngine::new(script()), config(Sides::Black));
        let summary = annotator.annotate(&mut game).unwrap();

        assert_eq!(summary.annotated, 0);
        assert_eq!(game.annotated_count(), 0);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut game = parse_pgn_string("1. f3 *").unwrap();
        let replies = vec![
            reply(Evaluation::Centipawns(30), &["e2e4"]),
            reply(Evaluation::Centipawns(20), &["e7e5"]),
        ];
        let mut annotator = Annotator::new(ScriptedEngine::new(replies), config(Sides::Both));
        let summary = annotator.annotate(&mut game).unwrap();

        // 30 - (-20) = 50, not more than the default threshold
        assert_eq!(summary.annotated, 0);
    }

    #[test]
    fn test_timeout_breaks_comparison_chain() {
        let mut game = parse_pgn_string("1. f3 e5 2. g4 *").unwrap();
        let mut replies = script();
        replies[1] = None;
        let mut annotator = Annotator::new(ScriptedEngine::new(replies), config(Sides::Both));
        let summary = annotator.annotate(&mut game).unwrap();

        assert_eq!(summary.unanswered, 1);
        assert_eq!(summary.annotated, 1);
        assert!(!game.moves[0].white.as_ref().unwrap().is_annotated());
        assert!(game.moves[1].white.as_ref().unwrap().is_annotated());
    }

    #[test]
    fn test_fen_tag_sets_start_position() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
        let pgn = format!("[FEN \"{}\"]\n\n1... e5 2. Nf3 *", fen);
        let mut game = parse_pgn_string(&pgn).unwrap();
        let mut annotator = Annotator::new(ScriptedEngine::default(), config(Sides::Both));
        let summary = annotator.annotate(&mut game).unwrap();

        assert_eq!(summary.plies, 2);
        assert_eq!(summary.unanswered, 3);
        let queries = &annotator.engine().queries;
        assert_eq!(queries[2].0.as_deref(), Some(fen));
        assert_eq!(queries[2].1, vec!["e7e5", "g1f3"]);
    }

    #[test]
    fn test_move_after_incomplete_pair_is_fatal() {
        let mut game = parse_pgn_string("1. e4 2. d4 *").unwrap();
        let mut annotator = Annotator::new(ScriptedEngine::new(script()), config(Sides::Both));
        let err = annotator.annotate(&mut game).unwrap_err();

        assert!(matches!(
            err,
            Error::Ordering(OrderingError::MoveAfterIncompletePair {
                number: 2,
                incomplete: 1
            })
        ));
        assert!(annotator.engine().queries.is_empty());
    }

    #[test]
    fn test_move_order_checks() {
        let mut game = Game::new();
        game.add_move(3, Some(ChessMove::new("e4")), Some(ChessMove::new("e5")));
        game.add_move(2, Some(ChessMove::new("d4")), None);
        assert_eq!(
            check_move_order(&game.moves),
            Err(OrderingError::MoveNumberDecreased {
                number: 2,
                previous: 3
            })
        );

        let mut game = Game::new();
        game.add_move(1, Some(ChessMove::new("e4")), Some(ChessMove::new("e5")));
        game.moves
            .push(ChessMovePair::new(2, None, Some(ChessMove::new("Nc6"))));
        assert_eq!(
            check_move_order(&game.moves),
            Err(OrderingError::MissingWhiteMove { number: 2 })
        );

        let mut game = Game::new();
        game.add_move(7, None, Some(ChessMove::new("Nf6")));
        game.add_move(8, Some(ChessMove::new("d4")), None);
        assert_eq!(check_move_order(&game.moves), Ok(()));
    }

    #[test]
    fn test_unplayable_move_is_notation_error() {
        let mut game = parse_pgn_string("1. e4 e5 2. Ke3 *").unwrap();
        let mut annotator = Annotator::new(ScriptedEngine::new(script()), config(Sides::Both));
        let err = annotator.annotate(&mut game).unwrap_err();

        assert!(matches!(
            err,
            Error::Notation(NotationError::NoMover { .. })
        ));
    }

    #[test]
    fn test_translate_game() {
        let game = parse_pgn_string("1. e4 e5 2. Nf3 Nc6 *").unwrap();
        assert_eq!(
            translate_game(&game).unwrap(),
            vec!["e2e4", "e7e5", "g1f3", "b8c6"]
        );
    }

    #[test]
    fn test_unrenderable_line_is_dropped() {
        assert_eq!(
            suggested_line(Board::start_position(), &["e2e5".to_string()], 1, Color::White),
            None
        );
        assert_eq!(suggested_line(Board::start_position(), &[], 1, Color::White), None);
    }
}
