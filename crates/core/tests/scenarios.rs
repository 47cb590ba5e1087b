//! End-to-end behaviour: parse a game, then replay it on a board.

use pgn_annotator_core::{
    parse_pgn_string, translate_game, Board, ChessMove, Color, Error, Game, NotationError,
    OrderingError, Piece, Position,
};
use pgn_annotator_core::board::Figure;

fn sq(name: &str) -> Position {
    Position::parse(name).unwrap()
}

#[test]
fn opening_translates_to_coordinates() {
    let game = parse_pgn_string("1. e4 e5 2. Nf3 Nc6 *").unwrap();
    assert_eq!(game.moves.len(), 2);
    assert_eq!(game.result.as_deref(), Some("*"));

    let mut board = Board::start_position();
    let mut color = Color::White;
    let mut coordinates = Vec::new();
    for notation in game.notations() {
        coordinates.push(board.translate_pgn_to_coordinates(notation, color).unwrap());
        color = color.opponent();
    }
    assert_eq!(coordinates, vec!["e2e4", "e7e5", "g1f3", "b8c6"]);
}

#[test]
fn nested_comment_keeps_single_pair() {
    let game = parse_pgn_string("1. e4 {outer (inner) still outer} e5").unwrap();
    assert_eq!(game.moves.len(), 1);
    let white = game.moves[0].white.as_ref().unwrap();
    assert_eq!(white.comments, vec!["{outer (inner) still outer}"]);
    assert_eq!(game.moves[0].black.as_ref().unwrap().notation, "e5");
}

#[test]
fn placeholder_then_backfill_merges() {
    let mut game = Game::new();
    game.add_move(5, None, Some(ChessMove::new("Nf6")));
    game.add_move(5, Some(ChessMove::new("d4")), None);
    assert_eq!(game.moves.len(), 1);
    assert!(game.moves[0].is_complete());
}

#[test]
fn en_passant_clears_passed_pawn() {
    let mut board = Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3").unwrap();
    assert_eq!(board.translate_coordinates_to_pgn("e5d6", Color::White).unwrap(), "exd6");
    assert_eq!(board.piece_at(sq("d5")), None);
    assert_eq!(
        board.piece_at(sq("d6")),
        Some(Piece::new(Color::White, Figure::Pawn))
    );
}

#[test]
fn castling_without_king_fails_cleanly() {
    let mut board = Board::from_fen("4k3/8/8/8/8/8/8/R6R").unwrap();
    let before = board.clone();
    let err = board.translate_coordinates_to_pgn("e1g1", Color::White).unwrap_err();
    assert!(matches!(err, NotationError::CastlingUnavailable { .. }));
    assert_eq!(board, before);
}

#[test]
fn round_trip_through_both_notations() {
    let game = parse_pgn_string(
        "1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 4. Ba4 Nf6 5. O-O Be7 6. Re1 b5 7. Bb3 d6 \
         8. c3 O-O 9. h3 Nb8 10. d4 Nbd7 *",
    )
    .unwrap();
    let coordinates = translate_game(&game).unwrap();

    let mut board = Board::start_position();
    let pgn = board.coordinates_line_to_pgn(&coordinates, Color::White).unwrap();
    assert_eq!(pgn, game.notations());
}

#[test]
fn incomplete_pair_stops_translation() {
    let game = parse_pgn_string("1. e4 2. d4 d5 *").unwrap();
    assert!(matches!(
        translate_game(&game),
        Err(Error::Ordering(OrderingError::MoveAfterIncompletePair { .. }))
    ));
}

#[test]
fn syntax_error_reports_location() {
    let text = "[Event \"x\"]\n\n1. e4 e5\n2. Zf3 *";
    let err = parse_pgn_string(text).unwrap_err();
    let scanner = pgn_annotator_core::parser::Scanner::new(text);
    assert_eq!(scanner.line_col(err.position()), (4, 4));
}

#[test]
fn annotated_game_renders_and_reparses() {
    let mut game = parse_pgn_string("[White \"A\"]\n\n1. f3 e5 2. g4 Qh4# 0-1").unwrap();
    let white = game.moves[1].white.as_mut().unwrap();
    white.score = Some(-10_000);
    white.variation = Some("2. d4".to_string());

    let text = game.to_string();
    assert_eq!(
        text,
        "[White \"A\"]\n\n1. f3 e5 2. g4 {-100.00} (2. d4) 2... Qh4# 0-1\n"
    );

    let reparsed = parse_pgn_string(&text).unwrap();
    assert_eq!(reparsed.notations(), game.notations());
    assert_eq!(reparsed.result.as_deref(), Some("0-1"));
}
