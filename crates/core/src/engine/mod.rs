//! Chess engine integration
//!
//! The annotator only needs one thing from an engine: an analysis of the
//! position reached after a sequence of coordinate moves.

pub mod analysis;
pub mod uci;

pub use analysis::{format_pawns, Evaluation, PositionAnalysis, MATE_SCORE};
pub use uci::{parse_info_line, EngineError, UciEngine};

/// Something that can evaluate positions
pub trait AnalysisEngine {
    /// Analyzes the position after `moves`, played from `start_fen` (or the
    /// standard start). `Ok(None)` means the engine gave no answer in time.
    fn analyze(
        &mut self,
        start_fen: Option<&str>,
        moves: &[String],
    ) -> Result<Option<PositionAnalysis>, EngineError>;
}
