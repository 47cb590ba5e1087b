//! Types for representing engine analysis results

use std::fmt;

use serde::{Deserialize, Serialize};

/// Centipawn value standing in for a forced mate
pub const MATE_SCORE: i32 = 10_000;

/// A position evaluation, from the point of view of the side to move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Evaluation {
    /// Centipawn score (positive = side to move is better)
    Centipawns(i32),
    /// Forced mate in N moves (negative = side to move gets mated)
    Mate(i32),
}

impl Default for Evaluation {
    fn default() -> Self {
        Evaluation::Centipawns(0)
    }
}

impl Evaluation {
    /// Collapses the evaluation onto the centipawn scale
    pub fn to_centipawns(self) -> i32 {
        match self {
            Evaluation::Centipawns(cp) => cp,
            Evaluation::Mate(moves) if moves > 0 => MATE_SCORE,
            Evaluation::Mate(_) => -MATE_SCORE,
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Centipawns(cp) => f.write_str(&format_pawns(*cp)),
            Evaluation::Mate(moves) => write!(f, "M{}", moves),
        }
    }
}

/// Formats centipawns as a signed pawn value: `+0.35`, `-1.20`
pub fn format_pawns(cp: i32) -> String {
    let score = cp as f64 / 100.0;
    if cp >= 0 {
        format!("+{:.2}", score)
    } else {
        format!("{:.2}", score)
    }
}

/// Complete analysis of a position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionAnalysis {
    /// Best move found, in coordinate notation
    pub best_move: String,
    /// Evaluation of the position
    pub evaluation: Evaluation,
    /// Analysis depth reached
    pub depth: u32,
    /// Principal variation (best line of play)
    pub pv: Vec<String>,
    /// Time spent analyzing (milliseconds)
    pub time_ms: u64,
    /// Nodes searched
    pub nodes: u64,
}

impl PositionAnalysis {
    /// Returns a brief summary of the analysis
    pub fn summary(&self) -> String {
        format!(
            "Eval: {} | Best: {} | Depth: {} | PV: {}",
            self.evaluation,
            self.best_move,
            self.depth,
            self.pv.iter().take(5).cloned().collect::<Vec<_>>().join(" ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mate_maps_to_bound() {
        assert_eq!(Evaluation::Mate(3).to_centipawns(), MATE_SCORE);
        assert_eq!(Evaluation::Mate(-2).to_centipawns(), -MATE_SCORE);
        assert_eq!(Evaluation::Mate(0).to_centipawns(), -MATE_SCORE);
        assert_eq!(Evaluation::Centipawns(-37).to_centipawns(), -37);
    }

    #[test]
    fn test_format_pawns() {
        assert_eq!(format_pawns(35), "+0.35");
        assert_eq!(format_pawns(0), "+0.00");
        assert_eq!(format_pawns(-120), "-1.20");
        assert_eq!(Evaluation::Mate(-4).to_string(), "M-4");
    }

    #[test]
    fn test_summary() {
        let analysis = PositionAnalysis {
            best_move: "e2e4".to_string(),
            evaluation: Evaluation::Centipawns(25),
            depth: 12,
            pv: vec!["e2e4".to_string(), "e7e5".to_string()],
            ..PositionAnalysis::default()
        };
        assert_eq!(analysis.summary(), "Eval: +0.25 | Best: e2e4 | Depth: 12 | PV: e2e4 e7e5");
    }
}
