//! UCI chess engine interface
//!
//! Spawns the engine as a subprocess and talks UCI over its stdin/stdout.
//! A reader thread forwards every output line over a channel so that the
//! caller can wait with a deadline instead of blocking on the pipe.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, trace, warn};

use super::analysis::{Evaluation, PositionAnalysis};
use super::AnalysisEngine;

/// Error type for engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// Failed to start the engine process
    #[error("failed to start engine: {0}")]
    Spawn(String),

    /// Failed to communicate with the engine
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Engine returned an unexpected response or went away
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Engine did not answer a handshake in time
    #[error("engine did not answer '{0}' in time")]
    Timeout(String),
}

/// A running UCI engine process
pub struct UciEngine {
    process: Child,
    stdin: ChildStdin,
    lines: Receiver<String>,
    move_time: Duration,
    grace: Duration,
}

impl UciEngine {
    /// Starts the engine at `path` and completes the UCI handshake.
    ///
    /// `move_time` is passed to `go movetime`; `grace` is the extra time the
    /// engine gets to answer before a query is given up on.
    pub fn new(path: &str, move_time: Duration, grace: Duration) -> Result<Self, EngineError> {
        let mut process = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| EngineError::Spawn(format!("{}: {}", path, e)))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| EngineError::Spawn("failed to open stdin".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| EngineError::Spawn("failed to open stdout".into()))?;

        let (tx, lines) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        let mut engine = UciEngine {
            process,
            stdin,
            lines,
            move_time,
            grace,
        };
        engine.init_uci()?;
        debug!("engine {} ready", path);

        Ok(engine)
    }

    fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        trace!(">> {}", cmd);
        writeln!(self.stdin, "{}", cmd)?;
        self.stdin.flush()?;
        Ok(())
    }

    /// Next output line, or `None` once `deadline` has passed
    fn next_line(&mut self, deadline: Instant) -> Result<Option<String>, EngineError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match self.lines.recv_timeout(remaining) {
            Ok(line) => {
                trace!("<< {}", line);
                Ok(Some(line))
            }
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                Err(EngineError::Protocol("engine closed its output".into()))
            }
        }
    }

    /// Reads lines until one starts with `expected`
    fn read_until(&mut self, expected: &str) -> Result<(), EngineError> {
        let deadline = Instant::now() + self.grace;
        loop {
            match self.next_line(deadline)? {
                Some(line) if line.starts_with(expected) => return Ok(()),
                Some(_) => {}
                None => return Err(EngineError::Timeout(expected.to_string())),
            }
        }
    }

    fn init_uci(&mut self) -> Result<(), EngineError> {
        self.send("uci")?;
        self.read_until("uciok")?;

        self.send("isready")?;
        self.read_until("readyok")?;
        Ok(())
    }

    /// Throws away output left over from an abandoned search
    fn drain(&mut self) {
        while let Ok(line) = self.lines.try_recv() {
            trace!("<< {} (stale)", line);
        }
    }

    /// Sets the position to analyze
    ///
    /// # Arguments
    /// * `fen` - FEN string, or None for the starting position
    /// * `moves` - Coordinate moves to play from that position
    pub fn set_position(&mut self, fen: Option<&str>, moves: &[String]) -> Result<(), EngineError> {
        let mut cmd = match fen {
            Some(f) => format!("position fen {}", f),
            None => "position startpos".to_string(),
        };
        if !moves.is_empty() {
            cmd.push_str(" moves ");
            cmd.push_str(&moves.join(" "));
        }
        self.send(&cmd)
    }

    /// Searches the current position for the configured move time.
    ///
    /// Returns `Ok(None)` if no `bestmove` arrives before the deadline, even
    /// after asking the engine to stop.
    pub fn go(&mut self) -> Result<Option<PositionAnalysis>, EngineError> {
        self.drain();
        self.send(&format!("go movetime {}", self.move_time.as_millis()))?;

        let mut analysis = PositionAnalysis::default();
        let deadline = Instant::now() + self.move_time + self.grace;
        if self.collect(&mut analysis, deadline)? {
            return Ok(Some(analysis));
        }

        warn!("engine missed its deadline, sending stop");
        self.send("stop")?;
        let deadline = Instant::now() + self.grace;
        if self.collect(&mut analysis, deadline)? {
            return Ok(Some(analysis));
        }
        Ok(None)
    }

    /// Folds `info` lines into `analysis` until `bestmove`; false on deadline
    fn collect(&mut self, analysis: &mut PositionAnalysis, deadline: Instant) -> Result<bool, EngineError> {
        while let Some(line) = self.next_line(deadline)? {
            if line.starts_with("bestmove") {
                // Parse: "bestmove e2e4 ponder e7e5"
                if let Some(best) = line.split_whitespace().nth(1) {
                    analysis.best_move = best.to_string();
                }
                return Ok(true);
            } else if line.starts_with("info") {
                parse_info_line(&line, analysis);
            }
        }
        Ok(false)
    }

    /// Quit the engine cleanly
    pub fn quit(&mut self) -> Result<(), EngineError> {
        self.send("quit")?;
        // Give it a moment to exit
        thread::sleep(Duration::from_millis(100));
        let _ = self.process.kill();
        let _ = self.process.wait();
        Ok(())
    }
}

impl AnalysisEngine for UciEngine {
    fn analyze(
        &mut self,
        start_fen: Option<&str>,
        moves: &[String],
    ) -> Result<Option<PositionAnalysis>, EngineError> {
        self.set_position(start_fen, moves)?;
        self.go()
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        let _ = self.quit();
    }
}

/// Parses an `info` line, updating only the fields it carries
pub fn parse_info_line(line: &str, analysis: &mut PositionAnalysis) {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let mut i = 0;

    while i < parts.len() {
        match parts[i] {
            "depth" => {
                if let Some(depth) = parts.get(i + 1).and_then(|s| s.parse().ok()) {
                    analysis.depth = depth;
                }
                i += 2;
            }
            "score" => {
                let value = parts.get(i + 2).and_then(|s| s.parse::<i32>().ok());
                match (parts.get(i + 1).copied(), value) {
                    (Some("cp"), Some(cp)) => analysis.evaluation = Evaluation::Centipawns(cp),
                    (Some("mate"), Some(moves)) => analysis.evaluation = Evaluation::Mate(moves),
                    _ => {}
                }
                i += 3;
            }
            "time" => {
                if let Some(time) = parts.get(i + 1).and_then(|s| s.parse().ok()) {
                    analysis.time_ms = time;
                }
                i += 2;
            }
            "nodes" => {
                if let Some(nodes) = parts.get(i + 1).and_then(|s| s.parse().ok()) {
                    analysis.nodes = nodes;
                }
                i += 2;
            }
            "pv" => {
                // Everything after "pv" is the principal variation
                analysis.pv = parts[i + 1..].iter().map(|s| s.to_string()).collect();
                break;
            }
            "string" => break,
            _ => i += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_info_line() {
        let mut analysis = PositionAnalysis::default();
        parse_info_line(
            "info depth 18 seldepth 24 multipv 1 score cp -34 nodes 912345 nps 1200000 time 760 pv e7e5 g1f3 b8c6",
            &mut analysis,
        );

        assert_eq!(analysis.depth, 18);
        assert_eq!(analysis.evaluation, Evaluation::Centipawns(-34));
        assert_eq!(analysis.nodes, 912345);
        assert_eq!(analysis.time_ms, 760);
        assert_eq!(analysis.pv, vec!["e7e5", "g1f3", "b8c6"]);
    }

    #[test]
    fn test_parse_info_line_mate_and_partial() {
        let mut analysis = PositionAnalysis::default();
        parse_info_line("info depth 30 score mate -3 pv g8h8", &mut analysis);
        parse_info_line("info depth 31 currmove h7h6 currmovenumber 2", &mut analysis);

        assert_eq!(analysis.depth, 31);
        assert_eq!(analysis.evaluation, Evaluation::Mate(-3));
        assert_eq!(analysis.pv, vec!["g8h8"]);
    }

    #[test]
    fn test_parse_info_string_is_ignored() {
        let mut analysis = PositionAnalysis::default();
        parse_info_line("info string NNUE evaluation using nn.nnue depth 99", &mut analysis);
        assert_eq!(analysis, PositionAnalysis::default());
    }

    #[test]
    fn test_missing_binary_is_spawn_error() {
        let result = UciEngine::new(
            "/nonexistent/uci-engine",
            Duration::from_millis(10),
            Duration::from_millis(10),
        );
        assert!(matches!(result, Err(EngineError::Spawn(_))));
    }

    #[test]
    #[ignore] // Ignore by default - requires stockfish installed
    fn test_stockfish_init() {
        let engine = UciEngine::new("stockfish", Duration::from_millis(100), Duration::from_secs(2));
        assert!(engine.is_ok());
    }

    #[test]
    #[ignore]
    fn test_analyze_after_moves() {
        let mut engine =
            UciEngine::new("stockfish", Duration::from_millis(200), Duration::from_secs(2)).unwrap();
        let moves = vec!["e2e4".to_string(), "e7e5".to_string()];
        let analysis = engine.analyze(None, &moves).unwrap().unwrap();

        assert!(!analysis.best_move.is_empty());
        assert!(!analysis.pv.is_empty());
        println!("{}", analysis.summary());
    }
}
