//! Session leaderboard
//!
//! Lives as long as the app does. Nothing is written to disk.

use serde::{Deserialize, Serialize};

/// Runs kept on the board
pub const MAX_HIGH_SCORES: usize = 10;

/// One finished run on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u32,
    /// Run index within the session (0-based)
    pub run: u32,
    pub seed: u64,
}

/// Best runs of the session, highest score first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HighScores {
    entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[HighScoreEntry] {
        &self.entries
    }

    /// Slot a score would take; equal scores go after the ones already there
    fn slot(&self, score: u32) -> usize {
        self.entries.partition_point(|e| e.score >= score)
    }

    /// A run with no points never makes the board
    pub fn qualifies(&self, score: u32) -> bool {
        score > 0 && self.slot(score) < MAX_HIGH_SCORES
    }

    /// 1-based rank `score` would get, if it qualifies
    pub fn potential_rank(&self, score: u32) -> Option<usize> {
        self.qualifies(score).then(|| self.slot(score) + 1)
    }

    /// Record a finished run; returns its 1-based rank if it made the board
    pub fn add_score(&mut self, score: u32, run: u32, seed: u64) -> Option<usize> {
        let rank = self.potential_rank(score)?;
        self.entries
            .insert(rank - 1, HighScoreEntry { score, run, seed });
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u32> {
        self.entries.first().map(|e| e.score)
    }
}
