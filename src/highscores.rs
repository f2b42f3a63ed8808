//! High score leaderboard
//!
//! Tracks the top 10 final scores across sessions. Persisted as JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::host::PlayerId;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

#[derive(Debug, Error)]
pub enum HighScoresError {
    #[error("cannot access high scores file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid high scores json: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub player: PlayerId,
    /// Final score
    pub score: u64,
    pub orders_completed: u32,
    /// Host tick the game ended on
    pub tick: u64,
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Add a final score. Returns the rank achieved (1-indexed) or None if it
    /// didn't qualify. Ties keep the earlier entry ahead.
    pub fn add_score(
        &mut self,
        player: PlayerId,
        score: u64,
        orders_completed: u32,
        tick: u64,
    ) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let entry = HighScoreEntry {
            player,
            score,
            orders_completed,
            tick,
        };

        // Sorted descending by score
        let pos = self.entries.iter().position(|e| score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Load from a JSON file; a missing or broken file gives an empty board
    pub fn load(path: &Path) -> Self {
        let parsed = std::fs::read_to_string(path)
            .map_err(HighScoresError::from)
            .and_then(|json| {
                serde_json::from_str::<HighScores>(&json).map_err(HighScoresError::from)
            });
        match parsed {
            Ok(mut scores) => {
                scores.entries.sort_by(|a, b| b.score.cmp(&a.score));
                scores.entries.truncate(MAX_HIGH_SCORES);
                log::info!("Loaded {} high scores", scores.entries.len());
                scores
            }
            Err(e) => {
                log::info!("No high scores at {} ({}), starting fresh", path.display(), e);
                Self::new()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), HighScoresError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }

    /// One line per entry, for logs and chat
    pub fn format_table(&self) -> String {
        if self.entries.is_empty() {
            return "No high scores yet".to_string();
        }
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| {
                format!(
                    "{:>2}. {:<10} {:>6} ({} orders)",
                    i + 1,
                    e.player.to_string(),
                    e.score,
                    e.orders_completed
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_score_never_qualifies() {
        let mut scores = HighScores::new();
        assert!(!scores.qualifies(0));
        assert_eq!(scores.add_score(PlayerId(1), 0, 0, 10), None);
        assert!(scores.is_empty());
    }

    #[test]
    fn test_sorted_and_capped() {
        let mut scores = HighScores::new();
        for i in 1..=12u64 {
            scores.add_score(PlayerId(i), i * 10, i as u32, i);
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.top_score(), Some(120));
        assert_eq!(scores.entries.last().map(|e| e.score), Some(30));
        // Below the lowest entry on a full board
        assert_eq!(scores.add_score(PlayerId(99), 20, 0, 0), None);
        assert_eq!(scores.add_score(PlayerId(99), 115, 0, 0), Some(2));
    }

    #[test]
    fn test_ties_keep_earlier_entry_first() {
        let mut scores = HighScores::new();
        scores.add_score(PlayerId(1), 50, 1, 1);
        assert_eq!(scores.add_score(PlayerId(2), 50, 1, 2), Some(2));
        assert_eq!(scores.entries[0].player, PlayerId(1));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("mcorder-scores-{}.json", std::process::id()));
        let mut scores = HighScores::new();
        scores.add_score(PlayerId(3), 140, 2, 900);
        scores.save(&path).unwrap();

        let loaded = HighScores::load(&path);
        assert_eq!(loaded.entries, scores.entries);
        let _ = std::fs::remove_file(&path);

        assert!(HighScores::load(&path).is_empty());
        let missing_dir = path.join("nested").join("scores.json");
        assert!(matches!(scores.save(&missing_dir), Err(HighScoresError::Io(_))));
        assert!(scores.format_table().contains("player#3"));
    }
}
