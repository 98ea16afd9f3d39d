//! High score leaderboard system
//!
//! Persisted through a [`KeyValueStore`] as a JSON array, tracks top 10 scores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, StoreError};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub nickname: String,
    /// Player's score
    pub score: u64,
    /// Level reached
    pub level: u32,
    /// Calendar date (YYYY-MM-DD) when achieved
    pub date: String,
}

/// High score leaderboard, best first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Storage key for the leaderboard
    pub const STORAGE_KEY: &'static str = "rage_clicker_highscores";

    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score would make the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a new entry to the leaderboard (if it qualifies)
    /// Returns the rank achieved (1-indexed) or None if didn't qualify
    pub fn add(&mut self, entry: HighScoreEntry) -> Option<usize> {
        if !self.qualifies(entry.score) {
            return None;
        }

        // Find insertion point (sorted descending by score, ties keep older first)
        let pos = self.entries.iter().position(|e| entry.score > e.score);
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

        // Trim to max size
        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    /// Convenience wrapper around [`HighScores::add`]
    pub fn add_score(&mut self, nickname: &str, score: u64, level: u32, timestamp: f64) -> Option<usize> {
        self.add(HighScoreEntry {
            nickname: nickname.to_string(),
            score,
            level,
            date: format_date(timestamp),
        })
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Restore ordering and size after reading untrusted data
    fn normalize(&mut self) {
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(MAX_HIGH_SCORES);
    }

    /// Load the leaderboard, falling back to empty on any failure
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let json = match store.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => json,
            Ok(None) => {
                log::info!("No high scores found, starting fresh");
                return Self::new();
            }
            Err(e) => {
                log::warn!("Could not read high scores: {}", e);
                return Self::new();
            }
        };

        match serde_json::from_str::<HighScores>(&json) {
            Ok(mut scores) => {
                scores.normalize();
                log::info!("Loaded {} high scores", scores.entries.len());
                scores
            }
            Err(e) => {
                log::warn!("Discarding corrupt high scores: {}", e);
                Self::new()
            }
        }
    }

    /// Save the leaderboard
    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        let json = serde_json::to_string(self)?;
        store.set(Self::STORAGE_KEY, &json)?;
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }
}

/// Format a unix timestamp (ms) as a `YYYY-MM-DD` UTC date.
///
/// Timestamps chrono cannot represent fall back to the epoch.
pub fn format_date(timestamp: f64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp as i64)
        .unwrap_or_default()
        .format("%Y-%m-%d")
        .to_string()
}
