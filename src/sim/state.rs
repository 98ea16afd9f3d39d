//! Game state and core simulation types
//!
//! Everything the engine reads or writes lives here. The host renders from
//! these values and never mutates them directly.

use serde::{Deserialize, Serialize};

use super::rules::Ruleset;

/// Current screen of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GamePhase {
    /// Title screen, waiting for start
    #[default]
    Menu,
    /// Active gameplay
    Playing,
    /// Someone ran out of patience
    GameOver,
}

/// Per-participant counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Display name (optional outside the ranked game)
    pub nickname: Option<String>,
    pub score: u64,
    pub hits: u32,
    pub misses: u32,
    /// Consecutive hits since the last miss
    pub combo: u32,
    /// Best combo this session (never decreases)
    pub max_combo: u32,
    /// Remaining patience, kept within `[0, max_patience]`
    pub patience: i32,
}

impl PlayerState {
    pub fn new(nickname: Option<String>, patience: i32) -> Self {
        Self {
            nickname,
            score: 0,
            hits: 0,
            misses: 0,
            combo: 0,
            max_combo: 0,
            patience,
        }
    }

    pub fn is_eliminated(&self) -> bool {
        self.patience <= 0
    }

    /// Fraction of clicks that landed, 0.0 before the first click
    pub fn accuracy(&self) -> f32 {
        let clicks = self.hits + self.misses;
        if clicks == 0 {
            0.0
        } else {
            self.hits as f32 / clicks as f32
        }
    }

    /// Label for HUD and leaderboard rows
    pub fn display_name(&self, index: usize) -> String {
        match &self.nickname {
            Some(name) => name.clone(),
            None => format!("P{}", index + 1),
        }
    }
}

/// Something that happened during a transition, for the host and announcer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A target was hit
    Hit { player: usize, gain: u64, combo: u32 },
    /// The combo just reached a multiple of the milestone
    ComboMilestone { player: usize, combo: u32 },
    /// The shared level went up by one
    LevelUp { level: u32 },
    /// A background click; lists every penalized player
    Miss { players: Vec<usize> },
    /// The session ended; lists every player out of patience
    GameOver { eliminated: Vec<usize> },
}

/// Complete game state for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Participants in seat order
    pub players: Vec<PlayerState>,
    /// Shared difficulty level (starts at 1)
    pub level: u32,
    pub phase: GamePhase,
    /// Rules in force for this session
    pub rules: Ruleset,
}

impl Default for GameState {
    fn default() -> Self {
        Self::menu(Ruleset::default())
    }
}

impl GameState {
    /// Title-screen state with no players seated
    pub fn menu(rules: Ruleset) -> Self {
        Self {
            players: Vec::new(),
            level: 1,
            phase: GamePhase::Menu,
            rules,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn total_score(&self) -> u64 {
        self.players.iter().map(|p| p.score).sum()
    }

    /// Seats whose patience ran out
    pub fn eliminated(&self) -> Vec<usize> {
        self.players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_eliminated())
            .map(|(i, _)| i)
            .collect()
    }

    /// Best surviving player once the game is over.
    ///
    /// `None` while playing, when everybody is out, or when the top two
    /// survivors are tied.
    pub fn winner(&self) -> Option<usize> {
        if !self.is_game_over() || self.players.len() < 2 {
            return None;
        }
        let mut survivors: Vec<(usize, u64)> = self
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_eliminated())
            .map(|(i, p)| (i, p.score))
            .collect();
        survivors.sort_by(|a, b| b.1.cmp(&a.1));
        match survivors.as_slice() {
            [] => None,
            [(only, _)] => Some(*only),
            [(first, top), (_, second), ..] => (top > second).then_some(*first),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_accuracy() {
        let mut p = PlayerState::new(None, 100);
        assert_eq!(p.accuracy(), 0.0);
        p.hits = 3;
        p.misses = 1;
        assert!((p.accuracy() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_display_name() {
        let named = PlayerState::new(Some("Ada".into()), 100);
        let anon = PlayerState::new(None, 100);
        assert_eq!(named.display_name(0), "Ada");
        assert_eq!(anon.display_name(1), "P2");
    }

    #[test]
    fn test_winner() {
        let mut state = GameState::menu(Ruleset::versus(false));
        state.players = vec![PlayerState::new(None, 0), PlayerState::new(None, 40)];
        state.players[0].score = 900;
        state.players[1].score = 100;

        // Only decided once the game ends
        state.phase = GamePhase::Playing;
        assert_eq!(state.winner(), None);

        state.phase = GamePhase::GameOver;
        assert_eq!(state.winner(), Some(1));

        // Shared failure knocks out both
        state.players[1].patience = 0;
        assert_eq!(state.winner(), None);
    }

    #[test]
    fn test_winner_tie() {
        let mut state = GameState::menu(Ruleset::versus(true));
        state.players = vec![PlayerState::new(None, 10), PlayerState::new(None, 10)];
        state.phase = GamePhase::GameOver;
        assert_eq!(state.winner(), None);
        state.players[0].score = 10;
        assert_eq!(state.winner(), Some(0));
    }
}
