//! Tunable game rules
//!
//! The solo, versus and leaderboard games only differ in a handful of
//! constants and two policies, so they share one engine configured by a
//! [`Ruleset`] and a [`TargetTuning`].

use serde::{Deserialize, Serialize};

/// Which game the player picked from the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GameMode {
    /// One player, no leaderboard
    #[default]
    Solo,
    /// Two players sharing the screen
    Versus,
    /// One player, nickname recorded to the top 10
    Leaderboard,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Solo => "Solo",
            GameMode::Versus => "Versus",
            GameMode::Leaderboard => "Leaderboard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "solo" => Some(GameMode::Solo),
            "versus" | "vs" | "1v1" => Some(GameMode::Versus),
            "leaderboard" | "ranked" => Some(GameMode::Leaderboard),
            _ => None,
        }
    }

    /// Number of players this mode seats
    pub fn player_count(&self) -> usize {
        match self {
            GameMode::Versus => 2,
            GameMode::Solo | GameMode::Leaderboard => 1,
        }
    }
}

/// What score is compared against the level-up threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelUpPolicy {
    /// The score of the player who just hit
    PerPlayer,
    /// The sum of every player's score
    Combined,
}

/// Scoring and patience rules for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ruleset {
    /// Points per hit before the level and combo multipliers
    pub base_value: u64,
    /// Patience restored by a hit
    pub recovery: i32,
    /// Patience lost by a miss
    pub miss_penalty: i32,
    /// Patience ceiling (and starting value)
    pub max_patience: i32,
    /// Level `n` ends once the compared score reaches `level_up_factor * n`
    pub level_up_factor: u64,
    pub level_up_policy: LevelUpPolicy,
    /// A miss penalizes every player instead of only the culprit
    pub shared_failure: bool,
    /// Combo values that are multiples of this trigger the announcer
    pub combo_milestone: u32,
    /// Final scores go to the high-score table
    pub records_high_scores: bool,
}

impl Ruleset {
    pub fn solo() -> Self {
        Self {
            base_value: 10,
            recovery: 5,
            miss_penalty: 10,
            max_patience: 100,
            level_up_factor: 300,
            level_up_policy: LevelUpPolicy::PerPlayer,
            shared_failure: false,
            combo_milestone: 5,
            records_high_scores: false,
        }
    }

    pub fn versus(shared_failure: bool) -> Self {
        Self {
            recovery: 3,
            level_up_policy: LevelUpPolicy::Combined,
            shared_failure,
            ..Self::solo()
        }
    }

    pub fn leaderboard() -> Self {
        Self {
            records_high_scores: true,
            ..Self::solo()
        }
    }

    pub fn for_mode(mode: GameMode, shared_failure: bool) -> Self {
        match mode {
            GameMode::Solo => Self::solo(),
            GameMode::Versus => Self::versus(shared_failure),
            GameMode::Leaderboard => Self::leaderboard(),
        }
    }
}

impl Default for Ruleset {
    fn default() -> Self {
        Self::solo()
    }
}

/// Movement and difficulty constants for the evasive button
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetTuning {
    /// Keep-out margin from every edge of the play area (px)
    pub padding: f32,
    /// Hit radius at scale 1.0 (px)
    pub radius: f32,

    /// Hover evasion chance is `hover_base + level * hover_step`, capped
    pub hover_base: f32,
    pub hover_step: f32,
    pub hover_cap: f32,

    /// First level with idle drift
    pub drift_level: u32,
    pub drift_base_ms: f64,
    pub drift_step_ms: f64,
    pub drift_min_ms: f64,
    pub drift_chance: f64,

    /// First level with glitch flicker
    pub glitch_level: u32,
    pub glitch_interval_ms: f64,
    pub glitch_chance: f64,
    pub glitch_duration_ms: f64,
    pub glitch_opacity: f32,

    /// Scale after a hit is `1 - level * shrink_rate`, floored at `min_scale`
    pub shrink_rate: f32,
    pub min_scale: f32,
}

impl Default for TargetTuning {
    fn default() -> Self {
        Self {
            padding: 120.0,
            radius: 56.0,

            hover_base: 0.05,
            hover_step: 0.05,
            hover_cap: 0.7,

            drift_level: 3,
            drift_base_ms: 3000.0,
            drift_step_ms: 200.0,
            drift_min_ms: 1000.0,
            drift_chance: 0.3,

            glitch_level: 10,
            glitch_interval_ms: 2000.0,
            glitch_chance: 0.2,
            glitch_duration_ms: 150.0,
            glitch_opacity: 0.3,

            shrink_rate: 0.03,
            min_scale: 0.4,
        }
    }
}

impl TargetTuning {
    pub fn for_mode(mode: GameMode) -> Self {
        match mode {
            // The ranked game gives two extra levels before the button drifts
            GameMode::Leaderboard => Self {
                drift_level: 5,
                ..Self::default()
            },
            GameMode::Solo | GameMode::Versus => Self::default(),
        }
    }

    /// Probability that entering the button makes it jump away
    pub fn hover_evade_chance(&self, level: u32) -> f32 {
        (self.hover_base + level as f32 * self.hover_step).clamp(0.0, self.hover_cap)
    }

    /// Idle drift period for this level, `None` below the drift level
    pub fn drift_interval_ms(&self, level: u32) -> Option<f64> {
        if level < self.drift_level {
            return None;
        }
        Some((self.drift_base_ms - level as f64 * self.drift_step_ms).max(self.drift_min_ms))
    }

    /// Glitch period for this level, `None` below the glitch level
    pub fn glitch_interval_ms(&self, level: u32) -> Option<f64> {
        (level >= self.glitch_level).then_some(self.glitch_interval_ms)
    }

    /// Button scale after a hit at `level`
    pub fn shrink_scale(&self, level: u32) -> f32 {
        (1.0 - level as f32 * self.shrink_rate).max(self.min_scale)
    }
}
