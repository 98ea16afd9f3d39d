//! Rage Clicker - click the button, not the background
//!
//! Core modules:
//! - `sim`: Deterministic game logic (engine, rules, evasive button, timers)
//! - `session`: Routes input, owns timers, announcer and leaderboard
//! - `announcer`: Cooldown-gated trash talk
//! - `highscores`: Top 10 leaderboard
//! - `persistence`: Key-value storage backends
//! - `platform`: Browser/native platform abstraction
//! - `settings`: Player preferences

pub mod announcer;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;

pub use announcer::{Announcer, CannedPhrases, TrashTalkMessage, TrashTalkProvider};
pub use highscores::{HighScoreEntry, HighScores};
pub use persistence::{KeyValueStore, MemoryStore, StoreError};
pub use session::{PointerOutcome, Routed, Session};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Default play area when the host hasn't reported a size yet
    pub const DEFAULT_WIDTH: f32 = 1280.0;
    pub const DEFAULT_HEIGHT: f32 = 720.0;

    /// Patience bar turns red below this
    pub const LOW_PATIENCE: i32 = 30;

    /// Combo shown on the HUD from this value up
    pub const COMBO_DISPLAY_MIN: u32 = 2;

    /// Lifetime of "OK!"/"MISS!" floating text (ms)
    pub const FEEDBACK_MS: f64 = 800.0;
    /// Screen shake length after a miss (ms)
    pub const SHAKE_MS: f64 = 150.0;
}
