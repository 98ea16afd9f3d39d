//! Deterministic game logic
//!
//! All gameplay rules live here. This module must stay pure:
//! - Transitions are functions of the previous state only
//! - Randomness comes from a caller-supplied RNG
//! - Time comes from the caller (milliseconds), never a clock
//! - No DOM, storage or platform dependencies

pub mod engine;
pub mod rules;
pub mod scheduler;
pub mod state;
pub mod target;

pub use engine::{
    Action, Transition, apply_hit, apply_miss, hit_score, reset_to_menu, start_session, step,
};
pub use rules::{GameMode, LevelUpPolicy, Ruleset, TargetTuning};
pub use scheduler::{Firing, Scheduler, TaskId, TimerKind};
pub use state::{GameEvent, GamePhase, GameState, PlayerState};
pub use target::{Bounds, Target, TargetKey, reposition};
