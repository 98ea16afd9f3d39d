//! Pure state transitions
//!
//! Every handler takes the current state by reference and returns the next
//! state plus the events it produced. Nothing here holds on to state between
//! calls, so a handler can never act on a stale snapshot.

use super::rules::{LevelUpPolicy, Ruleset};
use super::state::{GameEvent, GamePhase, GameState, PlayerState};

/// One input to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Seat `player_count` players and start playing
    Start {
        player_count: usize,
        nicknames: Vec<Option<String>>,
    },
    /// Player `player` clicked their target
    Hit { player: usize },
    /// A click landed on the background, optionally attributed to a player
    Miss { culprit: Option<usize> },
    /// Back to the title screen
    ResetToMenu,
}

/// Result of applying an action
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: GameState,
    pub events: Vec<GameEvent>,
}

impl Transition {
    fn unchanged(state: &GameState) -> Self {
        Self {
            state: state.clone(),
            events: Vec::new(),
        }
    }

    pub fn leveled_up(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, GameEvent::LevelUp { .. }))
    }

    pub fn ended(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, GameEvent::GameOver { .. }))
    }
}

/// Apply any action to the state
pub fn step(state: &GameState, action: &Action) -> Transition {
    match action {
        Action::Start {
            player_count,
            nicknames,
        } => Transition {
            state: start_session(state.rules.clone(), *player_count, nicknames),
            events: Vec::new(),
        },
        Action::Hit { player } => apply_hit(state, *player),
        Action::Miss { culprit } => apply_miss(state, *culprit),
        Action::ResetToMenu => Transition {
            state: reset_to_menu(state),
            events: Vec::new(),
        },
    }
}

/// Fresh playing state with `player_count` seats at full patience
pub fn start_session(
    rules: Ruleset,
    player_count: usize,
    nicknames: &[Option<String>],
) -> GameState {
    let players = (0..player_count.max(1))
        .map(|i| {
            let nickname = nicknames
                .get(i)
                .cloned()
                .flatten()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty());
            PlayerState::new(nickname, rules.max_patience)
        })
        .collect();

    GameState {
        players,
        level: 1,
        phase: GamePhase::Playing,
        rules,
    }
}

/// Drop every seat and go back to the title screen
pub fn reset_to_menu(state: &GameState) -> GameState {
    GameState::menu(state.rules.clone())
}

/// Points for a hit at `level` when the player already had `combo` hits
pub fn hit_score(base_value: u64, level: u32, combo: u32) -> u64 {
    base_value * level as u64 * (combo as u64 + 1)
}

/// Score a hit for `player`.
///
/// # Panics
///
/// Panics if `player` is not a seated player.
pub fn apply_hit(state: &GameState, player: usize) -> Transition {
    if state.phase != GamePhase::Playing {
        return Transition::unchanged(state);
    }
    assert!(
        player < state.players.len(),
        "hit for player {} but only {} seated",
        player,
        state.players.len()
    );

    let mut next = state.clone();
    let mut events = Vec::new();
    let rules = &state.rules;
    let level = state.level;

    let p = &mut next.players[player];
    let gain = hit_score(rules.base_value, level, p.combo);
    p.score += gain;
    p.hits += 1;
    p.combo += 1;
    p.max_combo = p.max_combo.max(p.combo);
    p.patience = (p.patience + rules.recovery).min(rules.max_patience);
    let combo = p.combo;

    events.push(GameEvent::Hit {
        player,
        gain,
        combo,
    });
    if rules.combo_milestone > 0 && combo.is_multiple_of(rules.combo_milestone) {
        events.push(GameEvent::ComboMilestone { player, combo });
    }

    let compared = match rules.level_up_policy {
        LevelUpPolicy::PerPlayer => next.players[player].score,
        LevelUpPolicy::Combined => next.total_score(),
    };
    // One level per hit at most, however far past the threshold the score is
    if compared >= rules.level_up_factor * level as u64 {
        next.level = level + 1;
        events.push(GameEvent::LevelUp { level: next.level });
    }

    Transition {
        state: next,
        events,
    }
}

/// Penalize a background click.
///
/// With one player or shared failure every player pays; otherwise only the
/// culprit does, falling back to everyone when the click can't be attributed.
///
/// # Panics
///
/// Panics if `culprit` is not a seated player.
pub fn apply_miss(state: &GameState, culprit: Option<usize>) -> Transition {
    if state.phase != GamePhase::Playing {
        return Transition::unchanged(state);
    }
    if let Some(c) = culprit {
        assert!(
            c < state.players.len(),
            "miss by player {} but only {} seated",
            c,
            state.players.len()
        );
    }

    let mut next = state.clone();
    let rules = &state.rules;

    let affected: Vec<usize> = match culprit {
        Some(c) if !rules.shared_failure && state.players.len() > 1 => vec![c],
        _ => (0..state.players.len()).collect(),
    };

    for &i in &affected {
        let p = &mut next.players[i];
        p.misses += 1;
        p.combo = 0;
        p.patience = (p.patience - rules.miss_penalty).clamp(0, rules.max_patience);
    }

    let mut events = vec![GameEvent::Miss {
        players: affected.clone(),
    }];

    let eliminated: Vec<usize> = affected
        .into_iter()
        .filter(|&i| next.players[i].is_eliminated())
        .collect();
    if !eliminated.is_empty() {
        next.phase = GamePhase::GameOver;
        events.push(GameEvent::GameOver { eliminated });
    }

    Transition {
        state: next,
        events,
    }
}
