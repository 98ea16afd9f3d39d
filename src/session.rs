//! Session orchestration
//!
//! Owns everything with a lifetime longer than one click: the current game
//! state, the mounted buttons, their timers, the announcer and the
//! leaderboard. The host forwards raw pointer events and frame times here and
//! renders from the accessors.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::announcer::{Announcer, OPENING_TAUNT, TrashTalkMessage, TrashTalkProvider};
use crate::highscores::HighScores;
use crate::persistence::KeyValueStore;
use crate::settings::Settings;
use crate::sim::{
    self, Bounds, GameEvent, GamePhase, GameState, Scheduler, Target, TargetTuning,
    TimerKind, Transition,
};

/// Event name sent to the announcer on a miss
pub const MISS_EVENT: &str = "user missed the button";
/// Event name sent to the announcer on a combo milestone
pub const COMBO_EVENT: &str = "user hit a combo";

/// Where a pointer-down ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// Not playing; nothing happened
    Ignored,
    /// Landed on this player's button
    Target(usize),
    /// Landed on the background
    Background,
}

/// What a pointer-down did, for feedback effects
#[derive(Debug, Clone, PartialEq)]
pub struct PointerOutcome {
    pub routed: Routed,
    /// Where the pointer went down
    pub position: Vec2,
    pub events: Vec<GameEvent>,
    /// Host should shake the screen
    pub shake: bool,
}

impl PointerOutcome {
    fn ignored(position: Vec2) -> Self {
        Self {
            routed: Routed::Ignored,
            position,
            events: Vec::new(),
            shake: false,
        }
    }

    pub fn game_over(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, GameEvent::GameOver { .. }))
    }
}

/// A leaderboard placement earned when the last game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub player: usize,
    /// 1-indexed rank
    pub rank: usize,
}

pub struct Session<S: KeyValueStore, P: TrashTalkProvider> {
    settings: Settings,
    tuning: TargetTuning,
    state: GameState,
    /// One per seated player while playing, indexed by seat
    targets: Vec<Target>,
    scheduler: Scheduler,
    announcer: Announcer,
    high_scores: HighScores,
    placements: Vec<Placement>,
    store: S,
    provider: P,
    rng: Pcg32,
    bounds: Bounds,
}

impl<S: KeyValueStore, P: TrashTalkProvider> Session<S, P> {
    /// Create a session on the menu screen, reading the leaderboard from `store`
    pub fn new(store: S, provider: P, settings: Settings, seed: u64, bounds: Bounds) -> Self {
        let high_scores = HighScores::load(&store);
        Self {
            tuning: settings.tuning(),
            state: GameState::menu(settings.ruleset()),
            targets: Vec::new(),
            scheduler: Scheduler::new(),
            announcer: Announcer::new(settings.announcer_cooldown_ms),
            high_scores,
            placements: Vec::new(),
            store,
            provider,
            rng: Pcg32::seed_from_u64(seed),
            bounds,
            settings,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn tuning(&self) -> &TargetTuning {
        &self.tuning
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.high_scores
    }

    /// Leaderboard ranks earned by the game that just ended
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Leaderboard rank for `player` once the game is over.
    ///
    /// Ranked games report the recorded placement; other modes report where
    /// the score would have landed.
    pub fn final_rank(&self, player: usize) -> Option<usize> {
        if !self.state.is_game_over() {
            return None;
        }
        if self.state.rules.records_high_scores {
            return self
                .placements
                .iter()
                .find(|p| p.player == player)
                .map(|p| p.rank);
        }
        let score = self.state.players.get(player)?.score;
        self.high_scores.potential_rank(score)
    }

    /// Announcer lines to draw right now
    pub fn messages(&self, now_ms: f64) -> Vec<&TrashTalkMessage> {
        self.announcer.visible(now_ms)
    }

    /// Replace the settings and persist them. Rule changes apply on the next start.
    pub fn update_settings(&mut self, settings: Settings) {
        if let Err(e) = settings.save(&mut self.store) {
            log::warn!("Failed to save settings: {}", e);
        }
        self.announcer.cooldown_ms = settings.announcer_cooldown_ms;
        if !settings.effective_glitch() {
            for t in &mut self.targets {
                t.end_glitch();
            }
        }
        self.settings = settings;
    }

    /// Leave the menu (or the game-over screen) and start playing
    pub fn start(&mut self, nicknames: &[Option<String>], now_ms: f64) {
        self.tuning = self.settings.tuning();
        let rules = self.settings.ruleset();
        self.state = sim::start_session(rules, self.settings.mode.player_count(), nicknames);
        self.placements.clear();

        self.scheduler.clear();
        self.targets = (0..self.state.players.len())
            .map(|i| Target::mount(i, self.bounds, &self.tuning, &mut self.rng))
            .collect();
        self.schedule_timers(now_ms);

        self.announcer.clear();
        if self.settings.announcer {
            self.announcer.taunt(OPENING_TAUNT, now_ms);
        }

        log::info!(
            "{} session started with {} player(s)",
            self.settings.mode.as_str(),
            self.state.players.len()
        );
    }

    /// Back to the title screen, dropping the buttons and their timers
    pub fn reset_to_menu(&mut self) {
        self.state = sim::reset_to_menu(&self.state);
        self.unmount_targets();
        self.announcer.clear();
        log::info!("Returned to menu");
    }

    /// The play area changed size
    pub fn resize(&mut self, bounds: Bounds) {
        self.bounds = bounds;
        for t in &mut self.targets {
            t.clamp_into(bounds, &self.tuning);
        }
    }

    /// Route a pointer-down on the play surface.
    ///
    /// Buttons are tested before the background, last seat first since it
    /// is drawn on top, so a click on a button never counts as a miss.
    pub fn pointer_down(&mut self, point: Vec2, now_ms: f64) -> PointerOutcome {
        if !self.state.is_playing() {
            return PointerOutcome::ignored(point);
        }

        let hit = self
            .targets
            .iter()
            .rev()
            .find(|t| t.contains(point, &self.tuning))
            .map(|t| t.key.player);

        match hit {
            Some(player) => self.handle_hit(player, point, now_ms),
            None => self.handle_miss(point, now_ms),
        }
    }

    fn handle_hit(&mut self, player: usize, point: Vec2, now_ms: f64) -> PointerOutcome {
        // Shrink follows the level the button was clicked at
        let level = self.state.level;
        let Transition { state, events } = sim::apply_hit(&self.state, player);
        self.state = state;

        if let Some(target) = self.targets.get_mut(player) {
            target.on_hit(level, self.bounds, &self.tuning, &mut self.rng);
        }

        for event in &events {
            match event {
                GameEvent::LevelUp { level } => {
                    log::info!("Level up: {}", level);
                    self.remount_targets(now_ms);
                }
                GameEvent::ComboMilestone { .. } => self.announce(COMBO_EVENT, now_ms),
                _ => {}
            }
        }

        PointerOutcome {
            routed: Routed::Target(player),
            position: point,
            events,
            shake: false,
        }
    }

    fn handle_miss(&mut self, point: Vec2, now_ms: f64) -> PointerOutcome {
        let Transition { state, events } = sim::apply_miss(&self.state, self.culprit(point));
        self.state = state;

        self.announce(MISS_EVENT, now_ms);

        if self.state.is_game_over() {
            self.finish(now_ms);
        }

        PointerOutcome {
            routed: Routed::Background,
            position: point,
            events,
            shake: self.settings.effective_screen_shake(),
        }
    }

    /// Who pays for a background click: in versus the owner of that half
    fn culprit(&self, point: Vec2) -> Option<usize> {
        let seats = self.state.players.len();
        if seats < 2 {
            return None;
        }
        let width = self.bounds.width.max(1.0);
        let seat = ((point.x / width) * seats as f32).floor() as isize;
        Some(seat.clamp(0, seats as isize - 1) as usize)
    }

    fn announce(&mut self, event: &str, now_ms: f64) {
        if self.settings.announcer {
            self.announcer.request(event, now_ms, &mut self.provider);
        }
    }

    /// Game just ended: stop every timer and record scores
    fn finish(&mut self, now_ms: f64) {
        self.unmount_targets();
        log::info!(
            "Game over at level {} (eliminated: {:?})",
            self.state.level,
            self.state.eliminated()
        );
        self.record_high_scores(now_ms);
    }

    fn record_high_scores(&mut self, now_ms: f64) {
        if !self.state.rules.records_high_scores {
            return;
        }
        let level = self.state.level;
        let mut changed = false;
        for (i, p) in self.state.players.iter().enumerate() {
            let Some(name) = &p.nickname else { continue };
            if let Some(rank) = self.high_scores.add_score(name, p.score, level, now_ms) {
                log::info!("{} placed #{} with {}", name, rank, p.score);
                self.placements.push(Placement { player: i, rank });
                changed = true;
            }
        }
        if changed {
            if let Err(e) = self.high_scores.save(&mut self.store) {
                log::warn!("Failed to save high scores: {}", e);
            }
        }
    }

    fn unmount_targets(&mut self) {
        self.scheduler.clear();
        self.targets.clear();
    }

    /// New level: every button becomes a new incarnation with fresh timers
    fn remount_targets(&mut self, now_ms: f64) {
        for t in &mut self.targets {
            self.scheduler.cancel_owner(t.key);
            t.remount();
        }
        self.schedule_timers(now_ms);
    }

    fn schedule_timers(&mut self, now_ms: f64) {
        let level = self.state.level;
        let drift = self.tuning.drift_interval_ms(level);
        let glitch = self
            .tuning
            .glitch_interval_ms(level)
            .filter(|_| self.settings.effective_glitch());

        for t in &self.targets {
            if let Some(period) = drift {
                self.scheduler
                    .schedule_every(t.key, TimerKind::Drift, now_ms, period);
            }
            if let Some(period) = glitch {
                self.scheduler
                    .schedule_every(t.key, TimerKind::Glitch, now_ms, period);
            }
        }
    }

    /// Pointer moved onto a player's button
    pub fn pointer_enter(&mut self, player: usize) -> bool {
        if !self.state.is_playing() {
            return false;
        }
        let level = self.state.level;
        match self.targets.get_mut(player) {
            Some(t) => t.on_pointer_enter(level, self.bounds, &self.tuning, &mut self.rng),
            None => false,
        }
    }

    /// Pointer moved off a player's button
    pub fn pointer_leave(&mut self, player: usize) {
        if let Some(t) = self.targets.get_mut(player) {
            t.on_pointer_leave();
        }
    }

    /// Run every timer due by `now_ms`; returns true if a button changed
    pub fn advance(&mut self, now_ms: f64) -> bool {
        if !self.state.is_playing() {
            self.scheduler.clear();
            return false;
        }

        let mut changed = false;
        for firing in self.scheduler.advance(now_ms) {
            let Some(idx) = self.targets.iter().position(|t| t.key == firing.owner) else {
                log::debug!("Dropping stale {:?} for {:?}", firing.kind, firing.owner);
                continue;
            };
            let target = &mut self.targets[idx];

            let acted = match firing.kind {
                TimerKind::Drift => target.on_drift(self.bounds, &self.tuning, &mut self.rng),
                TimerKind::Glitch => {
                    self.settings.effective_glitch() && target.on_glitch(&self.tuning, &mut self.rng)
                }
                TimerKind::GlitchRestore => {
                    target.end_glitch();
                    true
                }
            };

            if acted && firing.kind == TimerKind::Glitch {
                self.scheduler.schedule_once(
                    firing.owner,
                    TimerKind::GlitchRestore,
                    firing.due_ms,
                    self.tuning.glitch_duration_ms,
                );
            }
            changed |= acted;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::announcer::CannedPhrases;
    use crate::persistence::MemoryStore;
    use crate::sim::{GameMode, TargetKey};

    type TestSession = Session<MemoryStore, CannedPhrases>;

    fn session(mode: GameMode) -> TestSession {
        Session::new(
            MemoryStore::new(),
            CannedPhrases::new(1),
            Settings::from_mode(mode),
            42,
            Bounds::new(1280.0, 720.0),
        )
    }

    /// A point on the background far from every button
    fn empty_spot(s: &TestSession) -> Vec2 {
        let corners = [
            Vec2::new(1.0, 1.0),
            Vec2::new(1279.0, 1.0),
            Vec2::new(1.0, 719.0),
            Vec2::new(1279.0, 719.0),
        ];
        corners
            .into_iter()
            .find(|c| !s.targets().iter().any(|t| t.contains(*c, s.tuning())))
            .unwrap()
    }

    #[test]
    fn test_start_mounts_one_target_per_player() {
        let mut s = session(GameMode::Versus);
        assert!(s.targets().is_empty());
        s.start(&[], 0.0);
        assert_eq!(s.phase(), GamePhase::Playing);
        assert_eq!(s.targets().len(), 2);
        assert_eq!(s.messages(0.0)[0].text, OPENING_TAUNT);
    }

    #[test]
    fn test_click_on_target_is_a_hit() {
        let mut s = session(GameMode::Solo);
        s.start(&[], 0.0);
        let pos = s.targets()[0].pos;
        let out = s.pointer_down(pos, 10.0);
        assert_eq!(out.routed, Routed::Target(0));
        assert!(!out.shake);
        assert_eq!(s.state().players[0].score, 10);
        assert_eq!(s.state().players[0].misses, 0);
        assert!((s.targets()[0].scale - 0.97).abs() < 1e-6);
    }

    #[test]
    fn test_click_on_background_is_a_miss() {
        let mut s = session(GameMode::Solo);
        s.start(&[], 0.0);
        let spot = empty_spot(&s);
        let out = s.pointer_down(spot, 10.0);
        assert_eq!(out.routed, Routed::Background);
        assert!(out.shake);
        assert_eq!(s.state().players[0].patience, 90);
    }

    #[test]
    fn test_clicks_ignored_outside_play() {
        let mut s = session(GameMode::Solo);
        let out = s.pointer_down(Vec2::new(5.0, 5.0), 0.0);
        assert_eq!(out.routed, Routed::Ignored);
        assert_eq!(s.phase(), GamePhase::Menu);
    }

    #[test]
    fn test_game_over_stops_timers_and_unmounts() {
        let mut s = session(GameMode::Solo);
        s.start(&[], 0.0);
        s.state.level = 12;
        s.remount_targets(0.0);
        assert!(!s.scheduler.is_empty());

        for i in 0..10 {
            let spot = empty_spot(&s);
            let out = s.pointer_down(spot, i as f64);
            assert_eq!(out.game_over(), i == 9);
        }
        assert_eq!(s.phase(), GamePhase::GameOver);
        assert!(s.targets().is_empty());
        assert!(s.scheduler.is_empty());
        assert!(!s.advance(1_000_000.0));
    }

    #[test]
    fn test_level_up_remounts_with_timers() {
        let mut s = session(GameMode::Solo);
        s.start(&[], 0.0);
        assert!(s.scheduler.is_empty());
        let old_key = s.targets()[0].key;

        // Jump close to the level 2 and 3 thresholds
        s.state.level = 2;
        s.state.players[0].score = 590;
        let pos = s.targets()[0].pos;
        let out = s.pointer_down(pos, 100.0);
        assert!(out.events.contains(&GameEvent::LevelUp { level: 3 }));

        let key = s.targets()[0].key;
        assert_ne!(key, old_key);
        assert!(s.scheduler.has_task(key, TimerKind::Drift));
        assert!(!s.scheduler.has_task(old_key, TimerKind::Drift));
    }

    #[test]
    fn test_level_up_hit_shrinks_at_clicked_level() {
        let mut s = session(GameMode::Solo);
        s.start(&[], 0.0);
        s.state.players[0].score = 290;
        let pos = s.targets()[0].pos;
        let out = s.pointer_down(pos, 0.0);
        assert!(out.events.contains(&GameEvent::LevelUp { level: 2 }));
        assert_eq!(s.state().level, 2);
        assert_eq!(s.targets()[0].scale, s.tuning().shrink_scale(1));
        assert!((s.targets()[0].scale - 0.97).abs() < 1e-6);
    }

    #[test]
    fn test_reset_to_menu_discards_players() {
        let mut s = session(GameMode::Solo);
        s.start(&[], 0.0);
        s.reset_to_menu();
        assert_eq!(s.phase(), GamePhase::Menu);
        assert!(s.state().players.is_empty());
        assert!(s.targets().is_empty());
    }

    #[test]
    fn test_versus_isolated_miss_attribution() {
        let mut s = Session::new(
            MemoryStore::new(),
            CannedPhrases::new(1),
            Settings {
                mode: GameMode::Versus,
                shared_failure: false,
                ..Settings::default()
            },
            5,
            Bounds::new(1280.0, 720.0),
        );
        s.start(&[], 0.0);
        // Park both buttons in the middle so the corners are background
        for t in &mut s.targets {
            t.pos = Vec2::new(640.0, 360.0);
        }
        s.pointer_down(Vec2::new(10.0, 10.0), 0.0);
        assert_eq!(s.state().players[0].patience, 90);
        assert_eq!(s.state().players[1].patience, 100);
        s.pointer_down(Vec2::new(1270.0, 10.0), 1.0);
        assert_eq!(s.state().players[1].patience, 90);
    }

    #[test]
    fn test_versus_shared_round_ends_for_both() {
        let mut s = session(GameMode::Versus);
        s.start(&[], 0.0);
        assert_eq!(s.targets().len(), 2);
        let pos = s.targets()[1].pos;
        assert_eq!(s.pointer_down(pos, 0.0).routed, Routed::Target(1));

        let mut last = None;
        while s.state().is_playing() {
            let spot = empty_spot(&s);
            last = Some(s.pointer_down(spot, 0.0));
        }
        let out = last.unwrap();
        assert!(out.events.contains(&GameEvent::GameOver {
            eliminated: vec![0, 1]
        }));
        assert_eq!(s.state().players[0].misses, 10);
        assert_eq!(s.state().players[1].misses, 10);
        assert_eq!(s.state().winner(), None);
        assert!(s.targets().is_empty());
        assert!(s.scheduler.is_empty());
    }

    #[test]
    fn test_stale_firing_is_noop() {
        let mut s = session(GameMode::Solo);
        s.start(&[], 0.0);
        let stale = TargetKey {
            player: 0,
            generation: 99,
        };
        s.scheduler.schedule_once(stale, TimerKind::GlitchRestore, 0.0, 10.0);
        s.targets[0].opacity = 0.3;
        assert!(!s.advance(20.0));
        assert_eq!(s.targets()[0].opacity, 0.3);
    }

    #[test]
    fn test_glitch_restores_after_duration() {
        let mut s = Session::new(
            MemoryStore::new(),
            CannedPhrases::new(1),
            Settings::default(),
            3,
            Bounds::new(1280.0, 720.0),
        );
        s.start(&[], 0.0);
        s.tuning.glitch_chance = 1.0;
        s.state.level = 10;
        s.remount_targets(0.0);

        assert!(s.advance(2000.0));
        assert_eq!(s.targets()[0].opacity, s.tuning().glitch_opacity);
        s.advance(2149.0);
        assert_eq!(s.targets()[0].opacity, s.tuning().glitch_opacity);
        s.advance(2150.0);
        assert_eq!(s.targets()[0].opacity, 1.0);
    }

    #[test]
    fn test_reduced_motion_skips_glitch_timer() {
        let mut s = Session::new(
            MemoryStore::new(),
            CannedPhrases::new(1),
            Settings {
                reduced_motion: true,
                ..Settings::default()
            },
            3,
            Bounds::new(1280.0, 720.0),
        );
        s.start(&[], 0.0);
        s.state.level = 10;
        s.remount_targets(0.0);
        let key = s.targets()[0].key;
        assert!(s.scheduler.has_task(key, TimerKind::Drift));
        assert!(!s.scheduler.has_task(key, TimerKind::Glitch));
    }

    #[test]
    fn test_hover_not_counted_while_menu() {
        let mut s = session(GameMode::Solo);
        assert!(!s.pointer_enter(0));
    }

    /// Hit the button `hits` times, then miss until patience runs out
    fn play_round(s: &mut TestSession, name: &str, hits: usize, now: f64) {
        s.start(&[Some(name.to_string())], now);
        for _ in 0..hits {
            let pos = s.targets()[0].pos;
            assert_eq!(s.pointer_down(pos, now).routed, Routed::Target(0));
        }
        while s.state().is_playing() {
            let spot = empty_spot(s);
            s.pointer_down(spot, now);
        }
    }

    #[test]
    fn test_ranked_rounds_fill_leaderboard() {
        let mut s = session(GameMode::Leaderboard);
        play_round(&mut s, "A", 1, 1_709_208_000_000.0);
        play_round(&mut s, "B", 3, 1_709_208_000_000.0);
        assert_eq!(s.placements()[0].rank, 1);
        play_round(&mut s, "C", 2, 1_709_208_000_000.0);
        assert_eq!(s.placements()[0].rank, 2);

        let saved = HighScores::load(&s.store);
        let names: Vec<&str> = saved.entries.iter().map(|e| e.nickname.as_str()).collect();
        assert_eq!(names, ["B", "C", "A"]);
        assert!(saved.entries.iter().all(|e| e.date == "2024-02-29"));
    }

    #[test]
    fn test_unranked_modes_skip_leaderboard() {
        let mut s = session(GameMode::Solo);
        play_round(&mut s, "A", 2, 0.0);
        assert!(s.placements().is_empty());
        assert!(s.high_scores().is_empty());
    }

    #[test]
    fn test_final_rank() {
        let mut s = session(GameMode::Leaderboard);
        assert_eq!(s.final_rank(0), None);
        play_round(&mut s, "A", 3, 0.0);
        assert_eq!(s.final_rank(0), Some(1));
        play_round(&mut s, "B", 1, 0.0);
        assert_eq!(s.final_rank(0), Some(2));

        // Unranked games only report where they would have landed
        let mut settings = s.settings().clone();
        settings.mode = GameMode::Solo;
        s.update_settings(settings);
        play_round(&mut s, "C", 2, 0.0);
        assert_eq!(s.final_rank(0), Some(2));
        assert_eq!(s.high_scores().entries.len(), 2);
    }

    #[test]
    fn test_corrupt_scores_are_replaced() {
        let store = MemoryStore::new().with_item(HighScores::STORAGE_KEY, "{not json");
        let mut s = Session::new(
            store,
            CannedPhrases::new(1),
            Settings::from_mode(GameMode::Leaderboard),
            42,
            Bounds::new(1280.0, 720.0),
        );
        assert!(s.high_scores().is_empty());
        play_round(&mut s, "A", 1, 0.0);
        assert_eq!(HighScores::load(&s.store).entries.len(), 1);
    }
}
