//! The evasive button
//!
//! A target only knows its own geometry and how to run away. When it moves
//! and which player it belongs to is decided by the session.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::rules::TargetTuning;

/// Size of the play surface in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        self.size() / 2.0
    }

    /// Allowed `[min, max]` box for a target centre with `padding` on each side.
    ///
    /// Axes narrower than `2 * padding` collapse to their midpoint.
    pub fn padded(&self, padding: f32) -> (Vec2, Vec2) {
        let size = self.size();
        let pad = Vec2::splat(padding.max(0.0));
        let lo = pad.min(size / 2.0);
        let hi = (size - pad).max(size / 2.0);
        (lo, hi)
    }
}

/// Pick a uniformly random point inside the padded bounds
pub fn reposition<R: Rng>(bounds: Bounds, padding: f32, rng: &mut R) -> Vec2 {
    let (lo, hi) = bounds.padded(padding);
    let x = if hi.x > lo.x { rng.random_range(lo.x..=hi.x) } else { lo.x };
    let y = if hi.y > lo.y { rng.random_range(lo.y..=hi.y) } else { lo.y };
    Vec2::new(x, y)
}

/// Identifies one mounted incarnation of a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetKey {
    /// Seat the target belongs to
    pub player: usize,
    /// Bumped on every remount
    pub generation: u32,
}

/// A player's button
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub key: TargetKey,
    /// Centre position in play-area pixels
    pub pos: Vec2,
    /// Multiplier on the base radius
    pub scale: f32,
    /// Render opacity, only changed by the glitch flicker
    pub opacity: f32,
    /// Pointer currently over the button
    pub hovered: bool,
}

impl Target {
    /// Mount a target for `player` at a random spot
    pub fn mount<R: Rng>(player: usize, bounds: Bounds, tuning: &TargetTuning, rng: &mut R) -> Self {
        Self {
            key: TargetKey {
                player,
                generation: 0,
            },
            pos: reposition(bounds, tuning.padding, rng),
            scale: 1.0,
            opacity: 1.0,
            hovered: false,
        }
    }

    /// Start a new incarnation, invalidating timers tied to the old one
    pub fn remount(&mut self) {
        self.key.generation = self.key.generation.wrapping_add(1);
        self.opacity = 1.0;
    }

    /// Radius of the clickable circle
    pub fn hit_radius(&self, tuning: &TargetTuning) -> f32 {
        tuning.radius * self.scale
    }

    /// Whether a pointer at `point` lands on the button.
    ///
    /// Opacity is ignored so the button stays clickable mid-flicker.
    pub fn contains(&self, point: Vec2, tuning: &TargetTuning) -> bool {
        self.pos.distance_squared(point) <= self.hit_radius(tuning).powi(2)
    }

    /// Jump to a new random spot
    pub fn relocate<R: Rng>(&mut self, bounds: Bounds, tuning: &TargetTuning, rng: &mut R) {
        self.pos = reposition(bounds, tuning.padding, rng);
        log::debug!(
            "Target {} moved to ({:.0}, {:.0})",
            self.key.player,
            self.pos.x,
            self.pos.y
        );
    }

    /// Move and shrink after being hit at `level`
    pub fn on_hit<R: Rng>(&mut self, level: u32, bounds: Bounds, tuning: &TargetTuning, rng: &mut R) {
        self.relocate(bounds, tuning, rng);
        self.scale = tuning.shrink_scale(level);
    }

    /// Pointer entered the button; returns true if it fled
    pub fn on_pointer_enter<R: Rng>(
        &mut self,
        level: u32,
        bounds: Bounds,
        tuning: &TargetTuning,
        rng: &mut R,
    ) -> bool {
        let fled = rng.random::<f32>() < tuning.hover_evade_chance(level);
        if fled {
            self.relocate(bounds, tuning, rng);
        }
        // A button that fled is no longer under the cursor
        self.hovered = !fled;
        fled
    }

    pub fn on_pointer_leave(&mut self) {
        self.hovered = false;
    }

    /// Idle drift tick; returns true if the target moved
    pub fn on_drift<R: Rng>(&mut self, bounds: Bounds, tuning: &TargetTuning, rng: &mut R) -> bool {
        if self.hovered {
            return false;
        }
        let moved = rng.random_bool(tuning.drift_chance.clamp(0.0, 1.0));
        if moved {
            self.relocate(bounds, tuning, rng);
        }
        moved
    }

    /// Glitch tick; returns true if the flicker started
    pub fn on_glitch<R: Rng>(&mut self, tuning: &TargetTuning, rng: &mut R) -> bool {
        let flicker = rng.random_bool(tuning.glitch_chance.clamp(0.0, 1.0));
        if flicker {
            self.opacity = tuning.glitch_opacity;
        }
        flicker
    }

    pub fn end_glitch(&mut self) {
        self.opacity = 1.0;
    }

    /// Pull the target back inside new bounds after a resize
    pub fn clamp_into(&mut self, bounds: Bounds, tuning: &TargetTuning) {
        let (lo, hi) = bounds.padded(tuning.padding);
        self.pos = self.pos.clamp(lo, hi);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(7)
    }

    #[test]
    fn test_padded_small_bounds_collapse() {
        let (lo, hi) = Bounds::new(200.0, 1000.0).padded(120.0);
        assert_eq!(lo.x, 100.0);
        assert_eq!(hi.x, 100.0);
        assert_eq!(lo.y, 120.0);
        assert_eq!(hi.y, 880.0);

        let pos = reposition(Bounds::new(200.0, 1000.0), 120.0, &mut rng());
        assert_eq!(pos.x, 100.0);
    }

    #[test]
    fn test_contains_uses_scale() {
        let tuning = TargetTuning::default();
        let mut t = Target::mount(0, Bounds::new(1280.0, 720.0), &tuning, &mut rng());
        t.pos = Vec2::new(500.0, 300.0);
        assert!(t.contains(Vec2::new(550.0, 300.0), &tuning));
        t.scale = 0.5;
        assert!(!t.contains(Vec2::new(550.0, 300.0), &tuning));
        assert!(t.contains(Vec2::new(520.0, 300.0), &tuning));

        // Still clickable while dimmed
        t.opacity = 0.3;
        assert!(t.contains(Vec2::new(520.0, 300.0), &tuning));
    }

    #[test]
    fn test_on_hit_shrinks() {
        let tuning = TargetTuning::default();
        let bounds = Bounds::new(1280.0, 720.0);
        let mut r = rng();
        let mut t = Target::mount(0, bounds, &tuning, &mut r);
        t.on_hit(5, bounds, &tuning, &mut r);
        assert!((t.scale - 0.85).abs() < 1e-6);
    }

    #[test]
    fn test_drift_skipped_while_hovered() {
        let tuning = TargetTuning {
            drift_chance: 1.0,
            ..TargetTuning::default()
        };
        let bounds = Bounds::new(1280.0, 720.0);
        let mut r = rng();
        let mut t = Target::mount(0, bounds, &tuning, &mut r);
        t.hovered = true;
        let before = t.pos;
        assert!(!t.on_drift(bounds, &tuning, &mut r));
        assert_eq!(t.pos, before);

        t.on_pointer_leave();
        assert!(t.on_drift(bounds, &tuning, &mut r));
    }

    #[test]
    fn test_hover_evasion_certain_and_never() {
        let bounds = Bounds::new(1280.0, 720.0);
        let mut r = rng();
        let always = TargetTuning {
            hover_base: 1.0,
            hover_cap: 1.0,
            ..TargetTuning::default()
        };
        let never = TargetTuning {
            hover_base: 0.0,
            hover_step: 0.0,
            ..TargetTuning::default()
        };
        let mut t = Target::mount(0, bounds, &always, &mut r);
        assert!(t.on_pointer_enter(1, bounds, &always, &mut r));
        assert!(!t.hovered);
        assert!(!t.on_pointer_enter(30, bounds, &never, &mut r));
        assert!(t.hovered);
    }

    #[test]
    fn test_drift_resumes_after_fleeing() {
        let bounds = Bounds::new(1280.0, 720.0);
        let mut r = rng();
        let tuning = TargetTuning {
            hover_base: 1.0,
            hover_cap: 1.0,
            drift_chance: 1.0,
            ..TargetTuning::default()
        };
        let mut t = Target::mount(0, bounds, &tuning, &mut r);
        assert!(t.on_pointer_enter(1, bounds, &tuning, &mut r));

        let before = t.pos;
        assert!(t.on_drift(bounds, &tuning, &mut r));
        assert_ne!(t.pos, before);
    }

    #[test]
    fn test_glitch_restores() {
        let tuning = TargetTuning {
            glitch_chance: 1.0,
            ..TargetTuning::default()
        };
        let mut r = rng();
        let mut t = Target::mount(0, Bounds::new(800.0, 600.0), &tuning, &mut r);
        assert!(t.on_glitch(&tuning, &mut r));
        assert_eq!(t.opacity, 0.3);
        t.end_glitch();
        assert_eq!(t.opacity, 1.0);
    }

    #[test]
    fn test_remount_bumps_generation() {
        let tuning = TargetTuning::default();
        let mut t = Target::mount(1, Bounds::new(800.0, 600.0), &tuning, &mut rng());
        let old = t.key;
        t.opacity = 0.3;
        t.remount();
        assert_eq!(t.key.player, 1);
        assert_ne!(t.key, old);
        assert_eq!(t.opacity, 1.0);
    }

    #[test]
    fn test_clamp_into_after_resize() {
        let tuning = TargetTuning::default();
        let mut t = Target::mount(0, Bounds::new(1920.0, 1080.0), &tuning, &mut rng());
        t.pos = Vec2::new(1700.0, 900.0);
        t.clamp_into(Bounds::new(800.0, 600.0), &tuning);
        assert_eq!(t.pos, Vec2::new(680.0, 480.0));
    }

    proptest! {
        #[test]
        fn prop_reposition_within_padding(
            seed in any::<u64>(),
            w in 240.0f32..4000.0,
            h in 240.0f32..4000.0,
        ) {
            let mut r = Pcg32::seed_from_u64(seed);
            let padding = 120.0;
            let pos = reposition(Bounds::new(w, h), padding, &mut r);
            prop_assert!(pos.x >= padding && pos.x <= w - padding);
            prop_assert!(pos.y >= padding && pos.y <= h - padding);
        }
    }
}
