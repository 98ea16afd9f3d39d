//! Game settings and preferences
//!
//! Persisted separately from the leaderboard, under their own key.

use serde::{Deserialize, Serialize};

use crate::announcer::DEFAULT_COOLDOWN_MS;
use crate::persistence::{KeyValueStore, StoreError};
use crate::sim::{GameMode, Ruleset, TargetTuning};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Game picked on the menu
    pub mode: GameMode,
    /// In versus, a miss costs both players patience
    pub shared_failure: bool,

    // === Announcer ===
    /// Show trash talk at all
    pub announcer: bool,
    /// Minimum gap between announcer lines (ms)
    pub announcer_cooldown_ms: f64,

    // === Visual Effects ===
    /// Screen shake on misses
    pub screen_shake: bool,
    /// Glitch flicker at high levels
    pub glitch_effects: bool,

    // === Accessibility ===
    /// Reduced motion (no shake, no flicker)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: GameMode::Solo,
            shared_failure: true,

            announcer: true,
            announcer_cooldown_ms: DEFAULT_COOLDOWN_MS,

            screen_shake: true,
            glitch_effects: true,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Create settings for a mode (other fields default)
    pub fn from_mode(mode: GameMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Engine rules for the selected mode
    pub fn ruleset(&self) -> Ruleset {
        Ruleset::for_mode(self.mode, self.shared_failure)
    }

    /// Button tuning for the selected mode
    pub fn tuning(&self) -> TargetTuning {
        TargetTuning::for_mode(self.mode)
    }

    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Effective glitch flicker (respects reduced_motion)
    pub fn effective_glitch(&self) -> bool {
        self.glitch_effects && !self.reduced_motion
    }

    /// Storage key
    pub const STORAGE_KEY: &'static str = "rage_clicker_settings";

    /// Load settings, falling back to defaults
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring corrupt settings: {}", e),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Could not read settings: {}", e),
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings
    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        let json = serde_json::to_string(self)?;
        store.set(Self::STORAGE_KEY, &json)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::sim::LevelUpPolicy;

    #[test]
    fn test_reduced_motion_overrides() {
        let settings = Settings {
            reduced_motion: true,
            ..Settings::default()
        };
        assert!(!settings.effective_screen_shake());
        assert!(!settings.effective_glitch());
        assert!(Settings::default().effective_glitch());
    }

    #[test]
    fn test_ruleset_from_mode() {
        let mut settings = Settings::from_mode(GameMode::Versus);
        assert_eq!(settings.ruleset().level_up_policy, LevelUpPolicy::Combined);
        assert!(settings.ruleset().shared_failure);
        settings.shared_failure = false;
        assert!(!settings.ruleset().shared_failure);
        assert_eq!(Settings::from_mode(GameMode::Leaderboard).tuning().drift_level, 5);
    }

    #[test]
    fn test_save_load() {
        let mut store = MemoryStore::new();
        let settings = Settings {
            mode: GameMode::Leaderboard,
            announcer: false,
            ..Settings::default()
        };
        settings.save(&mut store).unwrap();
        assert_eq!(Settings::load(&store), settings);
    }

    #[test]
    fn test_partial_and_corrupt() {
        let partial = MemoryStore::new().with_item(Settings::STORAGE_KEY, r#"{"mode":"Versus"}"#);
        let loaded = Settings::load(&partial);
        assert_eq!(loaded.mode, GameMode::Versus);
        assert!(loaded.announcer);

        let corrupt = MemoryStore::new().with_item(Settings::STORAGE_KEY, "[]]");
        assert_eq!(Settings::load(&corrupt), Settings::default());
    }
}
