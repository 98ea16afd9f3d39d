//! Trash-talk announcer
//!
//! Purely cosmetic commentary. The provider picks a line for an event
//! category; the announcer rate-limits requests and keeps the short list of
//! messages the HUD shows. Nothing here feeds back into game state.

use std::collections::VecDeque;

use rand::SeedableRng;
use rand::seq::IndexedRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Minimum time between two announcer lines (ms)
pub const DEFAULT_COOLDOWN_MS: f64 = 2000.0;
/// How long a line stays on screen (ms)
pub const DISPLAY_WINDOW_MS: f64 = 6000.0;
/// Lines shown at once
pub const MAX_VISIBLE: usize = 3;

/// Line shown when a session starts
pub const OPENING_TAUNT: &str = "Go on then. Catch it if you can.";

/// Tone of a line, used for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrashTalkCategory {
    Insult,
    Praise,
    Taunt,
}

impl TrashTalkCategory {
    /// Categorize an event name: anything mentioning a miss is an insult
    pub fn for_event(event: &str) -> Self {
        if is_miss_event(event) {
            TrashTalkCategory::Insult
        } else {
            TrashTalkCategory::Praise
        }
    }
}

fn is_miss_event(event: &str) -> bool {
    event.to_lowercase().contains("miss")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrashTalkMessage {
    pub text: String,
    pub category: TrashTalkCategory,
    /// When the line was posted (ms)
    pub timestamp: f64,
}

/// Source of announcer lines
pub trait TrashTalkProvider {
    fn provide(&mut self, category: &str) -> String;
}

impl<F: FnMut(&str) -> String> TrashTalkProvider for F {
    fn provide(&mut self, category: &str) -> String {
        self(category)
    }
}

const INSULTS: &[&str] = &[
    "Nice miss, slow-poke.",
    "My grandma clicks faster than that.",
    "Are you even trying?",
    "The button is right there. Mostly.",
    "Maybe try a different game? Like solitaire?",
    "Error 404: Skill not found.",
    "I've seen bots with better aim.",
    "Is your mouse broken or just your spirit?",
    "That was embarrassing to watch.",
    "You're making the button laugh.",
    "Click harder, maybe that'll help. (It won't).",
    "Is that your best? Really?",
];

const PRAISE: &[&str] = &[
    "Lucky shot.",
    "Finally.",
    "Even a blind squirrel finds a nut.",
    "Don't get cocky.",
    "Pure fluke.",
    "About time.",
    "Stop hacking.",
];

/// Built-in phrase lists
#[derive(Debug, Clone)]
pub struct CannedPhrases {
    rng: Pcg32,
}

impl CannedPhrases {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn candidates(category: &str) -> &'static [&'static str] {
        if is_miss_event(category) { INSULTS } else { PRAISE }
    }
}

impl TrashTalkProvider for CannedPhrases {
    fn provide(&mut self, category: &str) -> String {
        Self::candidates(category)
            .choose(&mut self.rng)
            .map(|s| s.to_string())
            .unwrap_or_default()
    }
}

/// Cooldown gate plus the on-screen message log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcer {
    pub cooldown_ms: f64,
    pub display_ms: f64,
    /// Time of the last gated line
    last_ms: Option<f64>,
    messages: VecDeque<TrashTalkMessage>,
}

impl Default for Announcer {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN_MS)
    }
}

impl Announcer {
    pub fn new(cooldown_ms: f64) -> Self {
        Self {
            cooldown_ms,
            display_ms: DISPLAY_WINDOW_MS,
            last_ms: None,
            messages: VecDeque::new(),
        }
    }

    /// Whether a gated request at `now_ms` would go through
    pub fn ready(&self, now_ms: f64) -> bool {
        self.last_ms
            .map(|last| now_ms - last >= self.cooldown_ms)
            .unwrap_or(true)
    }

    /// Ask for a line about `event`; dropped while cooling down
    pub fn request(
        &mut self,
        event: &str,
        now_ms: f64,
        provider: &mut dyn TrashTalkProvider,
    ) -> Option<&TrashTalkMessage> {
        if !self.ready(now_ms) {
            return None;
        }
        self.last_ms = Some(now_ms);
        let text = provider.provide(event);
        self.push(TrashTalkMessage {
            text,
            category: TrashTalkCategory::for_event(event),
            timestamp: now_ms,
        });
        self.messages.back()
    }

    /// Post a fixed taunt, bypassing the cooldown
    pub fn taunt(&mut self, text: &str, now_ms: f64) {
        self.push(TrashTalkMessage {
            text: text.to_string(),
            category: TrashTalkCategory::Taunt,
            timestamp: now_ms,
        });
    }

    fn push(&mut self, msg: TrashTalkMessage) {
        self.messages.push_back(msg);
        while self.messages.len() > MAX_VISIBLE {
            self.messages.pop_front();
        }
    }

    /// Lines to draw at `now_ms`, oldest first
    pub fn visible(&self, now_ms: f64) -> Vec<&TrashTalkMessage> {
        self.messages
            .iter()
            .filter(|m| now_ms - m.timestamp < self.display_ms)
            .collect()
    }

    /// Forget every line and the cooldown
    pub fn clear(&mut self) {
        self.messages.clear();
        self.last_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canned_phrases_by_category() {
        let mut p = CannedPhrases::new(1);
        for _ in 0..20 {
            assert!(INSULTS.contains(&p.provide("user missed the button").as_str()));
            assert!(PRAISE.contains(&p.provide("user hit a combo").as_str()));
        }
    }

    #[test]
    fn test_category_for_event() {
        assert_eq!(TrashTalkCategory::for_event("miss"), TrashTalkCategory::Insult);
        assert_eq!(TrashTalkCategory::for_event("MISSED"), TrashTalkCategory::Insult);
        assert_eq!(TrashTalkCategory::for_event("combo"), TrashTalkCategory::Praise);
    }

    #[test]
    fn test_cooldown() {
        let mut a = Announcer::new(2000.0);
        let mut p = |_: &str| "line".to_string();
        assert!(a.request("miss", 0.0, &mut p).is_some());
        assert!(a.request("miss", 500.0, &mut p).is_none());
        assert!(a.request("miss", 1999.0, &mut p).is_none());
        assert!(a.request("combo", 2000.0, &mut p).is_some());
        assert_eq!(a.visible(2000.0).len(), 2);
    }

    #[test]
    fn test_flood_yields_one_per_window() {
        let mut a = Announcer::new(2000.0);
        let mut p = CannedPhrases::new(3);
        let mut posted = 0;
        // One request every 10ms for 10 seconds
        for i in 0..1000 {
            if a.request("miss", i as f64 * 10.0, &mut p).is_some() {
                posted += 1;
            }
        }
        assert_eq!(posted, 5);
    }

    #[test]
    fn test_only_three_visible() {
        let mut a = Announcer::new(0.0);
        let mut p = |c: &str| c.to_string();
        for i in 0..5 {
            a.request(&format!("event {}", i), i as f64, &mut p);
        }
        let shown: Vec<&str> = a.visible(10.0).iter().map(|m| m.text.as_str()).collect();
        assert_eq!(shown, vec!["event 2", "event 3", "event 4"]);
    }

    #[test]
    fn test_messages_expire() {
        let mut a = Announcer::default();
        a.taunt(OPENING_TAUNT, 0.0);
        assert_eq!(a.visible(100.0)[0].category, TrashTalkCategory::Taunt);
        assert!(a.visible(DISPLAY_WINDOW_MS).is_empty());
    }

    #[test]
    fn test_taunt_does_not_consume_cooldown() {
        let mut a = Announcer::default();
        a.taunt(OPENING_TAUNT, 0.0);
        let mut p = CannedPhrases::new(9);
        assert!(a.request("miss", 1.0, &mut p).is_some());
    }
}
