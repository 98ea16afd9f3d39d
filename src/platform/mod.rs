//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time
//! - Run seeds
//! - The default key-value store

use crate::persistence::KeyValueStore;

/// Milliseconds since the unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Milliseconds since the unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// A seed that differs between runs
pub fn clock_seed() -> u64 {
    (now_ms() as u64) ^ 0x9E37_79B9_7F4A_7C15
}

/// LocalStorage when available, otherwise an in-memory store
#[cfg(target_arch = "wasm32")]
pub fn default_store() -> Box<dyn KeyValueStore> {
    match crate::persistence::LocalStorage::open() {
        Ok(storage) => Box::new(storage),
        Err(e) => {
            log::warn!("{}; scores will not persist", e);
            Box::new(crate::persistence::MemoryStore::new())
        }
    }
}

/// In-memory store (native builds have no persistent backend)
#[cfg(not(target_arch = "wasm32"))]
pub fn default_store() -> Box<dyn KeyValueStore> {
    Box::new(crate::persistence::MemoryStore::new())
}
