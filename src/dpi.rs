//! DPI scaling
//!
//! Logical coordinates are multiplied by `dpi / 96` before they reach the
//! platform. Looked-up DPI values are memoized per display context; call
//! [`DpiCache::invalidate`] after a display configuration change, nothing
//! invalidates the cache on its own.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

use log::debug;

use crate::config::dpi::{BASELINE_DPI, ROUNDING_BIAS};

/// Scale a logical value to physical pixels, rounding half up.
///
/// DPI at or below the 96 baseline leaves the value untouched.
pub fn scale_for_dpi(value: i32, dpi: u32) -> i32 {
    if dpi <= BASELINE_DPI {
        return value;
    }
    let scaled = (value as i64 * dpi as i64 + ROUNDING_BIAS).div_euclid(BASELINE_DPI as i64);
    scaled.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Scale factor for a DPI value (1.0 at 96 DPI).
pub fn scale_factor(dpi: u32) -> f64 {
    dpi as f64 / BASELINE_DPI as f64
}

/// Per-context DPI memo. Concurrent readers, exclusive writers.
#[derive(Debug)]
pub struct DpiCache<K> {
    entries: RwLock<HashMap<K, u32>>,
}

impl<K> Default for DpiCache<K> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K> DpiCache<K>
where
    K: Eq + Hash + Copy + std::fmt::Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the stored DPI for `key`, or run `query` once and remember it.
    ///
    /// A zero result from `query` is answered with the baseline and not stored,
    /// so the next call asks the platform again.
    pub fn get_or_insert_with<F>(&self, key: K, query: F) -> u32
    where
        F: FnOnce() -> u32,
    {
        if let Some(dpi) = self.get(key) {
            return dpi;
        }

        let dpi = query();
        if dpi == 0 {
            debug!("DPI query for {:?} returned 0, using baseline", key);
            return BASELINE_DPI;
        }

        match self.entries.write() {
            Ok(mut entries) => *entries.entry(key).or_insert(dpi),
            Err(_) => dpi,
        }
    }

    pub fn get(&self, key: K) -> Option<u32> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(&key).copied())
    }

    /// Forget every stored value.
    pub fn invalidate(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
