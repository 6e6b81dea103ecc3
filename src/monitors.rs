//! Monitor enumeration
//!
//! `MonitorProbe` is the platform primitive; `MonitorEnumerator` adds index
//! validation and an optional snapshot cache on top of it. Indexes are only
//! meaningful within one snapshot.

use std::sync::RwLock;

use log::{debug, warn};

use crate::error::{CaptureError, Result};
use crate::geometry::Rectangle;

/// Source of active monitor rectangles, in platform enumeration order
pub trait MonitorProbe: Send + Sync {
    fn probe(&self) -> Result<Vec<Rectangle>>;

    /// Number of active monitors, without building their rectangles where the
    /// platform allows it.
    fn count(&self) -> Result<usize> {
        self.probe().map(|m| m.len())
    }
}

impl<P: MonitorProbe + ?Sized> MonitorProbe for Box<P> {
    fn probe(&self) -> Result<Vec<Rectangle>> {
        (**self).probe()
    }

    fn count(&self) -> Result<usize> {
        (**self).count()
    }
}

#[derive(Debug)]
pub struct MonitorEnumerator<P> {
    probe: P,
    cache_enabled: bool,
    cached: RwLock<Option<Vec<Rectangle>>>,
}

impl<P: MonitorProbe> MonitorEnumerator<P> {
    pub fn new(probe: P, cache_enabled: bool) -> Self {
        Self {
            probe,
            cache_enabled,
            cached: RwLock::new(None),
        }
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Every active monitor's bounds.
    ///
    /// With caching on, the first successful enumeration is kept until
    /// [`invalidate`](Self::invalidate). Failures are never cached.
    pub fn all_bounds(&self) -> Result<Vec<Rectangle>> {
        if self.cache_enabled {
            if let Some(cached) = self.cached.read().ok().and_then(|c| c.clone()) {
                return Ok(cached);
            }
        }

        let monitors = self.probe.probe()?;
        debug!("Enumerated {} monitor(s)", monitors.len());

        if self.cache_enabled {
            if let Ok(mut cached) = self.cached.write() {
                *cached = Some(monitors.clone());
            }
        }
        Ok(monitors)
    }

    /// Bounds of the monitor at `index`.
    pub fn bounds(&self, index: i64) -> Result<Rectangle> {
        let monitors = self.all_bounds()?;
        usize::try_from(index)
            .ok()
            .and_then(|i| monitors.get(i).copied())
            .ok_or(CaptureError::Index {
                index,
                count: monitors.len(),
            })
    }

    /// Finite iterator over one snapshot. Each call starts a new one.
    pub fn iter(&self) -> Result<std::vec::IntoIter<Rectangle>> {
        self.all_bounds().map(Vec::into_iter)
    }

    /// Bounding box of every monitor (the virtual desktop).
    pub fn virtual_bounds(&self) -> Result<Rectangle> {
        self.all_bounds().map(|m| Rectangle::bounding(&m))
    }

    /// Active monitor count through a separate counting pass, 0 on failure.
    ///
    /// A count that disagrees with the cached snapshot drops the snapshot, so
    /// indexes below the returned count resolve against the current layout.
    pub fn count(&self) -> usize {
        let count = match self.probe.count() {
            Ok(n) => n,
            Err(e) => {
                warn!("Monitor count failed: {}", e);
                return 0;
            }
        };

        let cached_len = self
            .cached
            .read()
            .ok()
            .and_then(|c| c.as_ref().map(Vec::len));
        if let Some(cached_len) = cached_len.filter(|&len| len != count) {
            debug!(
                "Monitor count changed from {} to {}, dropping snapshot",
                cached_len, count
            );
            self.invalidate();
        }
        count
    }

    /// Drop the cached snapshot so the next call enumerates again.
    pub fn invalidate(&self) {
        if let Ok(mut cached) = self.cached.write() {
            if cached.take().is_some() {
                debug!("Monitor cache invalidated");
            }
        }
    }

    pub fn is_cached(&self) -> bool {
        self.cached.read().map(|c| c.is_some()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Failing;

    impl MonitorProbe for Failing {
        fn probe(&self) -> Result<Vec<Rectangle>> {
            Err(CaptureError::Enumeration("EnumDisplayMonitors".into()))
        }
    }

    struct Counting(AtomicUsize);

    impl MonitorProbe for Counting {
        fn probe(&self) -> Result<Vec<Rectangle>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Rectangle::from_xywh(0, 0, 800, 600)])
        }
    }

    #[test]
    fn failed_enumeration_is_not_cached() {
        let monitors = MonitorEnumerator::new(Failing, true);
        assert!(monitors.all_bounds().is_err());
        assert!(!monitors.is_cached());
        assert_eq!(monitors.count(), 0);
    }

    #[test]
    fn uncached_enumerator_probes_every_call() {
        let monitors = MonitorEnumerator::new(Counting(AtomicUsize::new(0)), false);
        monitors.all_bounds().unwrap();
        monitors.bounds(0).unwrap();
        assert_eq!(monitors.probe().0.load(Ordering::SeqCst), 2);
        assert!(!monitors.is_cached());
    }

    #[test]
    fn index_past_the_end_reports_count() {
        let monitors = MonitorEnumerator::new(Counting(AtomicUsize::new(0)), true);
        assert_eq!(
            monitors.bounds(1),
            Err(CaptureError::Index { index: 1, count: 1 })
        );
    }
}
