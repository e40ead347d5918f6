//! Live palettes and their resize timers.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::settings::PluginSettings;

/// Handle of a registered palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PaletteId(u64);

/// Anything that re-renders when plugin settings change.
pub trait SettingsListener {
    fn settings_changed(&mut self, plugin: &PluginSettings);
}

/// Every palette currently on screen. Owned by the embedding layer and
/// passed to palettes as they load and unload.
#[derive(Debug)]
pub struct PaletteRegistry<T> {
    next: u64,
    entries: BTreeMap<PaletteId, T>,
}

impl<T> Default for PaletteRegistry<T> {
    fn default() -> Self {
        Self {
            next: 0,
            entries: BTreeMap::new(),
        }
    }
}

impl<T> PaletteRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entry: T) -> PaletteId {
        let id = PaletteId(self.next);
        self.next += 1;
        self.entries.insert(id, entry);
        log::debug!("registered palette {id:?}");
        id
    }

    pub fn unregister(&mut self, id: PaletteId) -> Option<T> {
        let entry = self.entries.remove(&id);
        if entry.is_some() {
            log::debug!("unregistered palette {id:?}");
        }
        entry
    }

    pub fn get(&self, id: PaletteId) -> Option<&T> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: PaletteId) -> Option<&mut T> {
        self.entries.get_mut(&id)
    }

    pub fn ids(&self) -> Vec<PaletteId> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: SettingsListener> PaletteRegistry<T> {
    /// Push new settings to every live palette. Returns who was refreshed.
    pub fn broadcast(&mut self, plugin: &PluginSettings) -> Vec<PaletteId> {
        for entry in self.entries.values_mut() {
            entry.settings_changed(plugin);
        }
        log::debug!("settings broadcast to {} palettes", self.entries.len());
        self.ids()
    }
}

/// Trailing-edge debounce of resize signals, one timer per palette.
#[derive(Debug, Clone)]
pub struct ResizeDebouncer<K = PaletteId> {
    delay: Duration,
    pending: BTreeMap<K, (Instant, f64)>,
}

impl<K: Ord + Copy> ResizeDebouncer<K> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: BTreeMap::new(),
        }
    }

    /// Record a resize, replacing any earlier pending one for `id`. Zero or
    /// negative widths come from hidden containers and are dropped.
    pub fn schedule(&mut self, id: K, width: f64, now: Instant) -> bool {
        if width <= 0.0 {
            return false;
        }
        self.pending.insert(id, (now + self.delay, width));
        true
    }

    pub fn cancel(&mut self, id: K) {
        self.pending.remove(&id);
    }

    pub fn is_pending(&self, id: K) -> bool {
        self.pending.contains_key(&id)
    }

    /// Earliest deadline, for sizing an event-loop poll.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|(at, _)| *at).min()
    }

    /// Remove and return resizes whose quiet period has passed.
    pub fn drain_due(&mut self, now: Instant) -> Vec<(K, f64)> {
        let due: Vec<(K, f64)> = self
            .pending
            .iter()
            .filter(|(_, (at, _))| *at <= now)
            .map(|(id, (_, width))| (*id, *width))
            .collect();
        for (id, _) in &due {
            self.pending.remove(id);
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        refreshes: usize,
        last_width: f64,
    }

    impl SettingsListener for Counter {
        fn settings_changed(&mut self, plugin: &PluginSettings) {
            self.refreshes += 1;
            self.last_width = plugin.width;
        }
    }

    #[test]
    fn ids_are_never_reused() {
        let mut registry = PaletteRegistry::new();
        let a = registry.register(Counter::default());
        registry.unregister(a);
        let b = registry.register(Counter::default());
        assert_ne!(a, b);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(a).is_none());
    }

    #[test]
    fn broadcast_reaches_live_palettes_only() {
        let mut registry = PaletteRegistry::new();
        let a = registry.register(Counter::default());
        let b = registry.register(Counter::default());
        let gone = registry.unregister(a).unwrap();
        assert_eq!(gone.refreshes, 0);

        let plugin = PluginSettings {
            width: 900.0,
            ..Default::default()
        };
        assert_eq!(registry.broadcast(&plugin), vec![b]);
        assert_eq!(registry.get(b).unwrap().refreshes, 1);
        assert_eq!(registry.get(b).unwrap().last_width, 900.0);
    }

    #[test]
    fn resizes_coalesce_to_last_signal() {
        let mut registry = PaletteRegistry::new();
        let id = registry.register(Counter::default());
        let mut debouncer = ResizeDebouncer::new(Duration::from_millis(5));
        let t0 = Instant::now();

        assert!(debouncer.schedule(id, 300.0, t0));
        assert!(debouncer.schedule(id, 320.0, t0 + Duration::from_millis(3)));
        assert!(debouncer.drain_due(t0 + Duration::from_millis(6)).is_empty());

        let due = debouncer.drain_due(t0 + Duration::from_millis(8));
        assert_eq!(due, vec![(id, 320.0)]);
        assert!(!debouncer.is_pending(id));
    }

    #[test]
    fn zero_size_and_cancel() {
        let mut registry = PaletteRegistry::new();
        let a = registry.register(Counter::default());
        let b = registry.register(Counter::default());
        let mut debouncer = ResizeDebouncer::new(Duration::from_millis(5));
        let t0 = Instant::now();

        assert!(!debouncer.schedule(a, 0.0, t0));
        assert!(!debouncer.is_pending(a));

        debouncer.schedule(a, 100.0, t0);
        debouncer.schedule(b, 200.0, t0 + Duration::from_millis(1));
        assert_eq!(debouncer.next_deadline(), Some(t0 + Duration::from_millis(5)));
        debouncer.cancel(a);
        assert_eq!(debouncer.drain_due(t0 + Duration::from_secs(1)), vec![(b, 200.0)]);
        assert_eq!(debouncer.next_deadline(), None);
    }
}
