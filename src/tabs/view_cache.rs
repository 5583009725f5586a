//! View Cache Module
//!
//! One cached view per open tab, with scroll offsets carried across switches.

use std::collections::HashMap;

use tracing::debug;

use crate::tabs::surface::{MountSurface, ScrollOffsets};

// == Cache Item ==
/// Cached view for one tab key.
#[derive(Debug, Clone)]
pub struct CacheItem<V> {
    pub view: V,
    /// Offsets captured when the tab was last deactivated
    pub scroll: ScrollOffsets,
}

#[derive(Debug)]
struct PendingRestore {
    key: String,
    offsets: ScrollOffsets,
}

// == View Cache ==
/// Keeps a mounted view per tab key and drives a single [`MountSurface`].
///
/// Per key: unmounted, then cached, active on activation, cached again on
/// deactivation, until evicted. At most one key is active. Eviction leaves
/// the surface's current content in place until the next activation.
pub struct ViewCache<S: MountSurface> {
    items: HashMap<String, CacheItem<S::View>>,
    active: Option<String>,
    surface: S,
    pending: Vec<PendingRestore>,
}

impl<S: MountSurface> ViewCache<S> {
    pub fn new(surface: S) -> Self {
        Self {
            items: HashMap::new(),
            active: None,
            surface,
            pending: Vec::new(),
        }
    }

    // == Activate ==
    /// Makes `key` the mounted view, creating its item from `content` on
    /// first activation.
    ///
    /// The outgoing item's offsets are captured before the swap. Restoring
    /// the incoming item's offsets is deferred to [`ViewCache::run_deferred`].
    pub fn activate<F>(&mut self, key: &str, content: F)
    where
        F: FnOnce() -> S::View,
    {
        if self.active.as_deref() == Some(key) && self.surface.mounted_key() == Some(key) {
            return;
        }

        self.deactivate();

        let item = self.items.entry(key.to_string()).or_insert_with(|| {
            debug!("Caching new view for tab '{}'", key);
            CacheItem {
                view: content(),
                scroll: ScrollOffsets::default(),
            }
        });

        self.surface.mount(key, &item.view);
        self.pending.push(PendingRestore {
            key: key.to_string(),
            offsets: item.scroll,
        });
        self.active = Some(key.to_string());
    }

    // == Deactivate ==
    /// Captures the surface's offsets into the active item and clears the
    /// active key. The surface keeps its content.
    ///
    /// Offsets are left alone while the item's own restore is still queued,
    /// since the surface has not shown them yet.
    pub fn deactivate(&mut self) {
        let Some(key) = self.active.take() else {
            return;
        };

        let restore_queued = self.pending.iter().any(|restore| restore.key == key);
        if !restore_queued && self.surface.mounted_key() == Some(key.as_str()) {
            if let Some(item) = self.items.get_mut(&key) {
                item.scroll = self.surface.scroll_offsets();
            }
        }
    }

    // == Run Deferred ==
    /// Applies queued scroll restores once the surface shows the new content.
    ///
    /// A restore whose key is no longer mounted is dropped. Returns how many
    /// restores were applied.
    pub fn run_deferred(&mut self) -> usize {
        let mut applied = 0;

        for restore in std::mem::take(&mut self.pending) {
            if self.surface.mounted_key() == Some(restore.key.as_str()) {
                self.surface.set_scroll_offsets(restore.offsets);
                applied += 1;
            } else {
                debug!("Dropping stale scroll restore for '{}'", restore.key);
            }
        }

        applied
    }

    // == Reconcile ==
    /// Evicts every cached key missing from `tab_keys`. Returns the evicted keys.
    pub fn reconcile<'a, I>(&mut self, tab_keys: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let open: std::collections::HashSet<&str> = tab_keys.into_iter().collect();
        let mut stale: Vec<String> = self
            .items
            .keys()
            .filter(|key| !open.contains(key.as_str()))
            .cloned()
            .collect();
        stale.sort();

        for key in &stale {
            self.evict(key);
        }
        stale
    }

    // == Evict ==
    /// Drops the item for `key`. A later activation starts from scratch.
    pub fn evict(&mut self, key: &str) -> bool {
        if self.active.as_deref() == Some(key) {
            self.active = None;
        }
        self.pending.retain(|restore| restore.key != key);

        let removed = self.items.remove(key).is_some();
        if removed {
            debug!("Evicted cached view for tab '{}'", key);
        }
        removed
    }

    // == Purge ==
    /// Drops every item. Returns how many were held.
    pub fn purge(&mut self) -> usize {
        let count = self.items.len();
        self.items.clear();
        self.pending.clear();
        self.active = None;
        count
    }

    /// Cached keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.items.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn item(&self, key: &str) -> Option<&CacheItem<S::View>> {
        self.items.get(key)
    }

    pub fn active_key(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabs::surface::MemorySurface;

    fn cache() -> ViewCache<MemorySurface<String>> {
        ViewCache::new(MemorySurface::new())
    }

    fn show(cache: &mut ViewCache<MemorySurface<String>>, key: &str) {
        cache.activate(key, || format!("view:{}", key));
        cache.run_deferred();
    }

    #[test]
    fn test_first_activation_creates_item() {
        let mut cache = cache();
        show(&mut cache, "a");

        assert_eq!(cache.keys(), vec!["a".to_string()]);
        assert_eq!(cache.active_key(), Some("a"));
        assert_eq!(cache.surface().mounted_key(), Some("a"));
        assert_eq!(cache.item("a").unwrap().scroll, ScrollOffsets::default());
    }

    #[test]
    fn test_reactivation_reuses_view() {
        let mut cache = cache();
        let mut renders = 0;

        for key in ["a", "b", "a"] {
            cache.activate(key, || {
                renders += 1;
                format!("view:{}", key)
            });
        }

        assert_eq!(renders, 2);
        assert_eq!(cache.surface().mounted_view(), Some(&"view:a".to_string()));
    }

    #[test]
    fn test_scroll_round_trip() {
        let mut cache = cache();
        show(&mut cache, "a");
        cache
            .surface_mut()
            .set_scroll_offsets(ScrollOffsets { top: 120, left: 50 });

        show(&mut cache, "b");
        assert_eq!(cache.surface().scroll_offsets(), ScrollOffsets::default());
        assert_eq!(cache.item("a").unwrap().scroll, ScrollOffsets::new(120, 50));

        show(&mut cache, "a");
        assert_eq!(cache.surface().scroll_offsets(), ScrollOffsets::new(120, 50));
    }

    #[test]
    fn test_restore_waits_for_deferred_run() {
        let mut cache = cache();
        show(&mut cache, "a");
        cache.surface_mut().set_scroll_offsets(ScrollOffsets::new(10, 0));
        show(&mut cache, "b");

        cache.activate("a", || unreachable!());
        assert_eq!(cache.surface().scroll_offsets(), ScrollOffsets::default());

        assert_eq!(cache.run_deferred(), 1);
        assert_eq!(cache.surface().scroll_offsets(), ScrollOffsets::new(10, 0));
    }

    #[test]
    fn test_stale_restore_is_noop() {
        let mut cache = cache();
        show(&mut cache, "a");
        cache.surface_mut().set_scroll_offsets(ScrollOffsets::new(300, 0));
        show(&mut cache, "b");

        // Rapid switch: a then b again before the surface settles
        cache.activate("a", || unreachable!());
        cache.activate("b", || unreachable!());

        assert_eq!(cache.run_deferred(), 1);
        assert_eq!(cache.surface().mounted_key(), Some("b"));
        assert_eq!(cache.surface().scroll_offsets(), ScrollOffsets::default());
        assert_eq!(cache.item("a").unwrap().scroll, ScrollOffsets::new(300, 0));
    }

    #[test]
    fn test_reconcile_drops_closed_tabs() {
        let mut cache = cache();
        for key in ["A", "B", "C", "D"] {
            show(&mut cache, key);
        }

        let evicted = cache.reconcile(["A", "C"]);

        assert_eq!(evicted, vec!["B".to_string(), "D".to_string()]);
        assert_eq!(cache.keys(), vec!["A".to_string(), "C".to_string()]);
    }

    #[test]
    fn test_evicted_key_starts_over() {
        let mut cache = cache();
        show(&mut cache, "a");
        cache.surface_mut().set_scroll_offsets(ScrollOffsets::new(40, 4));
        show(&mut cache, "b");

        assert!(cache.evict("a"));
        assert!(!cache.evict("a"));

        cache.activate("a", || "fresh".to_string());
        cache.run_deferred();

        assert_eq!(cache.item("a").unwrap().view, "fresh");
        assert_eq!(cache.surface().scroll_offsets(), ScrollOffsets::default());
    }

    #[test]
    fn test_purge_empties_cache() {
        let mut cache = cache();
        for key in ["a", "b", "c"] {
            show(&mut cache, key);
        }

        assert_eq!(cache.purge(), 3);
        assert!(cache.is_empty());
        assert_eq!(cache.active_key(), None);

        // The active tab is rebuilt on its next activation
        cache.activate("c", || "rebuilt".to_string());
        assert_eq!(cache.item("c").unwrap().view, "rebuilt");
    }
}
