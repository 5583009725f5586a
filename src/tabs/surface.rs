//! Mount Surface Module
//!
//! The single rendering slot views are swapped into.

use serde::Serialize;

/// Scroll position of the mount surface, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScrollOffsets {
    pub top: u32,
    pub left: u32,
}

impl ScrollOffsets {
    pub fn new(top: u32, left: u32) -> Self {
        Self { top, left }
    }
}

// == Mount Surface Trait ==
/// One content slot with readable and writable scroll offsets.
///
/// Mounting new content is expected to reset the offsets, the same way a
/// swapped DOM subtree starts at the top.
pub trait MountSurface {
    type View;

    /// Swaps the slot's content for `view`, rendered for tab `key`.
    fn mount(&mut self, key: &str, view: &Self::View);

    /// Key of the content currently in the slot.
    fn mounted_key(&self) -> Option<&str>;

    fn scroll_offsets(&self) -> ScrollOffsets;

    fn set_scroll_offsets(&mut self, offsets: ScrollOffsets);
}

// == Memory Surface ==
/// Headless surface holding a clone of the mounted view.
#[derive(Debug, Clone)]
pub struct MemorySurface<V> {
    mounted: Option<(String, V)>,
    offsets: ScrollOffsets,
    mounts: usize,
}

impl<V> Default for MemorySurface<V> {
    fn default() -> Self {
        Self {
            mounted: None,
            offsets: ScrollOffsets::default(),
            mounts: 0,
        }
    }
}

impl<V> MemorySurface<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mounted_view(&self) -> Option<&V> {
        self.mounted.as_ref().map(|(_, view)| view)
    }

    /// Number of content swaps so far.
    pub fn mount_count(&self) -> usize {
        self.mounts
    }
}

impl<V: Clone> MountSurface for MemorySurface<V> {
    type View = V;

    fn mount(&mut self, key: &str, view: &V) {
        self.mounted = Some((key.to_string(), view.clone()));
        self.offsets = ScrollOffsets::default();
        self.mounts += 1;
    }

    fn mounted_key(&self) -> Option<&str> {
        self.mounted.as_ref().map(|(key, _)| key.as_str())
    }

    fn scroll_offsets(&self) -> ScrollOffsets {
        self.offsets
    }

    fn set_scroll_offsets(&mut self, offsets: ScrollOffsets) {
        self.offsets = offsets;
    }
}
