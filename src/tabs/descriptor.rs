//! Tab Descriptor Module
//!
//! Open-tab records and the tab-list state published by the tab store.

use serde::{Deserialize, Serialize};

// == Tab Descriptor ==
/// One open tab. `key` is unique within a [`TabState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabDescriptor {
    pub key: String,
    pub label: String,
    pub path: String,
    /// Pinned tabs (`false`) refuse explicit close and survive a reset
    pub closable: bool,
}

impl TabDescriptor {
    /// Creates a closable tab.
    pub fn new(key: impl Into<String>, label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            path: path.into(),
            closable: true,
        }
    }

    /// Creates a tab that cannot be closed, such as the dashboard home.
    pub fn pinned(key: impl Into<String>, label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            closable: false,
            ..Self::new(key, label, path)
        }
    }
}

// == Tab State ==
/// Snapshot of the tab list and the currently active key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TabState {
    pub tabs: Vec<TabDescriptor>,
    pub active_key: Option<String>,
}

impl TabState {
    pub fn tab(&self, key: &str) -> Option<&TabDescriptor> {
        self.tabs.iter().find(|tab| tab.key == key)
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.tabs.iter().position(|tab| tab.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tabs.iter().map(|tab| tab.key.as_str())
    }

    pub fn active_tab(&self) -> Option<&TabDescriptor> {
        self.active_key.as_deref().and_then(|key| self.tab(key))
    }
}
