//! Tab Store Module
//!
//! Reactive tab list: mutations publish a new [`TabState`] to every subscriber.

use tokio::sync::watch;
use tracing::debug;

use crate::tabs::descriptor::{TabDescriptor, TabState};

// == Tab Store ==
/// Owns the open-tab list and the active key.
///
/// Every mutating call returns whether the state changed; unchanged calls do
/// not wake subscribers.
#[derive(Debug)]
pub struct TabStore {
    tx: watch::Sender<TabState>,
    max_tabs: usize,
}

impl TabStore {
    // == Constructor ==
    /// Creates an empty store bounded to `max_tabs` tabs (at least one).
    pub fn new(max_tabs: usize) -> Self {
        let (tx, _) = watch::channel(TabState::default());
        Self {
            tx,
            max_tabs: max_tabs.max(1),
        }
    }

    /// Subscribes to state changes. The current state is marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<TabState> {
        self.tx.subscribe()
    }

    /// Current state.
    pub fn state(&self) -> TabState {
        self.tx.borrow().clone()
    }

    // == Open ==
    /// Opens a tab (or focuses it when the key is already open).
    ///
    /// At `max_tabs`, the oldest closable tab is closed to make room. When
    /// every open tab is pinned the open is refused and nothing changes.
    pub fn open(&self, tab: TabDescriptor) -> bool {
        let max_tabs = self.max_tabs;

        self.tx.send_if_modified(|state| {
            let key = tab.key.clone();
            let mut changed = false;

            if !state.contains(&key) {
                if state.tabs.len() >= max_tabs {
                    let Some(oldest) = state.tabs.iter().position(|t| t.closable) else {
                        debug!(
                            "Tab limit {} reached with only pinned tabs, not opening '{}'",
                            max_tabs, key
                        );
                        return false;
                    };
                    let dropped = state.tabs.remove(oldest);
                    debug!("Tab limit {} reached, closed '{}'", max_tabs, dropped.key);
                }
                state.tabs.push(tab);
                changed = true;
            }

            if state.active_key.as_deref() != Some(key.as_str()) {
                state.active_key = Some(key);
                changed = true;
            }

            changed
        })
    }

    // == Activate ==
    /// Makes an open tab active. Unknown keys are ignored.
    pub fn activate(&self, key: &str) -> bool {
        self.tx.send_if_modified(|state| {
            if !state.contains(key) || state.active_key.as_deref() == Some(key) {
                return false;
            }
            state.active_key = Some(key.to_string());
            true
        })
    }

    // == Close ==
    /// Closes a closable tab.
    ///
    /// Closing the active tab activates its right neighbour, else its left one.
    pub fn close(&self, key: &str) -> bool {
        self.tx.send_if_modified(|state| {
            let Some(index) = state.position(key) else {
                return false;
            };
            if !state.tabs[index].closable {
                debug!("Refusing to close pinned tab '{}'", key);
                return false;
            }

            state.tabs.remove(index);
            if state.active_key.as_deref() == Some(key) {
                let next = state
                    .tabs
                    .get(index)
                    .or_else(|| index.checked_sub(1).and_then(|i| state.tabs.get(i)));
                state.active_key = next.map(|tab| tab.key.clone());
            }
            true
        })
    }

    // == Close Others ==
    /// Closes every closable tab except `key`, which becomes active.
    pub fn close_others(&self, key: &str) -> bool {
        self.tx.send_if_modified(|state| {
            if !state.contains(key) {
                return false;
            }
            let before = state.tabs.len();
            state.tabs.retain(|tab| tab.key == key || !tab.closable);

            let refocused = state.active_key.as_deref() != Some(key);
            state.active_key = Some(key.to_string());
            refocused || state.tabs.len() != before
        })
    }

    // == Reset ==
    /// Ends the tab session: closable tabs are dropped, the first pinned tab
    /// (if any) becomes active.
    pub fn reset(&self) -> bool {
        self.tx.send_if_modified(|state| {
            let before = state.clone();
            state.tabs.retain(|tab| !tab.closable);
            state.active_key = state.tabs.first().map(|tab| tab.key.clone());
            *state != before
        })
    }

    pub fn max_tabs(&self) -> usize {
        self.max_tabs
    }
}
