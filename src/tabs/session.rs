//! View Session Module
//!
//! Event loop binding a [`ViewCache`] to the tab store, to session-ending
//! events, and to an explicit debug handle.

use std::collections::BTreeMap;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{CacheError, Result};
use crate::tabs::descriptor::{TabDescriptor, TabState};
use crate::tabs::surface::{MountSurface, ScrollOffsets};
use crate::tabs::view_cache::ViewCache;

// == Session Events ==
/// Browser-level events that end the view session and purge the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    PageUnload,
    VisibilityHidden,
    WindowBlur,
}

// == View Factory ==
/// Renders the view content for a tab on its first activation.
pub trait ViewFactory<V>: Send + 'static {
    fn render(&self, tab: &TabDescriptor) -> V;
}

impl<V, F> ViewFactory<V> for F
where
    F: Fn(&TabDescriptor) -> V + Send + 'static,
{
    fn render(&self, tab: &TabDescriptor) -> V {
        self(tab)
    }
}

/// Read-only view of the session's cache and surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheSnapshot {
    /// Cached keys with their saved scroll offsets
    pub items: BTreeMap<String, ScrollOffsets>,
    pub active_key: Option<String>,
    pub mounted_key: Option<String>,
    pub surface_offsets: ScrollOffsets,
}

impl CacheSnapshot {
    pub fn keys(&self) -> Vec<&str> {
        self.items.keys().map(String::as_str).collect()
    }
}

enum Command {
    Clear(String, oneshot::Sender<bool>),
    ClearAll(oneshot::Sender<usize>),
    Event(SessionEvent),
    ScrollTo(ScrollOffsets),
    Snapshot(oneshot::Sender<CacheSnapshot>),
}

// == View Cache Handle ==
/// Handle onto a running view session.
///
/// Calls fail with [`CacheError::SessionClosed`] once the session has ended.
#[derive(Debug, Clone)]
pub struct ViewCacheHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl ViewCacheHandle {
    /// Evicts one cached view. Returns whether it was cached.
    pub async fn clear(&self, key: &str) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Clear(key.to_string(), reply))?;
        rx.await.map_err(|_| CacheError::SessionClosed)
    }

    /// Evicts every cached view. Returns how many were cached.
    pub async fn clear_all(&self) -> Result<usize> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::ClearAll(reply))?;
        rx.await.map_err(|_| CacheError::SessionClosed)
    }

    /// Delivers a session-ending browser event.
    pub fn notify(&self, event: SessionEvent) -> Result<()> {
        self.send(Command::Event(event))
    }

    /// Applies a user scroll to the mount surface.
    pub fn scroll_to(&self, offsets: ScrollOffsets) -> Result<()> {
        self.send(Command::ScrollTo(offsets))
    }

    /// Captures the cache and surface state once pending tab changes are applied.
    pub async fn snapshot(&self) -> Result<CacheSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot(reply))?;
        rx.await.map_err(|_| CacheError::SessionClosed)
    }

    fn send(&self, command: Command) -> Result<()> {
        self.tx.send(command).map_err(|_| CacheError::SessionClosed)
    }
}

// == Spawn ==
/// Spawns the view session on the current tokio runtime.
///
/// The session follows `tabs` until its sender is dropped. On every tab-state
/// change it evicts closed tabs, activates the active key, yields once so the
/// surface can show the swapped content, then restores scroll offsets.
pub fn spawn_view_session<S, F>(
    tabs: watch::Receiver<TabState>,
    surface: S,
    factory: F,
) -> (ViewCacheHandle, JoinHandle<()>)
where
    S: MountSurface + Send + 'static,
    S::View: Send + 'static,
    F: ViewFactory<S::View>,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let session = ViewSession {
        cache: ViewCache::new(surface),
        factory,
    };

    let task = tokio::spawn(session.run(tabs, rx));
    (ViewCacheHandle { tx }, task)
}

struct ViewSession<S: MountSurface, F> {
    cache: ViewCache<S>,
    factory: F,
}

impl<S, F> ViewSession<S, F>
where
    S: MountSurface + Send + 'static,
    S::View: Send + 'static,
    F: ViewFactory<S::View>,
{
    async fn run(
        mut self,
        mut tabs: watch::Receiver<TabState>,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) {
        info!("View session started");
        let initial = tabs.borrow_and_update().clone();
        self.sync(&initial).await;

        loop {
            tokio::select! {
                // Tab changes first, so handle calls observe every prior change
                biased;

                changed = tabs.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = tabs.borrow_and_update().clone();
                    self.sync(&state).await;
                }
                Some(command) = commands.recv() => self.handle(command),
            }
        }

        let dropped = self.cache.purge();
        info!("View session ended, dropped {} cached views", dropped);
    }

    async fn sync(&mut self, state: &TabState) {
        let evicted = self.cache.reconcile(state.keys());
        if !evicted.is_empty() {
            debug!("Reconciled tab cache, evicted {:?}", evicted);
        }

        match state.active_tab() {
            Some(tab) => {
                let factory = &self.factory;
                self.cache.activate(&tab.key, || factory.render(tab));
            }
            None => self.cache.deactivate(),
        }

        tokio::task::yield_now().await;
        self.cache.run_deferred();
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Clear(key, reply) => {
                let _ = reply.send(self.cache.evict(&key));
            }
            Command::ClearAll(reply) => {
                let _ = reply.send(self.cache.purge());
            }
            Command::Event(event) => {
                let dropped = self.cache.purge();
                info!("{:?}: purged {} cached views", event, dropped);
            }
            Command::ScrollTo(offsets) => {
                self.cache.surface_mut().set_scroll_offsets(offsets);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn snapshot(&self) -> CacheSnapshot {
        let items = self
            .cache
            .keys()
            .into_iter()
            .filter_map(|key| {
                let scroll = self.cache.item(&key)?.scroll;
                Some((key, scroll))
            })
            .collect();
        let surface = self.cache.surface();

        CacheSnapshot {
            items,
            active_key: self.cache.active_key().map(str::to_string),
            mounted_key: surface.mounted_key().map(str::to_string),
            surface_offsets: surface.scroll_offsets(),
        }
    }
}
