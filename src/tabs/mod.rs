//! Tab/View Session Module
//!
//! Bounded set of open tabs, each owning one cached view with its own scroll
//! position, kept in step with the tab list and purged when the session ends.

mod descriptor;
mod session;
mod store;
mod surface;
mod view_cache;


// Re-export public types
pub use descriptor::{TabDescriptor, TabState};
pub use session::{spawn_view_session, CacheSnapshot, SessionEvent, ViewCacheHandle, ViewFactory};
pub use store::TabStore;
pub use surface::{MemorySurface, MountSurface, ScrollOffsets};
pub use view_cache::{CacheItem, ViewCache};
