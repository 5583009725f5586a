//! Memory Tier Module
//!
//! Bounded in-process map of parameter entries with batch eviction.

use std::collections::HashMap;

use crate::param::entry::{current_timestamp_ms, CacheEntry};

// == Tier Lookup ==
/// Outcome of a single-tier lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierLookup {
    /// Unexpired value found
    Hit(String),
    /// Entry existed but had expired; it has been removed
    Expired,
    /// Nothing stored under the code
    Miss,
}

#[derive(Debug)]
struct Slot {
    entry: CacheEntry,
    /// Insertion sequence, breaks `created_at` ties within one millisecond
    seq: u64,
}

// == Memory Tier ==
/// Memory tier of the parameter cache.
///
/// When inserting a new code would exceed `max_entries`, the oldest-created
/// entries are evicted in one batch until the tier is at most half full.
#[derive(Debug)]
pub struct MemoryTier {
    entries: HashMap<String, Slot>,
    max_entries: usize,
    next_seq: u64,
}

impl MemoryTier {
    // == Constructor ==
    /// Creates an empty tier. A capacity of zero is treated as one.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries: max_entries.max(1),
            next_seq: 0,
        }
    }

    // == Get ==
    /// Looks up a code, removing the entry if it has expired.
    pub fn get(&mut self, code: &str) -> TierLookup {
        match self.entries.get(code) {
            None => TierLookup::Miss,
            Some(slot) if slot.entry.is_expired() => {
                self.entries.remove(code);
                TierLookup::Expired
            }
            Some(slot) => TierLookup::Hit(slot.entry.value.clone()),
        }
    }

    // == Insert ==
    /// Stores an entry, replacing any previous one for the same code.
    ///
    /// Returns the number of entries evicted to make room.
    pub fn insert(&mut self, code: String, entry: CacheEntry) -> usize {
        let evicted = if !self.entries.contains_key(&code) && self.entries.len() >= self.max_entries
        {
            self.evict_oldest_half()
        } else {
            0
        };

        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(code, Slot { entry, seq });

        evicted
    }

    fn evict_oldest_half(&mut self) -> usize {
        let target = self.max_entries / 2;
        let excess = self.entries.len().saturating_sub(target);

        let mut by_age: Vec<(i64, u64, String)> = self
            .entries
            .iter()
            .map(|(code, slot)| (slot.entry.created_at, slot.seq, code.clone()))
            .collect();
        by_age.sort_unstable();

        for (_, _, code) in by_age.into_iter().take(excess) {
            self.entries.remove(&code);
        }

        excess
    }

    // == Remove ==
    /// Removes a code. Returns whether anything was stored.
    pub fn remove(&mut self, code: &str) -> bool {
        self.entries.remove(code).is_some()
    }

    // == Clear ==
    /// Drops every entry and returns how many were held.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    // == Purge Expired ==
    /// Removes all expired entries, returning the count.
    pub fn purge_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let before = self.entries.len();
        self.entries.retain(|_, slot| !slot.entry.is_expired_at(now));
        before - self.entries.len()
    }

    /// Codes currently held, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Whether an entry (expired or not) is held for the code.
    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }
}
