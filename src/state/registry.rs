use crate::state::{LinkRecord, LinkState};
use std::collections::{HashMap, HashSet, VecDeque};

/// All unique links of a run, keyed by canonical URL
///
/// Raw spellings are kept as aliases so a reference seen again verbatim is
/// recognised without being canonicalized, and so the rewriter can map any
/// spelling that occurred in a page back to its record.
#[derive(Debug, Default)]
pub struct LinkRegistry {
    records: HashMap<String, LinkRecord>,
    aliases: HashMap<String, String>,
}

impl LinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record and aliases its raw spelling
    ///
    /// # Returns
    ///
    /// * `true` - The record was new
    /// * `false` - A record with the same key already exists; nothing changed
    pub fn insert(&mut self, record: LinkRecord) -> bool {
        let key = record.key().to_string();
        if self.records.contains_key(&key) {
            return false;
        }
        self.aliases.insert(record.raw.clone(), key.clone());
        self.records.insert(key, record);
        true
    }

    /// Maps another raw spelling to an existing key
    pub fn alias(&mut self, raw: &str, key: &str) {
        if self.records.contains_key(key) {
            self.aliases
                .entry(raw.to_string())
                .or_insert_with(|| key.to_string());
        }
    }

    pub fn get(&self, key: &str) -> Option<&LinkRecord> {
        self.records.get(key)
    }

    /// Looks a record up by any raw spelling seen so far
    pub fn get_by_raw(&self, raw: &str) -> Option<&LinkRecord> {
        self.aliases.get(raw).and_then(|key| self.records.get(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    pub fn contains_raw(&self, raw: &str) -> bool {
        self.aliases.contains_key(raw)
    }

    /// Moves a record to a new state; returns false if the key is unknown
    pub fn set_state(&mut self, key: &str, state: LinkState) -> bool {
        match self.records.get_mut(key) {
            Some(record) => {
                record.state = state;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LinkRecord> {
        self.records.values()
    }

    pub fn count_in_state(&self, state: LinkState) -> usize {
        self.records.values().filter(|r| r.state == state).count()
    }
}

/// Links waiting to be fetched, newest first
///
/// Holds registry keys. A key is never queued twice while it is waiting.
#[derive(Debug, Default)]
pub struct PendingQueue {
    order: VecDeque<String>,
    members: HashSet<String>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepends a key; returns false if it is already waiting
    pub fn push_front(&mut self, key: &str) -> bool {
        if !self.members.insert(key.to_string()) {
            return false;
        }
        self.order.push_front(key.to_string());
        true
    }

    pub fn pop_front(&mut self) -> Option<String> {
        let key = self.order.pop_front()?;
        self.members.remove(&key);
        Some(key)
    }

    /// Takes every waiting key, front to back
    pub fn drain(&mut self) -> Vec<String> {
        self.members.clear();
        self.order.drain(..).collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.members.contains(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
