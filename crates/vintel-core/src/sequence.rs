//! Generation tickets for abandoning superseded requests.
//!
//! Each request for a resource takes a ticket. When the response arrives it
//! is only honoured if no newer ticket was issued for the same resource in
//! the meantime; otherwise it is ignored. This replaces explicit
//! cancellation of in-flight calls.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket<K> {
    key: K,
    generation: u64,
}

#[derive(Debug)]
pub struct RequestTracker<K> {
    latest: HashMap<K, u64>,
}

impl<K: Hash + Eq + Clone> RequestTracker<K> {
    pub fn new() -> Self {
        Self {
            latest: HashMap::new(),
        }
    }

    pub fn issue(&mut self, key: K) -> Ticket<K> {
        let generation = self.latest.entry(key.clone()).or_insert(0);
        *generation += 1;
        Ticket {
            key,
            generation: *generation,
        }
    }

    pub fn is_current(&self, ticket: &Ticket<K>) -> bool {
        self.latest.get(&ticket.key) == Some(&ticket.generation)
    }
}

impl<K: Hash + Eq + Clone> Default for RequestTracker<K> {
    fn default() -> Self {
        Self::new()
    }
}
