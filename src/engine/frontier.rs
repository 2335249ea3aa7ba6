// SPDX-License-Identifier: PMPL-1.0-or-later

//! Longest-first search worklist.
//!
//! Selection order is: longest key first (in characters), then earliest
//! insertion. Re-inserting a key that is still pending only overwrites its
//! direction; it keeps its place in line.

use crate::types::{Candidate, Direction};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Heap entry. Field order gives the derived ordering: longer keys are
/// greater, and for equal lengths the lower sequence number is greater.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct FrontierEntry {
    len: usize,
    seq: Reverse<u64>,
    key: String,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    direction: Direction,
    seq: u64,
}

#[derive(Debug, Default)]
pub struct Frontier {
    heap: BinaryHeap<FrontierEntry>,
    slots: HashMap<String, Slot>,
    next_seq: u64,
    high_water: usize,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `key` tagged `direction`. Returns `false` when the key was
    /// already pending, in which case only its direction changes.
    pub fn insert(&mut self, key: String, direction: Direction) -> bool {
        if let Some(slot) = self.slots.get_mut(&key) {
            slot.direction = direction;
            return false;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(FrontierEntry {
            len: key.chars().count(),
            seq: Reverse(seq),
            key: key.clone(),
        });
        self.slots.insert(key, Slot { direction, seq });
        self.high_water = self.high_water.max(self.slots.len());
        true
    }

    /// Remove and return the next candidate to process.
    pub fn pop(&mut self) -> Option<Candidate> {
        while let Some(entry) = self.heap.pop() {
            match self.slots.get(&entry.key) {
                Some(slot) if slot.seq == entry.seq.0 => {
                    let slot = self.slots.remove(&entry.key)?;
                    return Some(Candidate::new(entry.key, slot.direction));
                }
                // stale
                _ => continue,
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Largest number of keys pending at once.
    pub fn high_water(&self) -> usize {
        self.high_water
    }
}
