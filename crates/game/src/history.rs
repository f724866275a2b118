//! Buffered input history for rollback and replay.
//!
//! A bounded ring of `(tick, input)` entries in increasing tick order. The
//! oldest entries are evicted once the capacity (the longest round trip the
//! simulation tolerates, in ticks) is reached.

use std::collections::VecDeque;

use vantage_physics::{InputRecord, LookRotation, Tick};

/// One buffered tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryEntry {
    /// Tick the input was consumed on.
    pub tick: Tick,

    /// The input record as consumed.
    pub input: InputRecord,

    /// Look rotation after the tick ran.
    pub look: LookRotation,

    /// Real input that arrived after the tick was simulated with a
    /// prediction, and has not been replayed yet.
    pub fresh: bool,
}

/// Input history for one entity.
#[derive(Debug, Clone)]
pub struct InputHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl InputHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a consumed tick.
    ///
    /// Ticks are expected in increasing order. Recording a tick that is
    /// already buffered replaces it and drops everything after it.
    pub fn push(&mut self, entry: HistoryEntry) {
        while self.entries.back().is_some_and(|last| last.tick >= entry.tick) {
            self.entries.pop_back();
        }

        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Replace the input of an already simulated tick with the real one and
    /// mark it fresh. Returns false if the tick is no longer buffered.
    pub fn replace_with_fresh(&mut self, input: InputRecord) -> bool {
        match self.entries.iter_mut().find(|entry| entry.tick == input.tick) {
            Some(entry) => {
                entry.input = input;
                entry.fresh = true;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, tick: Tick) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.tick == tick)
    }

    /// Drop every entry up to and including `tick`.
    pub fn discard_up_to(&mut self, tick: Tick) {
        while self.entries.front().is_some_and(|entry| entry.tick <= tick) {
            self.entries.pop_front();
        }
    }

    /// Entries strictly after `tick`, oldest first.
    pub fn entries_after(&self, tick: Tick) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().filter(move |entry| entry.tick > tick)
    }

    /// Clear the fresh marker on every entry after `tick`.
    pub fn mark_replayed_after(&mut self, tick: Tick) {
        for entry in self.entries.iter_mut().filter(|entry| entry.tick > tick) {
            entry.fresh = false;
        }
    }

    /// The most recent `count` inputs, oldest first.
    pub fn recent_inputs(&self, count: usize) -> Vec<InputRecord> {
        let skip = self.entries.len().saturating_sub(count);
        self.entries.iter().skip(skip).map(|entry| entry.input).collect()
    }

    pub fn latest_tick(&self) -> Option<Tick> {
        self.entries.back().map(|entry| entry.tick)
    }

    pub fn oldest_tick(&self) -> Option<Tick> {
        self.entries.front().map(|entry| entry.tick)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
