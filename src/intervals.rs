use indexmap::IndexMap;
use itertools::Itertools;
use std::hash::Hash;

/// A closed interval on a chromosome. Both ends are inclusive.
pub trait GenomeInterval {
    fn start(&self) -> u64;
    fn end(&self) -> u64;

    fn length(&self) -> u64 {
        (self.end() + 1).saturating_sub(self.start())
    }

    fn covers(&self, position: u64) -> bool {
        self.start() <= position && self.end() >= position
    }

    fn overlaps(&self, start: u64, end: u64) -> bool {
        self.start() <= end && self.end() >= start
    }

    fn contains(&self, other: &impl GenomeInterval) -> bool {
        self.start() <= other.start() && self.end() >= other.end()
    }

    fn middle(&self) -> u64 {
        (self.start() + self.end()) / 2
    }
}

/// Point lookup over `[start, end]` intervals.
///
/// Entries keep insertion order. Inserting an interval that is already present
/// replaces its handle in place, so two identical intervals keep only the latter.
///
/// Lookup is a linear scan. Chromosome gene counts are small enough that a tree
/// buys nothing here; if that changes, candidates are:
/// - https://github.com/dcjones/coitrees
/// - https://github.com/sstadick/rust-lapper
/// - https://github.com/rust-bio/rust-bio/blob/master/src/data_structures/interval_tree/avl_interval_tree.rs
#[derive(Debug, Clone)]
pub struct IntervalIndex<H> {
    entries: IndexMap<(u64, u64), H>,
}

impl<H> Default for IntervalIndex<H> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<H> IntervalIndex<H>
where
    H: Copy + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle previously stored under the same interval, if any.
    pub fn insert(&mut self, start: u64, end: u64, handle: H) -> Option<H> {
        self.entries.insert((start, end), handle)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Handles whose interval contains `position`, each once, in index order.
    pub fn covering(&self, position: u64) -> Vec<H> {
        self.entries
            .iter()
            .filter(|((start, end), _)| *start <= position && position <= *end)
            .map(|(_, handle)| *handle)
            .unique()
            .collect()
    }
}
