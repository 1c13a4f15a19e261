//! Specialized collection types

use std::collections::HashMap;
use std::hash::Hash;

pub use slotmap::{new_key_type, SlotMap};

/// Map from key to an ordered list of values that remembers key insertion order
///
/// Iteration visits groups in the order their key was first pushed, and the
/// values of each group in push order. `HashMap` iteration order is not stable,
/// so the order is tracked in a parallel list of groups.
#[derive(Debug, Clone)]
pub struct OrderedGroups<K, V> {
    index: HashMap<K, usize>,
    groups: Vec<(K, Vec<V>)>,
}

impl<K: Copy + Eq + Hash, V> OrderedGroups<K, V> {
    /// Create an empty grouping
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            groups: Vec::new(),
        }
    }

    /// Append `value` to the group for `key`, creating the group on first use
    pub fn push(&mut self, key: K, value: V) {
        match self.index.get(&key) {
            Some(&slot) => self.groups[slot].1.push(value),
            None => {
                self.index.insert(key, self.groups.len());
                self.groups.push((key, vec![value]));
            }
        }
    }

    /// Values grouped under `key`
    pub fn get(&self, key: &K) -> Option<&[V]> {
        self.index.get(key).map(|&slot| self.groups[slot].1.as_slice())
    }

    /// Keys in first-seen order
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.groups.iter().map(|(key, _)| *key)
    }

    /// Groups in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (K, &[V])> {
        self.groups.iter().map(|(key, values)| (*key, values.as_slice()))
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no value has been pushed
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of values across all groups
    pub fn value_count(&self) -> usize {
        self.groups.iter().map(|(_, values)| values.len()).sum()
    }
}

impl<K: Copy + Eq + Hash, V> Default for OrderedGroups<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> IntoIterator for OrderedGroups<K, V> {
    type Item = (K, Vec<V>);
    type IntoIter = std::vec::IntoIter<(K, Vec<V>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}
