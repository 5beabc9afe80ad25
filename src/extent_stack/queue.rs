//! Shared keyed-FIFO storage used by Single, Multi and BestEffort.

use std::collections::{BTreeMap, VecDeque};

use crate::model::ExtentId;

#[derive(Debug, Default)]
pub(super) struct KeyedQueue {
    map: BTreeMap<i64, VecDeque<ExtentId>>,
}

impl KeyedQueue {
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, key: i64, extent: ExtentId) {
        self.map.entry(key).or_default().push_back(extent);
    }

    pub fn length_at(&self, key: i64) -> usize {
        self.map.get(&key).map(|q| q.len()).unwrap_or(0)
    }

    pub fn total_len(&self) -> usize {
        self.map.values().map(|q| q.len()).sum()
    }

    pub fn contains(&self, extent: ExtentId) -> bool {
        self.map.values().any(|q| q.contains(&extent))
    }

    pub fn remove(&mut self, extent: ExtentId) -> bool {
        let mut removed = false;
        let mut empty_keys = Vec::new();
        for (key, q) in self.map.iter_mut() {
            if let Some(pos) = q.iter().position(|e| *e == extent) {
                q.remove(pos);
                removed = true;
                if q.is_empty() {
                    empty_keys.push(*key);
                }
                break;
            }
        }
        for key in empty_keys {
            self.map.remove(&key);
        }
        removed
    }

    pub fn get_at(&mut self, key: i64) -> Option<ExtentId> {
        let Some(q) = self.map.get_mut(&key) else {
            return None;
        };
        let head = q.pop_front();
        if q.is_empty() {
            self.map.remove(&key);
        }
        head
    }

    /// Numeric-nearest key to `key`; ties go to the higher candidate.
    pub fn closest_key(&self, key: i64) -> Option<i64> {
        let lower = self.map.range(..=key).next_back().map(|(k, _)| *k);
        let upper = self.map.range(key..).next().map(|(k, _)| *k);
        match (lower, upper) {
            (None, None) => None,
            (Some(l), None) => Some(l),
            (None, Some(u)) => Some(u),
            (Some(l), Some(u)) => {
                if l == key {
                    Some(l)
                } else if (key - l) > (u - key) {
                    Some(u)
                } else if (u - key) > (key - l) {
                    Some(l)
                } else {
                    // Exact tie: higher key wins (§4.6, §8, §9).
                    Some(u)
                }
            }
        }
    }

    pub fn get_at_closest(&mut self, key: i64) -> Option<ExtentId> {
        let closest = self.closest_key(key)?;
        self.get_at(closest)
    }

    pub fn keys_sorted_asc(&self) -> Vec<i64> {
        self.map.keys().copied().collect()
    }

    pub fn shuffle_all(&mut self, rng: &mut impl rand::Rng) {
        use rand::seq::SliceRandom;
        for q in self.map.values_mut() {
            let mut v: Vec<ExtentId> = q.drain(..).collect();
            v.shuffle(rng);
            *q = v.into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_key_single_entry_matches_regardless_of_query() {
        let mut q = KeyedQueue::new();
        q.add(5, ExtentId(0));
        assert_eq!(q.closest_key(100), Some(5));
        assert_eq!(q.closest_key(-100), Some(5));
    }

    #[test]
    fn closest_key_tie_prefers_higher() {
        let mut q = KeyedQueue::new();
        q.add(4, ExtentId(0));
        q.add(6, ExtentId(1));
        assert_eq!(q.closest_key(5), Some(6));
    }
}
