//! Extends Single with `get_at_closest`: numeric-nearest-key lookup,
//! ties broken toward the higher key.

use super::queue::KeyedQueue;
use super::{ExtentStack, Shuffle};
use crate::model::ExtentId;

#[derive(Default)]
pub struct BestEffortExtentStack {
    q: KeyedQueue,
}

impl BestEffortExtentStack {
    pub fn new() -> Self {
        Self { q: KeyedQueue::new() }
    }
}

impl ExtentStack for BestEffortExtentStack {
    fn add(&mut self, key: i64, extent: ExtentId) {
        self.q.add(key, extent);
    }

    fn pop_stripe(&mut self, n: usize) -> Vec<ExtentId> {
        if n == 0 || self.q.total_len() < n {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(n);
        for key in self.q.keys_sorted_asc() {
            while out.len() < n {
                match self.q.get_at(key) {
                    Some(e) => out.push(e),
                    None => break,
                }
            }
            if out.len() == n {
                break;
            }
        }
        out
    }

    fn num_stripes(&self, n: usize) -> usize {
        if n == 0 {
            0
        } else {
            self.q.total_len() / n
        }
    }

    fn length_at(&self, key: i64) -> usize {
        self.q.length_at(key)
    }

    fn contains(&self, extent: ExtentId) -> bool {
        self.q.contains(extent)
    }

    fn remove(&mut self, extent: ExtentId) -> bool {
        self.q.remove(extent)
    }

    fn get_at(&mut self, key: i64) -> Option<ExtentId> {
        self.q.get_at(key)
    }

    fn get_at_closest(&mut self, key: i64) -> Option<ExtentId> {
        self.q.get_at_closest(key)
    }

    fn total_len(&self) -> usize {
        self.q.total_len()
    }
}

impl Shuffle for BestEffortExtentStack {
    fn shuffle_all(&mut self, rng: &mut rand::rngs::StdRng) {
        self.q.shuffle_all(rng);
    }
}
