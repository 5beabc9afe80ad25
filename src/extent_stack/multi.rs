//! Pop requires a single key to hold `>= n` extents; if no key qualifies,
//! returns empty.

use super::queue::KeyedQueue;
use super::{ExtentStack, Shuffle};
use crate::model::ExtentId;

#[derive(Default)]
pub struct MultiExtentStack {
    q: KeyedQueue,
}

impl MultiExtentStack {
    pub fn new() -> Self {
        Self { q: KeyedQueue::new() }
    }
}

impl ExtentStack for MultiExtentStack {
    fn add(&mut self, key: i64, extent: ExtentId) {
        self.q.add(key, extent);
    }

    fn pop_stripe(&mut self, n: usize) -> Vec<ExtentId> {
        if n == 0 {
            return Vec::new();
        }
        let qualifying_key = self
            .q
            .keys_sorted_asc()
            .into_iter()
            .find(|&k| self.q.length_at(k) >= n);
        let Some(key) = qualifying_key else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            if let Some(e) = self.q.get_at(key) {
                out.push(e);
            }
        }
        out
    }

    fn num_stripes(&self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        self.q
            .keys_sorted_asc()
            .into_iter()
            .map(|k| self.q.length_at(k) / n)
            .max()
            .unwrap_or(0)
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

    fn total_len(&self) -> usize {
        self.q.total_len()
    }
}

impl Shuffle for MultiExtentStack {
    fn shuffle_all(&mut self, rng: &mut rand::rngs::StdRng) {
        self.q.shuffle_all(rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_stripe_requires_single_qualifying_key() {
        let mut s = MultiExtentStack::new();
        s.add(1, ExtentId(1));
        s.add(1, ExtentId(2));
        s.add(2, ExtentId(3));
        s.add(2, ExtentId(4));
        s.add(2, ExtentId(5));
        assert_eq!(s.pop_stripe(3), vec![ExtentId(3), ExtentId(4), ExtentId(5)]);
    }

    #[test]
    fn pop_stripe_empty_when_no_key_qualifies() {
        let mut s = MultiExtentStack::new();
        s.add(1, ExtentId(1));
        s.add(2, ExtentId(2));
        assert_eq!(s.pop_stripe(2), Vec::new());
    }
}
