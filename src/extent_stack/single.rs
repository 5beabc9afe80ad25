//! Pop iterates keys in sorted order, draining heads until `n` is
//! reached, partially draining a key if it is shorter than the remaining
//! need.

use super::queue::KeyedQueue;
use super::{ExtentStack, Shuffle};
use crate::model::ExtentId;

#[derive(Default)]
pub struct SingleExtentStack {
    q: KeyedQueue,
}

impl SingleExtentStack {
    pub fn new() -> Self {
        Self { q: KeyedQueue::new() }
    }
}

impl ExtentStack for SingleExtentStack {
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

    fn total_len(&self) -> usize {
        self.q.total_len()
    }
}

impl Shuffle for SingleExtentStack {
    fn shuffle_all(&mut self, rng: &mut rand::rngs::StdRng) {
        self.q.shuffle_all(rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_stripe_drains_in_key_order() {
        let mut s = SingleExtentStack::new();
        s.add(2, ExtentId(20));
        s.add(1, ExtentId(10));
        s.add(1, ExtentId(11));
        let popped = s.pop_stripe(3);
        assert_eq!(popped, vec![ExtentId(10), ExtentId(11), ExtentId(20)]);
    }

    #[test]
    fn pop_stripe_returns_empty_when_short() {
        let mut s = SingleExtentStack::new();
        s.add(1, ExtentId(10));
        assert_eq!(s.pop_stripe(5), Vec::new());
        // Nothing was consumed.
        assert_eq!(s.total_len(), 1);
    }

    #[test]
    fn get_at_removes_empty_key_entry() {
        let mut s = SingleExtentStack::new();
        s.add(1, ExtentId(10));
        assert_eq!(s.get_at(1), Some(ExtentId(10)));
        assert_eq!(s.length_at(1), 0);
        assert_eq!(s.get_at(1), None);
    }
}
