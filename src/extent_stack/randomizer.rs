//! Wrapping decorator that shuffles each key's queue with a fixed-seed
//! RNG before every pop/`get_at(*)` call, turning a nominally FIFO policy
//! random within a key.

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{ExtentStack, Shuffle};
use crate::model::ExtentId;

pub struct RandomizerExtentStack<T> {
    inner: T,
    rng: StdRng,
}

impl<T: ExtentStack + Shuffle> RandomizerExtentStack<T> {
    pub fn new(inner: T, seed: u64) -> Self {
        Self {
            inner,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn reshuffle(&mut self) {
        self.inner.shuffle_all(&mut self.rng);
    }
}

impl<T: ExtentStack + Shuffle> ExtentStack for RandomizerExtentStack<T> {
    fn add(&mut self, key: i64, extent: ExtentId) {
        self.inner.add(key, extent);
    }

    fn pop_stripe(&mut self, n: usize) -> Vec<ExtentId> {
        self.reshuffle();
        self.inner.pop_stripe(n)
    }

    fn num_stripes(&self, n: usize) -> usize {
        self.inner.num_stripes(n)
    }

    fn length_at(&self, key: i64) -> usize {
        self.inner.length_at(key)
    }

    fn contains(&self, extent: ExtentId) -> bool {
        self.inner.contains(extent)
    }

    fn remove(&mut self, extent: ExtentId) -> bool {
        self.inner.remove(extent)
    }

    fn get_at(&mut self, key: i64) -> Option<ExtentId> {
        self.reshuffle();
        self.inner.get_at(key)
    }

    fn get_at_closest(&mut self, key: i64) -> Option<ExtentId> {
        self.reshuffle();
        self.inner.get_at_closest(key)
    }

    fn total_len(&self) -> usize {
        self.inner.total_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extent_stack::SingleExtentStack;

    #[test]
    fn randomizer_preserves_total_count() {
        let mut inner = SingleExtentStack::new();
        for i in 0..10 {
            inner.add(1, ExtentId(i));
        }
        let mut r = RandomizerExtentStack::new(inner, 7);
        assert_eq!(r.total_len(), 10);
        let popped = r.pop_stripe(10);
        assert_eq!(popped.len(), 10);
    }
}
