//! Stores bundles — extents placed together for one object-spread —
//! re-keyed by bundle length. Pop takes the longest bundle first, then
//! fills the remainder with `fill_gap`: repeatedly taking the smallest
//! remaining bundle whose length still covers the gap (falling back to
//! the largest remaining bundle once none does), per §8 scenario 5.

use std::collections::{BTreeMap, VecDeque};

use super::ExtentStack;
use crate::model::ExtentId;

#[derive(Default)]
pub struct WholeObjectExtentStack {
    bundles: BTreeMap<usize, VecDeque<Vec<ExtentId>>>,
}

impl WholeObjectExtentStack {
    pub fn new() -> Self {
        Self {
            bundles: BTreeMap::new(),
        }
    }

    /// Stores a bundle of extents placed together for one object-spread,
    /// keyed by its own length (the explicit `key` parameter in
    /// `ExtentStack::add` has no meaning here).
    pub fn add_bundle(&mut self, bundle: Vec<ExtentId>) {
        if bundle.is_empty() {
            return;
        }
        self.bundles.entry(bundle.len()).or_default().push_back(bundle);
    }

    fn total_extents(&self) -> usize {
        self.bundles
            .values()
            .flat_map(|q| q.iter())
            .map(|b| b.len())
            .sum()
    }

    fn pop_largest(&mut self) -> Option<Vec<ExtentId>> {
        let key = *self.bundles.keys().next_back()?;
        self.take_from(key)
    }

    fn take_from(&mut self, key: usize) -> Option<Vec<ExtentId>> {
        let q = self.bundles.get_mut(&key)?;
        let bundle = q.pop_front();
        if q.is_empty() {
            self.bundles.remove(&key);
        }
        bundle
    }
}

impl ExtentStack for WholeObjectExtentStack {
    fn add(&mut self, _key: i64, extent: ExtentId) {
        self.add_bundle(vec![extent]);
    }

    fn pop_stripe(&mut self, n: usize) -> Vec<ExtentId> {
        if n == 0 || self.total_extents() < n {
            return Vec::new();
        }
        let mut out = match self.pop_largest() {
            Some(b) => b,
            None => return Vec::new(),
        };
        while out.len() < n {
            let remaining = n - out.len();
            let ceiling_key = self
                .bundles
                .keys()
                .copied()
                .find(|&k| k >= remaining);
            let chosen = match ceiling_key {
                Some(k) => k,
                None => match self.bundles.keys().next_back().copied() {
                    Some(k) => k,
                    None => break,
                },
            };
            match self.take_from(chosen) {
                Some(bundle) => out.extend(bundle),
                None => break,
            }
        }
        out
    }

    fn num_stripes(&self, n: usize) -> usize {
        if n == 0 {
            0
        } else {
            self.total_extents() / n
        }
    }

    /// Returns the grand total extent count, not a per-key count, since
    /// keys here are bundle lengths rather than a placement policy (§4.6).
    fn length_at(&self, _key: i64) -> usize {
        self.total_extents()
    }

    fn contains(&self, extent: ExtentId) -> bool {
        self.bundles.values().any(|q| q.iter().any(|b| b.contains(&extent)))
    }

    fn remove(&mut self, extent: ExtentId) -> bool {
        let mut found: Option<(usize, usize)> = None;
        'outer: for (&key, q) in self.bundles.iter() {
            for (idx, bundle) in q.iter().enumerate() {
                if bundle.contains(&extent) {
                    found = Some((key, idx));
                    break 'outer;
                }
            }
        }
        let Some((key, idx)) = found else {
            return false;
        };
        let q = self.bundles.get_mut(&key).unwrap();
        let mut bundle = q.remove(idx).unwrap();
        if q.is_empty() {
            self.bundles.remove(&key);
        }
        bundle.retain(|e| *e != extent);
        if !bundle.is_empty() {
            self.add_bundle(bundle);
        }
        true
    }

    /// Pops one extent out of the bundle whose length exactly equals
    /// `key`, re-keying the remainder under its new (shorter) length.
    fn get_at(&mut self, key: i64) -> Option<ExtentId> {
        if key < 0 {
            return None;
        }
        let mut bundle = self.take_from(key as usize)?;
        let head = bundle.remove(0);
        if !bundle.is_empty() {
            self.add_bundle(bundle);
        }
        Some(head)
    }

    fn total_len(&self) -> usize {
        self.total_extents()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_gap_prefers_smallest_bundle_covering_remainder() {
        let mut s = WholeObjectExtentStack::new();
        s.add_bundle(vec![ExtentId(0), ExtentId(1), ExtentId(2), ExtentId(3), ExtentId(4)]);
        s.add_bundle(vec![ExtentId(5), ExtentId(6), ExtentId(7)]);
        s.add_bundle(vec![ExtentId(8), ExtentId(9)]);

        let popped = s.pop_stripe(6);
        assert_eq!(popped.len(), 7);
        assert_eq!(
            popped,
            vec![
                ExtentId(0),
                ExtentId(1),
                ExtentId(2),
                ExtentId(3),
                ExtentId(4),
                ExtentId(8),
                ExtentId(9),
            ]
        );
    }

    #[test]
    fn pop_stripe_empty_when_fewer_extents_than_requested() {
        let mut s = WholeObjectExtentStack::new();
        s.add_bundle(vec![ExtentId(0), ExtentId(1)]);
        assert_eq!(s.pop_stripe(10), Vec::new());
    }
}
