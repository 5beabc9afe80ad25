//! A min-heap of deletion events keyed by expiry time.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::model::ObjectId;

/// `BinaryHeap` is a max-heap; wrapping each entry in `Reverse` over the
/// full `(expiry, object_id)` tuple gives strict less-than ordering on
/// expiry with an object-id tiebreak for free, matching §4.2's contract
/// exactly (and correcting the raw max-heap `priority_queue` used in
/// `original_source/event_manager.h`, which `spec.md` explicitly
/// documents as a min-heap).
#[derive(Debug, Default)]
pub struct EventManager {
    heap: BinaryHeap<Reverse<(u64, ObjectId)>>,
}

impl EventManager {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    pub fn push(&mut self, expiry: u64, object: ObjectId) {
        self.heap.push(Reverse((expiry, object)));
    }

    pub fn peek(&self) -> Option<(u64, ObjectId)> {
        self.heap.peek().map(|Reverse(e)| *e)
    }

    /// Pops and returns the earliest-expiring event if its expiry is
    /// `<= now`, else leaves the heap untouched.
    pub fn pop_if_due(&mut self, now: u64) -> Option<(u64, ObjectId)> {
        match self.peek() {
            Some((expiry, _)) if expiry <= now => self.heap.pop().map(|Reverse(e)| e),
            _ => None,
        }
    }

    /// Drains every event due at or before `now`, in strict expiry order
    /// (ties by object id), per §5's ordering rule.
    pub fn drain_due(&mut self, now: u64) -> Vec<(u64, ObjectId)> {
        let mut due = Vec::new();
        while let Some(event) = self.pop_if_due(now) {
            due.push(event);
        }
        due
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_expiry_then_id_order() {
        let mut em = EventManager::new();
        em.push(5, ObjectId(2));
        em.push(5, ObjectId(1));
        em.push(3, ObjectId(9));
        let due = em.drain_due(10);
        assert_eq!(
            due,
            vec![(3, ObjectId(9)), (5, ObjectId(1)), (5, ObjectId(2))]
        );
    }

    #[test]
    fn pop_if_due_respects_now() {
        let mut em = EventManager::new();
        em.push(10, ObjectId(1));
        assert_eq!(em.pop_if_due(5), None);
        assert_eq!(em.pop_if_due(10), Some((10, ObjectId(1))));
        assert!(em.is_empty());
    }
}
