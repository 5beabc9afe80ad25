//! Keyed multimaps of sealed extents awaiting striping (§4.6).
//!
//! Four concrete variants plus a shuffling decorator, all behind one
//! trait so the coordinator dispatches through `&mut dyn ExtentStack`
//! instead of the source's ad hoc per-variant call sites.

mod best_effort;
mod multi;
mod queue;
mod randomizer;
mod single;
mod whole_object;

pub use best_effort::BestEffortExtentStack;
pub use multi::MultiExtentStack;
pub use randomizer::RandomizerExtentStack;
pub use single::SingleExtentStack;
pub use whole_object::WholeObjectExtentStack;

use crate::model::ExtentId;

/// Shared contract for every extent-stack variant.
pub trait ExtentStack {
    fn add(&mut self, key: i64, extent: ExtentId);

    /// Pops up to `n` extents to assemble one stripe. Returns an empty
    /// list rather than a partial one if the variant's pop policy cannot
    /// be satisfied (§4.6, §8 boundary cases).
    fn pop_stripe(&mut self, n: usize) -> Vec<ExtentId>;

    /// `⌊total / n⌋`, the number of full stripes this stack could still
    /// assemble.
    fn num_stripes(&self, n: usize) -> usize;

    fn length_at(&self, key: i64) -> usize;

    fn contains(&self, extent: ExtentId) -> bool;

    fn remove(&mut self, extent: ExtentId) -> bool;

    /// Pops the head extent at `key`; removes the key entry entirely once
    /// it empties. Returns `None` (the sentinel) if `key` is absent.
    fn get_at(&mut self, key: i64) -> Option<ExtentId>;

    /// Best-effort numeric-nearest-key lookup, ties broken toward the
    /// higher key. The default implementation only matches the exact key
    /// (equivalent to `get_at`); only [`BestEffortExtentStack`] overrides
    /// this with true nearest-key search, per §4.6.
    fn get_at_closest(&mut self, key: i64) -> Option<ExtentId> {
        self.get_at(key)
    }

    fn total_len(&self) -> usize;
}

/// Implemented by the keyed-FIFO variants (Single, Multi, BestEffort) so
/// [`RandomizerExtentStack`] can reshuffle their per-key queues without
/// knowing which concrete variant it wraps.
pub trait Shuffle {
    fn shuffle_all(&mut self, rng: &mut rand::rngs::StdRng);
}
