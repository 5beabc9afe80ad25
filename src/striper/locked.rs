//! Optional coarse serialization for the striper chain (§5).
//!
//! Installed only when the coordinator is constructed in threaded mode;
//! wraps the outermost decorator so `create_stripe`/`create_stripes`/
//! `cost_to_replace_extents` run under one mutex, keeping the policy
//! counters and stripe roster consistent against a hypothetical
//! multi-threaded caller. Mirrors the teacher's preference for
//! `parking_lot::Mutex` over `std::sync::Mutex` for its own coarse locks.

use parking_lot::Mutex;

use super::{ReplCosts, StripeBatchResult, Striper, StriperCtx};

pub struct LockedStriper {
    inner: Box<dyn Striper>,
    lock: Mutex<()>,
}

impl LockedStriper {
    pub fn new(inner: Box<dyn Striper>) -> Self {
        Self {
            inner,
            lock: Mutex::new(()),
        }
    }
}

impl Striper for LockedStriper {
    fn create_stripes(&mut self, ctx: &mut StriperCtx) -> StripeBatchResult {
        let _guard = self.lock.lock();
        self.inner.create_stripes(ctx)
    }

    fn create_stripe(&mut self, ctx: &mut StriperCtx) -> StripeBatchResult {
        let _guard = self.lock.lock();
        self.inner.create_stripe(ctx)
    }

    fn cost_to_replace_extents(
        &mut self,
        ext_size: u64,
        exts_per_locality: &[u32],
        obs_per_locality: &[u64],
        valid_per_locality: &[u64],
    ) -> ReplCosts {
        let _guard = self.lock.lock();
        self.inner
            .cost_to_replace_extents(ext_size, exts_per_locality, obs_per_locality, valid_per_locality)
    }

    fn cost_to_write_data(&self, bytes: u64) -> u64 {
        self.inner.cost_to_write_data(bytes)
    }

    fn times_default_and_alternative(&self) -> (u64, u64) {
        self.inner.times_default_and_alternative()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::striper::SimpleStriper;

    #[test]
    fn forwards_cost_to_write_data() {
        let striper = LockedStriper::new(Box::new(SimpleStriper::new()));
        assert_eq!(striper.cost_to_write_data(10), 10);
    }
}
