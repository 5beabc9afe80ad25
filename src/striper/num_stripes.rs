use super::{ReplCosts, StripeBatchResult, Striper, StriperCtx};
use crate::extent_stack::ExtentStack;

/// Forces exactly `k` stripes per `create_stripes` call regardless of how
/// much more (or less) the stack could otherwise assemble.
pub struct NumStripesStriper {
    inner: Box<dyn Striper>,
    k: usize,
}

impl NumStripesStriper {
    pub fn new(inner: Box<dyn Striper>, k: usize) -> Self {
        Self { inner, k }
    }
}

impl Striper for NumStripesStriper {
    fn create_stripes(&mut self, ctx: &mut StriperCtx) -> StripeBatchResult {
        let mut total = StripeBatchResult::default();
        for _ in 0..self.k {
            let result = self.inner.create_stripe(ctx);
            if result.stripes.is_empty() {
                break;
            }
            total = total.merge(result);
        }
        total
    }

    fn create_stripe(&mut self, ctx: &mut StriperCtx) -> StripeBatchResult {
        self.inner.create_stripe(ctx)
    }

    fn cost_to_replace_extents(
        &mut self,
        ext_size: u64,
        exts_per_locality: &[u32],
        obs_per_locality: &[u64],
        valid_per_locality: &[u64],
    ) -> ReplCosts {
        self.inner
            .cost_to_replace_extents(ext_size, exts_per_locality, obs_per_locality, valid_per_locality)
    }

    fn cost_to_write_data(&self, bytes: u64) -> u64 {
        self.inner.cost_to_write_data(bytes)
    }

    fn num_stripes_reqd(&self, _stack: &dyn ExtentStack, _n: usize) -> usize {
        self.k
    }
}
