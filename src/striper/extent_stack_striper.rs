use super::{ReplCosts, StripeBatchResult, Striper, StriperCtx};

/// Decorates an inner striper so `create_stripes` drains the extent stack
/// completely rather than producing one stripe: it calls `create_stripe`
/// on the inner striper as many times as the stack still has a full
/// stripe's worth of extents.
pub struct ExtentStackStriper {
    inner: Box<dyn Striper>,
}

impl ExtentStackStriper {
    pub fn new(inner: Box<dyn Striper>) -> Self {
        Self { inner }
    }
}

impl Striper for ExtentStackStriper {
    fn create_stripes(&mut self, ctx: &mut StriperCtx) -> StripeBatchResult {
        let mut total = StripeBatchResult::default();
        let n = ctx.stripes.num_data_exts_per_stripe();
        while ctx.stack.num_stripes(n) > 0 {
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SimulationClock;
    use crate::extent_manager::ExtentManager;
    use crate::extent_stack::{ExtentStack, SingleExtentStack};
    use crate::stripe_manager::{StripeGeometry, StripeManager};
    use crate::striper::SimpleStriper;

    fn geometry() -> StripeGeometry {
        StripeGeometry {
            num_data_exts_per_locality: 2,
            num_localities: 1,
            num_local_parities: 1,
            num_global_parities: 0,
            coding_overhead: 1.0,
        }
    }

    #[test]
    fn create_stripes_drains_stack_in_full_batches() {
        let mut extents = ExtentManager::new(10, 10);
        let mut stack = SingleExtentStack::new();
        for _ in 0..5 {
            let id = extents.create_extent(Some(10), 0);
            stack.add(0, id);
        }
        let mut stripes = StripeManager::new(geometry());
        let mut ctx = StriperCtx {
            stack: &mut stack,
            extents: &mut extents,
            stripes: &mut stripes,
            secondary_threshold: 10,
            now: SimulationClock::zero(),
        };
        let mut striper = ExtentStackStriper::new(Box::new(SimpleStriper::new()));
        let result = striper.create_stripes(&mut ctx);
        // 5 extents, 2 per stripe: 2 full stripes, 1 extent left unused.
        assert_eq!(result.stripes.len(), 2);
        assert_eq!(stack.total_len(), 1);
    }
}
