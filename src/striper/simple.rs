use super::{ReplCosts, StripeBatchResult, Striper, StriperCtx};

/// The base striper: pops exactly one stripe's worth of extents from the
/// stack, round-robins them into a fresh stripe, and stops. Every other
/// striper decorates this one.
#[derive(Debug, Default)]
pub struct SimpleStriper;

impl SimpleStriper {
    pub fn new() -> Self {
        Self
    }
}

impl Striper for SimpleStriper {
    fn create_stripes(&mut self, ctx: &mut StriperCtx) -> StripeBatchResult {
        self.create_stripe(ctx)
    }

    fn create_stripe(&mut self, ctx: &mut StriperCtx) -> StripeBatchResult {
        let n = ctx.stripes.num_data_exts_per_stripe();
        let popped = ctx.stack.pop_stripe(n);
        if popped.is_empty() {
            return StripeBatchResult::default();
        }

        let ext_size = ctx
            .extents
            .get(popped[0])
            .map(|e| e.ext_size)
            .unwrap_or(0);
        let stripe_id = ctx.stripes.create_new_stripe(ext_size, ctx.secondary_threshold);
        let stripe = ctx.stripes.get_mut(stripe_id).expect("just created");

        for ext_id in &popped {
            let Some(ext) = ctx.extents.get_mut(*ext_id) else {
                continue;
            };
            let obsolete = ext.obsolete_space;
            let timestamp = ext.timestamp;
            let locality = stripe.add_extent_round_robin(*ext_id, obsolete, timestamp);
            ext.stripe = Some(stripe_id);
            ext.locality = Some(locality);
        }

        let total_bytes = popped.len() as u64 * ext_size;
        StripeBatchResult {
            stripes: vec![stripe_id],
            reads: total_bytes,
            writes: total_bytes,
        }
    }

    fn cost_to_replace_extents(
        &mut self,
        _ext_size: u64,
        _exts_per_locality: &[u32],
        _obs_per_locality: &[u64],
        _valid_per_locality: &[u64],
    ) -> ReplCosts {
        ReplCosts::default()
    }

    fn cost_to_write_data(&self, bytes: u64) -> u64 {
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SimulationClock;
    use crate::extent_manager::ExtentManager;
    use crate::extent_stack::{ExtentStack, SingleExtentStack};
    use crate::stripe_manager::{StripeGeometry, StripeManager};

    fn geometry() -> StripeGeometry {
        StripeGeometry {
            num_data_exts_per_locality: 3,
            num_localities: 2,
            num_local_parities: 1,
            num_global_parities: 1,
            coding_overhead: 18.0 / 14.0,
        }
    }

    #[test]
    fn create_stripe_consumes_exactly_one_stripe_worth() {
        let mut extents = ExtentManager::new(10, 10);
        let mut stack = SingleExtentStack::new();
        for _ in 0..6 {
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
        let result = SimpleStriper::new().create_stripe(&mut ctx);
        assert_eq!(result.stripes.len(), 1);
        assert_eq!(result.reads, 60);
        assert_eq!(result.writes, 60);
        assert_eq!(stack.total_len(), 0);
    }

    #[test]
    fn create_stripe_returns_empty_when_stack_too_short() {
        let mut extents = ExtentManager::new(10, 10);
        let mut stack = SingleExtentStack::new();
        let id = extents.create_extent(Some(10), 0);
        stack.add(0, id);
        let mut stripes = StripeManager::new(geometry());
        let mut ctx = StriperCtx {
            stack: &mut stack,
            extents: &mut extents,
            stripes: &mut stripes,
            secondary_threshold: 10,
            now: SimulationClock::zero(),
        };
        let result = SimpleStriper::new().create_stripe(&mut ctx);
        assert!(result.stripes.is_empty());
    }
}
