//! Dissolve-and-rebuild: an entire stripe is torn down and its extents'
//! live data re-pooled, rather than repaired extent by extent.

use super::{GcStrategy, StripeGcRet};
use crate::coordinator::Coordinator;
use crate::model::StripeId;

pub struct StripeLevelNoExtsGCStrategy {
    primary_threshold: u8,
    record_ext_types: bool,
}

impl StripeLevelNoExtsGCStrategy {
    pub fn new(primary_threshold: u8, record_ext_types: bool) -> Self {
        Self {
            primary_threshold,
            record_ext_types,
        }
    }
}

impl GcStrategy for StripeLevelNoExtsGCStrategy {
    fn primary_threshold(&self) -> u8 {
        self.primary_threshold
    }

    fn stripe_gc(&mut self, stripe_id: StripeId, coordinator: &mut Coordinator) -> StripeGcRet {
        let mut ret = StripeGcRet::default();

        let localities = match coordinator.stripe_manager().get(stripe_id) {
            Some(s) => s.localities().to_vec(),
            None => return ret,
        };

        for locality in &localities {
            for &ext_id in locality {
                let Some(ext) = coordinator.extent_manager().get(ext_id) else {
                    continue;
                };
                let obsolete = ext.obsolete_space;
                let valid = ext.valid_space();
                let ext_type = ext.ext_type.clone();

                ret.temp_space += obsolete;
                ret.valid_obj_transfers += valid;
                coordinator.gc_extent(ext_id);
                coordinator.extent_manager_mut().delete_extent(ext_id);
                ret.num_exts_replaced += 1;
                if self.record_ext_types {
                    *ret.reclaimed_space_by_ext_types.entry(ext_type).or_insert(0) += obsolete;
                }
            }
        }

        coordinator.stripe_manager_mut().delete_stripe(stripe_id);

        let generated = coordinator.generate_gc_stripes();
        if generated.stripes.is_empty() {
            let fallback = coordinator.get_stripe(0);
            ret.user_reads = fallback.reads;
            ret.user_writes = fallback.writes;
        } else {
            ret.user_reads = generated.reads;
            ret.user_writes = generated.writes;
        }

        // Rebuilding costs only parity, split evenly between global and
        // local; the data itself was already paid for in `user_reads`.
        let parity_writes = ret.user_writes.saturating_sub(ret.user_reads);
        ret.global_parity_writes = parity_writes / 2;
        ret.local_parity_writes = parity_writes / 2;
        ret.user_writes = ret.user_reads;

        ret
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::extent_stack::SingleExtentStack;
    use crate::packer::ObjectPacker;
    use crate::sampler::SanityCheckSampler;
    use crate::striper::{EcGeometry, ExtentStackStriper, SimpleStriper, Striper, StriperWithEc};

    fn small_config() -> SimConfig {
        let mut cfg = SimConfig::default();
        cfg.ext_size = 10;
        cfg.num_data_exts_per_locality = 2;
        cfg.num_localities = 1;
        cfg.num_local_parities = 1;
        cfg.num_global_parities = 0;
        cfg.coding_overhead = 1.0;
        cfg.num_objs = 20;
        cfg.simulation_time = 10;
        cfg
    }

    fn coordinator(config: SimConfig) -> Coordinator {
        let geometry = EcGeometry {
            num_data_exts_per_locality: config.num_data_exts_per_locality,
            num_local_parities: config.num_local_parities,
            num_global_parities: config.num_global_parities,
            coding_overhead: config.coding_overhead,
        };
        let striper: Box<dyn Striper> = Box::new(StriperWithEc::new(
            Box::new(ExtentStackStriper::new(Box::new(SimpleStriper::new()))),
            geometry,
        ));
        let gc_striper: Box<dyn Striper> = Box::new(StriperWithEc::new(
            Box::new(ExtentStackStriper::new(Box::new(SimpleStriper::new()))),
            geometry,
        ));
        Coordinator::new(
            config,
            ObjectPacker::simple(0),
            ObjectPacker::simple(1),
            striper,
            gc_striper,
            Box::new(SingleExtentStack::new()),
            Box::new(SingleExtentStack::new()),
            Box::new(SanityCheckSampler::new(10, 1)),
            false,
        )
    }

    #[test]
    fn dissolves_stripe_and_reclaims_every_extent() {
        let mut coord = coordinator(small_config());
        let stripe_id = coord.get_stripe(0).stripes[0];
        let mut strategy = StripeLevelNoExtsGCStrategy::new(0, false);
        let ret = strategy.stripe_gc(stripe_id, &mut coord);
        // 2 data extents per locality * 1 locality.
        assert_eq!(ret.num_exts_replaced, 2);
        assert!(coord.stripe_manager().get(stripe_id).is_none());
    }

    #[test]
    fn records_ext_types_when_enabled() {
        let mut coord = coordinator(small_config());
        let stripe_id = coord.get_stripe(0).stripes[0];
        let mut strategy = StripeLevelNoExtsGCStrategy::new(0, true);
        let ret = strategy.stripe_gc(stripe_id, &mut coord);
        assert_eq!(
            ret.reclaimed_space_by_ext_types.values().sum::<u64>(),
            ret.temp_space
        );
    }
}
