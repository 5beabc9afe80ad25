//! Extent-level repair: only the individual data extents past their own
//! secondary threshold are replaced, in place, within a stripe that stays
//! alive throughout.

use super::{GcStrategy, StripeGcRet};
use crate::coordinator::Coordinator;
use crate::model::StripeId;

pub struct StripeLevelWithExtsGCStrategy {
    primary_threshold: u8,
    record_ext_types: bool,
}

impl StripeLevelWithExtsGCStrategy {
    pub fn new(primary_threshold: u8, record_ext_types: bool) -> Self {
        Self {
            primary_threshold,
            record_ext_types,
        }
    }
}

impl GcStrategy for StripeLevelWithExtsGCStrategy {
    fn primary_threshold(&self) -> u8 {
        self.primary_threshold
    }

    fn stripe_gc(&mut self, stripe_id: StripeId, coordinator: &mut Coordinator) -> StripeGcRet {
        let mut ret = StripeGcRet::default();

        let (localities, ext_size) = match coordinator.stripe_manager().get(stripe_id) {
            Some(s) => (s.localities().to_vec(), s.ext_size),
            None => return ret,
        };

        let num_localities = localities.len();
        let mut exts_per_locality = vec![0u32; num_localities];
        let mut obs_per_locality = vec![0u64; num_localities];
        let mut valid_per_locality = vec![0u64; num_localities];

        for (locality_idx, locality) in localities.iter().enumerate() {
            for &ext_id in locality {
                let Some(ext) = coordinator.extent_manager().get(ext_id) else {
                    continue;
                };
                if ext.get_obsolete_percentage() < ext.secondary_threshold as f64 {
                    continue;
                }
                let key = ext.key;
                let obsolete = ext.obsolete_space;
                let valid = ext.valid_space();
                let ext_type = ext.ext_type.clone();

                ret.temp_space += obsolete;
                ret.valid_obj_transfers += valid;
                exts_per_locality[locality_idx] += 1;
                obs_per_locality[locality_idx] += obsolete;
                valid_per_locality[locality_idx] += valid;

                coordinator.gc_extent(ext_id);
                if let Some(stripe) = coordinator.stripe_manager_mut().get_mut(stripe_id) {
                    stripe.del_extent(locality_idx, ext_id, obsolete);
                }
                coordinator.extent_manager_mut().delete_extent(ext_id);

                let replacement = coordinator
                    .get_gc_extent(key)
                    .unwrap_or_else(|| coordinator.get_extent(key));
                let (rep_obsolete, rep_timestamp) = coordinator
                    .extent_manager()
                    .get(replacement)
                    .map(|e| (e.obsolete_space, e.timestamp))
                    .unwrap_or((0, 0));
                if let Some(stripe) = coordinator.stripe_manager_mut().get_mut(stripe_id) {
                    stripe.add_extent_at(locality_idx, replacement, rep_obsolete, rep_timestamp);
                }
                if let Some(rep_ext) = coordinator.extent_manager_mut().get_mut(replacement) {
                    rep_ext.stripe = Some(stripe_id);
                    rep_ext.locality = Some(locality_idx);
                }

                ret.user_reads += ext_size;
                ret.user_writes += ext_size;
                ret.num_exts_replaced += 1;
                if self.record_ext_types {
                    *ret.reclaimed_space_by_ext_types.entry(ext_type).or_insert(0) += obsolete;
                }
            }
        }

        if ret.num_exts_replaced > 0 {
            let costs =
                coordinator.gc_replacement_cost(ext_size, &exts_per_locality, &obs_per_locality, &valid_per_locality);
            ret.global_parity_reads += costs.global_parity_reads;
            ret.global_parity_writes += costs.global_parity_writes;
            ret.local_parity_reads += costs.local_parity_reads;
            ret.local_parity_writes += costs.local_parity_writes;
            ret.obsolete_data_reads += costs.obsolete_data_reads;
            ret.absent_data_reads += costs.absent_data_reads;
            ret.storage_node_to_parity_calculator += costs.valid_obj_reads;
        }

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
        cfg.secondary_threshold = 50;
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
    fn leaves_stripe_alive_when_nothing_crosses_threshold() {
        let mut coord = coordinator(small_config());
        let stripe_id = coord.get_stripe(0).stripes[0];
        let mut strategy = StripeLevelWithExtsGCStrategy::new(0, false);
        let ret = strategy.stripe_gc(stripe_id, &mut coord);
        assert_eq!(ret.num_exts_replaced, 0);
        assert!(coord.stripe_manager().get(stripe_id).is_some());
    }

    #[test]
    fn replaces_only_extents_past_their_own_secondary_threshold() {
        let mut coord = coordinator(small_config());
        let stripe_id = coord.get_stripe(0).stripes[0];
        let ext_id = coord.stripe_manager().get(stripe_id).unwrap().locality(0)[0];
        {
            let ext = coord.extent_manager_mut().get_mut(ext_id).unwrap();
            ext.obsolete_space = ext.ext_size;
        }
        let mut strategy = StripeLevelWithExtsGCStrategy::new(0, false);
        let ret = strategy.stripe_gc(stripe_id, &mut coord);
        assert_eq!(ret.num_exts_replaced, 1);
        assert!(coord.stripe_manager().get(stripe_id).is_some());
        let remaining = coord.stripe_manager().get(stripe_id).unwrap().locality(0);
        assert_eq!(remaining.len(), 2);
        assert!(!remaining.contains(&ext_id));
    }
}
