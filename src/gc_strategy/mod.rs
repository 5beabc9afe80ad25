//! Garbage-collection strategies (§4.9): decide which stripes to reclaim
//! and how the erasure-coded data they held gets accounted for and
//! rebuilt.
//!
//! Three concrete strategies share one `gc_handler` walk (`run_gc_handler`
//! below); they differ only in what `stripe_gc` does to a single
//! candidate stripe.

mod mix_obj;
mod no_exts;
mod with_exts;

pub use mix_obj::MixObjStripeLevelStrategy;
pub use no_exts::StripeLevelNoExtsGCStrategy;
pub use with_exts::StripeLevelWithExtsGCStrategy;

use std::collections::HashMap;

use crate::coordinator::Coordinator;
use crate::model::StripeId;

/// Per-stripe GC outcome (§4.9).
#[derive(Debug, Clone, Default)]
pub struct StripeGcRet {
    pub temp_space: u64,
    pub user_reads: u64,
    pub user_writes: u64,
    pub global_parity_reads: u64,
    pub global_parity_writes: u64,
    pub local_parity_reads: u64,
    pub local_parity_writes: u64,
    pub obsolete_data_reads: u64,
    pub absent_data_reads: u64,
    pub valid_obj_transfers: u64,
    pub storage_node_to_parity_calculator: u64,
    pub num_exts_replaced: u64,
    pub reclaimed_space_by_ext_types: HashMap<String, u64>,
}

/// Totals across every `stripe_gc` call in one `gc_handler` pass.
#[derive(Debug, Clone, Default)]
pub struct GcHandlerRet {
    pub num_stripes_gced: u64,
    pub temp_space: u64,
    pub user_reads: u64,
    pub user_writes: u64,
    pub global_parity_reads: u64,
    pub global_parity_writes: u64,
    pub local_parity_reads: u64,
    pub local_parity_writes: u64,
    pub obsolete_data_reads: u64,
    pub absent_data_reads: u64,
    pub valid_obj_transfers: u64,
    pub storage_node_to_parity_calculator: u64,
    pub num_exts_replaced: u64,
    pub reclaimed_space_by_ext_types: HashMap<String, u64>,
}

impl GcHandlerRet {
    fn accumulate(&mut self, r: &StripeGcRet) {
        self.num_stripes_gced += 1;
        self.temp_space += r.temp_space;
        self.user_reads += r.user_reads;
        self.user_writes += r.user_writes;
        self.global_parity_reads += r.global_parity_reads;
        self.global_parity_writes += r.global_parity_writes;
        self.local_parity_reads += r.local_parity_reads;
        self.local_parity_writes += r.local_parity_writes;
        self.obsolete_data_reads += r.obsolete_data_reads;
        self.absent_data_reads += r.absent_data_reads;
        self.valid_obj_transfers += r.valid_obj_transfers;
        self.storage_node_to_parity_calculator += r.storage_node_to_parity_calculator;
        self.num_exts_replaced += r.num_exts_replaced;
        for (ty, bytes) in &r.reclaimed_space_by_ext_types {
            *self.reclaimed_space_by_ext_types.entry(ty.clone()).or_insert(0) += bytes;
        }
    }

    /// Folds another pass's totals into this one, for the per-run summary.
    pub fn merge(&mut self, other: &GcHandlerRet) {
        self.num_stripes_gced += other.num_stripes_gced;
        self.temp_space += other.temp_space;
        self.user_reads += other.user_reads;
        self.user_writes += other.user_writes;
        self.global_parity_reads += other.global_parity_reads;
        self.global_parity_writes += other.global_parity_writes;
        self.local_parity_reads += other.local_parity_reads;
        self.local_parity_writes += other.local_parity_writes;
        self.obsolete_data_reads += other.obsolete_data_reads;
        self.absent_data_reads += other.absent_data_reads;
        self.valid_obj_transfers += other.valid_obj_transfers;
        self.storage_node_to_parity_calculator += other.storage_node_to_parity_calculator;
        self.num_exts_replaced += other.num_exts_replaced;
        for (ty, bytes) in &other.reclaimed_space_by_ext_types {
            *self.reclaimed_space_by_ext_types.entry(ty.clone()).or_insert(0) += bytes;
        }
    }
}

/// Shared contract for the three concrete strategies (§4.9).
pub trait GcStrategy {
    /// Reclaims or repairs one candidate stripe.
    fn stripe_gc(&mut self, stripe: StripeId, coordinator: &mut Coordinator) -> StripeGcRet;

    fn primary_threshold(&self) -> u8;

    /// Sorts `stripes` by id, GCs every one at or above `primary_threshold`,
    /// accumulates the totals, and drops from `stripes` whichever ones
    /// `stripe_manager` no longer holds afterward.
    fn gc_handler(&mut self, stripes: &mut Vec<StripeId>, coordinator: &mut Coordinator) -> GcHandlerRet {
        let threshold = self.primary_threshold();
        run_gc_handler(threshold, stripes, coordinator, |coord, id| self.stripe_gc(id, coord))
    }
}

pub(crate) fn run_gc_handler(
    primary_threshold: u8,
    stripes: &mut Vec<StripeId>,
    coordinator: &mut Coordinator,
    mut stripe_gc: impl FnMut(&mut Coordinator, StripeId) -> StripeGcRet,
) -> GcHandlerRet {
    stripes.sort();
    let mut ret = GcHandlerRet::default();
    let mut kept = Vec::with_capacity(stripes.len());
    for id in stripes.drain(..) {
        let Some(obsolete) = coordinator.stripe_manager().get(id).map(|s| s.get_obsolete_percentage()) else {
            continue;
        };
        assert!(
            obsolete <= 100.0,
            "stripe {} obsolete percentage {} exceeds 100",
            id,
            obsolete
        );
        if obsolete >= primary_threshold as f64 {
            let res = stripe_gc(coordinator, id);
            ret.accumulate(&res);
            if coordinator.stripe_manager().get(id).is_some() {
                kept.push(id);
            }
        } else {
            kept.push(id);
        }
    }
    *stripes = kept;
    ret
}
