//! Stateless stripe factory plus roster.

use tracing::debug;

use crate::clock::SimulationClock;
use crate::model::{IdAllocator, Stripe, StripeId};

/// Derived stripe geometry, shared by every stripe the manager creates.
#[derive(Debug, Clone, Copy)]
pub struct StripeGeometry {
    pub num_data_exts_per_locality: usize,
    pub num_localities: usize,
    pub num_local_parities: usize,
    pub num_global_parities: usize,
    pub coding_overhead: f64,
}

impl StripeGeometry {
    pub fn num_data_exts_per_stripe(&self) -> usize {
        self.num_data_exts_per_locality * self.num_localities
    }

    pub fn num_exts_per_stripe(&self) -> usize {
        self.num_data_exts_per_stripe() + self.num_local_parities + self.num_global_parities
    }
}

pub struct StripeManager {
    stripes: Vec<Option<Stripe>>,
    roster: Vec<StripeId>,
    ids: IdAllocator,
    pub geometry: StripeGeometry,
}

impl StripeManager {
    pub fn new(geometry: StripeGeometry) -> Self {
        Self {
            stripes: Vec::new(),
            roster: Vec::new(),
            ids: IdAllocator::new(),
            geometry,
        }
    }

    pub fn num_data_exts_per_stripe(&self) -> usize {
        self.geometry.num_data_exts_per_stripe()
    }

    pub fn num_exts_per_stripe(&self) -> usize {
        self.geometry.num_exts_per_stripe()
    }

    /// Returns a stripe with the configured geometry, sized to `ext_size`.
    pub fn create_new_stripe(&mut self, ext_size: u64, secondary_threshold: u8) -> StripeId {
        let id = self.ids.next_stripe();
        let stripe = Stripe::new(
            id,
            self.geometry.num_data_exts_per_locality,
            self.geometry.num_localities,
            self.geometry.num_local_parities,
            self.geometry.num_global_parities,
            ext_size,
            secondary_threshold,
        );
        let idx = id.0 as usize;
        if self.stripes.len() <= idx {
            self.stripes.resize_with(idx + 1, || None);
        }
        self.stripes[idx] = Some(stripe);
        self.roster.push(id);
        id
    }

    pub fn get(&self, id: StripeId) -> Option<&Stripe> {
        self.stripes.get(id.0 as usize).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, id: StripeId) -> Option<&mut Stripe> {
        self.stripes.get_mut(id.0 as usize).and_then(|s| s.as_mut())
    }

    /// Removes `id` from the roster — the sole legitimate way to retire a
    /// stripe (§4.5).
    pub fn delete_stripe(&mut self, id: StripeId) {
        if let Some(slot) = self.stripes.get_mut(id.0 as usize) {
            *slot = None;
        }
        self.roster.retain(|s| *s != id);
    }

    pub fn num_stripes(&self) -> usize {
        self.roster.len()
    }

    pub fn roster(&self) -> &[StripeId] {
        &self.roster
    }

    /// Total data bytes currently held across every live stripe,
    /// generalizing `original_source/stripe_manager.h::get_data_dc_size`.
    pub fn data_dc_size(&self) -> u64 {
        self.roster
            .iter()
            .filter_map(|id| self.get(*id))
            .map(|s| s.ext_size * s.num_data_exts_per_stripe() as u64)
            .sum()
    }

    /// Data size scaled by `coding_overhead`, generalizing
    /// `get_total_dc_size`.
    pub fn total_dc_size(&self) -> f64 {
        self.data_dc_size() as f64 * self.geometry.coding_overhead
    }

    pub fn log_dc_size(&self, now: SimulationClock) {
        debug!(
            tick = now.now(),
            data_dc_size = self.data_dc_size(),
            total_dc_size = self.total_dc_size(),
            "data center size"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn derived_sizes_match_formula() {
        let sm = StripeManager::new(geometry());
        assert_eq!(sm.num_data_exts_per_stripe(), 6);
        assert_eq!(sm.num_exts_per_stripe(), 8);
    }

    #[test]
    fn create_and_delete_stripe_updates_roster() {
        let mut sm = StripeManager::new(geometry());
        let id = sm.create_new_stripe(10, 10);
        assert_eq!(sm.num_stripes(), 1);
        sm.delete_stripe(id);
        assert_eq!(sm.num_stripes(), 0);
        assert!(sm.get(id).is_none());
    }

    #[test]
    fn data_dc_size_sums_across_stripes() {
        let mut sm = StripeManager::new(geometry());
        sm.create_new_stripe(10, 10);
        sm.create_new_stripe(10, 10);
        assert_eq!(sm.data_dc_size(), 10 * 6 * 2);
    }
}
