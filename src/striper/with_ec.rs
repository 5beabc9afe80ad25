use super::{ReplCosts, StripeBatchResult, Striper, StriperCtx};

/// Geometry `StriperWithEc` needs to price a replacement, independent of
/// whatever a stripe's own fields say (the striper may be costing a
/// hypothetical repair, not an existing stripe).
#[derive(Debug, Clone, Copy)]
pub struct EcGeometry {
    pub num_data_exts_per_locality: usize,
    pub num_local_parities: usize,
    pub num_global_parities: usize,
    pub coding_overhead: f64,
}

/// Decorates an inner striper with the default erasure-coding cost model
/// (§4.8): stripe assembly writes scale by `coding_overhead`, and
/// `cost_to_replace_extents` prices a partial- or full-locality repair.
pub struct StriperWithEc {
    inner: Box<dyn Striper>,
    pub geometry: EcGeometry,
}

impl StriperWithEc {
    pub fn new(inner: Box<dyn Striper>, geometry: EcGeometry) -> Self {
        Self { inner, geometry }
    }

    fn num_localities_in(&self, exts_per_locality: &[u32]) -> usize {
        exts_per_locality.len()
    }

    /// The default replacement-cost model. Shared with
    /// [`super::EfficientStriperWithEc`], which picks between this and an
    /// alternative per call.
    pub(super) fn default_repl_cost(
        geometry: &EcGeometry,
        ext_size: u64,
        exts_per_locality: &[u32],
        obs_per_locality: &[u64],
        valid_per_locality: &[u64],
    ) -> ReplCosts {
        let total_data_exts_per_stripe = geometry.num_data_exts_per_locality * exts_per_locality.len();
        let total_replaced: u32 = exts_per_locality.iter().sum();

        // Whole stripe replaced: only parity needs rewriting, nothing
        // needs to be read back (§4.8 short circuit).
        if total_replaced as usize == total_data_exts_per_stripe && total_data_exts_per_stripe > 0 {
            return ReplCosts {
                global_parity_writes: geometry.num_global_parities as u64 * ext_size,
                local_parity_writes: geometry.num_local_parities as u64 * ext_size,
                ..Default::default()
            };
        }

        let mut costs = ReplCosts::default();
        let mut any_replaced = false;
        for (i, &exts) in exts_per_locality.iter().enumerate() {
            if exts == 0 {
                continue;
            }
            any_replaced = true;
            costs.valid_obj_reads += valid_per_locality.get(i).copied().unwrap_or(0);
            costs.obsolete_data_reads += obs_per_locality.get(i).copied().unwrap_or(0);
            costs.local_parity_writes += ext_size;
            if exts as usize != geometry.num_data_exts_per_locality {
                costs.local_parity_reads += ext_size;
            }
        }
        if any_replaced {
            costs.global_parity_reads += geometry.num_global_parities as u64 * ext_size;
            costs.global_parity_writes += geometry.num_global_parities as u64 * ext_size;
        }
        costs
    }
}

impl Striper for StriperWithEc {
    fn create_stripes(&mut self, ctx: &mut StriperCtx) -> StripeBatchResult {
        let mut result = self.inner.create_stripes(ctx);
        result.writes = (result.writes as f64 * self.geometry.coding_overhead).round() as u64;
        result
    }

    fn create_stripe(&mut self, ctx: &mut StriperCtx) -> StripeBatchResult {
        let mut result = self.inner.create_stripe(ctx);
        result.writes = (result.writes as f64 * self.geometry.coding_overhead).round() as u64;
        result
    }

    fn cost_to_replace_extents(
        &mut self,
        ext_size: u64,
        exts_per_locality: &[u32],
        obs_per_locality: &[u64],
        valid_per_locality: &[u64],
    ) -> ReplCosts {
        let _ = self.num_localities_in(exts_per_locality);
        Self::default_repl_cost(&self.geometry, ext_size, exts_per_locality, obs_per_locality, valid_per_locality)
    }

    fn cost_to_write_data(&self, bytes: u64) -> u64 {
        (bytes as f64 * self.geometry.coding_overhead).round() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> EcGeometry {
        EcGeometry {
            num_data_exts_per_locality: 3,
            num_local_parities: 1,
            num_global_parities: 1,
            coding_overhead: 18.0 / 14.0,
        }
    }

    // §8 scenario 3: one of three data extents in a two-locality stripe is
    // replaced; the other locality is untouched.
    #[test]
    fn partial_locality_replacement_charges_both_parities() {
        let costs =
            StriperWithEc::default_repl_cost(&geometry(), 10, &[1, 0], &[10, 0], &[0, 0]);
        assert_eq!(costs.obsolete_data_reads, 10);
        assert_eq!(costs.valid_obj_reads, 0);
        assert_eq!(costs.local_parity_reads, 10);
        assert_eq!(costs.local_parity_writes, 10);
        assert_eq!(costs.global_parity_reads, 10);
        assert_eq!(costs.global_parity_writes, 10);
    }

    #[test]
    fn whole_stripe_replacement_skips_reads() {
        let geometry = EcGeometry {
            num_data_exts_per_locality: 3,
            num_local_parities: 1,
            num_global_parities: 1,
            coding_overhead: 1.0,
        };
        let costs = StriperWithEc::default_repl_cost(&geometry, 10, &[3, 3], &[30, 30], &[0, 0]);
        assert_eq!(costs.obsolete_data_reads, 0);
        assert_eq!(costs.global_parity_writes, 10);
        assert_eq!(costs.local_parity_writes, 10);
    }
}
