//! Creates and destroys objects, registering their deletion events.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::clock::SimulationClock;
use crate::event_manager::EventManager;
use crate::model::{IdAllocator, Object, ObjectId};
use crate::sampler::Sampler;

/// One freshly created object paired with its still-unplaced byte count,
/// the shape a packer's `add_objs` expects (§4.7).
pub struct ObjRecord {
    pub id: ObjectId,
    pub remaining: u64,
}

pub struct ObjectManager {
    objects: Vec<Option<Object>>,
    ids: IdAllocator,
    add_noise: bool,
    noise_rng: StdRng,
}

impl ObjectManager {
    pub fn new(add_noise: bool, rng_seed: u64) -> Self {
        Self {
            objects: Vec::new(),
            ids: IdAllocator::new(),
            add_noise,
            noise_rng: StdRng::seed_from_u64(rng_seed),
        }
    }

    /// Draws `num_samples` `(size, life)` pairs and materializes an object
    /// for each, per §4.3: optional ±12-unit noise is divided by 24 using
    /// truncating (toward-zero) division, matching the source's `noise/24`
    /// in C++ — for `noise` in `[-12,12]` that is always 0, so the noise
    /// term is a no-op by construction (this is *not* the `randint` bug,
    /// see `SPEC_FULL.md` §9) — then the current tick is added to get an
    /// absolute expiry.
    pub fn create_new_objects(
        &mut self,
        sampler: &mut dyn Sampler,
        event_manager: &mut EventManager,
        now: SimulationClock,
        num_samples: usize,
    ) -> Vec<ObjRecord> {
        let (sizes, lives) = sampler.sample(num_samples);
        let mut created = Vec::with_capacity(num_samples);
        for (size, mut life) in sizes.into_iter().zip(lives.into_iter()) {
            if self.add_noise {
                let noise: i64 = self.noise_rng.gen_range(0..25) - 12;
                life = (life as i64 + noise / 24) as u32;
            }
            let expiry = now.now() + life as u64;
            let id = self.ids.next_object();
            let obj = Object::new(id, size as u64, expiry, now.now());
            self.objects.push(Some(obj));
            event_manager.push(expiry, id);
            created.push(ObjRecord {
                id,
                remaining: size as u64,
            });
        }
        debug!(count = created.len(), tick = now.now(), "created objects");
        created
    }

    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(id.0 as usize).and_then(|o| o.as_ref())
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(id.0 as usize).and_then(|o| o.as_mut())
    }

    pub fn get_num_objs(&self) -> usize {
        self.objects.iter().filter(|o| o.is_some()).count()
    }

    /// Removes the object from the manager's registry. Does not cascade
    /// to extents — per §4.3, the GC/deletion path is responsible for
    /// unlinking shards first.
    pub fn remove_object(&mut self, id: ObjectId) {
        if let Some(slot) = self.objects.get_mut(id.0 as usize) {
            *slot = None;
        }
    }
}
