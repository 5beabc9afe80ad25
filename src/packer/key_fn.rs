//! Placement key functions: the one axis that distinguishes most of the
//! eleven named packers in §4.7's table (the other is [`super::pool_ordering::PoolOrdering`]).

use rand::rngs::StdRng;
use rand::Rng;

use crate::clock::SimulationClock;
use crate::model::Object;
use crate::sampler::SIZE_BUCKETS;

/// The object-expiry cutoff (in ticks from creation) below which
/// `MortalImmortal`'s classifier considers an object "expected mortal".
/// Matches the sampler's own finite life buckets — anything drawn from
/// its catch-all `ceil(sim_time + 1)` bucket is, by construction, never
/// going to expire inside the run and is the "immortal" class.
pub const MORTAL_THRESHOLD_TICKS: u64 = 365;

#[derive(Debug, Clone)]
pub enum KeyFn {
    /// Used by Simple, MixedObj and Randomized.
    Constant(i64),
    /// `floor(obj.age)`, used by AgeBased and AgeBasedRandomized.
    AgeBucket,
    /// Index into the sampler's own size-bucket table, used by the
    /// SizeBased family.
    SizeClass,
    /// `obj.generation`, used by GenerationBased.
    Generation,
    /// Partitions into expected-mortal (key 0) vs immortal (key 1) with a
    /// classifier correct with probability `percent_correct`.
    MortalImmortal { percent_correct: f64 },
}

impl KeyFn {
    pub fn key_of(&self, obj: &Object, now: SimulationClock, rng: &mut StdRng) -> i64 {
        match self {
            KeyFn::Constant(k) => *k,
            KeyFn::AgeBucket => {
                let age = now.now().saturating_sub(obj.creation_time);
                age as i64
            }
            KeyFn::SizeClass => size_class(obj.size),
            KeyFn::Generation => obj.generation as i64,
            KeyFn::MortalImmortal { percent_correct } => {
                let true_mortal = obj.life.saturating_sub(obj.creation_time) <= MORTAL_THRESHOLD_TICKS;
                let roll: f64 = rng.gen_range(0.0..1.0);
                let classified_mortal = if roll < *percent_correct {
                    true_mortal
                } else {
                    !true_mortal
                };
                if classified_mortal {
                    0
                } else {
                    1
                }
            }
        }
    }

    /// Tag written onto every extent this key function seals, so
    /// `record_ext_types` (§9 supplemental) has something non-empty to
    /// tally reclaimed space by.
    pub fn type_name(&self) -> &'static str {
        match self {
            KeyFn::Constant(_) => "constant",
            KeyFn::AgeBucket => "age_bucket",
            KeyFn::SizeClass => "size_class",
            KeyFn::Generation => "generation",
            KeyFn::MortalImmortal { .. } => "mortal_immortal",
        }
    }
}

fn size_class(size: u64) -> i64 {
    for (idx, &(lo, hi, _)) in SIZE_BUCKETS.iter().enumerate() {
        if size >= lo as u64 && size <= hi as u64 {
            return idx as i64;
        }
    }
    if size < SIZE_BUCKETS[0].0 as u64 {
        0
    } else {
        (SIZE_BUCKETS.len() - 1) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ObjectId;
    use rand::SeedableRng;

    #[test]
    fn age_bucket_is_floor_of_elapsed_time() {
        let mut rng = StdRng::seed_from_u64(0);
        let obj = Object::new(ObjectId(0), 10, 20, 3);
        let key = KeyFn::AgeBucket.key_of(&obj, SimulationClock::at(10), &mut rng);
        assert_eq!(key, 7);
    }

    #[test]
    fn size_class_is_stable_across_repeated_calls() {
        assert_eq!(size_class(5), size_class(8));
        assert_ne!(size_class(5), size_class(3000));
    }
}
