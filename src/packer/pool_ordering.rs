//! Pool-draining order: the second axis distinguishing the named packers
//! in §4.7's table.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::key_fn::KeyFn;
use crate::clock::SimulationClock;
use crate::model::{Object, ObjectId};

#[derive(Debug, Clone)]
pub enum PoolOrdering {
    /// Process in whatever order the pool holds them (insertion order).
    Insertion,
    /// Smallest remaining-bytes first.
    SmallerFirst,
    /// Chosen per current pool state: descending when the pool holds an
    /// even number of entries, ascending otherwise — a stand-in for the
    /// source's unspecified "dynamic" rule, pinned here for determinism.
    Dynamic,
    /// Largest (whole) objects first, so later smaller ones fill the
    /// extent-space gaps the large ones leave behind.
    WholeObjectFirst,
    /// Uniform-random order.
    Random,
    /// Stable by key, randomized among entries sharing a key.
    RandomWithinBucket,
}

impl PoolOrdering {
    pub fn order(
        &self,
        mut entries: Vec<(ObjectId, u64)>,
        lookup: impl Fn(ObjectId) -> Option<Object>,
        key_fn: &KeyFn,
        now: SimulationClock,
        rng: &mut StdRng,
    ) -> Vec<(ObjectId, u64)> {
        match self {
            PoolOrdering::Insertion => entries,
            PoolOrdering::SmallerFirst => {
                entries.sort_by_key(|(_, remaining)| *remaining);
                entries
            }
            PoolOrdering::WholeObjectFirst => {
                entries.sort_by_key(|(_, remaining)| std::cmp::Reverse(*remaining));
                entries
            }
            PoolOrdering::Dynamic => {
                if entries.len() % 2 == 0 {
                    entries.sort_by_key(|(_, remaining)| std::cmp::Reverse(*remaining));
                } else {
                    entries.sort_by_key(|(_, remaining)| *remaining);
                }
                entries
            }
            PoolOrdering::Random => {
                entries.shuffle(rng);
                entries
            }
            PoolOrdering::RandomWithinBucket => {
                let mut keyed: Vec<(i64, (ObjectId, u64))> = entries
                    .into_iter()
                    .map(|(id, remaining)| {
                        let key = lookup(id)
                            .map(|obj| key_fn.key_of(&obj, now, rng))
                            .unwrap_or(0);
                        (key, (id, remaining))
                    })
                    .collect();
                keyed.sort_by_key(|(key, _)| *key);
                // Shuffle within each contiguous run sharing a key.
                let mut start = 0;
                while start < keyed.len() {
                    let mut end = start + 1;
                    while end < keyed.len() && keyed[end].0 == keyed[start].0 {
                        end += 1;
                    }
                    keyed[start..end].shuffle(rng);
                    start = end;
                }
                keyed.into_iter().map(|(_, e)| e).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn smaller_first_sorts_ascending() {
        let mut rng = StdRng::seed_from_u64(0);
        let entries = vec![(ObjectId(0), 50), (ObjectId(1), 10), (ObjectId(2), 30)];
        let ordered = PoolOrdering::SmallerFirst.order(
            entries,
            |_| None,
            &KeyFn::Constant(0),
            SimulationClock::zero(),
            &mut rng,
        );
        let sizes: Vec<u64> = ordered.iter().map(|(_, r)| *r).collect();
        assert_eq!(sizes, vec![10, 30, 50]);
    }

    #[test]
    fn whole_object_first_sorts_descending() {
        let mut rng = StdRng::seed_from_u64(0);
        let entries = vec![(ObjectId(0), 10), (ObjectId(1), 50)];
        let ordered = PoolOrdering::WholeObjectFirst.order(
            entries,
            |_| None,
            &KeyFn::Constant(0),
            SimulationClock::zero(),
            &mut rng,
        );
        assert_eq!(ordered[0].1, 50);
    }
}
