#![cfg(test)]

// Property tests for HashIndex kept inside the crate so they can inspect the
// slot table, the resize flag and the growth sequence directly.

use crate::hash_index::{Config, HashIndex};
use hashbrown::HashMap;
use proptest::prelude::*;
use std::hash::{BuildHasher, Hasher};

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Put(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(String),
    Snapshot,
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Put(i, v)),
            3 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::Get),
            1 => "[a-z]{0,5}".prop_map(OpI::Contains),
            1 => Just(OpI::Snapshot),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Table layout facts that must hold after every operation.
fn assert_table_shape<S: BuildHasher>(
    sut: &HashIndex<i32, S>,
    capacities: &mut Vec<usize>,
) -> Result<(), TestCaseError> {
    prop_assert!(!sut.resizing);
    prop_assert_eq!(sut.backing.len(), sut.capacity);
    prop_assert_eq!(sut.full_count(), sut.len());
    prop_assert!(sut.len() < sut.capacity, "table must never fill up");
    prop_assert!(sut.check_invariants().is_ok());

    // Capacity only ever follows the c -> 2c + 1 chain.
    let last = *capacities.last().unwrap();
    if sut.capacity != last {
        prop_assert_eq!(sut.capacity, last * 2 + 1);
        capacities.push(sut.capacity);
    }
    Ok(())
}

fn run_scenario<S>(
    mut sut: HashIndex<i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher + Clone,
{
    let mut model: HashMap<String, i32> = HashMap::new();
    let mut capacities = vec![sut.capacity];
    let mut snapshots: Vec<(HashIndex<i32, S>, HashMap<String, i32>)> = Vec::new();

    for op in ops {
        match op {
            OpI::Put(i, v) => {
                let k = pool[i].clone();
                let prev = sut.put_mut(k.clone(), v).expect("put within max capacity");
                prop_assert_eq!(prev, model.insert(k, v));
            }
            OpI::Remove(i) => {
                let k = &pool[i];
                let removed = sut.remove_mut(k).expect("remove never fails");
                prop_assert_eq!(removed, model.remove(k));
            }
            OpI::Get(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.get(k).unwrap(), model.get(k));
            }
            OpI::Contains(s) => {
                prop_assert_eq!(sut.contains_key(&s).unwrap(), model.contains_key(&s));
            }
            OpI::Snapshot => snapshots.push((sut.clone(), model.clone())),
            OpI::Clear => {
                let capacity = sut.capacity;
                sut = sut.clear();
                model.clear();
                prop_assert_eq!(sut.capacity, capacity);
            }
        }

        assert_table_shape(&sut, &mut capacities)?;
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }

    // Snapshots taken along the way still read exactly what they held.
    for (snap, expected) in &snapshots {
        prop_assert_eq!(snap.len(), expected.len());
        for (k, v) in expected {
            prop_assert_eq!(snap.get(k).unwrap(), Some(v));
        }
        prop_assert!(snap.check_invariants().is_ok());
    }
    Ok(())
}

// Property: State-machine equivalence against hashbrown::HashMap.
// Invariants exercised across random operation sequences:
// - `put` returns the previous value exactly when the model had one.
// - `remove` returns the owned value matching the model.
// - `len()` equals `full_count()` and the model size after every step.
// - The table never fills; growth follows capacity -> 2 * capacity + 1.
// - Every entry is reachable from its home slot (`check_invariants`).
// - Clones taken earlier are unaffected by later in-place mutation.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let sut: HashIndex<i32> = HashIndex::with_capacity(1).unwrap();
        run_scenario(sut, &pool, ops)?;
    }
}

// Collision variant using a constant hasher: every key shares one home slot,
// so the whole table is a single cluster and every removal back-shifts.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Few-bucket variant: hashes collapse onto a handful of values, giving
// several interleaved clusters that wrap around the table end.
#[derive(Clone, Default)]
struct FewBucketsBuildHasher;
struct FewBucketsHasher(u64);
impl BuildHasher for FewBucketsBuildHasher {
    type Hasher = FewBucketsHasher;
    fn build_hasher(&self) -> Self::Hasher {
        FewBucketsHasher(0)
    }
}
impl Hasher for FewBucketsHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = self.0.wrapping_mul(31).wrapping_add(u64::from(b));
        }
    }
    fn finish(&self) -> u64 {
        // Land in the top slots so clusters run across the wrap point.
        (self.0 % 3) + 5
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let config = Config { capacity: 7, ..Config::default() };
        let sut = HashIndex::with_config(config, ConstBuildHasher).unwrap();
        run_scenario(sut, &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_with_wrapping_clusters((pool, ops) in arb_scenario()) {
        let config = Config { capacity: 7, load_factor: 0.9, ..Config::default() };
        let sut = HashIndex::with_config(config, FewBucketsBuildHasher).unwrap();
        run_scenario(sut, &pool, ops)?;
    }
}
