// HashIndex integration suite.
//
// Each test documents what behavior is being verified and which
// invariants are assumed or asserted. The core invariants exercised:
// - Counting: `len()` always equals `full_count()`.
// - Growth: the table grows to 2c + 1 once the load threshold is reached,
//   and every key stays retrievable across any number of resizes.
// - Persistence: `put`/`remove`/`clear` leave the receiver unchanged.
// - Removal: clearing a slot never strands later keys of the same cluster.
use avl_hashindex::{Config, Error, HashIndex, DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR};
use std::collections::BTreeSet;
use std::hash::{BuildHasher, Hasher};

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

// Test: overwrite of an existing key.
// Assumes: the second put finds the key in its probe chain.
// Verifies: size stays 1 and the new value wins.
#[test]
fn put_same_key_twice_overwrites() {
    let m = HashIndex::new()
        .put("key", "123".to_string())
        .unwrap()
        .put("key", "999".to_string())
        .unwrap();
    assert_eq!(m.len(), 1);
    assert_eq!(m.full_count(), 1);
    assert_eq!(m.get("key").unwrap(), Some(&"999".to_string()));
}

// Test: growth trigger at the load threshold.
// Assumes: floor(11 * 0.75) = 8 entries fit before growth.
// Verifies: the 9th distinct key triggers exactly one resize to 23 and the
// first eight keys are still retrievable.
#[test]
fn ninth_insert_grows_eleven_to_twenty_three() {
    let mut m: HashIndex<usize> = HashIndex::with_capacity_and_load(11, 0.75).unwrap();
    for i in 0..8 {
        m = m.put(format!("key{i}"), i).unwrap();
        assert_eq!(m.capacity(), 11, "no growth before the threshold");
    }
    m = m.put("key8", 8).unwrap();
    assert_eq!(m.capacity(), 23);
    assert_eq!(m.len(), 9);
    for i in 0..8 {
        assert_eq!(m.get(&format!("key{i}")).unwrap(), Some(&i));
    }
    m.check_invariants().unwrap();
}

// Test: keys survive repeated growth from the default size.
// Assumes: a default map starts at DEFAULT_CAPACITY slots.
// Verifies: all 20 keys are present with their own name as value.
#[test]
fn twenty_growkeys_survive_resizes() {
    let mut m = HashIndex::new();
    assert_eq!(m.capacity(), DEFAULT_CAPACITY);
    for i in 0..20 {
        let key = format!("growkey{i}");
        m = m.put(key.clone(), key).unwrap();
    }
    assert!(m.capacity() > DEFAULT_CAPACITY);
    for i in 0..20 {
        let key = format!("growkey{i}");
        assert!(m.contains_key(&key).unwrap());
        assert_eq!(m.get(&key).unwrap(), Some(&key));
    }
    assert_eq!(m.len(), 20);
    assert_eq!(m.full_count(), 20);
}

// Test: removing an absent key.
// Assumes: the probe stops at the first empty slot.
// Verifies: the result is absent and the size is unchanged.
#[test]
fn remove_missing_key_is_absent() {
    let m = HashIndex::new().put("present", 1).unwrap();
    let (removed, after) = m.remove("missing").unwrap();
    assert_eq!(removed, None);
    assert_eq!(after.len(), 1);
    assert_eq!(after.get("present").unwrap(), Some(&1));
}

// Test: the stranded-entry regression.
// Assumes: a constant hasher puts three keys on one home slot, occupying it
// and the next two slots.
// Verifies: removing the middle key leaves the third findable and counted.
#[test]
fn removing_middle_of_three_colliding_keys_keeps_third() {
    let mut m = HashIndex::with_hasher(ConstBuildHasher);
    for (k, v) in [("one", 1), ("two", 2), ("three", 3)] {
        m = m.put(k, v).unwrap();
    }
    let (removed, m) = m.remove("two").unwrap();
    assert_eq!(removed, Some(2));
    assert!(m.contains_key("three").unwrap());
    assert_eq!(m.get("three").unwrap(), Some(&3));
    assert_eq!(m.get("one").unwrap(), Some(&1));
    assert!(!m.contains_key("two").unwrap());
    assert_eq!(m.len(), 2);
    assert_eq!(m.full_count(), 2);
    m.check_invariants().unwrap();
}

// Test: value semantics of put/remove/clear.
// Assumes: each operation returns a new map.
// Verifies: every earlier version still reads its own contents.
#[test]
fn earlier_versions_are_unchanged() {
    let v0: HashIndex<i32> = HashIndex::new();
    let v1 = v0.put("a", 1).unwrap();
    let v2 = v1.put("b", 2).unwrap();
    let (_, v3) = v2.remove("a").unwrap();
    let v4 = v3.clear();

    assert!(v0.is_empty());
    assert_eq!(v1.keys(), vec!["a"]);
    assert_eq!(v2.len(), 2);
    assert_eq!(v2.get("a").unwrap(), Some(&1));
    assert_eq!(v3.get("a").unwrap(), None);
    assert_eq!(v3.get("b").unwrap(), Some(&2));
    assert!(v4.is_empty());
    assert_eq!(v4.capacity(), v3.capacity());
    assert_eq!(v4.load_factor(), v3.load_factor());
}

// Test: in-place variants report previous values.
// Assumes: put_mut/remove_mut mirror put/remove.
// Verifies: the previous value comes back on overwrite and removal.
#[test]
fn in_place_variants_return_previous_values() {
    let mut m = HashIndex::new();
    assert_eq!(m.put_mut("k", 1).unwrap(), None);
    assert_eq!(m.put_mut("k", 2).unwrap(), Some(1));
    assert_eq!(m.remove_mut("k").unwrap(), Some(2));
    assert_eq!(m.remove_mut("k").unwrap(), None);
    assert!(m.is_empty());
}

// Test: keys/values/entries agree with iteration.
// Assumes: all three are table-order scans over occupied slots.
// Verifies: same order, same pairs, and the expected sets.
#[test]
fn keys_values_entries_agree() {
    let mut m = HashIndex::new();
    for (i, k) in ["x", "y", "z", "w"].iter().enumerate() {
        m = m.put(*k, i).unwrap();
    }
    let entries = m.entries();
    let keys = m.keys();
    let values = m.values();
    assert_eq!(entries.len(), 4);
    assert_eq!(keys, entries.iter().map(|(k, _)| *k).collect::<Vec<_>>());
    assert_eq!(values, entries.iter().map(|(_, v)| *v).collect::<Vec<_>>());
    assert_eq!(
        keys.into_iter().collect::<BTreeSet<_>>(),
        ["w", "x", "y", "z"].into_iter().collect()
    );
    assert_eq!(m.iter().len(), 4);
    assert_eq!((&m).into_iter().count(), 4);
}

// Test: rendering format.
// Assumes: table order; with a constant hasher that is insertion order.
// Verifies: `{"k":v,...}` with the caller's formatter and via Display.
#[test]
fn to_string_renders_in_table_order() {
    let m = HashIndex::with_hasher(ConstBuildHasher)
        .put("a", 1)
        .unwrap()
        .put("b", 2)
        .unwrap();
    assert_eq!(m.to_string_with(|v| format!("<{v}>")), r#"{"a":<1>,"b":<2>}"#);
    assert_eq!(m.to_string(), r#"{"a":1,"b":2}"#);
    assert_eq!(format!("{m:?}"), r#"{"a": 1, "b": 2}"#);
    assert_eq!(HashIndex::<i32>::new().to_string(), "{}");
}

// Test: construction parameter handling.
// Assumes: invalid load factors fall back to the default; capacity < 1 is
// clamped to 1; capacity beyond the maximum is rejected.
// Verifies: each case through the public constructors.
#[test]
fn constructor_parameters_are_normalised() {
    let m: HashIndex<u8> = HashIndex::with_capacity_and_load(5, 1.5).unwrap();
    assert_eq!(m.load_factor(), DEFAULT_LOAD_FACTOR);
    let m: HashIndex<u8> = HashIndex::with_capacity_and_load(5, 0.0).unwrap();
    assert_eq!(m.load_factor(), DEFAULT_LOAD_FACTOR);
    let m: HashIndex<u8> = HashIndex::with_capacity_and_load(5, 0.5).unwrap();
    assert_eq!(m.load_factor(), 0.5);

    let m: HashIndex<u8> = HashIndex::with_capacity(0).unwrap();
    assert_eq!(m.capacity(), 1);
    let m = m.put("only", 1).unwrap();
    assert_eq!(m.get("only").unwrap(), Some(&1));
    assert!(m.capacity() > 1);

    let config = Config {
        capacity: 100,
        max_capacity: 50,
        ..Config::default()
    };
    assert_eq!(
        HashIndex::<u8, _>::with_config(config, ConstBuildHasher).err(),
        Some(Error::InputTooLarge {
            requested: 100,
            max: 50
        })
    );
}

// Test: growth stops at the configured ceiling.
// Assumes: capacities 3 -> 7 -> 15 with max 10 make the third growth fail.
// Verifies: InputTooLarge, and the map that failed to grow is still intact.
#[test]
fn growth_beyond_max_capacity_is_input_too_large() {
    let config = Config {
        capacity: 3,
        load_factor: 0.5,
        max_capacity: 10,
    };
    let mut m = HashIndex::with_config(config, ConstBuildHasher).unwrap();
    let mut stored = Vec::new();
    let err = loop {
        let key = format!("k{}", stored.len());
        match m.put(key.clone(), stored.len()) {
            Ok(next) => {
                m = next;
                stored.push(key);
            }
            Err(e) => break e,
        }
    };
    assert_eq!(
        err,
        Error::InputTooLarge {
            requested: 15,
            max: 10
        }
    );
    assert_eq!(m.capacity(), 7);
    for (i, key) in stored.iter().enumerate() {
        assert_eq!(m.get(key).unwrap(), Some(&i));
    }
}

// Test: size bookkeeping under a mixed workload with heavy collisions.
// Assumes: every key shares one home slot.
// Verifies: len == full_count after each step and all survivors are found.
#[test]
fn counts_agree_under_collisions() {
    let mut m = HashIndex::with_hasher(ConstBuildHasher);
    let mut live = BTreeSet::new();
    for round in 0..5 {
        for i in 0..30 {
            let key = format!("r{round}k{i}");
            m = m.put(key.clone(), i).unwrap();
            live.insert(key);
            assert_eq!(m.len(), m.full_count());
        }
        for i in (0..30).step_by(3) {
            let key = format!("r{round}k{i}");
            let (removed, next) = m.remove(&key).unwrap();
            assert_eq!(removed, Some(i));
            m = next;
            live.remove(&key);
            assert_eq!(m.len(), m.full_count());
        }
    }
    assert_eq!(m.len(), live.len());
    for key in &live {
        assert!(m.contains_key(key).unwrap(), "lost {key}");
    }
    m.check_invariants().unwrap();
}
