//! HashIndex: string-keyed open-addressing map whose slot table is an
//! `OrderedStore`.

use crate::error::Error;
use crate::ordered_store::{self, OrderedStore, DEFAULT_MAX_LEN};
use core::fmt::{self, Write as _};
use core::hash::BuildHasher;
use core::iter::FusedIterator;
use hashbrown::hash_map::DefaultHashBuilder;

/// Slot count used by `new` and `with_hasher`.
pub const DEFAULT_CAPACITY: usize = 11;
/// Load factor used when none (or an invalid one) is given.
pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;

/// Construction parameters for [`HashIndex::with_config`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Initial slot count; values below 1 are raised to 1.
    pub capacity: usize,
    /// Growth threshold as a fraction of capacity. Anything outside the open
    /// interval `(0, 1)` falls back to [`DEFAULT_LOAD_FACTOR`].
    pub load_factor: f64,
    /// Largest slot count the table may ever reach.
    pub max_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
            max_capacity: DEFAULT_MAX_LEN,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Entry<V> {
    key: String,
    value: V,
    // Raw hash computed once on insert; growth re-derives slots from it.
    hash: u64,
}

pub(crate) type Slot<V> = Option<Entry<V>>;

enum Probe {
    Occupied(usize),
    Vacant(usize),
    Exhausted,
}

/// Open-addressing map from `String` keys to `V`.
///
/// Collisions are resolved by linear probing; the table grows to
/// `capacity * 2 + 1` slots once the live entry count reaches the load
/// threshold. Removal back-shifts the rest of the probe cluster, so a
/// lookup may stop at the first empty slot it meets.
///
/// Like [`OrderedStore`], the map has value semantics: `put`, `remove` and
/// `clear` return a new map and leave the receiver as it was. `put_mut` and
/// `remove_mut` update in place.
///
/// # Examples
///
/// ```
/// use avl_hashindex::HashIndex;
///
/// let empty: HashIndex<u32> = HashIndex::new();
/// let one = empty.put("apples", 3).unwrap();
/// let two = one.put("apples", 5).unwrap();
///
/// assert_eq!(two.get("apples").unwrap(), Some(&5));
/// assert_eq!(one.get("apples").unwrap(), Some(&3));
/// assert!(empty.is_empty());
/// ```
pub struct HashIndex<V, S = DefaultHashBuilder> {
    hasher: S,
    pub(crate) backing: OrderedStore<Slot<V>>,
    pub(crate) capacity: usize,
    load_percent: usize,
    num_entries: usize,
    // Set on the fresh table while `rehash` refills it.
    pub(crate) resizing: bool,
}

impl<V, S: Clone> Clone for HashIndex<V, S> {
    fn clone(&self) -> Self {
        Self {
            hasher: self.hasher.clone(),
            backing: self.backing.clone(),
            capacity: self.capacity,
            load_percent: self.load_percent,
            num_entries: self.num_entries,
            resizing: self.resizing,
        }
    }
}

impl<V> HashIndex<V> {
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    pub fn with_capacity(capacity: usize) -> Result<Self, Error> {
        Self::with_capacity_and_load(capacity, DEFAULT_LOAD_FACTOR)
    }

    pub fn with_capacity_and_load(capacity: usize, load_factor: f64) -> Result<Self, Error> {
        let config = Config {
            capacity,
            load_factor,
            ..Config::default()
        };
        Self::with_config(config, DefaultHashBuilder::default())
    }
}

impl<V> Default for HashIndex<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, S> HashIndex<V, S> {
    /// Default capacity and load factor with a caller-supplied hasher.
    pub fn with_hasher(hasher: S) -> Self {
        Self::from_parts(
            hasher,
            DEFAULT_CAPACITY,
            load_percent(DEFAULT_LOAD_FACTOR),
            DEFAULT_MAX_LEN,
        )
    }

    pub fn with_config(config: Config, hasher: S) -> Result<Self, Error> {
        let capacity = config.capacity.max(1);
        if capacity > config.max_capacity {
            return Err(Error::InputTooLarge {
                requested: capacity,
                max: config.max_capacity,
            });
        }
        Ok(Self::from_parts(
            hasher,
            capacity,
            load_percent(config.load_factor),
            config.max_capacity,
        ))
    }

    fn from_parts(hasher: S, capacity: usize, load_percent: usize, max_capacity: usize) -> Self {
        Self {
            hasher,
            backing: OrderedStore::filled_with(capacity, || None, max_capacity),
            capacity,
            load_percent,
            num_entries: 0,
            resizing: false,
        }
    }

    pub fn len(&self) -> usize {
        self.num_entries
    }

    pub fn is_empty(&self) -> bool {
        self.num_entries == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn load_factor(&self) -> f64 {
        self.load_percent as f64 / 100.0
    }

    /// Lazy iterator over live entries in table order (not insertion order).
    pub fn iter(&self) -> Entries<'_, V> {
        Entries {
            slots: self.backing.iter(),
            remaining: self.num_entries,
        }
    }

    pub fn keys(&self) -> Vec<&str> {
        self.iter().map(|(k, _)| k).collect()
    }

    pub fn values(&self) -> Vec<&V> {
        self.iter().map(|(_, v)| v).collect()
    }

    pub fn entries(&self) -> Vec<(&str, &V)> {
        self.iter().collect()
    }

    /// Recount occupied slots by scanning the whole table. Always equal to
    /// `len()`; kept as an independent check on the cached counter.
    pub fn full_count(&self) -> usize {
        self.backing.iter().filter(|slot| slot.is_some()).count()
    }

    /// Render as `{"k1":v1,"k2":v2}` in table order. Keys use Rust string
    /// escaping; values are rendered by `format_value`.
    pub fn to_string_with<F>(&self, mut format_value: F) -> String
    where
        F: FnMut(&V) -> String,
    {
        let mut out = String::from("{");
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            // Writing into a String cannot fail.
            let _ = write!(out, "{key:?}:{}", format_value(value));
        }
        out.push('}');
        out
    }

    fn grow_threshold(&self) -> usize {
        self.capacity.saturating_mul(self.load_percent) / 100
    }

    #[inline]
    fn home_slot(&self, hash: u64) -> usize {
        (hash % self.capacity as u64) as usize
    }

    fn entry_at(&self, index: usize) -> Result<Option<&Entry<V>>, Error> {
        self.backing.get(index).map(Option::as_ref)
    }

    /// Linear probe from `home`: the slot holding `key`, else the first
    /// empty slot, else `Exhausted` after one full cycle.
    fn probe(&self, home: usize, hash: u64, key: &str) -> Result<Probe, Error> {
        for step in 0..self.capacity {
            let index = (home + step) % self.capacity;
            match self.entry_at(index)? {
                None => return Ok(Probe::Vacant(index)),
                Some(entry) if entry.hash == hash && entry.key == key => {
                    return Ok(Probe::Occupied(index))
                }
                Some(_) => {}
            }
        }
        Ok(Probe::Exhausted)
    }
}

impl<V, S: BuildHasher> HashIndex<V, S> {
    /// `(slot, raw_hash)` for `key` at the current capacity.
    fn calc_hash(&self, key: &str) -> (usize, u64) {
        let hash = self.hasher.hash_one(key);
        (self.home_slot(hash), hash)
    }

    pub fn get(&self, key: &str) -> Result<Option<&V>, Error> {
        let (home, hash) = self.calc_hash(key);
        match self.probe(home, hash, key)? {
            Probe::Occupied(index) => Ok(self.entry_at(index)?.map(|e| &e.value)),
            Probe::Vacant(_) | Probe::Exhausted => Ok(None),
        }
    }

    pub fn contains_key(&self, key: &str) -> Result<bool, Error> {
        let (home, hash) = self.calc_hash(key);
        Ok(matches!(self.probe(home, hash, key)?, Probe::Occupied(_)))
    }

    /// Audit the table: tree invariants, slot count, entry count, and that
    /// every entry is reachable from its home slot without crossing a hole.
    pub fn check_invariants(&self) -> Result<(), Error> {
        self.backing.check_invariants()?;
        if self.backing.len() != self.capacity {
            return Err(Error::InvariantViolation(
                "slot table length differs from capacity",
            ));
        }
        if self.full_count() != self.num_entries {
            return Err(Error::InvariantViolation(
                "cached entry count differs from occupied slots",
            ));
        }
        if self.resizing {
            return Err(Error::InvariantViolation("resize flag left set"));
        }
        for (index, slot) in self.backing.iter().enumerate() {
            let Some(entry) = slot else {
                continue;
            };
            if self.hasher.hash_one(entry.key.as_str()) != entry.hash {
                return Err(Error::InvariantViolation("stored hash is stale"));
            }
            let home = self.home_slot(entry.hash);
            match self.probe(home, entry.hash, &entry.key)? {
                Probe::Occupied(found) if found == index => {}
                _ => {
                    return Err(Error::InvariantViolation(
                        "entry unreachable from its home slot",
                    ))
                }
            }
        }
        Ok(())
    }
}

impl<V: Clone, S: BuildHasher + Clone> HashIndex<V, S> {
    /// New map with `key` bound to `value`.
    pub fn put(&self, key: impl Into<String>, value: V) -> Result<Self, Error> {
        let mut next = self.clone();
        next.put_mut(key, value)?;
        Ok(next)
    }

    /// New map without `key`, plus the value it was bound to (if any).
    pub fn remove(&self, key: &str) -> Result<(Option<V>, Self), Error> {
        let mut next = self.clone();
        let removed = next.remove_mut(key)?;
        Ok((removed, next))
    }

    /// Empty map with the same capacity, load factor, maximum and hasher.
    pub fn clear(&self) -> Self {
        Self::from_parts(
            self.hasher.clone(),
            self.capacity,
            self.load_percent,
            self.backing.max_len(),
        )
    }

    /// In-place `put`; returns the value previously bound to `key`.
    ///
    /// Overwriting a key that is not in its home slot may grow the table
    /// first. After an error the map may have grown but holds the same
    /// entries.
    pub fn put_mut(&mut self, key: impl Into<String>, value: V) -> Result<Option<V>, Error> {
        let key = key.into();
        let hash = self.hasher.hash_one(key.as_str());
        self.put_entry(Entry { key, value, hash })
    }

    fn put_entry(&mut self, entry: Entry<V>) -> Result<Option<V>, Error> {
        // Only a key sitting in its own home slot skips the growth check;
        // one further down the cluster is overwritten after any resize.
        let home = self.home_slot(entry.hash);
        let at_home = matches!(
            self.entry_at(home)?,
            Some(found) if found.hash == entry.hash && found.key == entry.key
        );
        if !at_home && !self.resizing && self.num_entries >= self.grow_threshold() {
            self.rehash(self.grown_capacity()?)?;
        }
        match self.probe(self.home_slot(entry.hash), entry.hash, &entry.key)? {
            Probe::Occupied(index) => {
                let previous = self.backing.set_mut(index, Some(entry))?;
                Ok(previous.map(|e| e.value))
            }
            Probe::Vacant(index) => {
                self.backing.set_mut(index, Some(entry))?;
                self.num_entries += 1;
                Ok(None)
            }
            Probe::Exhausted => Err(Error::NoSpace {
                capacity: self.capacity,
            }),
        }
    }

    /// In-place `remove`; returns the value that was bound to `key`.
    pub fn remove_mut(&mut self, key: &str) -> Result<Option<V>, Error> {
        let (home, hash) = self.calc_hash(key);
        let Probe::Occupied(index) = self.probe(home, hash, key)? else {
            return Ok(None);
        };
        let removed = self.backing.set_mut(index, None)?;
        self.num_entries -= 1;
        self.close_gap(index)?;
        Ok(removed.map(|e| e.value))
    }

    /// Back-shift deletion: walk the cluster after `hole` and move back every
    /// entry whose home slot does not lie cyclically in `(hole, next]`.
    fn close_gap(&mut self, mut hole: usize) -> Result<(), Error> {
        let mut next = hole;
        for _ in 1..self.capacity {
            next = (next + 1) % self.capacity;
            let home = match self.entry_at(next)? {
                None => break,
                Some(entry) => self.home_slot(entry.hash),
            };
            if cyclically_within(home, hole, next) {
                continue;
            }
            let moved = self.backing.set_mut(next, None)?;
            self.backing.set_mut(hole, moved)?;
            hole = next;
        }
        Ok(())
    }

    fn grown_capacity(&self) -> Result<usize, Error> {
        let max = self.backing.max_len();
        match self.capacity.checked_mul(2).and_then(|c| c.checked_add(1)) {
            Some(grown) if grown <= max => Ok(grown),
            _ => Err(Error::InputTooLarge {
                requested: self.capacity.saturating_mul(2).saturating_add(1),
                max,
            }),
        }
    }

    /// Rebuild into a fresh table of `new_capacity` slots, reinserting every
    /// live entry with its stored hash.
    fn rehash(&mut self, new_capacity: usize) -> Result<(), Error> {
        let mut fresh = Self::from_parts(
            self.hasher.clone(),
            new_capacity,
            self.load_percent,
            self.backing.max_len(),
        );
        fresh.resizing = true;
        for entry in self.backing.iter().flatten() {
            fresh.put_entry(entry.clone())?;
        }
        fresh.resizing = false;
        debug_assert_eq!(fresh.num_entries, self.num_entries);
        *self = fresh;
        Ok(())
    }
}

/// Integer percent in `1..=99` for a load factor; invalid factors fall back
/// to the default.
fn load_percent(load_factor: f64) -> usize {
    let fraction = if load_factor > 0.0 && load_factor < 1.0 {
        load_factor
    } else {
        DEFAULT_LOAD_FACTOR
    };
    ((fraction * 100.0).round() as usize).clamp(1, 99)
}

/// True when `home` lies in the cyclic interval `(hole, next]`.
fn cyclically_within(home: usize, hole: usize, next: usize) -> bool {
    if hole <= next {
        hole < home && home <= next
    } else {
        hole < home || home <= next
    }
}

impl<V: fmt::Debug, S> fmt::Debug for HashIndex<V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<V: fmt::Display, S> fmt::Display for HashIndex<V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_with(|v| v.to_string()))
    }
}

impl<'a, V, S> IntoIterator for &'a HashIndex<V, S> {
    type Item = (&'a str, &'a V);
    type IntoIter = Entries<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the live entries of a [`HashIndex`], in table order.
pub struct Entries<'a, V> {
    slots: ordered_store::Iter<'a, Slot<V>>,
    remaining: usize,
}

impl<V> Clone for Entries<'_, V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, V> Iterator for Entries<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Some(entry) = slot {
                self.remaining -= 1;
                return Some((entry.key.as_str(), &entry.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Entries<'_, V> {}
impl<V> FusedIterator for Entries<'_, V> {}
