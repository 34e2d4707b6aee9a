//! Open-addressing hash table shared by maps and sets
//!
//! One implementation, instantiated as [`ValueMap`] (`Table<Value>`) and
//! [`ValueSet`] (`Table<()>`). Slots are probed linearly from
//! `hash & (capacity - 1)`; deletions leave tombstones so probe chains stay
//! intact until the next rehash.
//!
//! Growth policy, checked before every insertion:
//! - an unallocated table gets [`TABLE_MIN_CAPACITY`] slots;
//! - when `(live + tombstones + 1) / capacity` reaches 70%, capacity doubles;
//! - when tombstones outnumber live entries (and capacity is above the
//!   minimum), the table is rebuilt at the same capacity.
//!
//! The tombstone check also runs after every deletion. A rebuild keeps only
//! occupied slots, in bucket order.

use crate::config::{LOAD_FACTOR_DEN, LOAD_FACTOR_NUM, TABLE_MIN_CAPACITY};
use crate::errors::{RuntimeError, RuntimeResult};
use crate::value::Value;

/// Hashing and equality for keys, supplied by the string registry.
///
/// Keys that compare equal must hash alike.
pub trait KeyContext {
    fn hash_key(&self, key: Value) -> u64;
    fn keys_equal(&self, a: Value, b: Value) -> bool;
}

#[derive(Debug, Clone)]
enum Slot<V> {
    Empty,
    Occupied { hash: u64, key: Value, value: V },
    Tombstone,
}

enum Probe {
    Found(usize),
    /// First tombstone on the chain, or the empty slot that ended it.
    Vacant(usize),
    /// Every slot was visited without finding the key or an empty slot.
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct Table<V> {
    slots: Vec<Slot<V>>,
    live: usize,
    tombstones: usize,
}

pub type ValueMap = Table<Value>;
pub type ValueSet = Table<()>;

impl<V> Table<V> {
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
            tombstones: 0,
        }
    }

    /// Live entries.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Slot count; zero until the first insertion, then a power of two.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    fn probe(&self, hash: u64, key: Value, ctx: &impl KeyContext) -> Probe {
        let capacity = self.capacity();
        if capacity == 0 {
            return Probe::Exhausted;
        }
        let mask = capacity - 1;
        let mut idx = hash as usize & mask;
        let mut first_tombstone = None;
        for _ in 0..capacity {
            match &self.slots[idx] {
                Slot::Empty => return Probe::Vacant(first_tombstone.unwrap_or(idx)),
                Slot::Tombstone => {
                    first_tombstone.get_or_insert(idx);
                }
                Slot::Occupied { hash: h, key: k, .. } => {
                    if *h == hash && ctx.keys_equal(*k, key) {
                        return Probe::Found(idx);
                    }
                }
            }
            idx = (idx + 1) & mask;
        }
        match first_tombstone {
            Some(idx) => Probe::Vacant(idx),
            None => Probe::Exhausted,
        }
    }

    fn find(&self, key: Value, ctx: &impl KeyContext) -> Option<usize> {
        if self.live == 0 {
            return None;
        }
        match self.probe(ctx.hash_key(key), key, ctx) {
            Probe::Found(idx) => Some(idx),
            Probe::Vacant(_) | Probe::Exhausted => None,
        }
    }

    pub fn get(&self, key: Value, ctx: &impl KeyContext) -> Option<&V> {
        let idx = self.find(key, ctx)?;
        match &self.slots[idx] {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Empty | Slot::Tombstone => None,
        }
    }

    pub fn contains(&self, key: Value, ctx: &impl KeyContext) -> bool {
        self.find(key, ctx).is_some()
    }

    /// Insert or overwrite. Returns the previous value if the key was present.
    pub fn insert(&mut self, key: Value, value: V, ctx: &impl KeyContext) -> RuntimeResult<Option<V>> {
        let hash = ctx.hash_key(key);
        self.reserve_one()?;
        loop {
            match self.probe(hash, key, ctx) {
                Probe::Found(idx) => {
                    let Slot::Occupied { value: slot, .. } = &mut self.slots[idx] else {
                        unreachable!("probe reported a non-occupied slot as found");
                    };
                    return Ok(Some(std::mem::replace(slot, value)));
                }
                Probe::Vacant(idx) => {
                    if matches!(self.slots[idx], Slot::Tombstone) {
                        self.tombstones -= 1;
                    }
                    self.slots[idx] = Slot::Occupied { hash, key, value };
                    self.live += 1;
                    self.check_invariants();
                    return Ok(None);
                }
                Probe::Exhausted => {
                    let capacity = self.capacity().max(TABLE_MIN_CAPACITY / 2) * 2;
                    self.rehash(capacity)?;
                }
            }
        }
    }

    /// Remove `key`, leaving a tombstone. Returns the removed value.
    pub fn remove(&mut self, key: Value, ctx: &impl KeyContext) -> RuntimeResult<Option<V>> {
        let Some(idx) = self.find(key, ctx) else {
            return Ok(None);
        };
        let removed = std::mem::replace(&mut self.slots[idx], Slot::Tombstone);
        self.live -= 1;
        self.tombstones += 1;
        if self.needs_compaction() {
            self.rehash(self.capacity())?;
        }
        self.check_invariants();
        match removed {
            Slot::Occupied { value, .. } => Ok(Some(value)),
            Slot::Empty | Slot::Tombstone => Ok(None),
        }
    }

    /// Drop every entry and tombstone, keeping the allocated capacity.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = Slot::Empty);
        self.live = 0;
        self.tombstones = 0;
    }

    /// Live entries in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = (Value, &V)> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Occupied { key, value, .. } => Some((*key, value)),
            Slot::Empty | Slot::Tombstone => None,
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = Value> + '_ {
        self.iter().map(|(key, _)| key)
    }

    fn needs_compaction(&self) -> bool {
        self.tombstones > self.live && self.capacity() > TABLE_MIN_CAPACITY
    }

    fn reserve_one(&mut self) -> RuntimeResult<()> {
        let capacity = self.capacity();
        if capacity == 0 {
            return self.rehash(TABLE_MIN_CAPACITY);
        }
        if (self.live + self.tombstones + 1) * LOAD_FACTOR_DEN >= capacity * LOAD_FACTOR_NUM {
            return self.rehash(capacity * 2);
        }
        if self.needs_compaction() {
            return self.rehash(capacity);
        }
        Ok(())
    }

    fn rehash(&mut self, new_capacity: usize) -> RuntimeResult<()> {
        debug_assert!(new_capacity.is_power_of_two());
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(new_capacity)
            .map_err(|_| RuntimeError::oom("table rehash"))?;
        slots.resize_with(new_capacity, || Slot::Empty);

        let old = std::mem::replace(&mut self.slots, slots);
        tracing::debug!(
            from = old.len(),
            to = new_capacity,
            live = self.live,
            tombstones = self.tombstones,
            "rehashing table"
        );
        let mask = new_capacity - 1;
        for slot in old {
            if let Slot::Occupied { hash, key, value } = slot {
                let mut idx = hash as usize & mask;
                while !matches!(self.slots[idx], Slot::Empty) {
                    idx = (idx + 1) & mask;
                }
                self.slots[idx] = Slot::Occupied { hash, key, value };
            }
        }
        self.tombstones = 0;
        self.check_invariants();
        Ok(())
    }

    #[cfg(feature = "debug_runtime")]
    fn check_invariants(&self) {
        let occupied = self
            .slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Occupied { .. }))
            .count();
        let tombstones = self
            .slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Tombstone))
            .count();
        assert_eq!(occupied, self.live, "live count drifted");
        assert_eq!(tombstones, self.tombstones, "tombstone count drifted");
        assert!(self.live + self.tombstones <= self.capacity());
        assert!(self.capacity() == 0 || self.capacity().is_power_of_two());
    }

    #[cfg(not(feature = "debug_runtime"))]
    #[inline(always)]
    fn check_invariants(&self) {}
}

impl<V> Default for Table<V> {
    fn default() -> Self {
        Self::new()
    }
}
