//! Growable vector of tagged values
//!
//! The logical length ("init") and the physical capacity are tracked
//! separately so capacity growth is deterministic: nothing is allocated
//! until the first push, then 4 slots, doubling from there.

use crate::config::VEC_INITIAL_CAPACITY;
use crate::errors::{RuntimeError, RuntimeResult};
use crate::value::Value;

#[derive(Debug, Clone, Default)]
pub struct ValueVec {
    items: Vec<Value>,
    capacity: usize,
}

impl ValueVec {
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            capacity: 0,
        }
    }

    /// Number of initialized slots.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }

    fn grow_for(&mut self, needed: usize) -> RuntimeResult<()> {
        if needed <= self.capacity {
            return Ok(());
        }
        let mut capacity = match self.capacity {
            0 => VEC_INITIAL_CAPACITY,
            cap => cap,
        };
        while capacity < needed {
            capacity *= 2;
        }
        self.items
            .try_reserve_exact(capacity - self.items.len())
            .map_err(|_| RuntimeError::oom("vec_push"))?;
        tracing::trace!(from = self.capacity, to = capacity, "grew vector");
        self.capacity = capacity;
        Ok(())
    }

    pub fn push(&mut self, item: Value) -> RuntimeResult<()> {
        self.grow_for(self.items.len() + 1)?;
        self.items.push(item);
        Ok(())
    }

    /// Remove the last element, or return zero if the vector is empty.
    pub fn pop(&mut self) -> Value {
        self.items.pop().unwrap_or_default()
    }

    /// Element at `index`, or zero outside `[0, len)`.
    pub fn get(&self, index: i64) -> Value {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.items.get(i))
            .copied()
            .unwrap_or_default()
    }

    /// Overwrite an element, or append when `index == len`.
    ///
    /// Negative indices are ignored. Any index past `len` is an error.
    pub fn set(&mut self, index: i64, item: Value) -> RuntimeResult<()> {
        let Ok(index) = usize::try_from(index) else {
            return Ok(());
        };
        let len = self.items.len();
        if index < len {
            self.items[index] = item;
            Ok(())
        } else if index == len {
            self.push(item)
        } else {
            Err(RuntimeError::IndexBeyondEnd { index, len })
        }
    }

    /// Reset the logical length, keeping capacity.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_starts_at_four_and_doubles() {
        let mut vec = ValueVec::new();
        assert_eq!(vec.capacity(), 0);
        vec.push(Value::Int(1)).unwrap();
        assert_eq!(vec.capacity(), 4);
        for i in 2..=5 {
            vec.push(Value::Int(i)).unwrap();
        }
        assert_eq!(vec.len(), 5);
        assert_eq!(vec.capacity(), 8);
        for i in 6..=17 {
            vec.push(Value::Int(i)).unwrap();
        }
        assert_eq!(vec.capacity(), 32);
    }

    #[test]
    fn test_get_out_of_range_is_zero() {
        let mut vec = ValueVec::new();
        vec.push(Value::Int(7)).unwrap();
        assert_eq!(vec.get(0), Value::Int(7));
        assert_eq!(vec.get(1), Value::ZERO);
        assert_eq!(vec.get(-1), Value::ZERO);
    }

    #[test]
    fn test_pop_empty_is_zero() {
        let mut vec = ValueVec::new();
        assert_eq!(vec.pop(), Value::ZERO);
        vec.push(Value::Int(3)).unwrap();
        assert_eq!(vec.pop(), Value::Int(3));
        assert!(vec.is_empty());
    }

    #[test]
    fn test_set_boundaries() {
        let mut vec = ValueVec::new();
        vec.push(Value::Int(1)).unwrap();
        vec.set(0, Value::Int(10)).unwrap();
        vec.set(1, Value::Int(20)).unwrap();
        assert_eq!(vec.as_slice(), &[Value::Int(10), Value::Int(20)]);

        vec.set(-4, Value::Int(99)).unwrap();
        assert_eq!(vec.len(), 2);

        let err = vec.set(7, Value::Int(1)).unwrap_err();
        assert!(matches!(err, RuntimeError::IndexBeyondEnd { index: 7, len: 2 }));
        assert_eq!(vec.len(), 2);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut vec = ValueVec::new();
        for i in 0..6 {
            vec.push(Value::Int(i)).unwrap();
        }
        vec.clear();
        assert_eq!(vec.len(), 0);
        assert_eq!(vec.capacity(), 8);
        assert_eq!(vec.get(0), Value::ZERO);
    }
}
