//! Vector, map, set and string builder operations
//!
//! Every container is addressed by handle. Mutators return the handle they
//! were given so generated code can chain calls. An unknown handle turns
//! reads into their zero/false default and mutators into no-ops.
//!
//! Map keys and set items are canonicalized before hashing, so a transient
//! string used as a key is copied into the registry once it is stored or
//! looked up.

use crate::builder::StringBuilder;
use crate::errors::RuntimeResult;
use crate::handle::HeapObject;
use crate::runtime::{Runtime, resolve};
use crate::table::{ValueMap, ValueSet};
use crate::value::Value;
use crate::vector::ValueVec;

// Vectors
impl Runtime {
    pub fn vec_new(&mut self) -> RuntimeResult<Value> {
        self.heap.insert(HeapObject::Vec(ValueVec::new()))
    }

    pub fn vec_push(&mut self, vec: Value, item: Value) -> RuntimeResult<Value> {
        if let Some(v) = self.heap.vec_mut(vec) {
            v.push(item)?;
        }
        Ok(vec)
    }

    pub fn vec_pop(&mut self, vec: Value) -> Value {
        self.heap.vec_mut(vec).map(ValueVec::pop).unwrap_or_default()
    }

    pub fn vec_get(&self, vec: Value, index: i64) -> Value {
        self.heap.vec(vec).map(|v| v.get(index)).unwrap_or_default()
    }

    /// Fails when `index` is more than one past the initialized length.
    pub fn vec_set(&mut self, vec: Value, index: i64, item: Value) -> RuntimeResult<Value> {
        if let Some(v) = self.heap.vec_mut(vec) {
            v.set(index, item)?;
        }
        Ok(vec)
    }

    pub fn vec_length(&self, vec: Value) -> i64 {
        self.heap.vec(vec).map_or(0, |v| v.len() as i64)
    }

    pub fn vec_init(&self, vec: Value) -> i64 {
        self.vec_length(vec)
    }

    pub fn vec_capacity(&self, vec: Value) -> i64 {
        self.heap.vec(vec).map_or(0, |v| v.capacity() as i64)
    }

    pub fn vec_clear(&mut self, vec: Value) -> Value {
        if let Some(v) = self.heap.vec_mut(vec) {
            v.clear();
        }
        vec
    }

    /// Join elements with `sep`. Small integers render in base 10, strings
    /// by content; other values contribute nothing.
    pub fn vec_join(&mut self, vec: Value, sep: Value) -> RuntimeResult<Value> {
        let mut out = StringBuilder::new();
        if let Some(v) = self.heap.vec(vec) {
            let sep = resolve(&self.strings, &self.heap, sep).unwrap_or_default();
            for (i, &item) in v.as_slice().iter().enumerate() {
                if i > 0 {
                    out.push_bytes(sep)?;
                }
                match item {
                    Value::Int(n) => out.push_bytes(n.to_string().as_bytes())?,
                    Value::Ref(_) => {
                        if let Some(bytes) = resolve(&self.strings, &self.heap, item) {
                            out.push_bytes(bytes)?;
                        }
                    }
                }
            }
        }
        self.strings.register_copy(out.as_bytes())
    }

    pub fn vec_includes(&self, vec: Value, item: Value) -> bool {
        self.heap.vec(vec).is_some_and(|v| {
            v.as_slice()
                .iter()
                .any(|&candidate| self.values_equal(candidate, item))
        })
    }
}

// String builders
impl Runtime {
    pub fn sb_new(&mut self) -> RuntimeResult<Value> {
        self.heap.insert(HeapObject::Builder(StringBuilder::new()))
    }

    /// Append the contents of `s`; a non-string operand appends nothing.
    pub fn sb_append(&mut self, sb: Value, s: Value) -> RuntimeResult<Value> {
        let bytes = resolve(&self.strings, &self.heap, s);
        if let (Some(bytes), Some(builder)) = (bytes, self.heap.builder_mut(sb)) {
            builder.push_bytes(bytes)?;
        }
        Ok(sb)
    }

    pub fn sb_append_char(&mut self, sb: Value, code: i64) -> RuntimeResult<Value> {
        if let Some(builder) = self.heap.builder_mut(sb) {
            builder.push_byte(code as u8)?;
        }
        Ok(sb)
    }

    /// Register a copy of the builder's contents. The builder stays usable.
    pub fn sb_build(&mut self, sb: Value) -> RuntimeResult<Value> {
        let bytes = self.heap.builder(sb).map(StringBuilder::as_bytes).unwrap_or_default();
        self.strings.register_copy(bytes)
    }
}

// Maps
impl Runtime {
    pub fn map_new(&mut self) -> RuntimeResult<Value> {
        self.heap.insert(HeapObject::Map(ValueMap::new()))
    }

    pub fn map_set(&mut self, map: Value, key: Value, value: Value) -> RuntimeResult<Value> {
        if !self.is_map(map) {
            return Ok(map);
        }
        let key = self.canonicalize(key)?;
        if let Some(table) = self.heap.map_mut(map) {
            table.insert(key, value, &self.strings)?;
        }
        Ok(map)
    }

    /// Value stored under `key`, or 0 when absent.
    pub fn map_get(&mut self, map: Value, key: Value) -> RuntimeResult<Value> {
        self.map_get_or_default(map, key, Value::ZERO)
    }

    pub fn map_get_or_default(&mut self, map: Value, key: Value, default: Value) -> RuntimeResult<Value> {
        if !self.is_map(map) {
            return Ok(default);
        }
        let key = self.canonicalize(key)?;
        Ok(self
            .heap
            .map(map)
            .and_then(|table| table.get(key, &self.strings))
            .copied()
            .unwrap_or(default))
    }

    pub fn map_has(&mut self, map: Value, key: Value) -> RuntimeResult<bool> {
        if !self.is_map(map) {
            return Ok(false);
        }
        let key = self.canonicalize(key)?;
        Ok(self
            .heap
            .map(map)
            .is_some_and(|table| table.contains(key, &self.strings)))
    }

    /// Returns whether an entry was removed.
    pub fn map_delete(&mut self, map: Value, key: Value) -> RuntimeResult<bool> {
        if !self.is_map(map) {
            return Ok(false);
        }
        let key = self.canonicalize(key)?;
        match self.heap.map_mut(map) {
            Some(table) => Ok(table.remove(key, &self.strings)?.is_some()),
            None => Ok(false),
        }
    }

    pub fn map_clear(&mut self, map: Value) -> Value {
        if let Some(table) = self.heap.map_mut(map) {
            table.clear();
        }
        map
    }

    pub fn map_length(&self, map: Value) -> i64 {
        self.heap.map(map).map_or(0, |table| table.len() as i64)
    }

    fn is_map(&self, map: Value) -> bool {
        self.heap.map(map).is_some()
    }
}

// Sets
impl Runtime {
    pub fn set_new(&mut self) -> RuntimeResult<Value> {
        self.heap.insert(HeapObject::Set(ValueSet::new()))
    }

    pub fn set_add(&mut self, set: Value, item: Value) -> RuntimeResult<Value> {
        if !self.is_set(set) {
            return Ok(set);
        }
        let item = self.canonicalize(item)?;
        if let Some(table) = self.heap.set_mut(set) {
            table.insert(item, (), &self.strings)?;
        }
        Ok(set)
    }

    pub fn set_has(&mut self, set: Value, item: Value) -> RuntimeResult<bool> {
        if !self.is_set(set) {
            return Ok(false);
        }
        let item = self.canonicalize(item)?;
        Ok(self
            .heap
            .set(set)
            .is_some_and(|table| table.contains(item, &self.strings)))
    }

    /// Returns whether an item was removed.
    pub fn set_delete(&mut self, set: Value, item: Value) -> RuntimeResult<bool> {
        if !self.is_set(set) {
            return Ok(false);
        }
        let item = self.canonicalize(item)?;
        match self.heap.set_mut(set) {
            Some(table) => Ok(table.remove(item, &self.strings)?.is_some()),
            None => Ok(false),
        }
    }

    pub fn set_clear(&mut self, set: Value) -> Value {
        if let Some(table) = self.heap.set_mut(set) {
            table.clear();
        }
        set
    }

    pub fn set_length(&self, set: Value) -> i64 {
        self.heap.set(set).map_or(0, |table| table.len() as i64)
    }

    fn is_set(&self, set: Value) -> bool {
        self.heap.set(set).is_some()
    }
}
