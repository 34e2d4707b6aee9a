//! Handle table for container control blocks
//!
//! Vectors, maps, sets and string builders are boxed and owned by the
//! [`HandleTable`]. The handle generated code holds is the stable address of
//! the box, so it is pointer-shaped like any other heap value. Objects are
//! never released while the process runs.
//!
//! Looking up a handle the table does not know (zero, a small integer, a
//! string, a stale pointer) yields `None`; callers turn that into their
//! default result.

use std::collections::HashMap;

use crate::builder::StringBuilder;
use crate::errors::{RuntimeError, RuntimeResult};
use crate::hash::BuildAddressHasher;
use crate::table::{ValueMap, ValueSet};
use crate::value::Value;
use crate::vector::ValueVec;

/// A heap object addressed by handle.
#[derive(Debug)]
pub enum HeapObject {
    Vec(ValueVec),
    Map(ValueMap),
    Set(ValueSet),
    Builder(StringBuilder),
}

impl HeapObject {
    pub fn kind(&self) -> &'static str {
        match self {
            HeapObject::Vec(_) => "vec",
            HeapObject::Map(_) => "map",
            HeapObject::Set(_) => "set",
            HeapObject::Builder(_) => "string builder",
        }
    }
}

#[derive(Default)]
pub struct HandleTable {
    objects: HashMap<usize, Box<HeapObject>, BuildAddressHasher>,
}

macro_rules! typed_access {
    ($get:ident, $get_mut:ident, $variant:ident, $ty:ty) => {
        pub fn $get(&self, handle: Value) -> Option<&$ty> {
            match self.get(handle)? {
                HeapObject::$variant(inner) => Some(inner),
                _ => None,
            }
        }

        pub fn $get_mut(&mut self, handle: Value) -> Option<&mut $ty> {
            match self.get_mut(handle)? {
                HeapObject::$variant(inner) => Some(inner),
                _ => None,
            }
        }
    };
}

impl HandleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Box `object` and return its handle.
    pub fn insert(&mut self, object: HeapObject) -> RuntimeResult<Value> {
        self.objects
            .try_reserve(1)
            .map_err(|_| RuntimeError::oom("handle table"))?;
        let kind = object.kind();
        let boxed = Box::new(object);
        let address = &*boxed as *const HeapObject as usize;
        self.objects.insert(address, boxed);
        tracing::trace!(kind, address, "allocated heap object");
        Ok(Value::from_raw(address as i64))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Lookups go by address so a box that happens to sit in the small
    /// integer range is still found.
    pub fn contains(&self, handle: Value) -> bool {
        !handle.is_null() && self.objects.contains_key(&handle.address())
    }

    pub fn get(&self, handle: Value) -> Option<&HeapObject> {
        if handle.is_null() {
            return None;
        }
        self.objects.get(&handle.address()).map(|boxed| &**boxed)
    }

    pub fn get_mut(&mut self, handle: Value) -> Option<&mut HeapObject> {
        if handle.is_null() {
            return None;
        }
        self.objects.get_mut(&handle.address()).map(|boxed| &mut **boxed)
    }

    typed_access!(vec, vec_mut, Vec, ValueVec);
    typed_access!(map, map_mut, Map, ValueMap);
    typed_access!(set, set_mut, Set, ValueSet);
    typed_access!(builder, builder_mut, Builder, StringBuilder);
}
