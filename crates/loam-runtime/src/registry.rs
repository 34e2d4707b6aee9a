//! Managed string registry
//!
//! The registry owns every string buffer the runtime produces. Each buffer is
//! stored NUL-terminated so generated C code can read it directly, and its
//! address is the string's [`Value`]. Buffers are never freed while the
//! process runs, so a string value stays valid for the life of the program.
//!
//! An address index gives O(1) membership tests, which back string equality
//! and key canonicalization.

use std::collections::HashMap;
use std::ffi::{CStr, c_char};

use crate::config::{REGISTRY_INDEX_MIN_CAPACITY, REGISTRY_INITIAL_CAPACITY};
use crate::errors::{RuntimeError, RuntimeResult};
use crate::hash::{BuildAddressHasher, hash_bytes, mix64};
use crate::table::KeyContext;
use crate::value::Value;

/// How pointer-shaped values that the registry does not own are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ForeignStrings {
    /// Treated as opaque, non-string values.
    Opaque,
    /// Read as NUL-terminated C strings.
    CStr,
}

pub struct StringRegistry {
    buffers: Vec<Box<[u8]>>,
    /// Buffer address -> position in `buffers`.
    index: HashMap<usize, usize, BuildAddressHasher>,
    foreign: ForeignStrings,
}

impl StringRegistry {
    /// A registry that treats unregistered pointers as opaque.
    pub fn new() -> Self {
        Self {
            buffers: Vec::new(),
            index: HashMap::default(),
            foreign: ForeignStrings::Opaque,
        }
    }

    /// A registry that reads unregistered pointer-shaped values as C strings.
    ///
    /// # Safety
    ///
    /// Every unregistered pointer-shaped value later resolved through this
    /// registry must be the address of a NUL-terminated buffer that outlives
    /// the registry (string literals in generated code satisfy this).
    pub unsafe fn trusting_foreign() -> Self {
        Self {
            foreign: ForeignStrings::CStr,
            ..Self::new()
        }
    }

    /// Number of registered buffers.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Take ownership of `bytes`, append the terminating NUL and register the
    /// resulting buffer. Returns the new string's value.
    pub fn register_owned(&mut self, mut bytes: Vec<u8>) -> RuntimeResult<Value> {
        bytes
            .try_reserve_exact(1)
            .map_err(|_| RuntimeError::oom("managed string buffer"))?;
        bytes.push(0);
        let buffer = bytes.into_boxed_slice();
        // A fresh allocation never aliases a live registered buffer.
        let address = buffer.as_ptr() as usize;
        self.reserve_slot()?;
        self.index.insert(address, self.buffers.len());
        self.buffers.push(buffer);
        Ok(Value::from_raw(address as i64))
    }

    /// Register a private copy of `bytes`.
    pub fn register_copy(&mut self, bytes: &[u8]) -> RuntimeResult<Value> {
        let mut owned = Vec::new();
        owned
            .try_reserve_exact(bytes.len() + 1)
            .map_err(|_| RuntimeError::oom("managed string copy"))?;
        owned.extend_from_slice(bytes);
        self.register_owned(owned)
    }

    fn reserve_slot(&mut self) -> RuntimeResult<()> {
        if self.buffers.len() == self.buffers.capacity() {
            let target = match self.buffers.capacity() {
                0 => REGISTRY_INITIAL_CAPACITY,
                cap => cap * 2,
            };
            self.buffers
                .try_reserve_exact(target - self.buffers.len())
                .map_err(|_| RuntimeError::oom("managed string registry"))?;
        }

        let before = self.index.capacity();
        let additional = if before == 0 { REGISTRY_INDEX_MIN_CAPACITY } else { 1 };
        self.index
            .try_reserve(additional)
            .map_err(|_| RuntimeError::oom("managed string index"))?;
        if self.index.capacity() != before {
            tracing::debug!(
                from = before,
                to = self.index.capacity(),
                strings = self.buffers.len(),
                "grew managed string index"
            );
        }
        Ok(())
    }

    /// True if `address` is the start of a registered buffer.
    pub fn is_managed(&self, address: usize) -> bool {
        address != 0 && self.index.contains_key(&address)
    }

    /// Contents of a registered string, up to its first NUL.
    pub fn managed_bytes(&self, value: Value) -> Option<&[u8]> {
        if value.is_null() {
            return None;
        }
        let slot = *self.index.get(&value.address())?;
        Some(until_nul(&self.buffers[slot]))
    }

    /// Contents of any string-shaped value.
    ///
    /// Registered buffers resolve even if their address happens to fall in
    /// the small-integer range. Other small integers are never strings.
    /// Unregistered pointers resolve only when foreign strings are trusted.
    pub fn resolve(&self, value: Value) -> Option<&[u8]> {
        if let Some(bytes) = self.managed_bytes(value) {
            return Some(bytes);
        }
        match (value, self.foreign) {
            (Value::Ref(handle), ForeignStrings::CStr) => {
                // SAFETY: `trusting_foreign` requires unregistered
                // pointer-shaped values to be live NUL-terminated buffers.
                let cstr = unsafe { CStr::from_ptr(handle.as_ptr::<c_char>()) };
                Some(cstr.to_bytes())
            }
            _ => None,
        }
    }

    /// Value equality: identical values are equal; small integers equal only
    /// themselves; otherwise both sides must be registered strings with the
    /// same contents.
    pub fn values_equal(&self, a: Value, b: Value) -> bool {
        if a == b {
            return true;
        }
        if a.is_small_int() || b.is_small_int() {
            return false;
        }
        match (self.managed_bytes(a), self.managed_bytes(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }
}

impl Default for StringRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyContext for StringRegistry {
    fn hash_key(&self, key: Value) -> u64 {
        if !key.is_small_int() {
            if let Some(bytes) = self.managed_bytes(key) {
                return hash_bytes(bytes);
            }
        }
        match key {
            Value::Int(n) => mix64(u64::from(n as u32)),
            Value::Ref(handle) => mix64(handle.raw() as u64),
        }
    }

    fn keys_equal(&self, a: Value, b: Value) -> bool {
        self.values_equal(a, b)
    }
}

fn until_nul(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}
