//! The runtime owner object
//!
//! [`Runtime`] holds all process-scoped state: the string registry and the
//! handle table for containers. Operations are grouped by concern in sibling
//! modules (`string_ops`, `collections`, `io`), each adding an `impl Runtime`
//! block.

use std::time::Instant;

use crate::errors::RuntimeResult;
use crate::handle::HandleTable;
use crate::registry::StringRegistry;
use crate::value::Value;

pub struct Runtime {
    pub(crate) strings: StringRegistry,
    pub(crate) heap: HandleTable,
    pub(crate) epoch: Instant,
}

impl Runtime {
    /// A runtime that only treats its own registered buffers as strings.
    pub fn new() -> Self {
        Self::with_registry(StringRegistry::new())
    }

    /// A runtime that also reads unregistered pointer-shaped values as
    /// NUL-terminated C strings, as generated code passes string literals.
    ///
    /// # Safety
    ///
    /// Every pointer-shaped value passed to this runtime that is neither a
    /// registered string nor a container handle must point to a live
    /// NUL-terminated buffer.
    pub unsafe fn trusting_foreign_strings() -> Self {
        // SAFETY: forwarded to the caller.
        Self::with_registry(unsafe { StringRegistry::trusting_foreign() })
    }

    fn with_registry(strings: StringRegistry) -> Self {
        Self {
            strings,
            heap: HandleTable::new(),
            epoch: Instant::now(),
        }
    }

    pub fn registry(&self) -> &StringRegistry {
        &self.strings
    }

    pub fn heap(&self) -> &HandleTable {
        &self.heap
    }

    /// Register a copy of `bytes` as a new string.
    pub fn new_string(&mut self, bytes: &[u8]) -> RuntimeResult<Value> {
        self.strings.register_copy(bytes)
    }

    /// String contents of `value`, or `None` if it is not a string.
    pub fn resolve(&self, value: Value) -> Option<&[u8]> {
        resolve(&self.strings, &self.heap, value)
    }

    /// String contents of `value`, with non-strings read as empty.
    pub fn text(&self, value: Value) -> &[u8] {
        self.resolve(value).unwrap_or_default()
    }

    /// Equality used by string comparison, `vec_includes` and table keys.
    pub fn values_equal(&self, a: Value, b: Value) -> bool {
        self.strings.values_equal(a, b)
    }

    /// Rewrite `value` into the form used as a map key or set item.
    ///
    /// Small integers, registered strings and container handles pass through.
    /// Any other string is copied into the registry. Opaque values pass
    /// through unchanged.
    pub fn canonicalize(&mut self, value: Value) -> RuntimeResult<Value> {
        if value.is_small_int()
            || self.strings.is_managed(value.address())
            || self.heap.contains(value)
        {
            return Ok(value);
        }
        match self.strings.resolve(value) {
            Some(bytes) => {
                let bytes = bytes.to_vec();
                self.strings.register_owned(bytes)
            }
            None => Ok(value),
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

/// Field-level resolve so string bytes can be borrowed while the handle
/// table is borrowed mutably elsewhere.
pub(crate) fn resolve<'a>(
    strings: &'a StringRegistry,
    heap: &HandleTable,
    value: Value,
) -> Option<&'a [u8]> {
    if heap.contains(value) {
        return None;
    }
    strings.resolve(value)
}
