//! Tagged value representation
//!
//! Every value exchanged with generated code is a raw `i64`. Values strictly
//! inside `(-2^31, 2^31)` are small integers; anything else is the address of
//! a runtime-owned object (a registered string buffer or a container control
//! block). [`Value`] makes that split explicit while round-tripping every raw
//! `i64` exactly.

use std::fmt;
use std::num::NonZeroI64;

use crate::config::{SMALL_INT_MAX, SMALL_INT_MIN};

/// True if `raw` lies in the small-integer range `(-2^31, 2^31)`.
pub const fn is_small_int(raw: i64) -> bool {
    raw > SMALL_INT_MIN && raw < SMALL_INT_MAX
}

/// Non-owning reference to a heap object, identified by its address.
///
/// Zero is always a small integer, so a handle is never null.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(NonZeroI64);

impl Handle {
    pub const fn raw(self) -> i64 {
        self.0.get()
    }

    pub const fn address(self) -> usize {
        self.0.get() as usize
    }

    /// Reinterpret the handle as a pointer. Creating the pointer is safe;
    /// dereferencing it is up to the caller.
    pub fn as_ptr<T>(self) -> *const T {
        self.address() as *const T
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:#x})", self.raw())
    }
}

/// A tagged runtime value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    /// Literal scalar in `(-2^31, 2^31)`.
    Int(i32),
    /// Pointer-shaped value: a string buffer or container handle.
    Ref(Handle),
}

impl Value {
    pub const ZERO: Value = Value::Int(0);

    /// Classify a raw ABI value by range.
    pub const fn from_raw(raw: i64) -> Self {
        match NonZeroI64::new(raw) {
            Some(bits) if !is_small_int(raw) => Value::Ref(Handle(bits)),
            _ => Value::Int(raw as i32),
        }
    }

    /// The raw ABI encoding.
    pub const fn to_raw(self) -> i64 {
        match self {
            Value::Int(n) => n as i64,
            Value::Ref(handle) => handle.raw(),
        }
    }

    /// Small integer constructor. `i32::MIN` falls outside the small range
    /// and therefore classifies as a reference.
    pub const fn int(n: i32) -> Self {
        Value::from_raw(n as i64)
    }

    pub fn from_ptr<T>(ptr: *const T) -> Self {
        Value::from_raw(ptr as usize as i64)
    }

    pub fn as_ptr<T>(self) -> *const T {
        self.address() as *const T
    }

    /// Raw bits viewed as an address; used for registry membership tests.
    pub const fn address(self) -> usize {
        self.to_raw() as usize
    }

    pub const fn is_small_int(self) -> bool {
        matches!(self, Value::Int(_))
    }

    /// The null value doubles as the integer zero.
    pub const fn is_null(self) -> bool {
        matches!(self, Value::Int(0))
    }

    pub const fn as_int(self) -> Option<i32> {
        match self {
            Value::Int(n) => Some(n),
            Value::Ref(_) => None,
        }
    }

    pub const fn as_handle(self) -> Option<Handle> {
        match self {
            Value::Ref(handle) => Some(handle),
            Value::Int(_) => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::ZERO
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Int(i32::from(b))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Ref(handle) => write!(f, "{:#x}", handle.raw()),
        }
    }
}
