//! Append-only byte buffer for assembling strings.
//!
//! A builder is not a string: its contents become one only when the runtime
//! registers a copy on `build`. The builder stays usable afterwards.

use crate::config::BUILDER_INITIAL_CAPACITY;
use crate::errors::{RuntimeError, RuntimeResult};

#[derive(Debug, Clone)]
pub struct StringBuilder {
    bytes: Vec<u8>,
    capacity: usize,
}

impl StringBuilder {
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            capacity: BUILDER_INITIAL_CAPACITY,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Logical capacity, including room for a terminating NUL.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn reserve(&mut self, additional: usize) -> RuntimeResult<()> {
        let needed = self.bytes.len() + additional + 1;
        let mut capacity = self.capacity.max(1);
        while capacity < needed {
            capacity *= 2;
        }
        if capacity != self.capacity {
            tracing::trace!(from = self.capacity, to = capacity, "grew string builder");
            self.capacity = capacity;
        }
        if self.bytes.capacity() < needed {
            self.bytes
                .try_reserve_exact(capacity - self.bytes.len())
                .map_err(|_| RuntimeError::oom("sb_append"))?;
        }
        Ok(())
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) -> RuntimeResult<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.reserve(bytes.len())?;
        self.bytes.extend_from_slice(bytes);
        Ok(())
    }

    pub fn push_byte(&mut self, byte: u8) -> RuntimeResult<()> {
        self.reserve(1)?;
        self.bytes.push(byte);
        Ok(())
    }
}

impl Default for StringBuilder {
    fn default() -> Self {
        Self::new()
    }
}
