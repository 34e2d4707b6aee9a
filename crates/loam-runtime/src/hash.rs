//! Hash mixing shared by the registry index and the collection tables.

use std::hash::{BuildHasherDefault, Hasher};

use rustc_hash::FxHasher;

/// 64-bit avalanche mix. Shifting by 33 folds the high address bits into
/// the low ones so allocator alignment does not bias the bucket index.
pub(crate) const fn mix64(mut x: u64) -> u64 {
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51_afd7_ed55_8ccd);
    x ^= x >> 33;
    x
}

/// Content hash for string keys: [`FxHasher`] over the bytes, then [`mix64`].
pub(crate) fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(bytes);
    mix64(hasher.finish())
}

/// Identity hasher for address-keyed maps.
///
/// Only integer writes are expected; the address itself is the hash input.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct AddressHasher(u64);

impl Hasher for AddressHasher {
    fn finish(&self) -> u64 {
        mix64(self.0)
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = self.0.rotate_left(8) ^ u64::from(b);
        }
    }

    fn write_u64(&mut self, n: u64) {
        self.0 = n;
    }

    fn write_usize(&mut self, n: usize) {
        self.0 = n as u64;
    }
}

pub(crate) type BuildAddressHasher = BuildHasherDefault<AddressHasher>;
