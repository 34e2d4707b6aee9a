//! Runtime tunables and host-provided configuration.
//!
//! Capacities and thresholds are compile-time constants; the only runtime
//! configuration is a pair of environment variables naming optional text
//! assets used by the self-hosting build.

use std::env;
use std::path::PathBuf;

/// Exclusive lower bound of the small-integer range.
pub const SMALL_INT_MIN: i64 = -(1 << 31);
/// Exclusive upper bound of the small-integer range.
pub const SMALL_INT_MAX: i64 = 1 << 31;

/// Initial byte capacity of a fresh string builder.
pub const BUILDER_INITIAL_CAPACITY: usize = 32;
/// Capacity of a vector after its first push.
pub const VEC_INITIAL_CAPACITY: usize = 4;
/// Smallest capacity of an allocated map or set table.
pub const TABLE_MIN_CAPACITY: usize = 16;
/// Initial capacity of the registry's buffer list.
pub const REGISTRY_INITIAL_CAPACITY: usize = 32;
/// Initial capacity of the registry's address index.
pub const REGISTRY_INDEX_MIN_CAPACITY: usize = 64;

/// Tables grow once `(used + 1) / capacity` reaches `LOAD_FACTOR_NUM / LOAD_FACTOR_DEN`.
pub const LOAD_FACTOR_NUM: usize = 7;
pub const LOAD_FACTOR_DEN: usize = 10;

/// Environment variable naming the substrate source bundle.
pub const SUBSTRATE_PATH_VAR: &str = "LOAM_SUBSTRATE_PATH";
/// Environment variable naming the runtime prelude source.
pub const PRELUDE_PATH_VAR: &str = "LOAM_PRELUDE_PATH";

/// Paths of the optional text assets a host may provide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostAssets {
    pub substrate: Option<PathBuf>,
    pub prelude: Option<PathBuf>,
}

impl HostAssets {
    /// Read asset paths from the process environment. Empty values count as unset.
    pub fn from_env() -> Self {
        Self {
            substrate: path_from_env(SUBSTRATE_PATH_VAR),
            prelude: path_from_env(PRELUDE_PATH_VAR),
        }
    }
}

fn path_from_env(var: &str) -> Option<PathBuf> {
    env::var_os(var)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
