//! Loam runtime library.
//!
//! The native substrate linked into every compiled Loam program. It provides
//! the only data structures generated code can use:
//! - Tagged 64-bit values: small integers or pointers ([`Value`])
//! - Managed, never-freed strings backed by a registry ([`StringRegistry`])
//! - Growable vectors, open-addressing maps and sets, string builders
//! - Whole-file I/O, path helpers and console output
//! - A structured panic protocol that prints a diagnostic and aborts
//!
//! Rust callers use the safe [`Runtime`] API, where fatal conditions are
//! [`RuntimeError`] values. Generated C code links the unmangled entry points
//! in [`ffi`], which abort on those same errors.

pub mod builder;
mod collections;
pub mod config;
pub mod errors;
pub mod fatal;
pub mod ffi;
pub mod handle;
mod hash;
mod io;
pub mod registry;
pub mod runtime;
mod string_ops;
pub mod table;
pub mod value;
pub mod vector;

pub use builder::StringBuilder;
pub use config::HostAssets;
pub use errors::{RuntimeError, RuntimeResult};
pub use fatal::{Diagnostic, PanicMessage, SourceLocation};
pub use handle::{HandleTable, HeapObject};
pub use registry::StringRegistry;
pub use runtime::Runtime;
pub use table::{KeyContext, Table, ValueMap, ValueSet};
pub use value::{Handle, Value, is_small_int};
pub use vector::ValueVec;

#[cfg(test)]
mod tests;
