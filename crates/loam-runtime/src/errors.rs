//! Error types for runtime operations
//!
//! The safe API reports fatal conditions as [`RuntimeError`]; the C ABI layer
//! turns every one of them into a diagnostic followed by process abort.

use std::io;
use std::path::PathBuf;

use derive_more::{Display, Error};

use crate::fatal::Diagnostic;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

pub const CODE_OUT_OF_MEMORY: &str = "E_RUNTIME_OOM";
pub const CODE_VEC_SET_OUT_OF_BOUNDS: &str = "E_RUNTIME_VEC_SET_OOB";
pub const CODE_IO: &str = "E_RUNTIME_IO";

#[derive(Display, Debug, Error)]
pub enum RuntimeError {
    #[display("Out of memory in {context}")]
    OutOfMemory { context: &'static str },

    #[display("vec_set index {index} exceeds initialized size {len}")]
    IndexBeyondEnd { index: usize, len: usize },

    #[display("Failed to read file {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[display("{diagnostic}")]
    Explicit { diagnostic: Diagnostic },
}

impl RuntimeError {
    pub(crate) fn oom(context: &'static str) -> Self {
        RuntimeError::OutOfMemory { context }
    }

    /// Structured form of the error, as printed by the panic protocol.
    pub fn diagnostic(&self) -> Diagnostic {
        match self {
            RuntimeError::OutOfMemory { .. } => Diagnostic::new(CODE_OUT_OF_MEMORY)
                .with_message(self.to_string())
                .with_reason("an allocation for runtime data could not be satisfied")
                .with_fix("reduce the program's memory use or raise the process memory limit"),
            RuntimeError::IndexBeyondEnd { .. } => Diagnostic::new(CODE_VEC_SET_OUT_OF_BOUNDS)
                .with_message(self.to_string())
                .with_reason("vectors can only be written at an existing index or exactly one past the end")
                .with_fix("push elements in order, or write at index length(v) to extend by one"),
            RuntimeError::Io { path, .. } => Diagnostic::new(CODE_IO)
                .with_message(self.to_string())
                .with_reason(format!("{} could not be opened or read", path.display()))
                .with_fix("check that the path exists and is readable"),
            RuntimeError::Explicit { diagnostic } => diagnostic.clone(),
        }
    }
}

impl From<Diagnostic> for RuntimeError {
    fn from(diagnostic: Diagnostic) -> Self {
        RuntimeError::Explicit { diagnostic }
    }
}
