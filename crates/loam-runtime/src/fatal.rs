//! Fatal diagnostics and the process-terminating panic protocol.
//!
//! Diagnostics render in a line-oriented format that external tooling parses:
//!
//! ```text
//! error[<code>] <message> @ <line>:<col>
//! reason: <reasoning>
//! fix: <fix>
//! ```
//!
//! The ` @ <line>:<col>` suffix is present only when a source location is known.

use std::fmt;
use std::io::{self, Write};
use std::process;

/// Code used when the caller supplies none.
pub const DEFAULT_CODE: &str = "E_RUNTIME_INTERNAL_ERROR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: i64,
    pub column: i64,
}

/// A structured fatal error report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: Option<String>,
    pub message: Option<String>,
    pub reason: Option<String>,
    pub fix: Option<String>,
    pub location: Option<SourceLocation>,
}

impl Diagnostic {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.fix = Some(fix.into());
        self
    }

    pub fn at(mut self, line: i64, column: i64) -> Self {
        self.location = Some(SourceLocation { line, column });
        self
    }

    pub fn code(&self) -> &str {
        self.code.as_deref().unwrap_or(DEFAULT_CODE)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error[{}] {}",
            self.code(),
            self.message.as_deref().unwrap_or("<no message>")
        )?;
        if let Some(SourceLocation { line, column }) = self.location {
            write!(f, " @ {line}:{column}")?;
        }
        write!(
            f,
            "\nreason: {}\nfix: {}",
            self.reason.as_deref().unwrap_or("<no reason>"),
            self.fix.as_deref().unwrap_or("<no fix>")
        )
    }
}

/// Rendering of a bare `panic(message)` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanicMessage(pub Option<String>);

impl fmt::Display for PanicMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(message) => write!(f, "runtime panic: {message}"),
            None => write!(f, "runtime panic"),
        }
    }
}

/// Write `report` to stderr and abort the process. There is no unwinding.
pub fn abort_with(code: &str, report: &dyn fmt::Display) -> ! {
    tracing::error!(code, "fatal runtime error, aborting");
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "{report}");
    let _ = stderr.flush();
    process::abort()
}
