//! File I/O, path helpers, console output and host assets
//!
//! Paths are strings like any other: they are resolved through the registry
//! and converted to OS paths only at the filesystem boundary.

use std::borrow::Cow;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::config::HostAssets;
use crate::errors::{RuntimeError, RuntimeResult};
use crate::runtime::Runtime;
use crate::value::Value;

impl Runtime {
    /// Whole-file contents as a new string.
    ///
    /// A non-string path yields 0; a file that cannot be read is an error.
    pub fn read_file(&mut self, path: Value) -> RuntimeResult<Value> {
        let Some(raw) = self.resolve(path) else {
            return Ok(Value::ZERO);
        };
        let path = bytes_to_path(raw).into_owned();
        let contents = fs::read(&path).map_err(|source| RuntimeError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = contents.len(), "read file");
        self.strings.register_owned(contents)
    }

    /// Write `contents` to `path`, creating missing parent directories.
    ///
    /// Returns 0 on success and -1 on failure; never fatal.
    pub fn write_file(&self, path: Value, contents: Value) -> i64 {
        let Some(raw) = self.resolve(path) else {
            return -1;
        };
        let path = bytes_to_path(raw);
        let contents = self.text(contents);
        match write_creating_parents(&path, contents) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote file");
                0
            }
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "write failed");
                -1
            }
        }
    }

    /// Join two path strings with `/`. An absolute `b` replaces `a`.
    pub fn path_join(&mut self, a: Value, b: Value) -> RuntimeResult<Value> {
        let (a, b) = (self.text(a), self.text(b));
        let absolute = matches!(b.first(), Some(b'/' | b'\\')) || b.get(1) == Some(&b':');
        if absolute {
            let b = b.to_vec();
            return self.strings.register_owned(b);
        }
        let needs_sep = a.last().is_some_and(|c| !is_separator(*c));
        let mut joined = Vec::with_capacity(a.len() + b.len() + 2);
        joined.extend_from_slice(a);
        if needs_sep {
            joined.push(b'/');
        }
        joined.extend_from_slice(b);
        self.strings.register_owned(joined)
    }

    /// Everything before the last separator; `.` if there is none.
    pub fn path_dirname(&mut self, p: Value) -> RuntimeResult<Value> {
        let path = self.text(p);
        let dir = match path.iter().rposition(|&c| is_separator(c)) {
            None => &b"."[..],
            Some(0) => &path[..1],
            Some(last) => &path[..last],
        };
        let dir = dir.to_vec();
        self.strings.register_owned(dir)
    }

    /// Write `s` and a newline to `out`. Non-strings print as empty lines.
    pub fn write_line(&self, out: &mut dyn Write, s: Value) -> io::Result<()> {
        out.write_all(self.text(s))?;
        out.write_all(b"\n")
    }

    pub fn print(&self, s: Value) {
        let _ = self.write_line(&mut io::stdout().lock(), s);
    }

    pub fn print_error(&self, s: Value) {
        let _ = self.write_line(&mut io::stderr().lock(), s);
    }

    /// Milliseconds since the runtime was created, from a monotonic clock.
    pub fn perf_now(&self) -> i64 {
        i64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(i64::MAX)
    }

    /// Substrate source bundle named by the host environment, or "".
    pub fn host_substrate_source(&mut self, assets: &HostAssets) -> RuntimeResult<Value> {
        self.read_asset(assets.substrate.as_deref())
    }

    /// Prelude source named by the host environment, or "".
    pub fn host_prelude_source(&mut self, assets: &HostAssets) -> RuntimeResult<Value> {
        self.read_asset(assets.prelude.as_deref())
    }

    fn read_asset(&mut self, path: Option<&Path>) -> RuntimeResult<Value> {
        let contents = match path.map(fs::read) {
            Some(Ok(contents)) => contents,
            Some(Err(err)) => {
                tracing::debug!(error = %err, "host asset unreadable, using empty source");
                Vec::new()
            }
            None => Vec::new(),
        };
        self.strings.register_owned(contents)
    }
}

fn is_separator(c: u8) -> bool {
    c == b'/' || c == b'\\'
}

fn write_creating_parents(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

#[cfg(unix)]
fn bytes_to_path(bytes: &[u8]) -> Cow<'_, Path> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(Path::new(OsStr::from_bytes(bytes)))
}

#[cfg(not(unix))]
fn bytes_to_path(bytes: &[u8]) -> Cow<'_, Path> {
    match String::from_utf8_lossy(bytes) {
        Cow::Borrowed(s) => Cow::Borrowed(Path::new(s)),
        Cow::Owned(s) => Cow::Owned(std::path::PathBuf::from(s)),
    }
}
