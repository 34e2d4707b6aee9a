//! C ABI entry points
//!
//! One unmangled function per runtime operation. Every argument and result is
//! a raw `i64` tagged value; booleans come back as 0 or 1 and mutators return
//! the handle they were given.
//!
//! Each thread owns a lazily created [`Runtime`]. Generated code is single
//! threaded, so in practice there is exactly one. Any [`RuntimeError`]
//! surfacing here is fatal: its diagnostic goes to stderr and the process
//! aborts.
//!
//! # Safety
//!
//! The runtime reads string literals straight out of generated code, so
//! functions marked `unsafe` require every pointer-shaped argument that is not
//! a runtime-created string or container handle to be the address of a live
//! NUL-terminated buffer.

use std::cell::RefCell;
use std::ffi::{CStr, c_char};

use crate::config::HostAssets;
use crate::errors::{RuntimeError, RuntimeResult};
use crate::fatal::{DEFAULT_CODE, Diagnostic, PanicMessage, abort_with};
use crate::runtime::Runtime;
use crate::value::Value;

thread_local! {
    // SAFETY: the trust requirement is part of every `unsafe` entry point's
    // contract; safe entry points never resolve their arguments as strings.
    static RUNTIME: RefCell<Runtime> = RefCell::new(unsafe { Runtime::trusting_foreign_strings() });
}

fn with_runtime<T>(f: impl FnOnce(&mut Runtime) -> T) -> T {
    RUNTIME.with_borrow_mut(f)
}

fn try_with_runtime<T>(f: impl FnOnce(&mut Runtime) -> RuntimeResult<T>) -> T {
    match with_runtime(f) {
        Ok(value) => value,
        Err(err) => fail(&err),
    }
}

fn fail(err: &RuntimeError) -> ! {
    let diagnostic = err.diagnostic();
    abort_with(diagnostic.code(), &diagnostic)
}

fn v(raw: i64) -> Value {
    Value::from_raw(raw)
}

fn flag(b: bool) -> i64 {
    i64::from(b)
}

// ---------------------------------------------------------------------------
// Strings
// ---------------------------------------------------------------------------

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_length(s: i64) -> i64 {
    with_runtime(|rt| rt.str_length(v(s)))
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_char_at(s: i64, index: i64) -> i64 {
    with_runtime(|rt| rt.str_char_at(v(s), index))
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_slice(s: i64, start: i64, end: i64) -> i64 {
    try_with_runtime(|rt| rt.str_slice(v(s), start, end)).to_raw()
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_slice_window(s: i64, start: i64, end: i64) -> i64 {
    try_with_runtime(|rt| rt.str_slice_window(v(s), start, end)).to_raw()
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_copy(s: i64) -> i64 {
    try_with_runtime(|rt| rt.str_copy(v(s))).to_raw()
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_concat(a: i64, b: i64) -> i64 {
    try_with_runtime(|rt| rt.str_concat(v(a), v(b))).to_raw()
}

/// Content comparison applies only when both sides are runtime-owned strings;
/// an unregistered literal equals only itself, so copy it with `str_copy`
/// before comparing it against a computed string.
///
/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_eq(a: i64, b: i64) -> i64 {
    with_runtime(|rt| flag(rt.str_eq(v(a), v(b))))
}

#[unsafe(no_mangle)]
pub extern "C" fn str_from_char_code(code: i64) -> i64 {
    try_with_runtime(|rt| rt.str_from_char_code(code)).to_raw()
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_index_of(s: i64, needle: i64) -> i64 {
    with_runtime(|rt| rt.str_index_of(v(s), v(needle)))
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_includes(s: i64, needle: i64) -> i64 {
    with_runtime(|rt| flag(rt.str_includes(v(s), v(needle))))
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_starts_with(s: i64, prefix: i64) -> i64 {
    with_runtime(|rt| flag(rt.str_starts_with(v(s), v(prefix))))
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_trim(s: i64) -> i64 {
    try_with_runtime(|rt| rt.str_trim(v(s))).to_raw()
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn str_replace_all(s: i64, from: i64, to: i64) -> i64 {
    try_with_runtime(|rt| rt.str_replace_all(v(s), v(from), v(to))).to_raw()
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn char_code(ch: i64) -> i64 {
    with_runtime(|rt| rt.char_code(v(ch)))
}

#[unsafe(no_mangle)]
pub extern "C" fn int_to_string(n: i64) -> i64 {
    try_with_runtime(|rt| rt.int_to_string(n)).to_raw()
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn parse_int(s: i64) -> i64 {
    with_runtime(|rt| rt.parse_int(v(s)))
}

// ---------------------------------------------------------------------------
// String builder
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "C" fn sb_new() -> i64 {
    try_with_runtime(Runtime::sb_new).to_raw()
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sb_append(sb: i64, s: i64) -> i64 {
    try_with_runtime(|rt| rt.sb_append(v(sb), v(s))).to_raw()
}

#[unsafe(no_mangle)]
pub extern "C" fn sb_append_char(sb: i64, code: i64) -> i64 {
    try_with_runtime(|rt| rt.sb_append_char(v(sb), code)).to_raw()
}

#[unsafe(no_mangle)]
pub extern "C" fn sb_build(sb: i64) -> i64 {
    try_with_runtime(|rt| rt.sb_build(v(sb))).to_raw()
}

// ---------------------------------------------------------------------------
// Vec
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "C" fn vec_new() -> i64 {
    try_with_runtime(Runtime::vec_new).to_raw()
}

#[unsafe(no_mangle)]
pub extern "C" fn vec_push(vec: i64, item: i64) -> i64 {
    try_with_runtime(|rt| rt.vec_push(v(vec), v(item))).to_raw()
}

#[unsafe(no_mangle)]
pub extern "C" fn vec_pop(vec: i64) -> i64 {
    with_runtime(|rt| rt.vec_pop(v(vec))).to_raw()
}

#[unsafe(no_mangle)]
pub extern "C" fn vec_get(vec: i64, index: i64) -> i64 {
    with_runtime(|rt| rt.vec_get(v(vec), index)).to_raw()
}

/// Aborts when `index` is more than one past the initialized length.
#[unsafe(no_mangle)]
pub extern "C" fn vec_set(vec: i64, index: i64, item: i64) -> i64 {
    try_with_runtime(|rt| rt.vec_set(v(vec), index, v(item))).to_raw()
}

#[unsafe(no_mangle)]
pub extern "C" fn vec_length(vec: i64) -> i64 {
    with_runtime(|rt| rt.vec_length(v(vec)))
}

#[unsafe(no_mangle)]
pub extern "C" fn vec_init(vec: i64) -> i64 {
    with_runtime(|rt| rt.vec_init(v(vec)))
}

#[unsafe(no_mangle)]
pub extern "C" fn vec_capacity(vec: i64) -> i64 {
    with_runtime(|rt| rt.vec_capacity(v(vec)))
}

#[unsafe(no_mangle)]
pub extern "C" fn vec_clear(vec: i64) -> i64 {
    with_runtime(|rt| rt.vec_clear(v(vec))).to_raw()
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vec_join(vec: i64, sep: i64) -> i64 {
    try_with_runtime(|rt| rt.vec_join(v(vec), v(sep))).to_raw()
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vec_includes(vec: i64, item: i64) -> i64 {
    with_runtime(|rt| flag(rt.vec_includes(v(vec), v(item))))
}

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "C" fn map_new() -> i64 {
    try_with_runtime(Runtime::map_new).to_raw()
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn map_set(map: i64, key: i64, value: i64) -> i64 {
    try_with_runtime(|rt| rt.map_set(v(map), v(key), v(value))).to_raw()
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn map_get(map: i64, key: i64) -> i64 {
    try_with_runtime(|rt| rt.map_get(v(map), v(key))).to_raw()
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn map_get_or_default(map: i64, key: i64, default: i64) -> i64 {
    try_with_runtime(|rt| rt.map_get_or_default(v(map), v(key), v(default))).to_raw()
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn map_has(map: i64, key: i64) -> i64 {
    flag(try_with_runtime(|rt| rt.map_has(v(map), v(key))))
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn map_delete(map: i64, key: i64) -> i64 {
    flag(try_with_runtime(|rt| rt.map_delete(v(map), v(key))))
}

#[unsafe(no_mangle)]
pub extern "C" fn map_clear(map: i64) -> i64 {
    with_runtime(|rt| rt.map_clear(v(map))).to_raw()
}

#[unsafe(no_mangle)]
pub extern "C" fn map_length(map: i64) -> i64 {
    with_runtime(|rt| rt.map_length(v(map)))
}

// ---------------------------------------------------------------------------
// Set
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "C" fn set_new() -> i64 {
    try_with_runtime(Runtime::set_new).to_raw()
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn set_add(set: i64, item: i64) -> i64 {
    try_with_runtime(|rt| rt.set_add(v(set), v(item))).to_raw()
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn set_has(set: i64, item: i64) -> i64 {
    flag(try_with_runtime(|rt| rt.set_has(v(set), v(item))))
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn set_delete(set: i64, item: i64) -> i64 {
    flag(try_with_runtime(|rt| rt.set_delete(v(set), v(item))))
}

#[unsafe(no_mangle)]
pub extern "C" fn set_clear(set: i64) -> i64 {
    with_runtime(|rt| rt.set_clear(v(set))).to_raw()
}

#[unsafe(no_mangle)]
pub extern "C" fn set_length(set: i64) -> i64 {
    with_runtime(|rt| rt.set_length(v(set)))
}

// ---------------------------------------------------------------------------
// Files, paths and output
// ---------------------------------------------------------------------------

/// Aborts if the file cannot be read.
///
/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn read_file(path: i64) -> i64 {
    try_with_runtime(|rt| rt.read_file(v(path))).to_raw()
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn write_file(path: i64, contents: i64) -> i64 {
    with_runtime(|rt| rt.write_file(v(path), v(contents)))
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn path_join(a: i64, b: i64) -> i64 {
    try_with_runtime(|rt| rt.path_join(v(a), v(b))).to_raw()
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn path_dirname(p: i64) -> i64 {
    try_with_runtime(|rt| rt.path_dirname(v(p))).to_raw()
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn print(s: i64) -> i64 {
    with_runtime(|rt| rt.print(v(s)));
    0
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn print_error(s: i64) -> i64 {
    with_runtime(|rt| rt.print_error(v(s)));
    0
}

#[unsafe(no_mangle)]
pub extern "C" fn perf_now() -> i64 {
    with_runtime(|rt| rt.perf_now())
}

/// Profiling hook. Samples are discarded.
#[unsafe(no_mangle)]
pub extern "C" fn profile_mark(label: i64, duration_ms: i64) -> i64 {
    tracing::trace!(label, duration_ms, "profile mark");
    0
}

/// Collected profile as JSON; always the empty object.
#[unsafe(no_mangle)]
pub extern "C" fn profile_take_json() -> i64 {
    try_with_runtime(|rt| rt.new_string(b"{}")).to_raw()
}

#[unsafe(no_mangle)]
pub extern "C" fn host_substrate_source() -> i64 {
    let assets = HostAssets::from_env();
    try_with_runtime(|rt| rt.host_substrate_source(&assets)).to_raw()
}

#[unsafe(no_mangle)]
pub extern "C" fn host_prelude_source() -> i64 {
    let assets = HostAssets::from_env();
    try_with_runtime(|rt| rt.host_prelude_source(&assets)).to_raw()
}

// ---------------------------------------------------------------------------
// Panic
// ---------------------------------------------------------------------------

fn lossy(rt: &Runtime, raw: i64) -> Option<String> {
    rt.resolve(v(raw))
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
}

/// Print `runtime panic: <msg>` and abort.
///
/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn panic(msg: i64) -> i64 {
    let message = PanicMessage(with_runtime(|rt| lossy(rt, msg)));
    abort_with(DEFAULT_CODE, &message)
}

/// Print a structured diagnostic and abort.
///
/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn panic_with_code(code: i64, msg: i64, reason: i64, fix: i64) -> i64 {
    let diagnostic = with_runtime(|rt| Diagnostic {
        code: lossy(rt, code),
        message: lossy(rt, msg),
        reason: lossy(rt, reason),
        fix: lossy(rt, fix),
        location: None,
    });
    abort_with(diagnostic.code(), &diagnostic)
}

/// [`panic_with_code`] with a source location.
///
/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn panic_with_code_loc(
    code: i64,
    msg: i64,
    reason: i64,
    fix: i64,
    line: i64,
    column: i64,
) -> i64 {
    let diagnostic = with_runtime(|rt| Diagnostic {
        code: lossy(rt, code),
        message: lossy(rt, msg),
        reason: lossy(rt, reason),
        fix: lossy(rt, fix),
        location: None,
    })
    .at(line, column);
    abort_with(diagnostic.code(), &diagnostic)
}

/// Host-side panic taking a plain C string. A null message prints
/// `runtime panic`.
///
/// # Safety
/// `message` must be null or point to a NUL-terminated buffer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn loam_panic(message: *const c_char) -> ! {
    let message = (!message.is_null()).then(|| {
        // SAFETY: checked non-null above; termination is the caller's contract.
        let cstr = unsafe { CStr::from_ptr(message) };
        cstr.to_string_lossy().into_owned()
    });
    abort_with(DEFAULT_CODE, &PanicMessage(message))
}
