//! Integration tests driving the runtime through its C entry points, the way
//! generated code does: raw `i64` values and NUL-terminated literals.

use std::ffi::{CStr, CString, c_char};
use std::process::Command;

use loam_runtime::ffi::*;
use loam_runtime::is_small_int;

/// Keeps caller-owned C strings alive for the duration of a test.
#[derive(Default)]
struct Literals(Vec<CString>);

impl Literals {
    fn lit(&mut self, s: &str) -> i64 {
        let owned = CString::new(s).unwrap();
        let raw = owned.as_ptr() as i64;
        assert!(!is_small_int(raw), "literal allocated in the small-int range");
        self.0.push(owned);
        raw
    }
}

fn text(value: i64) -> String {
    assert!(value != 0, "expected a string, got null");
    // SAFETY: runtime strings are NUL-terminated and never freed.
    unsafe { CStr::from_ptr(value as *const c_char) }
        .to_string_lossy()
        .into_owned()
}

#[test]
fn string_operations_accept_foreign_literals() {
    let mut lits = Literals::default();
    // SAFETY: every pointer-shaped argument comes from `lits` or the runtime.
    unsafe {
        let hello = lits.lit("hello world");
        assert_eq!(str_length(hello), 11);
        assert_eq!(str_char_at(hello, 4), i64::from(b'o'));
        assert_eq!(text(str_slice(hello, 6, 100)), "world");
        assert_eq!(str_index_of(hello, lits.lit("world")), 6);
        assert_eq!(str_index_of(hello, lits.lit("mars")), -1);
        assert_eq!(text(str_concat(hello, lits.lit("!"))), "hello world!");
        assert_eq!(text(str_trim(lits.lit("\t padded \n"))), "padded");
        assert_eq!(parse_int(lits.lit("  -120xyz")), -120);
        assert_eq!(text(int_to_string(-120)), "-120");
        assert_eq!(char_code(lits.lit("A")), 65);
        assert_eq!(str_starts_with(hello, lits.lit("hell")), 1);
        assert_eq!(str_includes(hello, lits.lit("o w")), 1);
        assert_eq!(text(str_from_char_code(122)), "z");
    }
}

#[test]
fn equality_requires_registered_strings() {
    let mut lits = Literals::default();
    // SAFETY: see above.
    unsafe {
        let a = lits.lit("same");
        let b = lits.lit("same");
        assert_eq!(str_eq(a, a), 1);
        // unregistered buffers are only equal to themselves
        assert_eq!(str_eq(a, b), 0);

        let ca = str_copy(a);
        let cb = str_copy(b);
        assert_ne!(ca, cb);
        assert_eq!(str_eq(ca, cb), 1);
        assert_eq!(str_eq(ca, 5), 0);
    }
}

#[test]
fn replace_all_scenario() {
    let mut lits = Literals::default();
    // SAFETY: see above.
    unsafe {
        let out = str_replace_all(lits.lit("aXbXc"), lits.lit("X"), lits.lit("-"));
        assert_eq!(text(out), "a-b-c");
        let same = str_replace_all(lits.lit("abc"), lits.lit(""), lits.lit("zz"));
        assert_eq!(text(same), "abc");
    }
}

#[test]
fn map_keys_from_distinct_literals_converge() {
    let mut lits = Literals::default();
    let map = map_new();
    // SAFETY: see above.
    unsafe {
        assert_eq!(map_set(map, lits.lit("a"), 1), map);
        map_set(map, lits.lit("b"), 2);
        assert_eq!(map_delete(map, lits.lit("a")), 1);
        assert_eq!(map_has(map, lits.lit("a")), 0);
        assert_eq!(map_has(map, lits.lit("b")), 1);
        assert_eq!(map_get(map, lits.lit("b")), 2);
        assert_eq!(map_get_or_default(map, lits.lit("zzz"), -1), -1);
    }
    assert_eq!(map_length(map), 1);
    assert_eq!(map_clear(map), map);
    assert_eq!(map_length(map), 0);
}

#[test]
fn set_membership() {
    let mut lits = Literals::default();
    let set = set_new();
    // SAFETY: see above.
    unsafe {
        set_add(set, lits.lit("x"));
        set_add(set, lits.lit("x"));
        set_add(set, 3);
        assert_eq!(set_length(set), 2);
        assert_eq!(set_has(set, lits.lit("x")), 1);
        assert_eq!(set_delete(set, lits.lit("x")), 1);
        assert_eq!(set_has(set, lits.lit("x")), 0);
        assert_eq!(set_has(set, 3), 1);
    }
    set_clear(set);
    assert_eq!(set_length(set), 0);
}

#[test]
fn vec_join_scenario() {
    let mut lits = Literals::default();
    let vec = vec_new();
    vec_push(vec, 10);
    vec_push(vec, 20);
    // SAFETY: see above.
    unsafe {
        assert_eq!(text(vec_join(vec, lits.lit(","))), "10,20");
        assert_eq!(vec_includes(vec, 20), 1);
        assert_eq!(vec_includes(vec, 30), 0);
    }
    assert_eq!(vec_set(vec, 2, 30), vec);
    assert_eq!(vec_length(vec), 3);
    assert_eq!(vec_init(vec), 3);
    assert_eq!(vec_capacity(vec), 4);
    vec_clear(vec);
    assert_eq!(vec_length(vec), 0);
    assert_eq!(vec_capacity(vec), 4);
}

#[test]
fn builder_round_trip() {
    let mut lits = Literals::default();
    let sb = sb_new();
    // SAFETY: see above.
    unsafe {
        sb_append(sb, lits.lit("key"));
        sb_append(sb, 0);
    }
    sb_append_char(sb, i64::from(b'='));
    let first = sb_build(sb);
    sb_append_char(sb, i64::from(b'1'));
    assert_eq!(text(first), "key=");
    assert_eq!(text(sb_build(sb)), "key=1");
}

#[test]
fn files_and_paths() {
    let dir = tempfile::tempdir().unwrap();
    let mut lits = Literals::default();
    // SAFETY: see above.
    unsafe {
        let base = lits.lit(dir.path().to_str().unwrap());
        let path = path_join(base, lits.lit("out/result.txt"));
        assert_eq!(text(path_dirname(path)), format!("{}/out", dir.path().display()));
        assert_eq!(write_file(path, lits.lit("contents")), 0);
        assert_eq!(text(read_file(path)), "contents");
        assert_eq!(read_file(0), 0);
        assert_eq!(write_file(0, 0), -1);
    }
}

#[test]
fn perf_now_does_not_go_backwards() {
    let a = perf_now();
    let b = perf_now();
    assert!(b >= a);
}

#[test]
fn profiling_hooks_are_inert() {
    let mut lits = Literals::default();
    assert_eq!(profile_mark(lits.lit("lex"), 12), 0);
    assert_eq!(profile_mark(0, 0), 0);
    let report = profile_take_json();
    assert_eq!(text(report), "{}");
    // SAFETY: both sides are runtime-owned strings.
    unsafe {
        assert_eq!(str_eq(report, profile_take_json()), 1);
    }
}

#[test]
fn computed_string_matches_copied_literal_only() {
    let mut lits = Literals::default();
    // SAFETY: see above.
    unsafe {
        let prefix = str_slice(lits.lit("fn main"), 0, 2);
        let literal = lits.lit("fn");
        assert_eq!(text(prefix), "fn");
        assert_eq!(str_eq(prefix, literal), 0);
        assert_eq!(str_eq(prefix, str_copy(literal)), 1);
    }
}

const PANIC_CHILD_VAR: &str = "LOAM_RUNTIME_PANIC_CHILD";

/// Runs the named test of this binary in a child process with
/// `PANIC_CHILD_VAR` set and returns its stderr and whether it succeeded.
fn run_child(test_name: &str) -> (bool, String) {
    let output = Command::new(std::env::current_exe().unwrap())
        .args(["--exact", test_name, "--nocapture", "--test-threads=1"])
        .env(PANIC_CHILD_VAR, "1")
        .output()
        .unwrap();
    (
        output.status.success(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    )
}

#[test]
fn panic_with_code_loc_prints_diagnostic_and_aborts() {
    if std::env::var_os(PANIC_CHILD_VAR).is_some() {
        let mut lits = Literals::default();
        // SAFETY: see above.
        unsafe {
            panic_with_code_loc(
                lits.lit("E_TEST_FAILURE"),
                lits.lit("boom"),
                lits.lit("the test asked for it"),
                lits.lit("stop asking"),
                3,
                7,
            );
        }
    }
    let (success, stderr) = run_child("panic_with_code_loc_prints_diagnostic_and_aborts");
    assert!(!success);
    assert!(
        stderr.contains("error[E_TEST_FAILURE] boom @ 3:7\nreason: the test asked for it\nfix: stop asking"),
        "stderr was: {stderr}"
    );
}

#[test]
fn vec_set_far_past_end_aborts() {
    if std::env::var_os(PANIC_CHILD_VAR).is_some() {
        let vec = vec_new();
        vec_push(vec, 1);
        vec_set(vec, 6, 1);
        return;
    }
    let (success, stderr) = run_child("vec_set_far_past_end_aborts");
    assert!(!success);
    assert!(
        stderr.contains("error[E_RUNTIME_VEC_SET_OOB] vec_set index 6 exceeds initialized size 1"),
        "stderr was: {stderr}"
    );
}

#[test]
fn plain_panic_message() {
    if std::env::var_os(PANIC_CHILD_VAR).is_some() {
        let mut lits = Literals::default();
        // SAFETY: see above.
        unsafe {
            panic(lits.lit("unreachable state"));
        }
    }
    let (success, stderr) = run_child("plain_panic_message");
    assert!(!success);
    assert!(stderr.contains("runtime panic: unreachable state"), "stderr was: {stderr}");
}
