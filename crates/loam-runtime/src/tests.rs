//! Cross-module tests for the runtime
//!
//! Note: tests touching process environment variables use serial_test since
//! the environment is shared by every test thread.

use crate::config::{HostAssets, PRELUDE_PATH_VAR, SUBSTRATE_PATH_VAR};
use crate::errors::RuntimeError;
use crate::runtime::Runtime;
use crate::value::Value;
use serial_test::serial;

fn s(rt: &mut Runtime, text: &str) -> Value {
    rt.new_string(text.as_bytes()).unwrap()
}

#[test]
fn test_map_set_delete_scenario() {
    let mut rt = Runtime::new();
    let map = rt.map_new().unwrap();
    let (a, b) = (s(&mut rt, "a"), s(&mut rt, "b"));
    rt.map_set(map, a, Value::Int(1)).unwrap();
    rt.map_set(map, b, Value::Int(2)).unwrap();
    assert!(rt.map_delete(map, a).unwrap());

    let (a2, b2) = (s(&mut rt, "a"), s(&mut rt, "b"));
    assert!(!rt.map_has(map, a2).unwrap());
    assert!(rt.map_has(map, b2).unwrap());
    assert_eq!(rt.map_get(map, b2).unwrap(), Value::Int(2));
}

#[test]
fn test_vec_join_scenario() {
    let mut rt = Runtime::new();
    let vec = rt.vec_new().unwrap();
    rt.vec_push(vec, Value::Int(10)).unwrap();
    rt.vec_push(vec, Value::Int(20)).unwrap();
    let comma = s(&mut rt, ",");
    let joined = rt.vec_join(vec, comma).unwrap();
    assert_eq!(rt.text(joined), b"10,20");

    let empty = rt.vec_new().unwrap();
    let joined = rt.vec_join(empty, comma).unwrap();
    assert_eq!(rt.text(joined), b"");
}

#[test]
fn test_replace_all_scenario() {
    let mut rt = Runtime::new();
    let (src, x, dash) = (s(&mut rt, "aXbXc"), s(&mut rt, "X"), s(&mut rt, "-"));
    let out = rt.str_replace_all(src, x, dash).unwrap();
    assert_eq!(rt.text(out), b"a-b-c");
}

#[test]
fn test_same_key_churn_never_accumulates_tombstones() {
    let mut rt = Runtime::new();
    let map = rt.map_new().unwrap();
    let key = s(&mut rt, "k");
    for round in 0..20 {
        rt.map_set(map, key, Value::Int(round)).unwrap();
        assert!(rt.map_delete(map, key).unwrap());
        let table = rt.heap().map(map).unwrap();
        assert!(table.tombstones() <= 1);
        assert!(table.len() + table.tombstones() <= table.capacity());
    }
    let table = rt.heap().map(map).unwrap();
    assert_eq!(table.capacity(), 16);
    assert_eq!(table.len(), 0);
}

#[test]
fn test_set_compaction_at_same_capacity() {
    let mut rt = Runtime::new();
    let set = rt.set_new().unwrap();
    let items: Vec<Value> = (0..40).map(|i| s(&mut rt, &format!("item-{i}"))).collect();
    for &item in &items {
        rt.set_add(set, item).unwrap();
    }
    let grown = rt.heap().set(set).unwrap().capacity();
    assert_eq!(grown, 64);

    for &item in &items[..30] {
        assert!(rt.set_delete(set, item).unwrap());
        let table = rt.heap().set(set).unwrap();
        assert!(table.tombstones() <= table.len());
        assert_eq!(table.capacity(), grown);
    }
    for &item in &items[30..] {
        assert!(rt.set_has(set, item).unwrap());
    }
    assert_eq!(rt.set_length(set), 10);
}

#[test]
fn test_map_operation_sequence_invariants() {
    let mut rt = Runtime::new();
    let map = rt.map_new().unwrap();
    let keys: Vec<Value> = (0..24).map(|i| s(&mut rt, &format!("key{i}"))).collect();
    for round in 0..6 {
        for (i, &key) in keys.iter().enumerate() {
            if (i + round) % 3 == 0 {
                rt.map_delete(map, key).unwrap();
                assert!(!rt.map_has(map, key).unwrap());
            } else {
                let value = Value::Int((round * 100 + i) as i32);
                rt.map_set(map, key, value).unwrap();
                assert!(rt.map_has(map, key).unwrap());
                assert_eq!(rt.map_get(map, key).unwrap(), value);
            }
            let table = rt.heap().map(map).unwrap();
            assert!(table.len() + table.tombstones() <= table.capacity());
        }
    }
}

#[test]
fn test_copy_equals_original_with_distinct_address() {
    let mut rt = Runtime::new();
    let original = s(&mut rt, "payload");
    let copy = rt.str_copy(original).unwrap();
    assert!(rt.str_eq(original, copy));
    assert_ne!(original.to_raw(), copy.to_raw());
}

#[test]
fn test_vec_push_pop_set_properties() {
    let mut rt = Runtime::new();
    let vec = rt.vec_new().unwrap();
    rt.vec_push(vec, Value::Int(1)).unwrap();
    rt.vec_push(vec, Value::Int(42)).unwrap();
    assert_eq!(rt.vec_get(vec, rt.vec_length(vec) - 1), Value::Int(42));

    let before = rt.vec_length(vec);
    rt.vec_push(vec, Value::Int(7)).unwrap();
    assert_eq!(rt.vec_pop(vec), Value::Int(7));
    assert_eq!(rt.vec_length(vec), before);

    let len = rt.vec_length(vec);
    rt.vec_set(vec, len, Value::Int(9)).unwrap();
    assert_eq!(rt.vec_length(vec), len + 1);

    let far = rt.vec_length(vec) + 5;
    let err = rt.vec_set(vec, far, Value::Int(0)).unwrap_err();
    assert!(matches!(err, RuntimeError::IndexBeyondEnd { .. }));
    insta::assert_snapshot!(err.diagnostic().to_string(), @r"
    error[E_RUNTIME_VEC_SET_OOB] vec_set index 8 exceeds initialized size 3
    reason: vectors can only be written at an existing index or exactly one past the end
    fix: push elements in order, or write at index length(v) to extend by one
    ");
}

#[test]
fn test_strings_and_ints_never_collide_as_keys() {
    let mut rt = Runtime::new();
    let map = rt.map_new().unwrap();
    let one = s(&mut rt, "1");
    rt.map_set(map, Value::Int(1), Value::Int(10)).unwrap();
    rt.map_set(map, one, Value::Int(20)).unwrap();
    assert_eq!(rt.map_length(map), 2);
    assert_eq!(rt.map_get(map, Value::Int(1)).unwrap(), Value::Int(10));
    assert_eq!(rt.map_get(map, one).unwrap(), Value::Int(20));
}

#[test]
fn test_builder_feeds_string_ops() {
    let mut rt = Runtime::new();
    let sb = rt.sb_new().unwrap();
    for word in ["  alpha", ",", "beta  "] {
        let w = s(&mut rt, word);
        rt.sb_append(sb, w).unwrap();
    }
    let built = rt.sb_build(sb).unwrap();
    let trimmed = rt.str_trim(built).unwrap();
    assert_eq!(rt.text(trimmed), b"alpha,beta");
    let comma = s(&mut rt, ",");
    assert_eq!(rt.str_index_of(trimmed, comma), 5);
}

#[test]
#[serial]
fn test_host_assets_from_env() {
    let dir = tempfile::tempdir().unwrap();
    let substrate = dir.path().join("substrate.c");
    std::fs::write(&substrate, "int64_t x;").unwrap();

    // SAFETY: serialized with every other environment-mutating test.
    unsafe {
        std::env::set_var(SUBSTRATE_PATH_VAR, &substrate);
        std::env::set_var(PRELUDE_PATH_VAR, "");
    }
    let assets = HostAssets::from_env();
    assert_eq!(assets.substrate.as_deref(), Some(substrate.as_path()));
    assert_eq!(assets.prelude, None);

    let mut rt = Runtime::new();
    let source = rt.host_substrate_source(&assets).unwrap();
    let prelude = rt.host_prelude_source(&assets).unwrap();
    assert_eq!(rt.text(source), b"int64_t x;");
    assert_eq!(rt.text(prelude), b"");

    // SAFETY: as above.
    unsafe {
        std::env::remove_var(SUBSTRATE_PATH_VAR);
        std::env::remove_var(PRELUDE_PATH_VAR);
    }
}

#[test]
#[serial]
fn test_host_assets_unset() {
    // SAFETY: serialized with every other environment-mutating test.
    unsafe {
        std::env::remove_var(SUBSTRATE_PATH_VAR);
        std::env::remove_var(PRELUDE_PATH_VAR);
    }
    assert_eq!(HostAssets::from_env(), HostAssets::default());
}
