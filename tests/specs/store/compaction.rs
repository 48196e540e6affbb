// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compaction behaviors observable through the public API

use crate::prelude::*;
use serde_json::json;
use tempfile::TempDir;

#[test]
fn compacting_twice_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, 2, 100);
    for i in 0..10 {
        store.set("counter", &i).unwrap();
        store.set(&format!("k{i}"), &i).unwrap();
    }
    store.remove("k3").unwrap();
    store.remove("k7").unwrap();

    store.compact().unwrap();
    let first_pass = std::fs::read_to_string(log_path(&dir)).unwrap();
    let keys = store.keys();
    let values: Vec<_> = keys.iter().map(|k| store.get(k)).collect();

    store.compact().unwrap();
    let second_pass = std::fs::read_to_string(log_path(&dir)).unwrap();

    assert_eq!(first_pass, second_pass);
    assert_eq!(store.keys(), keys);
    let values_after: Vec<_> = keys.iter().map(|k| store.get(k)).collect();
    assert_eq!(values_after, values);
}

#[test]
fn compaction_preserves_every_live_value() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, 4, 100);
    for i in 0..20 {
        store.set(&format!("k{}", i % 7), &json!({"i": i})).unwrap();
    }
    store.remove("k0").unwrap();
    let before: Vec<_> = store.keys().iter().map(|k| store.get(k)).collect();

    let stats = store.compact().unwrap();

    let after: Vec<_> = store.keys().iter().map(|k| store.get(k)).collect();
    assert_eq!(before, after);
    assert_eq!(stats.records_after, store.len());
    assert_eq!(log_records(&log_path(&dir)).len(), store.len());
}

#[test]
fn failed_compaction_never_fails_the_triggering_write() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, 1, 1);

    // Block the temp path so every compaction attempt fails.
    let tmp = dir.path().join("minnow.jsonl.tmp");
    std::fs::create_dir(&tmp).unwrap();

    // Each set flushes and triggers a compaction that cannot run; the
    // writes themselves must still succeed and stay durable.
    store.set("a", &1).unwrap();
    store.set("a", &2).unwrap();
    assert_eq!(log_records(&log_path(&dir)).len(), 2);
    assert_eq!(store.get("a"), Some(json!(2)));

    // Once the blockage clears, the next cycle reduces the log.
    std::fs::remove_dir(&tmp).unwrap();
    store.set("a", &3).unwrap();
    assert_eq!(log_records(&log_path(&dir)).len(), 1);
    assert_eq!(store.get("a"), Some(json!(3)));
}

#[test]
fn compaction_state_survives_reopen() {
    let dir = TempDir::new().unwrap();

    {
        let store = store_in(&dir, 2, 2);
        for i in 0..12 {
            store.set(&format!("k{}", i % 3), &i).unwrap();
        }
        store.flush().unwrap();
    }

    let store = store_in(&dir, 2, 2);
    assert_eq!(store.keys(), vec!["k0", "k1", "k2"]);
    assert_eq!(store.get("k0"), Some(json!(9)));
    assert_eq!(store.get("k1"), Some(json!(10)));
    assert_eq!(store.get("k2"), Some(json!(11)));
}
