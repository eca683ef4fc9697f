// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for category merging, bundle export and logo
// fingerprinting in the rdpconnect-store crate.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use serde_json::{Value, json};

use rdpconnect_core::config::{Category, Configuration};
use rdpconnect_store::bundle::{EmbeddedAsset, export};
use rdpconnect_store::integrity::fingerprint;
use rdpconnect_store::merge;

/// Merge a realistic Folders file with a couple of dozen entries.
fn bench_merge(c: &mut Criterion) {
    let folders: Vec<Value> = (0..24)
        .map(|i| json!({"path": format!("/srv/share/{i}"), "enabled": i % 3 != 0}))
        .collect();
    let file = json!({"Redirect": true, "Folders": folders, "Unknown": 1})
        .as_object()
        .cloned()
        .unwrap_or_default();
    let base = Configuration::defaults();

    c.bench_function("merge_folders (24 entries)", |b| {
        b.iter(|| merge(black_box(&base), Category::Folders, black_box(&file)))
    });
}

/// Export of the default tree (no logo on disk).
fn bench_export(c: &mut Criterion) {
    let config = Configuration::defaults();
    c.bench_function("export_defaults", |b| {
        b.iter(|| export(black_box(&config)).map(|doc| black_box(doc)))
    });
}

/// Base64 embedding and SHA-256 of logo-sized payloads.
fn bench_logo(c: &mut Criterion) {
    let sizes: &[(&str, usize)] = &[("16 KiB", 16 * 1024), ("256 KiB", 256 * 1024)];

    let mut group = c.benchmark_group("logo");
    for &(label, size) in sizes {
        let data = vec![0x89u8; size];
        group.bench_function(format!("embed {label}"), |b| {
            b.iter(|| EmbeddedAsset::from_bytes("logo.png", black_box(&data)))
        });
        group.bench_function(format!("fingerprint {label}"), |b| {
            b.iter(|| fingerprint(black_box(&data)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_merge, bench_export, bench_logo);
criterion_main!(benches);
