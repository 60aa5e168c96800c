//! Benchmarks for the QASM3 parsing pipeline
//!
//! Run with: cargo bench -p qasmparser

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use qasmparser::diagnostics::Diagnostics;
use qasmparser::{QasmParser, emit, tokenize};

/// Build a layered circuit over `num_qubits` qubits.
fn circuit_source(num_qubits: usize, layers: usize) -> String {
    let mut source = format!("OPENQASM 3.0;\ninclude \"stdgates.inc\";\nqubit[{num_qubits}] q;\n");
    source.push_str(&format!("bit[{num_qubits}] c;\n"));
    for layer in 0..layers {
        source.push_str(&format!("// layer {layer}\n"));
        for q in 0..num_qubits {
            source.push_str(&format!("rz(pi / {}) q[{q}];\n", layer + 2));
        }
        for q in 1..num_qubits {
            source.push_str(&format!("cx q[{}], q[{q}];\n", q - 1));
        }
    }
    source.push_str("c = measure q;\n");
    source
}

/// Benchmark tokenization alone
fn bench_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");

    for layers in &[10, 100, 1000] {
        let source = circuit_source(10, *layers);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::new("layers", layers), &source, |b, s| {
            b.iter(|| {
                let mut diagnostics = Diagnostics::unbounded();
                tokenize(black_box(s), &mut diagnostics).tokens.len()
            });
        });
    }

    group.finish();
}

/// Benchmark the full pipeline against validation only
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    let parser = QasmParser::new();

    for layers in &[10, 100, 1000] {
        let source = circuit_source(10, *layers);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::new("full", layers), &source, |b, s| {
            b.iter(|| parser.parse_with_diagnostics(black_box(s)));
        });
        group.bench_with_input(BenchmarkId::new("validate", layers), &source, |b, s| {
            b.iter(|| parser.validate(black_box(s)));
        });
    }

    group.finish();
}

/// Benchmark recovery on input where every other statement is malformed
fn bench_recovery(c: &mut Criterion) {
    let source = "qubit 1;\nh q[0];\n".repeat(500);
    let parser = QasmParser::new();

    c.bench_function("recovery", |b| {
        b.iter(|| parser.parse_with_diagnostics(black_box(&source)));
    });
}

/// Benchmark canonical emission
fn bench_emit(c: &mut Criterion) {
    let program = QasmParser::new()
        .parse_str(&circuit_source(10, 100))
        .unwrap_or_default();

    c.bench_function("emit", |b| {
        b.iter(|| emit(black_box(&program)));
    });
}

criterion_group!(benches, bench_tokenize, bench_parse, bench_recovery, bench_emit);
criterion_main!(benches);
