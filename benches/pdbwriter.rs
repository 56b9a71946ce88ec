//! Benchmarks for PDB generation.
//!
//! - Sequence point blob encoding and decoding
//! - Full generation of a synthetic module, sequential and parallel
//! - Reading a generated container back

extern crate dotpdb;

use std::{collections::BTreeMap, hint::black_box};

use criterion::{criterion_group, criterion_main, Criterion};
use dotpdb::prelude::*;

struct SyntheticDecompiler {
    files: BTreeMap<Token, DecompiledFile>,
}

impl Decompiler for SyntheticDecompiler {
    fn decompile_types(&self, _module: &ModuleInfo, types: &[Token]) -> Result<DecompiledFile> {
        types
            .first()
            .and_then(|token| self.files.get(token))
            .cloned()
            .ok_or_else(|| Error::Decompiler("unknown type".to_string()))
    }
}

/// A method body's worth of points: one statement per line, a hidden point every fourth
fn method_points(statements: u32) -> Vec<SequencePoint> {
    (0..statements)
        .map(|i| {
            if i % 4 == 3 {
                SequencePoint::hidden(i * 6)
            } else {
                SequencePoint::new(i * 6, 10 + i, 9, 10 + i, 40)
            }
        })
        .collect()
}

/// `types` top-level types with `methods` methods each
fn synthetic(types: u32, methods: u32) -> (ModuleInfo, SyntheticDecompiler) {
    let mut builder = ModuleInfoBuilder::new("Synthetic.dll");
    let mut files = BTreeMap::new();

    for t in 0..types {
        let ty = builder.add_type(&format!("Synthetic.Area{}", t % 8), &format!("Type{t}"));
        let mut tree = Vec::new();
        let mut functions = Vec::new();
        let mut points = BTreeMap::new();
        for m in 0..methods {
            let method = builder.add_method(ty, &format!("Method{m}"), Some((200, 0)));
            tree.push(SyntaxNode::method(m));
            functions.push(FunctionInfo::new(m, method));
            points.insert(m, method_points(30));
        }

        files.insert(
            ty,
            DecompiledFile {
                source: "    statement();\n".repeat(40 * methods as usize),
                syntax_tree: vec![SyntaxNode::namespace(
                    &format!("Synthetic.Area{}", t % 8),
                    std::iter::once(SyntaxNode::using("System"))
                        .chain(tree)
                        .collect(),
                )],
                functions,
                sequence_points: SequencePointTable::Points(points),
            },
        );
    }

    (builder.build(), SyntheticDecompiler { files })
}

fn bench_encode_sequence_points(c: &mut Criterion) {
    let points = method_points(64);

    c.bench_function("encode_sequence_points_64", |b| {
        b.iter(|| {
            let blob = encode_sequence_points(0, black_box(&points)).unwrap();
            black_box(blob)
        });
    });
}

fn bench_parse_sequence_points(c: &mut Criterion) {
    let blob = encode_sequence_points(0, &method_points(64)).unwrap().unwrap();

    c.bench_function("parse_sequence_points_64", |b| {
        b.iter(|| {
            let points = parse_sequence_points(black_box(&blob)).unwrap();
            black_box(points)
        });
    });
}

fn bench_generate(c: &mut Criterion) {
    let (module, decompiler) = synthetic(200, 10);

    let mut group = c.benchmark_group("generate_200x10");
    group.sample_size(20);
    group.bench_function("sequential", |b| {
        b.iter(|| {
            let pdb = PdbGenerator::new(&module, &decompiler)
                .with_options(GeneratorOptions::default().with_parallel(false))
                .generate()
                .unwrap();
            black_box(pdb)
        });
    });
    group.bench_function("parallel", |b| {
        b.iter(|| {
            let pdb = PdbGenerator::new(&module, &decompiler).generate().unwrap();
            black_box(pdb)
        });
    });
    group.finish();
}

fn bench_read(c: &mut Criterion) {
    let (module, decompiler) = synthetic(200, 10);
    let pdb = PdbGenerator::new(&module, &decompiler).generate().unwrap();

    c.bench_function("read_200x10", |b| {
        b.iter(|| {
            let parsed = PortablePdb::parse(black_box(&pdb.data)).unwrap();
            black_box(parsed)
        });
    });
}

criterion_group!(
    benches,
    bench_encode_sequence_points,
    bench_parse_sequence_points,
    bench_generate,
    bench_read
);
criterion_main!(benches);
