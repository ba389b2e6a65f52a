use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use raya_verifier_types::{ClassTable, ClosureMode, LanguageKind, TypeResolver, TypeSystem, VerifierEngine};

/// A chain `T0 <= T1 <= ... <= Tn` with covariant and contravariant
/// wrappers around every link.
fn build_chain(mode: ClosureMode, length: usize) -> TypeSystem {
    let mut types = TypeSystem::new(mode);
    let list = types.parametric("List");
    let sink = types.parametric("Sink");

    let nodes: Vec<_> = (0..length).map(|i| types.nullary(&format!("T{}", i))).collect();
    for &node in &nodes {
        let wrapped = list.apply(&mut types, &[node.covariant()]);
        sink.apply(&mut types, &[wrapped.contravariant()]);
    }
    for pair in nodes.windows(2) {
        types.relate(pair[0], pair[1]);
    }

    match mode {
        ClosureMode::Eager => {}
        ClosureMode::Deferred => {
            types.close_accumulated();
        }
        ClosureMode::Manual => {
            types.close_all();
        }
    }
    types
}

fn bench_closure_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("closure");

    for length in [16usize, 64] {
        for mode in [ClosureMode::Eager, ClosureMode::Deferred, ClosureMode::Manual] {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", mode), length),
                &length,
                |b, &length| {
                    b.iter(|| build_chain(black_box(mode), black_box(length)).edge_count());
                },
            );
        }
    }

    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let types = build_chain(ClosureMode::Eager, 64);
    let all: Vec<_> = types.handles().collect();

    c.bench_function("is_subtype_all_pairs", |b| {
        b.iter(|| {
            let mut count = 0usize;
            for &lhs in &all {
                for &rhs in &all {
                    if types.is_subtype(black_box(lhs), black_box(rhs)) {
                        count += 1;
                    }
                }
            }
            count
        });
    });

    c.bench_function("join_chain_ends", |b| {
        let first = all[2];
        let last = all[all.len() - 1];
        b.iter(|| types.join(black_box(first), black_box(last)).len());
    });
}

fn bench_engine_setup(c: &mut Criterion) {
    c.bench_function("engine_with_classes", |b| {
        let mut table = ClassTable::new();
        let mut parent = table.add_class("Object", &[]);
        for i in 0..100 {
            parent = table.add_class(&format!("C{}", i), &[parent]);
        }

        b.iter(|| {
            let mut engine = VerifierEngine::new(LanguageKind::Raya, 0, ClosureMode::Eager);
            let mut resolver = TypeResolver::new(&mut engine, &table);
            resolver.type_of_class(black_box(parent));
            engine.types().edge_count()
        });
    });
}

criterion_group!(benches, bench_closure_modes, bench_queries, bench_engine_setup);
criterion_main!(benches);
