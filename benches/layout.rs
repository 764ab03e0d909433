use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use kindred::config::LayoutConfig;
use kindred::graph::{AttachKind, FamilyGraph, Sex};
use kindred::layout::{compute_layout, compute_layout_filtered, FilterOptions, KinDepth};
use kindred::query::relationship_between;
use std::hint::black_box;

/// Build a balanced synthetic family: every couple in each generation has
/// `children_per_couple` children, who each marry before having their own.
fn synthetic_family(generations: usize, children_per_couple: usize) -> FamilyGraph {
    let mut g = FamilyGraph::new("Ahn", "Ahnin");
    let mut parents = vec![g.root()];
    for level in 0..generations {
        let mut next = Vec::new();
        for (pi, &parent) in parents.iter().enumerate() {
            for ci in 0..children_per_couple {
                let sex = if ci % 2 == 0 { Sex::Male } else { Sex::Female };
                let name = format!("g{level}p{pi}c{ci}");
                let child = g
                    .add_member(parent, &name, sex, AttachKind::Child { adopted: false })
                    .expect("synthetic child");
                let spouse_sex = match sex {
                    Sex::Male => Sex::Female,
                    Sex::Female => Sex::Male,
                };
                g.add_member(child, &format!("{name}s"), spouse_sex, AttachKind::Spouse)
                    .expect("synthetic spouse");
                next.push(child);
            }
        }
        parents = next;
    }
    g
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let config = LayoutConfig::default();
    for (gens, kids) in [(2usize, 2usize), (3, 2), (3, 3), (4, 2)] {
        let graph = synthetic_family(gens, kids);
        let name = format!("gens{}_kids{}_n{}", gens, kids, graph.len());
        group.bench_with_input(BenchmarkId::from_parameter(name), &graph, |b, graph| {
            b.iter(|| {
                let layout = compute_layout(black_box(graph), &config);
                black_box(layout.nodes.len());
            });
        });
    }
    group.finish();
}

fn bench_filtered_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_filtered");
    let config = LayoutConfig::default();
    let graph = synthetic_family(4, 2);
    // Focus somewhere in the middle of the tree.
    let focus = "p0010".to_string();
    for (label, depth) in [
        ("direct", KinDepth::DirectLine),
        ("siblings", KinDepth::Siblings),
        ("cousins", KinDepth::Cousins),
        ("second_cousins", KinDepth::SecondCousins),
    ] {
        let opts = FilterOptions {
            kin_depth: depth,
            include_spouses: true,
        };
        group.bench_with_input(BenchmarkId::from_parameter(label), &graph, |b, graph| {
            b.iter(|| {
                let layout =
                    compute_layout_filtered(black_box(graph), Some(&focus), &opts, &config);
                black_box(layout.nodes.len());
            });
        });
    }
    group.finish();
}

fn bench_relationship(c: &mut Criterion) {
    let mut group = c.benchmark_group("relationship");
    for (gens, kids) in [(3usize, 2usize), (4, 2)] {
        let graph = synthetic_family(gens, kids);
        let root = graph.root();
        // Last arena slot is the deepest spouse; a worst-case lookup.
        let deepest = graph
            .ids()
            .last()
            .expect("synthetic family is never empty");
        let name = format!("gens{}_n{}", gens, graph.len());
        group.bench_with_input(BenchmarkId::from_parameter(name), &graph, |b, graph| {
            b.iter(|| {
                let rel = relationship_between(black_box(graph), root, deepest)
                    .expect("both endpoints reachable");
                black_box(rel);
            });
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_layout, bench_filtered_layout, bench_relationship
);
criterion_main!(benches);
