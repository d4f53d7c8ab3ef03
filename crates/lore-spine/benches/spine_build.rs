//! Benchmarks for spine construction and linearization.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use lore_spine::{SpineIndex, build_store, linearize};
use lore_storage::{MockStorage, PageRow, SectionRow, Storage, UnitRow};

const UNIT: i64 = 1;

/// `sections` top-level sections with `pages` pages each.
fn wide_rows(sections: i64, pages: i64) -> (UnitRow, Vec<SectionRow>, Vec<PageRow>) {
    let unit = UnitRow {
        id: UNIT,
        ..UnitRow::default()
    };
    let mut section_rows = Vec::new();
    let mut page_rows = Vec::new();
    let mut next_id = 2;
    for s in 0..sections {
        let section_id = next_id;
        next_id += 1;
        section_rows.push(SectionRow {
            id: section_id,
            project: UNIT,
            priority: s % 7,
            ..SectionRow::default()
        });
        for p in 0..pages {
            page_rows.push(PageRow {
                id: next_id,
                project: UNIT,
                section: section_id,
                priority: (p * 31) % 11,
                tags: format!("tag{}, common", p % 5),
                ..PageRow::default()
            });
            next_id += 1;
        }
    }
    (unit, section_rows, page_rows)
}

/// A chain of `depth` nested sections with one page at every level.
fn deep_rows(depth: i64) -> (UnitRow, Vec<SectionRow>, Vec<PageRow>) {
    let unit = UnitRow {
        id: UNIT,
        ..UnitRow::default()
    };
    let sections = (0..depth)
        .map(|d| SectionRow {
            id: 2 + d,
            project: UNIT,
            root: if d == 0 { 0 } else { 1 + d },
            ..SectionRow::default()
        })
        .collect();
    let pages = (0..depth)
        .map(|d| PageRow {
            id: 10_000 + d,
            project: UNIT,
            section: 2 + d,
            ..PageRow::default()
        })
        .collect();
    (unit, sections, pages)
}

fn bench_linearize_wide(c: &mut Criterion) {
    let mut group = c.benchmark_group("linearize_wide");

    for (sections, pages) in [(10, 10), (50, 40), (200, 50)] {
        let (unit, section_rows, page_rows) = wide_rows(sections, pages);
        let count = 1 + section_rows.len() + page_rows.len();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(
            BenchmarkId::new("nodes", count),
            &(unit, section_rows, page_rows),
            |b, (unit, sections, pages)| {
                b.iter(|| {
                    let mut store = build_store(unit, sections, pages);
                    black_box(linearize(&mut store, UNIT))
                });
            },
        );
    }

    group.finish();
}

fn bench_linearize_deep(c: &mut Criterion) {
    let mut group = c.benchmark_group("linearize_deep");

    for depth in [8, 64, 256] {
        let (unit, sections, pages) = deep_rows(depth);

        group.bench_with_input(
            BenchmarkId::new("depth", depth),
            &(unit, sections, pages),
            |b, (unit, sections, pages)| {
                b.iter(|| {
                    let mut store = build_store(unit, sections, pages);
                    black_box(linearize(&mut store, UNIT))
                });
            },
        );
    }

    group.finish();
}

fn bench_create_and_decode(c: &mut Criterion) {
    let (unit, sections, pages) = wide_rows(50, 40);
    let mut storage = MockStorage::new().with_unit(unit);
    for row in sections {
        storage = storage.with_section(row);
    }
    for row in pages {
        storage = storage.with_page(row);
    }

    c.bench_function("create_wide_50x40", |b| {
        b.iter(|| {
            let tx = storage.begin().unwrap();
            black_box(SpineIndex::create(&*tx, UNIT).unwrap())
        });
    });

    let tx = storage.begin().unwrap();
    let encoded = SpineIndex::create(&*tx, UNIT).unwrap().encode().unwrap();

    c.bench_function("decode_wide_50x40", |b| {
        b.iter(|| black_box(SpineIndex::from_encoded(&encoded)));
    });
}

criterion_group!(
    benches,
    bench_linearize_wide,
    bench_linearize_deep,
    bench_create_and_decode
);
criterion_main!(benches);
