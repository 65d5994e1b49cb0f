use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use piecesql::{Connection, LiteralConnection, Query};
use std::sync::Arc;

/// `select c0, c1, ... from t where c0 = ? and c1 = ? ...` with `n` columns.
fn build_select(conn: &Arc<dyn Connection>, n: usize) -> Query {
    let columns: Vec<String> = (0..n).map(|i| format!("c{i}")).collect();
    let mut q = Query::new(Arc::clone(conn));
    q.select(columns.iter()).from("t");
    for (i, column) in columns.iter().enumerate() {
        q.where_(column, i as i64);
    }
    q
}

fn bench_to_sql(c: &mut Criterion) {
    let conn = LiteralConnection::postgres().into_shared();
    let mut group = c.benchmark_group("render/to_sql");

    for n in [1, 5, 10, 50, 100] {
        let q = build_select(&conn, n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.to_sql()));
        });
    }

    group.finish();
}

fn bench_build_and_render(c: &mut Criterion) {
    let conn = LiteralConnection::postgres().into_shared();
    let mut group = c.benchmark_group("render/build_and_render");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(build_select(&conn, n).to_sql()));
        });
    }

    group.finish();
}

fn bench_where_in(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/where_in");

    for prepared in [true, false] {
        let conn = if prepared {
            LiteralConnection::mysql().into_shared()
        } else {
            LiteralConnection::mysql().unprepared().into_shared()
        };
        let values: Vec<i64> = (0..500).collect();
        let label = if prepared { "prepared" } else { "inline" };
        group.bench_with_input(BenchmarkId::from_parameter(label), &values, |b, values| {
            b.iter(|| {
                let mut q = Query::new(Arc::clone(&conn));
                q.select_all().from("t").where_in("id", values.iter().copied());
                black_box(q.to_sql());
            });
        });
    }

    group.finish();
}

fn bench_positional(c: &mut Criterion) {
    let conn = LiteralConnection::postgres().into_shared();
    let mut group = c.benchmark_group("render/postgres_positional");

    for n in [10, 100] {
        let statement = build_select(&conn, n).build().expect("statement builds");
        group.bench_with_input(BenchmarkId::from_parameter(n), &statement, |b, s| {
            b.iter(|| black_box(s.postgres_positional()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_to_sql,
    bench_build_and_render,
    bench_where_in,
    bench_positional
);
criterion_main!(benches);
