//! Criterion benchmarks for sql_data_mapper

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sql_data_mapper::prelude::*;

// ============================================================================
// Template Benchmarks
// ============================================================================

fn bench_query_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_creation");
    group.throughput(Throughput::Elements(1));

    group.bench_function("plain", |b| {
        b.iter(|| SqlQuery::new(black_box("select * from users where id = {id}")));
    });

    group.bench_function("with_comments", |b| {
        b.iter(|| {
            SqlQuery::new(black_box(
                "select * from users -- all columns\nwhere /* primary key */ id = {id}",
            ))
        });
    });

    group.bench_function("add", |b| {
        let base = SqlQuery::new("select * from users where name like {term}");
        b.iter(|| black_box(&base).add(black_box("order by name")));
    });

    group.finish();
}

fn bench_substitution(c: &mut Criterion) {
    let mut group = c.benchmark_group("substitution");

    for count in [1usize, 10, 100].iter() {
        let text = (0..*count)
            .map(|i| format!("c{} = {{p{}}}", i, i))
            .collect::<Vec<_>>()
            .join(" and ");
        let params: SqlParameters = (0..*count).map(|i| (format!("p{}", i), i as i64)).collect();

        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::new("bag", count), &text, |b, text| {
            b.iter(|| {
                let mut query = SqlQuery::new(text);
                query.set_parameters(black_box(&params)).unwrap();
                black_box(query)
            });
        });

        group.bench_with_input(BenchmarkId::new("unresolved", count), &text, |b, text| {
            let query = SqlQuery::new(text);
            b.iter(|| black_box(query.unresolved_parameters()));
        });
    }

    group.finish();
}

// ============================================================================
// Formatter Benchmarks
// ============================================================================

fn bench_formatter(c: &mut Criterion) {
    let mut group = c.benchmark_group("formatter");

    let values = vec![
        ("int", SqlValue::from(42)),
        ("string", SqlValue::from("hello world")),
        ("bytes", SqlValue::from(vec![0xDEu8; 64])),
        ("list", SqlValue::from((0..100).collect::<Vec<i32>>())),
    ];

    for (name, value) in values.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(name), value, |b, value| {
            b.iter(|| DEFAULT_FORMATTER.format(black_box(value)));
        });
    }

    group.finish();
}

// ============================================================================
// Mapping Benchmarks
// ============================================================================

#[derive(Default)]
struct User {
    id: i64,
    name: String,
    email: Option<String>,
    score: f64,
}

impl SqlEntity for User {
    fn bind(b: &mut BindingBuilder<Self>) {
        b.field("id", |u| &u.id, |u| &mut u.id).not_null();
        b.field("name", |u| &u.name, |u| &mut u.name).alias("user_name");
        b.field("email", |u| &u.email, |u| &mut u.email);
        b.field("score", |u| &u.score, |u| &mut u.score);
    }
}

fn bench_row_mapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("row_mapping");

    let row = SqlRow::new()
        .with("ID", 1i64)
        .with("USER_NAME", "alice")
        .with("EMAIL", SqlValue::Null)
        .with("SCORE", 9.5);

    group.bench_function("map_row", |b| {
        b.iter(|| map_row::<User>(black_box(&row)).unwrap());
    });

    for size in [10usize, 100, 1000].iter() {
        let rows: Vec<SqlRow> = (0..*size).map(|_| row.clone()).collect();
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("map_rows", size), &rows, |b, rows| {
            b.iter(|| map_rows::<User>(black_box(rows)).unwrap());
        });
    }

    group.finish();
}

#[cfg(feature = "sqlite")]
fn bench_sqlite_round_trip(c: &mut Criterion) {
    use std::sync::Arc;

    let db = Arc::new(SqliteDatabase::new());
    tokio_test::block_on(async {
        db.connect(":memory:").await.unwrap();
        db.execute("CREATE TABLE users (id INTEGER PRIMARY KEY, user_name TEXT, email TEXT, score REAL)")
            .await
            .unwrap();
        for i in 0..100 {
            db.execute(&format!(
                "INSERT INTO users (user_name, score) VALUES ('user{}', {})",
                i, i
            ))
            .await
            .unwrap();
        }
    });
    let ctx = SqlContext::new(db);

    c.bench_function("sqlite_query_for_list", |b| {
        b.iter(|| {
            tokio_test::block_on(async {
                let users: Vec<User> = ctx
                    .query_for_list(&SqlQuery::new("select * from users"))
                    .await
                    .unwrap();
                black_box(users)
            })
        });
    });
}

#[cfg(feature = "sqlite")]
criterion_group!(
    benches,
    bench_query_creation,
    bench_substitution,
    bench_formatter,
    bench_row_mapping,
    bench_sqlite_round_trip
);

#[cfg(not(feature = "sqlite"))]
criterion_group!(
    benches,
    bench_query_creation,
    bench_substitution,
    bench_formatter,
    bench_row_mapping
);

criterion_main!(benches);
