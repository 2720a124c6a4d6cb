//! Basic benchmarks for the `pooled_text` crate.
//!
//! The allocation report printed at the end shows that building into a warm pool allocates
//! only for the final snapshot.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::time::Instant;

use alloc_tracker::Allocator;
use criterion::{Criterion, criterion_group, criterion_main};
use pooled_text::escape::{escape_json_into, escape_sql_into};
use pooled_text::{ByteBuffer, JsonBuffer, SqlStatement, TextPool};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

#[global_allocator]
static ALLOCATOR: Allocator<std::alloc::System> = Allocator::system();

const FIELDS: [&str; 4] = ["id", "name", "email", "created_at"];
const TEXT_PLAIN: &str = "a perfectly ordinary value without anything to escape";
const TEXT_ESCAPED: &str = "it's a \"quoted\"\nvalue with a \\ and a <tag>";

fn entrypoint(c: &mut Criterion) {
    let allocs = alloc_tracker::Session::new();

    let mut group = c.benchmark_group("pt_basic");

    let allocs_op = allocs.operation("acquire_release_warm");
    group.bench_function("acquire_release_warm", |b| {
        b.iter_custom(|iters| {
            let pool = TextPool::new();
            drop(pool.acquire());

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                drop(black_box(pool.acquire()));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("select_build_release");
    group.bench_function("select_build_release", |b| {
        b.iter_custom(|iters| {
            let pool = TextPool::new();
            SqlStatement::new(&pool)
                .append("SELECT")
                .append_field_list("u", FIELDS);

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for i in 0..iters {
                let mut statement = SqlStatement::new(&pool);
                statement
                    .append("SELECT")
                    .append_field_list("u", FIELDS)
                    .append("FROM users u WHERE u.id =")
                    .append(black_box(i));
                black_box(statement.as_text());
                statement.release();
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("select_snapshot");
    group.bench_function("select_snapshot", |b| {
        b.iter_custom(|iters| {
            let pool = TextPool::new();
            drop(pool.acquire());

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for i in 0..iters {
                let mut statement = SqlStatement::new(&pool);
                statement
                    .append("SELECT * FROM users WHERE id IN")
                    .append_raw("(")
                    .append_int_list(&[black_box(i), 2, 3])
                    .append_raw(")");
                drop(black_box(statement.snapshot_text()));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("json_document_release");
    group.bench_function("json_document_release", |b| {
        b.iter_custom(|iters| {
            let pool = TextPool::new();
            drop(pool.acquire());

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for i in 0..iters {
                let mut json = JsonBuffer::new(&pool);
                json.member_int("{", "id", black_box(i))
                    .member_str(",", "text", black_box(TEXT_ESCAPED))
                    .member_f64(",", "score", 1.25)
                    .push_str("}");
                black_box(json.as_bytes());
                json.release();
            }

            start.elapsed()
        });
    });

    group.finish();

    let mut group = c.benchmark_group("pt_escape");

    for (name, text) in [("plain", TEXT_PLAIN), ("escaped", TEXT_ESCAPED)] {
        let allocs_op = allocs.operation(&format!("sql_{name}"));
        group.bench_function(format!("sql_{name}"), |b| {
            b.iter_custom(|iters| {
                let mut buffer = ByteBuffer::with_capacity(256);

                let _span = allocs_op.measure_thread().iterations(iters);

                let start = Instant::now();

                for _ in 0..iters {
                    buffer.reset();
                    escape_sql_into(&mut buffer, black_box(text));
                }

                start.elapsed()
            });
        });

        let allocs_op = allocs.operation(&format!("json_{name}"));
        group.bench_function(format!("json_{name}"), |b| {
            b.iter_custom(|iters| {
                let mut buffer = ByteBuffer::with_capacity(256);

                let _span = allocs_op.measure_thread().iterations(iters);

                let start = Instant::now();

                for _ in 0..iters {
                    buffer.reset();
                    escape_json_into(&mut buffer, black_box(text));
                }

                start.elapsed()
            });
        });
    }

    group.finish();

    allocs.print_to_stdout();
}
