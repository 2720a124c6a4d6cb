//! Basic usage of the `pooled_text` crate:
//!
//! * Creating a pool.
//! * Building a SQL statement and a JSON document.
//! * Getting the text out, which returns the buffer to the pool.

use pooled_text::{JsonBuffer, SqlStatement, TextPool, UpsertStatement};

fn main() {
    let pool = TextPool::new();

    let user_ids = [3_u64, 5, 8];

    let mut query = SqlStatement::new(&pool);
    query
        .append("SELECT")
        .append_field_list("u", &["id", "name"])
        .append_field_list("p", &["title"])
        .append("FROM users u JOIN posts p ON p.user_id = u.id WHERE u.id IN")
        .append_raw("(")
        .append_int_list(&user_ids)
        .append(")")
        .append("AND p.title =")
        .append_escaped("What's new");

    // The snapshot is an owned copy. The buffer is already back in the pool at this point.
    let query = query.snapshot_text();
    println!("{query}");
    println!("Idle buffers after first statement: {}", pool.idle_len());

    // The next builder reuses the same storage but starts empty.
    let mut json = JsonBuffer::new(&pool);
    json.member_int("{", "count", user_ids.len())
        .member_str(",", "query", &query)
        .push_str("}");
    println!("{}", json.snapshot_text());

    let mut upsert = UpsertStatement::insert_into(&pool, "user_stats");
    upsert
        .columns(&["user_id", "visits"])
        .on_duplicate_key_update(&["visits=visits+VALUES(visits)"]);

    for id in user_ids {
        upsert.record(&[&id, &1]);
    }

    println!("{}", upsert.query());
    println!("Idle buffers at the end: {}", pool.idle_len());
}
