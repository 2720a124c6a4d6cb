use std::fmt::Display;

use crate::{SqlStatement, TextPool};

/// Builds a multi-row MySQL `INSERT ... ON DUPLICATE KEY UPDATE` statement.
///
/// Every record value is rendered as an escaped, single-quoted string literal and MySQL converts
/// it to the column type.
///
/// # Example
///
/// ```rust
/// use pooled_text::{TextPool, UpsertStatement};
///
/// let pool = TextPool::new();
///
/// let mut upsert = UpsertStatement::insert_into(&pool, "users");
/// upsert
///     .columns(&["id", "name"])
///     .on_duplicate_key_update(&["name=VALUES(name)"]);
/// upsert.record(&[&1, &"Ann"]);
/// upsert.record(&[&2, &"O'Brien"]);
///
/// assert_eq!(
///     upsert.query(),
///     r"INSERT INTO users (`id`,`name`) VALUES ('1','Ann'),('2','O\'Brien') ON DUPLICATE KEY UPDATE name=VALUES(name)"
/// );
/// ```
#[derive(Debug)]
pub struct UpsertStatement {
    statement: SqlStatement,

    /// Set once the column list has been written.
    column_count: Option<usize>,

    record_count: usize,

    /// Comma-separated assignments for the update clause, empty if there is none.
    assignments: String,
}

impl UpsertStatement {
    /// Starts an upsert into `table`, using a buffer acquired from `pool`.
    #[must_use]
    pub fn insert_into(pool: &TextPool, table: &str) -> Self {
        let mut statement = SqlStatement::new(pool);
        statement.append("INSERT INTO").append(table);

        Self {
            statement,
            column_count: None,
            record_count: 0,
            assignments: String::new(),
        }
    }

    /// Writes the column list. Every record must provide one value per column, in this order.
    ///
    /// # Panics
    ///
    /// Panics if `columns` is empty or if the columns have already been written.
    pub fn columns<I>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        assert!(
            self.column_count.is_none(),
            "upsert columns can only be written once"
        );

        let mut count: usize = 0;

        self.statement.append_raw("(");

        for column in columns {
            if count > 0 {
                self.statement.append_raw(",");
            }

            self.statement
                .append_raw("`")
                .append_raw(column.as_ref())
                .append_raw("`");

            count = count.saturating_add(1);
        }

        assert!(count > 0, "an upsert needs at least one column");

        self.statement.append_raw(") VALUES ");
        self.column_count = Some(count);
        self
    }

    /// Sets the assignments of the `ON DUPLICATE KEY UPDATE` clause, replacing any set before.
    ///
    /// The clause is written by [`query()`][Self::query], after the last record.
    pub fn on_duplicate_key_update<I>(&mut self, assignments: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.assignments.clear();

        for (index, assignment) in assignments.into_iter().enumerate() {
            if index > 0 {
                self.assignments.push(',');
            }

            self.assignments.push_str(assignment.as_ref());
        }

        self
    }

    /// Appends one row of values.
    ///
    /// # Panics
    ///
    /// Panics if the columns have not been written yet or if the number of values does not match
    /// the number of columns.
    pub fn record(&mut self, values: &[&dyn Display]) -> &mut Self {
        let Some(column_count) = self.column_count else {
            panic!("upsert records can only be added after the columns");
        };

        assert_eq!(
            values.len(),
            column_count,
            "upsert record has {} values but the statement has {column_count} columns",
            values.len()
        );

        if self.record_count > 0 {
            self.statement.append_raw(",");
        }

        self.statement.append_raw("(");

        for (index, value) in values.iter().enumerate() {
            if index > 0 {
                self.statement.append_raw(",");
            }

            self.statement.append_escaped_display(value);
        }

        self.statement.append_raw(")");
        self.record_count = self.record_count.saturating_add(1);
        self
    }

    /// Number of records added so far.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// The statement as built so far, without the update clause.
    #[must_use]
    pub fn as_text(&self) -> &str {
        self.statement.as_text()
    }

    /// Finishes the statement and releases its buffer.
    ///
    /// The update clause is only written if at least one record was added and assignments were
    /// set.
    #[must_use]
    pub fn query(mut self) -> String {
        if self.record_count > 0 && !self.assignments.is_empty() {
            self.statement
                .append_raw(" ON DUPLICATE KEY UPDATE ")
                .append_raw(self.assignments.as_str());
        }

        self.statement.snapshot_text()
    }

    /// Discards the statement and releases its buffer.
    pub fn release(self) {
        self.statement.release();
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(UpsertStatement: Send, Sync);

    #[test]
    fn single_record_without_update() {
        let pool = TextPool::new();

        let mut upsert = UpsertStatement::insert_into(&pool, "t");
        upsert.columns(&["a"]).record(&[&"x"]);

        assert_eq!(upsert.record_count(), 1);
        assert_eq!(upsert.query(), "INSERT INTO t (`a`) VALUES ('x')");
        assert_eq!(pool.leased_len(), 0);
    }

    #[test]
    fn values_are_escaped() {
        let pool = TextPool::new();

        let mut upsert = UpsertStatement::insert_into(&pool, "t");
        upsert
            .columns(vec![String::from("a"), String::from("b")])
            .record(&[&"a\\b", &-3.5]);

        assert_eq!(upsert.as_text(), r"INSERT INTO t (`a`,`b`) VALUES ('a\\b','-3.5')");
    }

    #[test]
    fn update_clause_follows_the_last_record() {
        let pool = TextPool::new();

        let mut upsert = UpsertStatement::insert_into(&pool, "t");
        upsert
            .columns(&["id", "v"])
            .on_duplicate_key_update(&["ignored=1"])
            .on_duplicate_key_update(&["v=VALUES(v)", "n=n+1"])
            .record(&[&1, &10])
            .record(&[&2, &20]);

        assert_eq!(
            upsert.query(),
            "INSERT INTO t (`id`,`v`) VALUES ('1','10'),('2','20') ON DUPLICATE KEY UPDATE v=VALUES(v),n=n+1"
        );
    }

    #[test]
    fn no_update_clause_without_records() {
        let pool = TextPool::new();

        let mut upsert = UpsertStatement::insert_into(&pool, "t");
        upsert.columns(&["id"]).on_duplicate_key_update(&["id=id"]);

        assert_eq!(upsert.query(), "INSERT INTO t (`id`) VALUES ");
    }

    #[test]
    fn dropping_releases() {
        let pool = TextPool::new();

        {
            let mut upsert = UpsertStatement::insert_into(&pool, "t");
            upsert.columns(&["id"]);
        }
        assert_eq!(pool.leased_len(), 0);

        let upsert = UpsertStatement::insert_into(&pool, "t");
        upsert.release();
        assert_eq!(pool.leased_len(), 0);
    }

    #[test]
    #[should_panic]
    fn record_before_columns_panics() {
        let pool = TextPool::new();

        let mut upsert = UpsertStatement::insert_into(&pool, "t");
        upsert.record(&[&1]);
    }

    #[test]
    #[should_panic]
    fn record_with_wrong_value_count_panics() {
        let pool = TextPool::new();

        let mut upsert = UpsertStatement::insert_into(&pool, "t");
        upsert.columns(&["a", "b"]).record(&[&1]);
    }

    #[test]
    #[should_panic]
    fn empty_columns_panic() {
        let pool = TextPool::new();

        let mut upsert = UpsertStatement::insert_into(&pool, "t");
        upsert.columns(Vec::<&str>::new());
    }

    #[test]
    #[should_panic]
    fn columns_twice_panics() {
        let pool = TextPool::new();

        let mut upsert = UpsertStatement::insert_into(&pool, "t");
        upsert.columns(&["a"]).columns(&["b"]);
    }
}
