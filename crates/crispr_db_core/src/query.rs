//! Parameterized statement composition.
//!
//! # Responsibility
//! - Combine a fixed base `SELECT` with an optional filter and ordering.
//! - Compose `INSERT ... RETURNING <id>` statements for adaptors.
//!
//! # Invariants
//! - Values only ever travel as bound parameters; SQL text holds column
//!   names chosen by adaptors plus `?` placeholders.
//! - A built statement has exactly one `?` per bound value.

use crate::error::{RepoError, RepoResult, StatementContext};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};

/// Conjunction of filter fragments with their bound values, in order.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<String>,
    values: Vec<Value>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `column = ?`
    pub fn and_eq(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.clauses.push(format!("{column} = ?"));
        self.values.push(value.into());
        self
    }

    /// `column IN (?, ?, ...)`, one placeholder per value.
    ///
    /// An empty list matches nothing.
    pub fn and_in<I, V>(mut self, column: &'static str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            self.clauses.push("1 = 0".to_string());
            return self;
        }
        self.clauses
            .push(format!("{column} IN ({})", in_placeholders(values.len())));
        self.values.extend(values);
        self
    }

    /// `column IS NULL`
    pub fn and_null(mut self, column: &'static str) -> Self {
        self.clauses.push(format!("{column} IS NULL"));
        self
    }

    /// Adds a hand-written fragment. Its placeholders must line up with `values`.
    pub fn and_raw(mut self, fragment: impl Into<String>, values: Vec<Value>) -> Self {
        self.clauses.push(fragment.into());
        self.values.extend(values);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn fragment(&self) -> Option<String> {
        if self.clauses.is_empty() {
            None
        } else {
            Some(self.clauses.join(" AND "))
        }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Returns `?, ?, ?` with `count` placeholders.
pub fn in_placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Base `SELECT` plus optional filter and ordering.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    base: &'static str,
    filter: Filter,
    order_by: Option<&'static str>,
}

impl SelectQuery {
    pub fn new(base: &'static str) -> Self {
        Self {
            base,
            filter: Filter::new(),
            order_by: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn order_by(mut self, order_by: &'static str) -> Self {
        self.order_by = Some(order_by);
        self
    }

    pub fn build(self) -> RepoResult<BoundStatement> {
        let mut sql = self.base.to_string();
        if let Some(fragment) = self.filter.fragment() {
            sql.push_str(" WHERE ");
            sql.push_str(&fragment);
        }
        if let Some(order_by) = self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }
        BoundStatement::new(sql, self.filter.values)
    }
}

/// SQL text with its bound values.
#[derive(Debug, Clone)]
pub struct BoundStatement {
    sql: String,
    values: Vec<Value>,
}

impl BoundStatement {
    /// Fails with `MalformedQuery` when placeholders and values disagree.
    pub fn new(sql: String, values: Vec<Value>) -> RepoResult<Self> {
        let placeholders = count_placeholders(&sql);
        if placeholders != values.len() {
            return Err(RepoError::MalformedQuery {
                placeholders,
                values: values.len(),
            });
        }
        Ok(Self { sql, values })
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Runs the statement and maps every row.
    pub(crate) fn query_map<T>(
        &self,
        conn: &Connection,
        mut map: impl FnMut(&Row<'_>) -> RepoResult<T>,
    ) -> RepoResult<Vec<T>> {
        let mut stmt = conn.prepare(&self.sql).in_statement(&self.sql)?;
        let mut rows = stmt
            .query(params_from_iter(self.values.iter()))
            .in_statement(&self.sql)?;
        let mut items = Vec::new();
        while let Some(row) = rows.next().in_statement(&self.sql)? {
            items.push(map(row)?);
        }
        Ok(items)
    }

    pub(crate) fn query_i64(&self, conn: &Connection) -> RepoResult<Option<i64>> {
        let mut values = self.query_map(conn, |row| Ok(row.get::<_, i64>(0)?))?;
        Ok(if values.is_empty() {
            None
        } else {
            Some(values.swap_remove(0))
        })
    }

    pub(crate) fn execute(&self, conn: &Connection) -> RepoResult<usize> {
        conn.execute(&self.sql, params_from_iter(self.values.iter()))
            .in_statement(&self.sql)
    }
}

/// `SELECT COUNT(*) FROM table WHERE filter`.
pub(crate) fn count_rows(
    conn: &Connection,
    table: &'static str,
    filter: Filter,
) -> RepoResult<i64> {
    let sql = match filter.fragment() {
        Some(fragment) => format!("SELECT COUNT(*) FROM {table} WHERE {fragment}"),
        None => format!("SELECT COUNT(*) FROM {table}"),
    };
    let statement = BoundStatement::new(sql, filter.values)?;
    Ok(statement.query_i64(conn)?.unwrap_or(0))
}

/// `SELECT id_column FROM table WHERE filter`, first match only.
pub(crate) fn select_id(
    conn: &Connection,
    table: &'static str,
    id_column: &'static str,
    filter: Filter,
) -> RepoResult<Option<i64>> {
    let fragment = filter.fragment().unwrap_or_else(|| "1 = 1".to_string());
    let sql = format!("SELECT {id_column} FROM {table} WHERE {fragment} LIMIT 1");
    BoundStatement::new(sql, filter.values)?.query_i64(conn)
}

/// `INSERT INTO table (...) VALUES (...) RETURNING id_column`.
///
/// The returned id belongs to the row this statement inserted into `table`.
#[derive(Debug, Clone)]
pub struct InsertStatement {
    table: &'static str,
    id_column: &'static str,
    columns: Vec<&'static str>,
    values: Vec<Value>,
}

impl InsertStatement {
    pub fn new(table: &'static str, id_column: &'static str) -> Self {
        Self {
            table,
            id_column,
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn value(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.columns.push(column);
        self.values.push(value.into());
        self
    }

    /// Binds an explicit id. `None` leaves id assignment to the database.
    pub fn id(self, id: Option<i64>) -> Self {
        match id {
            Some(id) => {
                let id_column = self.id_column;
                self.value(id_column, id)
            }
            None => self,
        }
    }

    pub fn sql(&self) -> String {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            self.table,
            self.columns.join(", "),
            in_placeholders(self.columns.len()),
            self.id_column
        )
    }

    pub(crate) fn execute_returning_id(self, conn: &Connection) -> RepoResult<i64> {
        let sql = self.sql();
        let statement = BoundStatement::new(sql, self.values)?;
        statement.query_i64(conn)?.ok_or_else(|| {
            RepoError::Integrity(format!("insert into {} returned no id", self.table))
        })
    }
}

/// Counts `?` placeholders outside single-quoted literals.
fn count_placeholders(sql: &str) -> usize {
    let mut in_literal = false;
    let mut count = 0;
    for c in sql.chars() {
        match c {
            '\'' => in_literal = !in_literal,
            '?' if !in_literal => count += 1,
            _ => {}
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::{count_placeholders, in_placeholders, Filter, InsertStatement, SelectQuery};
    use crate::error::RepoError;
    use rusqlite::types::Value;

    const BASE: &str = "SELECT p.primer_id AS primer_id FROM primer p";

    #[test]
    fn base_query_without_filter_has_no_where() {
        let statement = SelectQuery::new(BASE).build().unwrap();
        assert_eq!(statement.sql(), BASE);
        assert!(statement.values().is_empty());
    }

    #[test]
    fn filters_are_joined_in_order() {
        let statement = SelectQuery::new(BASE)
            .filter(
                Filter::new()
                    .and_eq("p.primer_chr", "5".to_string())
                    .and_null("p.plate_id")
                    .and_eq("p.primer_start", 100_i64),
            )
            .order_by("p.primer_id")
            .build()
            .unwrap();
        assert_eq!(
            statement.sql(),
            format!(
                "{BASE} WHERE p.primer_chr = ? AND p.plate_id IS NULL AND p.primer_start = ? ORDER BY p.primer_id"
            )
        );
        assert_eq!(
            statement.values(),
            &[Value::Text("5".to_string()), Value::Integer(100)]
        );
    }

    #[test]
    fn in_clause_has_one_placeholder_per_value() {
        for n in 1..=12_i64 {
            let ids: Vec<i64> = (0..n).map(|i| i * 3 + 1).collect();
            let statement = SelectQuery::new(BASE)
                .filter(Filter::new().and_in("p.primer_id", ids.clone()))
                .build()
                .unwrap();
            assert_eq!(count_placeholders(statement.sql()), n as usize);
            let expected: Vec<Value> = ids.into_iter().map(Value::Integer).collect();
            assert_eq!(statement.values(), expected.as_slice());
        }
    }

    #[test]
    fn empty_in_list_matches_nothing() {
        let statement = SelectQuery::new(BASE)
            .filter(Filter::new().and_in("p.primer_id", Vec::<i64>::new()))
            .build()
            .unwrap();
        assert!(statement.sql().ends_with("WHERE 1 = 0"));
        assert!(statement.values().is_empty());
    }

    #[test]
    fn mismatched_raw_fragment_is_rejected() {
        let err = SelectQuery::new(BASE)
            .filter(Filter::new().and_raw("p.primer_id = ? OR p.primer_id = ?", vec![1.into()]))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::MalformedQuery {
                placeholders: 2,
                values: 1
            }
        ));
    }

    #[test]
    fn quoted_question_marks_are_not_placeholders() {
        assert_eq!(count_placeholders("SELECT '?' WHERE a = ?"), 1);
        assert_eq!(in_placeholders(3), "?, ?, ?");
        assert_eq!(in_placeholders(0), "");
    }

    #[test]
    fn insert_binds_explicit_id_only_when_present() {
        let fresh = InsertStatement::new("plate", "plate_id")
            .id(None)
            .value("plate_name", "CR_000001".to_string());
        assert_eq!(
            fresh.sql(),
            "INSERT INTO plate (plate_name) VALUES (?) RETURNING plate_id"
        );

        let recreated = InsertStatement::new("plate", "plate_id")
            .id(Some(4))
            .value("plate_name", "CR_000001".to_string());
        assert_eq!(
            recreated.sql(),
            "INSERT INTO plate (plate_id, plate_name) VALUES (?, ?) RETURNING plate_id"
        );
    }
}
