use rusqlite::{Connection, ToSql, Transaction};
use serde::Serialize;

use crate::config::GeneratorConfig;
use crate::error::{ContaError, Result};
use crate::sql;

/// Transactional execution context the allocator runs against.
///
/// The caller owns the transaction boundary; the allocator only prepares
/// and executes parameterized statements through this seam. Implemented
/// for plain connections and for open transactions; tests plug in mocks
/// to script contention and storage failure.
pub trait ExecutionContext {
    /// Single-row read of the stored counter value for one segment.
    fn query_value(&self, sql: &str, segment_key: &str) -> Result<Option<i64>>;

    /// Executes a statement, returning the affected-row count.
    fn execute(&self, sql: &str, params: &[&dyn ToSql]) -> Result<usize>;
}

impl ExecutionContext for Connection {
    fn query_value(&self, sql: &str, segment_key: &str) -> Result<Option<i64>> {
        tracing::trace!(sql, segment_key, "read counter row");
        let mut stmt = self
            .prepare_cached(sql)
            .map_err(|e| ContaError::Storage(format!("failed to prepare select: {e}")))?;
        let mut rows = stmt
            .query(rusqlite::params![segment_key])
            .map_err(|e| ContaError::Storage(format!("select failed: {e}")))?;
        match rows
            .next()
            .map_err(|e| ContaError::Storage(format!("failed to read select result: {e}")))?
        {
            Some(row) => {
                let value = row
                    .get(0)
                    .map_err(|e| ContaError::Storage(format!("bad counter value: {e}")))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn execute(&self, sql: &str, params: &[&dyn ToSql]) -> Result<usize> {
        tracing::trace!(sql, "execute statement");
        let mut stmt = self
            .prepare_cached(sql)
            .map_err(|e| ContaError::Storage(format!("failed to prepare statement: {e}")))?;
        stmt.execute(params)
            .map_err(|e| ContaError::Storage(format!("statement failed: {e}")))
    }
}

impl ExecutionContext for Transaction<'_> {
    fn query_value(&self, sql: &str, segment_key: &str) -> Result<Option<i64>> {
        ExecutionContext::query_value(&**self, sql, segment_key)
    }

    fn execute(&self, sql: &str, params: &[&dyn ToSql]) -> Result<usize> {
        ExecutionContext::execute(&**self, sql, params)
    }
}

/// One counter row, for inspection tooling.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentRow {
    pub segment: String,
    pub value: i64,
}

/// Creates the counter table if it does not exist. Idempotent. The
/// allocator itself assumes this has already happened.
pub fn ensure_table(conn: &Connection, config: &GeneratorConfig) -> Result<()> {
    config.validate()?;
    conn.execute_batch(&sql::bootstrap_ddl(config))
        .map_err(|e| ContaError::Storage(format!("schema bootstrap failed: {e}")))
}

/// Reads the stored value for one segment without touching it.
pub fn current_value(
    conn: &Connection,
    config: &GeneratorConfig,
    segment_key: &str,
) -> Result<Option<i64>> {
    let statements = sql::Statements::build(config);
    conn.query_value(&statements.select, segment_key)
}

/// All counter rows, ordered by segment key.
pub fn list_segments(conn: &Connection, config: &GeneratorConfig) -> Result<Vec<SegmentRow>> {
    let query = format!(
        "SELECT {segment}, {value} FROM {table} ORDER BY {segment}",
        segment = config.segment_column,
        value = config.value_column,
        table = config.table,
    );
    let mut stmt = conn
        .prepare(&query)
        .map_err(|e| ContaError::Storage(format!("failed to prepare listing: {e}")))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(SegmentRow {
                segment: row.get(0)?,
                value: row.get(1)?,
            })
        })
        .map_err(|e| ContaError::Storage(format!("listing failed: {e}")))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| ContaError::Storage(format!("failed to read listing: {e}")))?;
    Ok(rows)
}
