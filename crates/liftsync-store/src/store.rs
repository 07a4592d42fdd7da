//! SQLite-backed local table cache.
//!
//! One database file per authenticated identity. Every catalog table is
//! created up front with its primary-key and index columns materialized as
//! real SQLite columns; the remaining row fields travel in a JSON `data`
//! column. Writable tables carry an `is_synced` column (0 = locally
//! modified, unpushed; 1 = matches or was sourced from the remote store)
//! which is stripped from the stored payload and re-injected on read.

use parking_lot::Mutex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, params_from_iter};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

use crate::catalog::{ALL_TABLES, Table, TableSpec, WRITABLE_TABLES};
use crate::error::{StoreError, StoreResult};
use crate::key::Key;

/// A writable table still holding unpushed rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTable {
    pub table: &'static str,
    pub count: usize,
}

/// Result of a guarded purge attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeOutcome {
    /// Nothing was awaiting push; every table was cleared.
    Cleared,
    /// Unpushed rows remain; nothing was touched.
    Pending(Vec<PendingTable>),
}

/// Durable local cache of the remote table set
/// Uses Mutex for thread-safe access to the SQLite connection
pub struct LocalStore {
    /// The underlying SQLite connection (wrapped in Mutex for thread safety)
    conn: Mutex<Connection>,
}

impl LocalStore {
    /// Open or create a cache database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(&path)?;

        // Configure SQLite for better performance
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "cache_size", 10000)?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_tables()?;

        info!(path = %path.as_ref().display(), "opened local store");
        Ok(store)
    }

    /// Open the cache file for one authenticated identity, creating the
    /// data directory if needed.
    pub fn open_for_user<P: AsRef<Path>>(data_dir: P, user_id: &str) -> StoreResult<Self> {
        std::fs::create_dir_all(&data_dir)?;
        Self::open(data_dir.as_ref().join(format!("{user_id}.db")))
    }

    /// Create every catalog table and its declared indexes
    fn create_tables(&self) -> StoreResult<()> {
        let conn = self.conn.lock();
        for table in ALL_TABLES {
            let spec = table.spec();
            conn.execute(&create_table_sql(spec), [])?;
            for index in spec.indexes {
                conn.execute(&create_index_sql(spec, index), [])?;
            }
            if spec.writable {
                // Dirty-row scans back every reconciliation pass
                conn.execute(
                    &format!(
                        "CREATE INDEX IF NOT EXISTS idx_{0}_dirty ON {0} (is_synced)",
                        spec.name
                    ),
                    [],
                )?;
            }
        }
        Ok(())
    }

    // MARK: - Row Operations

    /// Get a row by primary key.
    pub fn get(&self, table: Table, key: &Key) -> StoreResult<Option<Value>> {
        let conn = self.conn.lock();
        get_row(&conn, table, key)
    }

    /// Insert or update a row by primary key.
    ///
    /// For writable tables the row's `is_synced` field (default 0) decides
    /// the stored flag; read-only tables are always stored as synced.
    pub fn put(&self, table: Table, row: &Value) -> StoreResult<()> {
        let conn = self.conn.lock();
        put_row(&conn, table, row)
    }

    /// Upsert a batch of rows in one transaction.
    pub fn bulk_put(&self, table: Table, rows: &[Value]) -> StoreResult<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        for row in rows {
            put_row(&tx, table, row)?;
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// Delete a row by primary key.
    pub fn delete(&self, table: Table, key: &Key) -> StoreResult<()> {
        let conn = self.conn.lock();
        delete_row(&conn, table, key)
    }

    /// Delete a batch of rows in one transaction.
    pub fn bulk_delete(&self, table: Table, keys: &[Key]) -> StoreResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        for key in keys {
            delete_row(&tx, table, key)?;
        }
        tx.commit()?;
        Ok(())
    }

    // MARK: - Queries

    /// Equality query on the primary key, a key prefix, or a declared
    /// secondary index (composite indexes included).
    pub fn query_eq(&self, table: Table, fields: &[&str], values: &[Value]) -> StoreResult<Vec<Value>> {
        let conn = self.conn.lock();
        query_eq_rows(&conn, table, fields, values)
    }

    /// Range query: equality on the leading index fields plus an inclusive
    /// range on the final field. `eq_values` must cover `fields` except the
    /// last one; either bound may be open.
    pub fn query_range(
        &self,
        table: Table,
        fields: &[&str],
        eq_values: &[Value],
        lower: Option<&Value>,
        upper: Option<&Value>,
    ) -> StoreResult<Vec<Value>> {
        let spec = table.spec();
        if fields.is_empty() || eq_values.len() != fields.len() - 1 {
            return Err(StoreError::KeyArity {
                table: spec.name,
                expected: fields.len().saturating_sub(1),
                got: eq_values.len(),
            });
        }
        if !index_declared(spec, fields) {
            return Err(StoreError::UnknownIndex {
                table: spec.name,
                fields: fields.join(","),
            });
        }

        let mut clauses = Vec::with_capacity(fields.len() + 1);
        let mut params = Vec::with_capacity(fields.len() + 1);
        for (field, value) in fields[..fields.len() - 1].iter().zip(eq_values) {
            clauses.push(format!("{field} = ?"));
            params.push(bind_scalar(spec.name, field, value)?);
        }
        let range_field = fields[fields.len() - 1];
        if let Some(lower) = lower {
            clauses.push(format!("{range_field} >= ?"));
            params.push(bind_scalar(spec.name, range_field, lower)?);
        }
        if let Some(upper) = upper {
            clauses.push(format!("{range_field} <= ?"));
            params.push(bind_scalar(spec.name, range_field, upper)?);
        }
        let sql = if clauses.is_empty() {
            format!("SELECT data, is_synced FROM {}", spec.name)
        } else {
            format!(
                "SELECT data, is_synced FROM {} WHERE {}",
                spec.name,
                clauses.join(" AND ")
            )
        };

        let conn = self.conn.lock();
        collect_rows(&conn, spec, &sql, params)
    }

    /// All rows of a table.
    pub fn all_rows(&self, table: Table) -> StoreResult<Vec<Value>> {
        let spec = table.spec();
        let sql = format!("SELECT data, is_synced FROM {}", spec.name);
        let conn = self.conn.lock();
        collect_rows(&conn, spec, &sql, Vec::new())
    }

    /// Number of rows in a table.
    pub fn count(&self, table: Table) -> StoreResult<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", table.name()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    // MARK: - Dirty State

    /// All rows of a table still awaiting push (`is_synced = 0`).
    pub fn dirty_rows(&self, table: Table) -> StoreResult<Vec<Value>> {
        let spec = table.spec();
        let sql = format!("SELECT data, is_synced FROM {} WHERE is_synced = 0", spec.name);
        let conn = self.conn.lock();
        collect_rows(&conn, spec, &sql, Vec::new())
    }

    /// Number of rows of a table still awaiting push.
    pub fn count_dirty(&self, table: Table) -> StoreResult<usize> {
        let conn = self.conn.lock();
        count_dirty_rows(&conn, table)
    }

    /// Flip `is_synced` to 1 for exactly the given keys, in one
    /// transaction. Returns the number of rows updated.
    pub fn mark_synced(&self, table: Table, keys: &[Key]) -> StoreResult<usize> {
        let spec = table.spec();
        let clause = key_where_clause(spec);
        let sql = format!("UPDATE {} SET is_synced = 1 WHERE {}", spec.name, clause);

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut updated = 0;
        for key in keys {
            check_key_arity(spec, key)?;
            let params = key_params(spec, key)?;
            updated += tx.execute(&sql, params_from_iter(params))?;
        }
        tx.commit()?;
        Ok(updated)
    }

    // MARK: - Destructive Operations

    /// Count unpushed rows across every writable table and, only when the
    /// total is zero, clear every table - all inside one transaction, so no
    /// interleaved write can land between the check and the wipe.
    pub fn purge_if_clean(&self) -> StoreResult<PurgeOutcome> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let mut pending = Vec::new();
        for table in WRITABLE_TABLES {
            let count = count_dirty_rows(&tx, *table)?;
            if count > 0 {
                pending.push(PendingTable {
                    table: table.name(),
                    count,
                });
            }
        }
        if !pending.is_empty() {
            debug!(?pending, "purge blocked by unpushed rows");
            return Ok(PurgeOutcome::Pending(pending));
        }

        for table in ALL_TABLES {
            tx.execute(&format!("DELETE FROM {}", table.name()), [])?;
        }
        tx.commit()?;
        info!("local store purged");
        Ok(PurgeOutcome::Cleared)
    }

    /// Destroy every table's contents unconditionally.
    pub fn clear_all(&self) -> StoreResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        for table in ALL_TABLES {
            tx.execute(&format!("DELETE FROM {}", table.name()), [])?;
        }
        tx.commit()?;
        info!("local store cleared");
        Ok(())
    }

    // MARK: - Transactions

    /// Run `f` atomically: every row operation inside commits together or
    /// not at all. Used whenever a logical update spans more than one table.
    pub fn transaction<T>(&self, f: impl FnOnce(&StoreTx<'_>) -> StoreResult<T>) -> StoreResult<T> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let out = f(&StoreTx { conn: &tx })?;
        tx.commit()?;
        Ok(out)
    }
}

/// Row operations scoped to one open transaction.
pub struct StoreTx<'a> {
    conn: &'a Connection,
}

impl StoreTx<'_> {
    pub fn get(&self, table: Table, key: &Key) -> StoreResult<Option<Value>> {
        get_row(self.conn, table, key)
    }

    pub fn put(&self, table: Table, row: &Value) -> StoreResult<()> {
        put_row(self.conn, table, row)
    }

    pub fn delete(&self, table: Table, key: &Key) -> StoreResult<()> {
        delete_row(self.conn, table, key)
    }

    pub fn query_eq(&self, table: Table, fields: &[&str], values: &[Value]) -> StoreResult<Vec<Value>> {
        query_eq_rows(self.conn, table, fields, values)
    }
}

// MARK: - Schema Helpers

/// Key and index fields materialized as real columns, key fields first.
fn physical_columns(spec: &TableSpec) -> Vec<&'static str> {
    let mut cols: Vec<&'static str> = spec.key.fields().to_vec();
    for index in spec.indexes {
        for field in *index {
            if !cols.contains(field) {
                cols.push(field);
            }
        }
    }
    cols
}

fn create_table_sql(spec: &TableSpec) -> String {
    // Key and index columns are declared without a type name: no affinity,
    // so numeric and string key values compare exactly as bound.
    let mut defs: Vec<String> = Vec::new();
    for col in physical_columns(spec) {
        if spec.key.fields().contains(&col) {
            defs.push(format!("{col} NOT NULL"));
        } else {
            defs.push(col.to_string());
        }
    }
    defs.push("data TEXT NOT NULL".to_string());
    defs.push("is_synced INTEGER NOT NULL DEFAULT 0".to_string());
    defs.push(format!("PRIMARY KEY ({})", spec.key.fields().join(", ")));
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        spec.name,
        defs.join(", ")
    )
}

fn create_index_sql(spec: &TableSpec, fields: &[&str]) -> String {
    format!(
        "CREATE INDEX IF NOT EXISTS idx_{}_{} ON {} ({})",
        spec.name,
        fields.join("_"),
        spec.name,
        fields.join(", ")
    )
}

/// Whether `fields` is the primary key, a key prefix, or a declared
/// secondary index (or index prefix).
fn index_declared(spec: &TableSpec, fields: &[&str]) -> bool {
    if fields.is_empty() {
        return false;
    }
    let key = spec.key.fields();
    if fields.len() <= key.len() && fields == &key[..fields.len()] {
        return true;
    }
    spec.indexes
        .iter()
        .any(|index| fields.len() <= index.len() && fields == &index[..fields.len()])
}

// MARK: - Row Helpers

fn bind_scalar(table: &'static str, field: &str, value: &Value) -> StoreResult<SqlValue> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(SqlValue::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(SqlValue::Real(f))
            } else {
                Err(StoreError::NotIndexable {
                    table,
                    field: field.to_string(),
                })
            }
        }
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        Value::Array(_) | Value::Object(_) => Err(StoreError::NotIndexable {
            table,
            field: field.to_string(),
        }),
    }
}

fn check_key_arity(spec: &TableSpec, key: &Key) -> StoreResult<()> {
    if key.len() != spec.key.len() {
        return Err(StoreError::KeyArity {
            table: spec.name,
            expected: spec.key.len(),
            got: key.len(),
        });
    }
    Ok(())
}

fn key_where_clause(spec: &TableSpec) -> String {
    spec.key
        .fields()
        .iter()
        .map(|field| format!("{field} = ?"))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn key_params(spec: &TableSpec, key: &Key) -> StoreResult<Vec<SqlValue>> {
    spec.key
        .fields()
        .iter()
        .zip(key.values())
        .map(|(field, value)| bind_scalar(spec.name, field, value))
        .collect()
}

/// Rebuild the application-visible row: stored payload plus the `is_synced`
/// flag for writable tables.
fn inflate(spec: &TableSpec, data: &str, is_synced: i64) -> StoreResult<Value> {
    let mut row: Value = serde_json::from_str(data)?;
    if spec.writable {
        if let Some(obj) = row.as_object_mut() {
            obj.insert("is_synced".to_string(), Value::from(is_synced));
        }
    }
    Ok(row)
}

fn put_row(conn: &Connection, table: Table, row: &Value) -> StoreResult<()> {
    let spec = table.spec();
    let obj = row
        .as_object()
        .ok_or(StoreError::NotObject { table: spec.name })?;

    // The flag lives in its own column; the stored payload never carries it.
    let mut payload = obj.clone();
    let flag = payload.remove("is_synced");
    let is_synced = if spec.writable {
        i64::from(flag.and_then(|v| v.as_i64()).unwrap_or(0) != 0)
    } else {
        1
    };

    let cols = physical_columns(spec);
    let mut params: Vec<SqlValue> = Vec::with_capacity(cols.len() + 2);
    for col in &cols {
        let is_key = spec.key.fields().contains(col);
        match payload.get(*col) {
            Some(v) if !(is_key && v.is_null()) => params.push(bind_scalar(spec.name, col, v)?),
            _ if is_key => {
                return Err(StoreError::MissingKeyField {
                    table: spec.name,
                    field: *col,
                });
            }
            _ => params.push(SqlValue::Null),
        }
    }
    params.push(SqlValue::Text(serde_json::to_string(&payload)?));
    params.push(SqlValue::Integer(is_synced));

    let mut sets: Vec<String> = cols
        .iter()
        .filter(|col| !spec.key.fields().contains(*col))
        .map(|col| format!("{col} = excluded.{col}"))
        .collect();
    sets.push("data = excluded.data".to_string());
    sets.push("is_synced = excluded.is_synced".to_string());

    let sql = format!(
        "INSERT INTO {} ({}, data, is_synced) VALUES ({}) ON CONFLICT({}) DO UPDATE SET {}",
        spec.name,
        cols.join(", "),
        vec!["?"; cols.len() + 2].join(", "),
        spec.key.fields().join(", "),
        sets.join(", ")
    );
    conn.execute(&sql, params_from_iter(params))?;
    Ok(())
}

fn get_row(conn: &Connection, table: Table, key: &Key) -> StoreResult<Option<Value>> {
    let spec = table.spec();
    check_key_arity(spec, key)?;
    let sql = format!(
        "SELECT data, is_synced FROM {} WHERE {}",
        spec.name,
        key_where_clause(spec)
    );
    let params = key_params(spec, key)?;
    let found: Option<(String, i64)> = conn
        .query_row(&sql, params_from_iter(params), |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .optional()?;
    match found {
        Some((data, is_synced)) => Ok(Some(inflate(spec, &data, is_synced)?)),
        None => Ok(None),
    }
}

fn delete_row(conn: &Connection, table: Table, key: &Key) -> StoreResult<()> {
    let spec = table.spec();
    check_key_arity(spec, key)?;
    let sql = format!("DELETE FROM {} WHERE {}", spec.name, key_where_clause(spec));
    let params = key_params(spec, key)?;
    conn.execute(&sql, params_from_iter(params))?;
    Ok(())
}

fn query_eq_rows(
    conn: &Connection,
    table: Table,
    fields: &[&str],
    values: &[Value],
) -> StoreResult<Vec<Value>> {
    let spec = table.spec();
    if fields.len() != values.len() {
        return Err(StoreError::KeyArity {
            table: spec.name,
            expected: fields.len(),
            got: values.len(),
        });
    }
    if !index_declared(spec, fields) {
        return Err(StoreError::UnknownIndex {
            table: spec.name,
            fields: fields.join(","),
        });
    }
    let clause = fields
        .iter()
        .map(|field| format!("{field} = ?"))
        .collect::<Vec<_>>()
        .join(" AND ");
    let sql = format!(
        "SELECT data, is_synced FROM {} WHERE {}",
        spec.name, clause
    );
    let params = fields
        .iter()
        .zip(values)
        .map(|(field, value)| bind_scalar(spec.name, field, value))
        .collect::<StoreResult<Vec<_>>>()?;
    collect_rows(conn, spec, &sql, params)
}

fn count_dirty_rows(conn: &Connection, table: Table) -> StoreResult<usize> {
    let count: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {} WHERE is_synced = 0",
            table.name()
        ),
        [],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

fn collect_rows(
    conn: &Connection,
    spec: &TableSpec,
    sql: &str,
    params: Vec<SqlValue>,
) -> StoreResult<Vec<Value>> {
    let mut stmt = conn.prepare(sql)?;
    let mapped = stmt.query_map(params_from_iter(params), |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;
    let mut rows = Vec::new();
    for item in mapped {
        let (data, is_synced) = item?;
        rows.push(inflate(spec, &data, is_synced)?);
    }
    Ok(rows)
}
