//! # Sqlite driver
//!
//! One `rusqlite::Connection` guarded by a mutex, every call runs on the
//! tokio blocking pool.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::spawn_blocking;
use uow_error::Result;

use crate::{ColumnType, Driver, Execution, IndexInfo, Row, TableInfo, Value};

#[derive(Clone)]
pub struct SqliteConnProxy {
    conn: Arc<Mutex<rusqlite::Connection>>,
}

impl SqliteConnProxy {
    pub fn new(conn: rusqlite::Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, rusqlite::Connection>> {
        self.conn
            .lock()
            .map_err(|e| uow_error::connection!("SqliteConnProxy lock error: {}", e))
    }

    async fn execute_batch(&self, sql: &'static str) -> Result<()> {
        let proxy = self.clone();
        spawn_blocking(move || {
            let conn = proxy.lock()?;

            log::trace!("Execute `{}`", sql);
            conn.execute_batch(sql)
                .map_err(|e| uow_error::database!("Execute error: {}, sql: `{}`", e, sql))
        })
        .await
        .map_err(|e| uow_error::runtime!("Tokio join error: {}", e))?
    }
}

#[async_trait::async_trait]
impl Driver for SqliteConnProxy {
    async fn execute_many(
        &self,
        pairs: Vec<(String, Vec<Vec<Value>>)>,
    ) -> Result<Vec<Execution>> {
        let proxy = self.clone();
        spawn_blocking(move || {
            let mut conn = proxy.lock()?;

            // Inside an outer transaction the batch gets its own savepoint
            if conn.is_autocommit() {
                log::trace!("Start transaction");
                let tx = conn
                    .transaction()
                    .map_err(|e| uow_error::database!("Start transaction error: {}", e))?;
                let executions = execute_pairs(&tx, pairs)?;

                log::trace!("Commit transaction");
                tx.commit()
                    .map_err(|e| uow_error::database!("Commit error: {}", e))?;

                Ok(executions)
            } else {
                log::trace!("Start savepoint");
                let sp = conn
                    .savepoint()
                    .map_err(|e| uow_error::database!("Start savepoint error: {}", e))?;
                let executions = execute_pairs(&sp, pairs)?;

                log::trace!("Release savepoint");
                sp.commit()
                    .map_err(|e| uow_error::database!("Release savepoint error: {}", e))?;

                Ok(executions)
            }
        })
        .await
        .map_err(|e| uow_error::runtime!("Tokio join error: {}", e))?
    }

    async fn query_many(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>> {
        let sql_string = sql.to_string();
        let proxy = self.clone();
        spawn_blocking(move || {
            let conn = proxy.lock()?;

            log::trace!("Prepare query many `{}`", sql_string);
            let mut stmt = conn.prepare(&sql_string).map_err(|e| {
                uow_error::database!("Prepare query many error: {}, sql: `{}`", e, sql_string)
            })?;
            let columns = stmt
                .column_names()
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>();

            log::trace!("Query many {:?}", params);
            let mut sql_rows = stmt
                .query(&to_rusqlite_params(&params)[..])
                .map_err(|e| uow_error::database!("Query error: {}", e))?;
            let mut rows = Vec::<Row>::new();
            while let Some(row) = sql_rows
                .next()
                .map_err(|e| uow_error::database!("Fetch row error: {}", e))?
            {
                let row = rusqlite_row_to_row(&columns, row)?;
                log::trace!("Append row: {:?}", row);
                rows.push(row);
            }

            Ok(rows)
        })
        .await
        .map_err(|e| uow_error::runtime!("Tokio join error: {}", e))?
    }

    async fn init_table(&self, info: &TableInfo) -> Result<()> {
        // Generate sql
        let table_sql = gen_create_table(info);
        let index_sqls = info
            .indexes
            .iter()
            .map(|idx| gen_create_index(info.name, idx))
            .collect::<Vec<_>>();

        // Execute sql
        let proxy = self.clone();
        spawn_blocking(move || {
            let conn = proxy.lock()?;

            log::trace!("Execute `{}`", table_sql);
            conn.execute(&table_sql, []).map_err(|e| {
                uow_error::database!("Create table error: {}, sql: `{}`", e, table_sql)
            })?;

            for index_sql in index_sqls {
                log::trace!("Execute `{}`", index_sql);
                conn.execute(&index_sql, []).map_err(|e| {
                    uow_error::database!("Create index error: {}, sql: `{}`", e, index_sql)
                })?;
            }

            Ok(())
        })
        .await
        .map_err(|e| uow_error::runtime!("Tokio join error: {}", e))?
    }

    async fn begin(&self) -> Result<()> {
        self.execute_batch("BEGIN").await
    }

    async fn commit(&self) -> Result<()> {
        self.execute_batch("COMMIT").await
    }

    async fn rollback(&self) -> Result<()> {
        self.execute_batch("ROLLBACK").await
    }
}

fn execute_pairs(
    conn: &rusqlite::Connection,
    pairs: Vec<(String, Vec<Vec<Value>>)>,
) -> Result<Vec<Execution>> {
    let mut executions = Vec::<Execution>::new();
    for (sql, params_list) in pairs {
        log::trace!("Prepare execute many `{}`", sql);
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| uow_error::database!("Prepare error: {}, sql: `{}`", e, sql))?;

        for params in params_list {
            log::trace!("Execute {:?}", params);

            let rows_affected = stmt
                .execute(&to_rusqlite_params(&params)[..])
                .map_err(|e| uow_error::database!("Execute error: {}, sql: `{}`", e, sql))?;

            executions.push(Execution {
                rows_affected: rows_affected as u64,
                last_insert_id: conn.last_insert_rowid(),
            });
        }
    }

    Ok(executions)
}

fn to_rusqlite_params(params: &[Value]) -> Vec<&'_ dyn rusqlite::ToSql> {
    params.iter().map(|v| v as &dyn rusqlite::ToSql).collect()
}

fn rusqlite_row_to_row(columns: &[String], src: &rusqlite::Row<'_>) -> Result<Row> {
    use rusqlite::types::ValueRef;

    let mut values = Vec::with_capacity(columns.len());
    for (i, column_name) in columns.iter().enumerate() {
        let v = src
            .get_ref(i)
            .map_err(|e| uow_error::database!("Get column `{}` error: {}", column_name, e))?;
        let value = match v {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(v) => Value::I64(v),
            ValueRef::Real(v) => Value::F64(v),
            ValueRef::Text(v) => Value::Str(String::from_utf8_lossy(v).into_owned()),
            ValueRef::Blob(v) => Value::Bytes(v.to_vec()),
        };
        values.push((column_name.clone(), value));
    }

    Ok(Row { values })
}

impl rusqlite::ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        use rusqlite::types::{ToSqlOutput, Value as SqlValue, ValueRef};

        let output = match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Bool(v) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*v))),
            Value::U8(v) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*v))),
            Value::I8(v) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*v))),
            Value::U16(v) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*v))),
            Value::I16(v) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*v))),
            Value::U32(v) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*v))),
            Value::I32(v) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*v))),
            Value::U64(v) => {
                let n = i64::try_from(*v)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
                ToSqlOutput::Owned(SqlValue::Integer(n))
            }
            Value::I64(v) => ToSqlOutput::Owned(SqlValue::Integer(*v)),
            Value::F32(v) => ToSqlOutput::Owned(SqlValue::Real(f64::from(*v))),
            Value::F64(v) => ToSqlOutput::Owned(SqlValue::Real(*v)),
            Value::Str(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Value::Bytes(v) => ToSqlOutput::Borrowed(ValueRef::Blob(v)),
        };

        Ok(output)
    }
}

fn gen_create_table(info: &TableInfo) -> String {
    let composite_key = info.primary_keys().count() > 1;

    let mut cols = info
        .columns
        .iter()
        .map(|col| {
            let mut parts = vec![
                col.name.to_string(),
                column_type_to_sqlite_type(&col.ty).to_string(),
            ];
            if col.is_primary_key && !composite_key {
                parts.push("PRIMARY KEY".into());
            }
            if col.is_auto_increment {
                parts.push("AUTOINCREMENT".into());
            }
            if col.is_not_null {
                parts.push("NOT NULL".into());
            }
            if let Some(def) = col.default {
                parts.push(format!("DEFAULT {}", def));
            }
            if col.is_unique {
                parts.push("UNIQUE".into());
            }

            parts.join(" ")
        })
        .collect::<Vec<_>>();

    if composite_key {
        let keys = info.primary_keys().map(|col| col.name).collect::<Vec<_>>();
        cols.push(format!("PRIMARY KEY ({})", keys.join(", ")));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {table_name} ({cols})",
        table_name = info.name,
        cols = cols.join(", ")
    )
}

fn gen_create_index(table_name: &str, index_info: &IndexInfo) -> String {
    let cols = index_info
        .keys
        .iter()
        .map(|k| k.column_name)
        .collect::<Vec<_>>();

    format!(
        "CREATE INDEX IF NOT EXISTS {index_name} ON {table_name} ({cols})",
        index_name = index_info.name,
        table_name = table_name,
        cols = cols.join(", ")
    )
}

fn column_type_to_sqlite_type(col: &ColumnType) -> &'static str {
    match col {
        ColumnType::Bool
        | ColumnType::I8
        | ColumnType::U8
        | ColumnType::I16
        | ColumnType::U16
        | ColumnType::I32
        | ColumnType::U32
        | ColumnType::I64
        | ColumnType::U64 => "INTEGER",
        ColumnType::F32 | ColumnType::F64 => "REAL",
        ColumnType::Str(_) => "TEXT",
        ColumnType::Bytes(_) => "BLOB",
    }
}
