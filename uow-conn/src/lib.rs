mod connection;
mod drivers;
mod info;
mod value;

pub use connection::{Connection, Transaction};
pub use value::{FromValue, ToValue, Value};

pub mod driver {
    #[cfg(feature = "sqlite")]
    pub use rusqlite;
}

pub use info::{ColumnInfo, ColumnType, IndexInfo, IndexKeyInfo, TableInfo};

use uow_error::Result;

#[async_trait::async_trait]
pub trait Driver: Sync + Send {
    /// Execute every `(sql, params_list)` pair atomically. One `Execution` is
    /// returned per executed parameter set, in order. When an outer transaction
    /// is open (see `begin`) the batch runs inside it.
    async fn execute_many(&self, pairs: Vec<(String, Vec<Vec<Value>>)>)
        -> Result<Vec<Execution>>;
    async fn query_many(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>>;
    async fn init_table(&self, info: &TableInfo) -> Result<()>;

    async fn begin(&self) -> Result<()>;
    async fn commit(&self) -> Result<()>;
    async fn rollback(&self) -> Result<()>;
}

/// Outcome of a single executed statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Execution {
    pub rows_affected: u64,
    pub last_insert_id: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub(crate) values: Vec<(String, Value)>,
}

impl Row {
    pub fn from_values(values: Vec<(String, Value)>) -> Self {
        Self { values }
    }

    pub fn get<T: FromValue<Output = T>>(&self, name: &str) -> Result<T> {
        if let Some(v) = self.value(name) {
            Ok(T::from_value(v)?)
        } else {
            Err(uow_error::out_of_range!(
                "Column `{}` not found, columns: {:?}",
                name,
                self.columns().collect::<Vec<_>>()
            ))
        }
    }

    /// Look a column up by exact name first, then case-insensitively
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(col, _)| col == name)
            .or_else(|| {
                self.values
                    .iter()
                    .find(|(col, _)| col.eq_ignore_ascii_case(name))
            })
            .map(|(_, v)| v)
    }

    pub fn value_at(&self, index: usize) -> Option<&Value> {
        self.values.get(index).map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(col, _)| col.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(col, v)| (col.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
