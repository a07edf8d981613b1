use std::sync::Arc;

use crate::{
    error::Result, query, unit_of_work::Session, Entity, EntityMapper, FromValue, Value,
};

/// Raw SQL against the session connection. Nothing goes through the change
/// tracker and every call runs immediately.
pub struct QueryExecutor {
    session: Arc<Session>,
}

impl QueryExecutor {
    pub(crate) fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    fn mapper(&self) -> EntityMapper {
        EntityMapper::new(self.session.options.materialize)
    }

    /// Returns the affected rows
    pub async fn execute_command(&self, sql: &str, params: Vec<Value>) -> Result<u64> {
        self.session.connection()?.execute(sql, params).await
    }

    /// Every row must carry every column of `E`
    pub async fn from_sql<E: Entity>(&self, sql: &str, params: Vec<Value>) -> Result<Vec<E>> {
        self.session
            .connection()?
            .query_many_map(sql, params, |row| E::from_row(&row))
            .await
    }

    /// Rows mapped by column name, missing columns keep their default
    pub async fn exec_raw_sql<E: Entity + Default>(&self, sql: &str) -> Result<Vec<E>> {
        let rows = self.session.connection()?.query_many(sql, vec![]).await?;

        self.mapper().map_all(&rows)
    }

    /// `SELECT * FROM <table> WHERE (<filter>)`, the filter text is used
    /// verbatim. A blank filter selects every row.
    pub async fn exec_filter<E: Entity + Default>(&self, filter: &str) -> Result<Vec<E>> {
        let sql = select_sql::<E>(filter)?;

        self.exec_raw_sql(&sql).await
    }

    /// As `exec_filter` with bind params, each row then passed through
    /// `projection`
    pub async fn exec_filter_project<E, R, F>(
        &self,
        filter: &str,
        projection: F,
        params: Vec<Value>,
    ) -> Result<Vec<R>>
    where
        E: Entity,
        F: Fn(E) -> R,
    {
        let sql = select_sql::<E>(filter)?;
        let list = self.from_sql::<E>(&sql, params).await?;

        Ok(list.into_iter().map(projection).collect())
    }

    /// First column of the first row, `Value::Null` without rows
    pub async fn exec_scalar(&self, sql: &str, params: Vec<Value>) -> Result<Value> {
        let rows = self.session.connection()?.query_many(sql, params).await?;

        Ok(rows
            .first()
            .and_then(|row| row.value_at(0))
            .cloned()
            .unwrap_or(Value::Null))
    }

    pub async fn exec_scalar_as<T>(&self, sql: &str, params: Vec<Value>) -> Result<T>
    where
        T: FromValue<Output = T>,
    {
        let value = self.exec_scalar(sql, params).await?;

        T::from_value(&value)
    }
}

fn select_sql<E: Entity>(filter: &str) -> Result<String> {
    let mut builder = query::QueryBuilder::select(E::TABLE_NAME);
    builder.column("*");
    if !filter.trim().is_empty() {
        builder.where_cond(query::Where::raw(filter.trim()));
    }

    Ok(builder.build()?)
}
