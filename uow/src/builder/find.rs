use std::marker::PhantomData;

use crate::{error::Result, query, Connection, Entity, FromValue, Predicate, Value};

pub struct FindBuilder<E: Entity> {
    predicate: Predicate,
    orders: Vec<(String, bool)>,
    limit: Option<(u64, u64)>,
    _marker1: PhantomData<E>,
}

impl<E: Entity> FindBuilder<E> {
    pub fn new() -> Self {
        Self {
            predicate: Predicate::all(),
            orders: vec![],
            limit: None,
            _marker1: PhantomData,
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = self.predicate.and(predicate);
        self
    }

    pub fn order_by(mut self, col: &str, is_asc: bool) -> Self {
        self.orders.push((col.to_string(), is_asc));
        self
    }

    pub fn limit(mut self, limit: u64, offset: u64) -> Self {
        self.limit = Some((limit, offset));
        self
    }

    fn build(&self) -> Result<(String, Vec<Value>)> {
        let mut builder = query::QueryBuilder::select(E::TABLE_NAME);
        builder.column("*");
        if let Some(cond) = self.predicate.where_cond() {
            builder.where_cond(cond.clone());
        }
        builder.order_bys(self.orders.iter().map(|(col, is_asc)| (col, *is_asc)));
        if let Some((limit, offset)) = self.limit {
            builder.limit(limit, offset);
        }

        Ok((builder.build()?, self.predicate.params().to_vec()))
    }

    pub async fn execute(self, conn: &Connection) -> Result<Vec<E>> {
        let (sql, params) = self.build()?;

        conn.query_many_map(&sql, params, |row| E::from_row(&row))
            .await
    }

    pub async fn first(self, conn: &Connection) -> Result<Option<E>> {
        let list = self.limit(1, 0).execute(conn).await?;

        Ok(list.into_iter().next())
    }

    /// Count matching rows, ordering and limit are ignored
    pub async fn count(self, conn: &Connection) -> Result<u64> {
        let mut builder = query::QueryBuilder::count(E::TABLE_NAME);
        if let Some(cond) = self.predicate.where_cond() {
            builder.where_cond(cond.clone());
        }
        let sql = builder.build()?;

        let rows = conn
            .query_many(&sql, self.predicate.params().to_vec())
            .await?;
        match rows.first().and_then(|row| row.value_at(0)) {
            Some(v) => u64::from_value(v),
            None => Ok(0),
        }
    }
}

impl<E: Entity> Default for FindBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}
