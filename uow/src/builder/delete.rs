use crate::{error::Result, query, Predicate, ToSqlParamPair, Value};

pub struct DeleteBuilder {
    sql_builder: query::DeleteBuilder,
    filter: Predicate,
}

impl DeleteBuilder {
    pub fn new(table: &'static str) -> Self {
        Self {
            sql_builder: query::QueryBuilder::delete(table),
            filter: Predicate::all(),
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter = self.filter.and(predicate);
        self
    }
}

impl ToSqlParamPair for DeleteBuilder {
    fn to_sql_param_pair(mut self) -> Result<Vec<(String, Vec<Vec<Value>>)>> {
        if let Some(cond) = self.filter.where_cond() {
            self.sql_builder.where_cond(cond.clone());
        }
        let sql = self.sql_builder.build()?;

        Ok(vec![(sql, vec![self.filter.params().to_vec()])])
    }
}
