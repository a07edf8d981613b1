use crate::{error::Result, query, Predicate, ToSqlParamPair, Value};

pub struct UpdateBuilder {
    sql_builder: query::UpdateBuilder,
    set_params: Vec<Value>,
    filter: Predicate,
}

impl UpdateBuilder {
    pub fn new(table: &'static str) -> Self {
        Self {
            sql_builder: query::QueryBuilder::update(table),
            set_params: vec![],
            filter: Predicate::all(),
        }
    }

    pub fn set(mut self, col: &'static str, value: Value) -> Self {
        self.sql_builder.set(col, "?".into());
        self.set_params.push(value);
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter = self.filter.and(predicate);
        self
    }
}

impl ToSqlParamPair for UpdateBuilder {
    fn to_sql_param_pair(mut self) -> Result<Vec<(String, Vec<Vec<Value>>)>> {
        if let Some(cond) = self.filter.where_cond() {
            self.sql_builder.where_cond(cond.clone());
        }
        let sql = self.sql_builder.build()?;
        let mut params = self.set_params;
        params.extend_from_slice(self.filter.params());

        Ok(vec![(sql, vec![params])])
    }
}
