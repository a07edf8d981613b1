use crate::{
    error::Result,
    query::{QueryBuilder, QueryValue},
    ToSqlParamPair, Value,
};

/// Single row insert, bound with `?` placeholders
pub struct InsertBuilder {
    table: &'static str,
    cols: Vec<&'static str>,
    params: Vec<Value>,
}

impl InsertBuilder {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            cols: vec![],
            params: vec![],
        }
    }

    pub fn value(mut self, col: &'static str, value: Value) -> Self {
        self.cols.push(col);
        self.params.push(value);
        self
    }

    pub fn values<I>(self, values: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Value)>,
    {
        values
            .into_iter()
            .fold(self, |this, (col, value)| this.value(col, value))
    }
}

impl ToSqlParamPair for InsertBuilder {
    fn to_sql_param_pair(self) -> Result<Vec<(String, Vec<Vec<Value>>)>> {
        let mut builder = QueryBuilder::insert(self.table);
        if !self.cols.is_empty() {
            builder
                .columns(self.cols.iter())
                .values(self.cols.iter().map(|_| QueryValue::from("?")));
        }
        let sql = builder.build()?;

        Ok(vec![(sql, vec![self.params])])
    }
}
