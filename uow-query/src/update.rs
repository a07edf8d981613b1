use uow_error::Result;

use crate::{QueryValue, Where};

#[derive(Debug, Default)]
pub struct UpdateBuilder {
    table: String,
    kvs: Vec<(String, String)>,
    where_cond: Option<Where>,
}

impl UpdateBuilder {
    pub fn new<S>(table: S) -> Self
    where
        S: ToString,
    {
        Self {
            table: table.to_string(),
            ..Default::default()
        }
    }

    /// Append kv pair
    ///
    /// # Examples
    ///
    /// ```
    /// use uow_query::QueryBuilder;
    ///
    /// let sql = QueryBuilder::update("ta")
    ///     .set("a", 1.into())
    ///     .set("b", "?".into())
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(&sql, "UPDATE ta SET a = 1, b = ?");
    /// ```
    pub fn set<S>(&mut self, col: S, val: QueryValue) -> &mut Self
    where
        S: ToString,
    {
        self.kvs.push((col.to_string(), val.to_string()));
        self
    }

    /// Set where condition
    ///
    /// # Examples
    ///
    /// ```
    /// use uow_query::{QueryBuilder, Where};
    ///
    /// let sql = QueryBuilder::update("ta")
    ///     .set("a", "?".into())
    ///     .where_cond(Where::raw("id = ?"))
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(&sql, "UPDATE ta SET a = ? WHERE (id = ?)");
    /// ```
    pub fn where_cond(&mut self, cond: Where) -> &mut Self {
        self.where_cond = Some(cond);
        self
    }

    /// Build sql
    pub fn build(&self) -> Result<String> {
        // Validate builder
        self.validate()?;

        let mut parts = Vec::<String>::new();

        // Build prefix
        parts.push("UPDATE".into());
        parts.push(self.table.clone());

        // Build kvs
        parts.push("SET".into());
        parts.push(
            self.kvs
                .iter()
                .map(|(k, v)| format!("{} = {}", k, v))
                .collect::<Vec<_>>()
                .join(", "),
        );

        // Build where
        if let Some(whe) = &self.where_cond {
            parts.push("WHERE".into());
            parts.push(whe.to_string());
        }

        Ok(parts.join(" "))
    }

    /// Validate builder
    fn validate(&self) -> Result<()> {
        if self.kvs.is_empty() {
            return Err(uow_error::query_builder!("Update empty columns"));
        }

        Ok(())
    }
}
