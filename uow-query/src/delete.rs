use uow_error::Result;

use crate::Where;

#[derive(Debug, Default)]
pub struct DeleteBuilder {
    table: String,
    where_cond: Option<Where>,
}

impl DeleteBuilder {
    pub fn new<S>(table: S) -> Self
    where
        S: ToString,
    {
        Self {
            table: table.to_string(),
            ..Default::default()
        }
    }

    /// Set where condition
    ///
    /// # Examples
    ///
    /// ```
    /// use uow_query::{QueryBuilder, Where};
    ///
    /// let sql = QueryBuilder::delete("ta")
    ///     .where_cond(Where::raw("a > 1 AND b < ?"))
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(&sql, "DELETE FROM ta WHERE (a > 1 AND b < ?)");
    /// ```
    pub fn where_cond(&mut self, cond: Where) -> &mut Self {
        self.where_cond = Some(cond);
        self
    }

    /// Build sql, no condition deletes every row
    ///
    /// # Examples
    ///
    /// ```
    /// use uow_query::QueryBuilder;
    ///
    /// let sql = QueryBuilder::delete("ta").build().unwrap();
    ///
    /// assert_eq!(&sql, "DELETE FROM ta");
    /// ```
    pub fn build(&self) -> Result<String> {
        let mut parts = Vec::<String>::new();

        // Build prefix
        parts.push("DELETE".into());

        // Build table
        parts.push("FROM".into());
        parts.push(self.table.clone());

        // Build where
        if let Some(whe) = &self.where_cond {
            parts.push("WHERE".into());
            parts.push(whe.to_string());
        }

        Ok(parts.join(" "))
    }
}
