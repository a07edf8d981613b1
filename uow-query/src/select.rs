use uow_error::Result;

use crate::{Filter, Where};

#[derive(Debug, Clone, Default)]
pub struct SelectBuilder {
    table: String,
    columns: Vec<String>,
    filter: Filter,
}

impl SelectBuilder {
    pub fn new<S>(table: S) -> Self
    where
        S: ToString,
    {
        Self {
            table: table.to_string(),
            ..Default::default()
        }
    }

    /// Append column
    ///
    /// # Examples
    ///
    /// ```
    /// use uow_query::QueryBuilder;
    ///
    /// let a = QueryBuilder::select("ta")
    ///     .column("a")
    ///     .column("b")
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(&a, "SELECT a, b FROM ta");
    /// ```
    pub fn column<S>(&mut self, col: S) -> &mut Self
    where
        S: ToString,
    {
        self.columns.push(col.to_string());
        self
    }

    pub fn where_cond(&mut self, cond: Where) -> &mut Self {
        self.filter.where_cond(cond);
        self
    }

    pub fn order_bys<T, S>(&mut self, list: T) -> &mut Self
    where
        T: IntoIterator<Item = (S, bool)>,
        S: ToString,
    {
        self.filter.order_bys(list);
        self
    }

    pub fn limit(&mut self, limit: u64, offset: u64) -> &mut Self {
        self.filter.limit(limit, offset);
        self
    }

    /// Build sql
    ///
    /// # Examples
    ///
    /// ```
    /// use uow_query::{QueryBuilder, Where};
    ///
    /// let sql = QueryBuilder::select("ta")
    ///     .column("*")
    ///     .where_cond(Where::raw("a = ?"))
    ///     .order_bys([("b", false)])
    ///     .limit(10, 0)
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(&sql, "SELECT * FROM ta WHERE (a = ?) ORDER BY b DESC LIMIT 10 OFFSET 0");
    /// ```
    pub fn build(&self) -> Result<String> {
        // Validate builder
        self.validate()?;

        let mut parts = Vec::<String>::new();

        // Build prefix
        parts.push("SELECT".into());

        // Build columns
        parts.push(self.columns.join(", "));

        // Build table
        parts.push("FROM".into());
        parts.push(self.table.clone());

        // Build filter
        if !self.filter.is_empty() {
            parts.push(self.filter.build()?);
        }

        Ok(parts.join(" "))
    }

    /// Validate builder
    fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(uow_error::query_builder!("Select empty columns"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::QueryBuilder;

    #[test]
    fn test_empty_columns() {
        assert!(QueryBuilder::select("ta").build().is_err());
    }
}
