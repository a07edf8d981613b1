use uow_error::Result;

use crate::QueryValue;

#[derive(Debug, Default)]
pub struct InsertBuilder {
    table: String,
    columns: Vec<String>,
    values_list: Vec<Vec<String>>,
}

impl InsertBuilder {
    pub fn new<S>(table: S) -> Self
    where
        S: ToString,
    {
        Self {
            table: table.to_string(),
            ..Default::default()
        }
    }

    /// Set columns
    ///
    /// # Examples
    ///
    /// ```
    /// use uow_query::QueryBuilder;
    ///
    /// let sql = QueryBuilder::insert("ta")
    ///     .columns(["a", "b", "c"])
    ///     .values([1.into(), "?".into(), "?".into()])
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(&sql, "INSERT INTO ta (a, b, c) VALUES (1, ?, ?)");
    /// ```
    pub fn columns<T, S>(&mut self, cols: T) -> &mut Self
    where
        T: IntoIterator<Item = S>,
        S: ToString,
    {
        self.columns = cols.into_iter().map(|s| s.to_string()).collect();
        self
    }

    /// Append a values row
    ///
    /// # Examples
    ///
    /// ```
    /// use uow_query::QueryBuilder;
    ///
    /// let sql = QueryBuilder::insert("ta")
    ///     .columns(["a", "b"])
    ///     .values(["?".into(), "?".into()])
    ///     .values(["?".into(), "?".into()])
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(&sql, "INSERT INTO ta (a, b) VALUES (?, ?), (?, ?)");
    /// ```
    pub fn values<T>(&mut self, values: T) -> &mut Self
    where
        T: IntoIterator<Item = QueryValue>,
    {
        self.values_list
            .push(values.into_iter().map(|v| v.to_string()).collect());
        self
    }

    /// Build sql, no columns means a row of defaults
    ///
    /// # Examples
    ///
    /// ```
    /// use uow_query::QueryBuilder;
    ///
    /// let sql = QueryBuilder::insert("ta").build().unwrap();
    ///
    /// assert_eq!(&sql, "INSERT INTO ta DEFAULT VALUES");
    /// ```
    pub fn build(&self) -> Result<String> {
        // Validate builder
        self.validate()?;

        let mut parts = Vec::<String>::new();

        // Build prefix
        parts.push(format!("INSERT INTO {}", self.table));

        if self.columns.is_empty() {
            parts.push("DEFAULT VALUES".into());
            return Ok(parts.join(" "));
        }

        // Build columns
        parts.push(format!("({})", self.columns.join(", ")));

        // Build values
        parts.push("VALUES".into());
        parts.push(
            self.values_list
                .iter()
                .map(|values| format!("({})", values.join(", ")))
                .collect::<Vec<String>>()
                .join(", "),
        );

        Ok(parts.join(" "))
    }

    /// Validate builder
    fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            if !self.values_list.is_empty() {
                return Err(uow_error::query_builder!("Values without columns"));
            }
            return Ok(());
        }

        if self.values_list.is_empty() {
            return Err(uow_error::query_builder!("Empty values list"));
        }

        for values in &self.values_list {
            if values.len() != self.columns.len() {
                return Err(uow_error::query_builder!(
                    "Columns and values length mismatch"
                ));
            }
        }

        Ok(())
    }
}
