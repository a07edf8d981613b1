//! # SQL text builders
//!
//! Builders render plain SQL strings. Bind parameters are written as `?`
//! placeholders (the `"?"` literal renders verbatim) and are supplied by the
//! caller alongside the text.

mod delete;
mod filter;
mod insert;
mod query_value;
mod select;
mod update;
mod where_cond;

pub use delete::DeleteBuilder;
pub use filter::Filter;
pub use insert::InsertBuilder;
pub use query_value::QueryValue;
pub use select::SelectBuilder;
pub use update::UpdateBuilder;
pub use where_cond::Where;

#[derive(Debug)]
pub struct QueryBuilder {}

impl QueryBuilder {
    pub fn select<S: ToString>(table: S) -> SelectBuilder {
        SelectBuilder::new(table)
    }

    /// `SELECT COUNT(*) FROM table`
    ///
    /// # Examples
    ///
    /// ```
    /// use uow_query::{QueryBuilder, Where};
    ///
    /// let sql = QueryBuilder::count("ta")
    ///     .where_cond(Where::raw("a = ?"))
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(&sql, "SELECT COUNT(*) FROM ta WHERE (a = ?)");
    /// ```
    pub fn count<S: ToString>(table: S) -> SelectBuilder {
        let mut builder = SelectBuilder::new(table);
        builder.column("COUNT(*)");
        builder
    }

    pub fn insert<S: ToString>(table: S) -> InsertBuilder {
        InsertBuilder::new(table)
    }

    pub fn update<S: ToString>(table: S) -> UpdateBuilder {
        UpdateBuilder::new(table)
    }

    pub fn delete<S: ToString>(table: S) -> DeleteBuilder {
        DeleteBuilder::new(table)
    }
}
