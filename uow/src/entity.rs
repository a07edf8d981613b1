use crate::{
    builder::FindBuilder, error::Result, Connection, Predicate, Row, TableInfo, Value,
};

/// Column accessor pair, generated per field by `#[derive(Entity)]`
pub struct Field<E> {
    pub name: &'static str,
    pub get: fn(&E) -> Value,
    pub set: fn(&mut E, &Value) -> Result<()>,
}

#[async_trait::async_trait]
pub trait Entity: Sized + Send + Sync + 'static {
    type PrimaryKey: Send + Sync;

    /// Type name, used in error messages
    const NAME: &'static str;

    /// Table name
    const TABLE_NAME: &'static str;

    /// Column names
    const COLUMNS: &'static [&'static str];

    /// Primary key column names, in key order
    const PRIMARY_KEYS: &'static [&'static str];

    /// Auto increment column, filled by the database on insert
    const AUTO_INCREMENT: Option<&'static str>;

    /// Relation field names accepted by `include`
    const RELATIONS: &'static [&'static str];

    /// Table info
    const INFO: TableInfo;

    /// Getter and setter per column
    const FIELDS: &'static [Field<Self>];

    /// Convert database row to self, every column must be present
    fn from_row(row: &Row) -> Result<Self>;

    fn key_to_values(key: &Self::PrimaryKey) -> Vec<Value>;

    /// Load a relation field from the database
    async fn load_relation(&mut self, conn: &Connection, relation: &str) -> Result<()>;

    fn to_values(&self) -> Vec<(&'static str, Value)> {
        Self::FIELDS
            .iter()
            .map(|field| (field.name, (field.get)(self)))
            .collect()
    }

    fn key_values(&self) -> Vec<Value> {
        Self::PRIMARY_KEYS
            .iter()
            .filter_map(|key| Self::FIELDS.iter().find(|field| field.name == *key))
            .map(|field| (field.get)(self))
            .collect()
    }
}

/// Rows of `R` whose `column` equals `value`
pub async fn fetch_related<R: Entity>(
    conn: &Connection,
    column: &str,
    value: Value,
) -> Result<Vec<R>> {
    FindBuilder::<R>::new()
        .filter(Predicate::eq(column, value))
        .execute(conn)
        .await
}

/// Predicate matching the primary key of `E`
pub(crate) fn key_predicate<E: Entity>(values: Vec<Value>) -> Predicate {
    E::PRIMARY_KEYS
        .iter()
        .zip(values)
        .fold(Predicate::all(), |pred, (col, value)| {
            pred.and(Predicate::eq(*col, value))
        })
}
