use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{json, Map, Value as JsonValue};

use crate::{
    builder::InsertBuilder,
    error::Result,
    tracker::{EntityState, Entry},
    Entity, ToSqlParamPair, Value,
};

/// Audit row written by `UnitOfWork::save_changes(true, ..)` for every
/// modified or deleted entity. Create the table with
/// `ensure_created::<AutoHistory>()`.
#[derive(Debug, Clone, Default, PartialEq, Entity)]
#[uow(table_name = "auto_history", index = [table_name, row_id])]
pub struct AutoHistory {
    #[uow(primary_key, auto_increment)]
    pub id: i64,
    pub row_id: String,
    #[uow(length = 128)]
    pub table_name: String,
    /// JSON, `{"before": {..}, "after": {..}}` for updates, the full row for deletes
    pub changed: String,
    #[uow(length = 16)]
    pub kind: String,
    /// Unix seconds
    pub created: i64,
}

/// Insert statement recording the change of `entry`
pub(crate) fn render(entry: &Entry) -> Result<Vec<(String, Vec<Vec<Value>>)>> {
    let changed = match entry.state {
        EntityState::Modified => {
            let before = entry
                .modified
                .iter()
                .map(|col| (*col, entry.original_value(col)))
                .collect::<Vec<_>>();
            let after = entry
                .modified
                .iter()
                .map(|col| (*col, entry.value(col)))
                .collect::<Vec<_>>();

            json!({ "before": to_json_object(before), "after": to_json_object(after) })
        }
        EntityState::Deleted => {
            to_json_object(entry.values.iter().map(|(col, v)| (*col, Some(v))))
        }
        _ => return Ok(vec![]),
    };

    let created = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default();
    let history = AutoHistory {
        id: 0,
        row_id: key_text(&entry.key()),
        table_name: entry.meta.table.to_string(),
        changed: changed.to_string(),
        kind: format!("{:?}", entry.state),
        created,
    };

    InsertBuilder::new(AutoHistory::TABLE_NAME)
        .values(
            history
                .to_values()
                .into_iter()
                .filter(|(col, _)| Some(*col) != AutoHistory::AUTO_INCREMENT),
        )
        .to_sql_param_pair()
}

fn to_json_object<'a, I>(values: I) -> JsonValue
where
    I: IntoIterator<Item = (&'static str, Option<&'a Value>)>,
{
    let map = values
        .into_iter()
        .map(|(col, v)| (col.to_string(), v.map(to_json).unwrap_or(JsonValue::Null)))
        .collect::<Map<_, _>>();

    JsonValue::Object(map)
}

fn to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(v) => json!(v),
        Value::U8(v) => json!(v),
        Value::I8(v) => json!(v),
        Value::U16(v) => json!(v),
        Value::I16(v) => json!(v),
        Value::U32(v) => json!(v),
        Value::I32(v) => json!(v),
        Value::U64(v) => json!(v),
        Value::I64(v) => json!(v),
        Value::F32(v) => json!(v),
        Value::F64(v) => json!(v),
        Value::Str(v) => json!(v),
        Value::Bytes(v) => json!(v),
    }
}

/// Primary key as text, composite keys as a JSON array
fn key_text(key: &[Value]) -> String {
    match key {
        [single] => match to_json(single) {
            JsonValue::String(s) => s,
            other => other.to_string(),
        },
        _ => JsonValue::Array(key.iter().map(to_json).collect()).to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_key_text() {
        assert_eq!(key_text(&[Value::I64(3)]), "3");
        assert_eq!(key_text(&[Value::Str("a".into())]), "a");
        assert_eq!(
            key_text(&[Value::U32(1), Value::Str("b".into())]),
            r#"[1,"b"]"#
        );
    }

    #[test]
    fn test_json_object() {
        let a = Value::Str("x".into());
        let obj = to_json_object(vec![("name", Some(&a)), ("age", None)]);

        assert_eq!(obj, json!({"name": "x", "age": null}));
    }
}
