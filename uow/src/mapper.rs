use crate::{error::Result, Entity, MaterializePolicy, Row};

/// Builds entities from arbitrary result rows by matching column names to
/// fields. Columns without a field are ignored, fields without a column
/// or with a NULL value keep their default.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityMapper {
    policy: MaterializePolicy,
}

impl EntityMapper {
    pub fn new(policy: MaterializePolicy) -> Self {
        Self { policy }
    }

    pub fn map<E: Entity + Default>(&self, row: &Row) -> Result<E> {
        let mut entity = E::default();

        for field in E::FIELDS {
            let value = match row.value(field.name) {
                Some(v) if !v.is_null() => v,
                _ => continue,
            };

            if let Err(e) = (field.set)(&mut entity, value) {
                match self.policy {
                    MaterializePolicy::Lenient => {
                        log::debug!("Skip {}.{}: {}", E::NAME, field.name, e);
                    }
                    MaterializePolicy::Strict => return Err(e),
                }
            }
        }

        Ok(entity)
    }

    pub fn map_all<E: Entity + Default>(&self, rows: &[Row]) -> Result<Vec<E>> {
        rows.iter().map(|row| self.map(row)).collect()
    }
}
