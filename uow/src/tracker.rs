//! # Change tracker
//!
//! Staged changes of one unit of work. Entries are kept in staging order and
//! identified by primary key, so the tracker doubles as the session's
//! identity map.

use std::any::TypeId;

use crate::{
    builder::{DeleteBuilder, InsertBuilder, UpdateBuilder},
    error::{Error, Result},
    history, Entity, Execution, Predicate, Row, ToSqlParamPair, Value,
};

type SqlParamPair = (String, Vec<Vec<Value>>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    Added,
    Unchanged,
    Modified,
    Deleted,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct EntityMeta {
    pub type_id: TypeId,
    pub table: &'static str,
    pub primary_keys: &'static [&'static str],
    pub auto_increment: Option<&'static str>,
}

impl EntityMeta {
    fn of<E: Entity>() -> Self {
        Self {
            type_id: TypeId::of::<E>(),
            table: E::TABLE_NAME,
            primary_keys: E::PRIMARY_KEYS,
            auto_increment: E::AUTO_INCREMENT,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub id: u64,
    pub meta: EntityMeta,
    pub values: Vec<(&'static str, Value)>,
    pub original: Option<Vec<(&'static str, Value)>>,
    pub state: EntityState,
    pub modified: Vec<&'static str>,
}

impl Entry {
    pub fn value(&self, col: &str) -> Option<&Value> {
        self.values.iter().find(|(c, _)| *c == col).map(|(_, v)| v)
    }

    pub fn original_value(&self, col: &str) -> Option<&Value> {
        self.original
            .as_ref()
            .and_then(|values| values.iter().find(|(c, _)| *c == col))
            .map(|(_, v)| v)
    }

    pub fn key(&self) -> Vec<Value> {
        self.meta
            .primary_keys
            .iter()
            .map(|key| self.value(key).cloned().unwrap_or(Value::Null))
            .collect()
    }

    fn set_value(&mut self, col: &'static str, value: Value) {
        match self.values.iter_mut().find(|(c, _)| *c == col) {
            Some((_, v)) => *v = value,
            None => self.values.push((col, value)),
        }
    }

    fn matches_key(&self, type_id: TypeId, key: &[Value]) -> bool {
        self.meta.type_id == type_id
            && self.meta.primary_keys.len() == key.len()
            && self
                .meta
                .primary_keys
                .iter()
                .zip(key)
                .all(|(col, v)| self.value(col).map(|cur| cur.matches(v)).unwrap_or(false))
    }

    fn mark_modified(&mut self, cols: &[&'static str]) {
        for col in cols {
            if !self.modified.contains(col) {
                self.modified.push(*col);
            }
        }
        if self.state != EntityState::Added && !self.modified.is_empty() {
            self.state = EntityState::Modified;
        }
    }

    /// Auto increment key not assigned yet
    fn is_key_generated(&self) -> bool {
        match self.meta.auto_increment.and_then(|col| self.value(col)) {
            Some(v) => v.is_null() || v.as_integer() == Some(0),
            None => false,
        }
    }

    fn to_row(&self) -> Row {
        Row::from_values(
            self.values
                .iter()
                .map(|(col, v)| (col.to_string(), v.clone()))
                .collect(),
        )
    }

    fn key_filter(&self) -> Predicate {
        self.meta
            .primary_keys
            .iter()
            .zip(self.key())
            .fold(Predicate::all(), |pred, (col, value)| {
                pred.and(Predicate::eq(*col, value))
            })
    }

    fn render(&self) -> Result<Vec<SqlParamPair>> {
        match self.state {
            EntityState::Unchanged => Ok(vec![]),
            EntityState::Added => {
                let skip = if self.is_key_generated() {
                    self.meta.auto_increment
                } else {
                    None
                };
                InsertBuilder::new(self.meta.table)
                    .values(
                        self.values
                            .iter()
                            .filter(|(col, _)| Some(*col) != skip)
                            .cloned(),
                    )
                    .to_sql_param_pair()
            }
            EntityState::Modified => {
                if self.modified.is_empty() {
                    return Ok(vec![]);
                }
                self.modified
                    .iter()
                    .fold(UpdateBuilder::new(self.meta.table), |builder, col| {
                        builder.set(*col, self.value(col).cloned().unwrap_or(Value::Null))
                    })
                    .filter(self.key_filter())
                    .to_sql_param_pair()
            }
            EntityState::Deleted => DeleteBuilder::new(self.meta.table)
                .filter(self.key_filter())
                .to_sql_param_pair(),
        }
    }
}

/// Result of a local identity-map lookup
pub(crate) enum Local<E> {
    Found(E),
    Deleted,
    Missing,
}

/// Statements rendered from the tracker, one parameter set per statement
#[derive(Debug, Default)]
pub(crate) struct SavePlan {
    pairs: Vec<SqlParamPair>,
    sources: Vec<Option<u64>>, // Entry id per statement, None for history rows
}

impl SavePlan {
    fn push(&mut self, source: Option<u64>, pairs: Vec<SqlParamPair>) {
        for pair in pairs {
            self.sources.push(source);
            self.pairs.push(pair);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> Vec<SqlParamPair> {
        self.pairs.clone()
    }
}

#[derive(Debug, Default)]
pub(crate) struct ChangeTracker {
    entries: Vec<Entry>,
    next_id: u64,
}

impl ChangeTracker {
    fn push(
        &mut self,
        meta: EntityMeta,
        values: Vec<(&'static str, Value)>,
        state: EntityState,
        modified: Vec<&'static str>,
    ) {
        self.next_id += 1;
        let original = match state {
            EntityState::Added | EntityState::Modified => None,
            _ => Some(values.clone()),
        };
        log::debug!("Track {} entry {} as {:?}", meta.table, self.next_id, state);

        self.entries.push(Entry {
            id: self.next_id,
            meta,
            values,
            original,
            state,
            modified,
        });
    }

    fn position<E: Entity>(&self, key: &[Value]) -> Option<usize> {
        let type_id = TypeId::of::<E>();
        self.entries
            .iter()
            .position(|entry| entry.matches_key(type_id, key))
    }

    pub fn add<E: Entity>(&mut self, entity: &E) {
        self.push(
            EntityMeta::of::<E>(),
            entity.to_values(),
            EntityState::Added,
            vec![],
        );
    }

    pub fn find_local<E: Entity>(&self, key: &[Value]) -> Result<Local<E>> {
        match self.position::<E>(key).map(|index| &self.entries[index]) {
            Some(entry) if entry.state == EntityState::Deleted => Ok(Local::Deleted),
            Some(entry) => Ok(Local::Found(E::from_row(&entry.to_row())?)),
            None => Ok(Local::Missing),
        }
    }

    /// Register a loaded entity as unchanged. A tracked copy wins over the
    /// loaded one, a pending delete hides it.
    pub fn track_loaded<E: Entity>(&mut self, entity: E) -> Result<Option<E>> {
        match self.find_local::<E>(&entity.key_values())? {
            Local::Found(local) => Ok(Some(local)),
            Local::Deleted => Ok(None),
            Local::Missing => {
                self.push(
                    EntityMeta::of::<E>(),
                    entity.to_values(),
                    EntityState::Unchanged,
                    vec![],
                );
                Ok(Some(entity))
            }
        }
    }

    pub fn delete<E: Entity>(&mut self, entity: &E) {
        match self.position::<E>(&entity.key_values()) {
            Some(index) if self.entries[index].state == EntityState::Added => {
                let entry = self.entries.remove(index);
                log::debug!("Untrack added {} entry {}", entry.meta.table, entry.id);
            }
            Some(index) => {
                let entry = &mut self.entries[index];
                entry.state = EntityState::Deleted;
                log::debug!("Mark {} entry {} as Deleted", entry.meta.table, entry.id);
            }
            None => self.push(
                EntityMeta::of::<E>(),
                entity.to_values(),
                EntityState::Deleted,
                vec![],
            ),
        }
    }

    /// Overwrite every non-key column except `avoid`
    pub fn update<E: Entity>(&mut self, entity: &E, avoid: &[&str]) -> Result<()> {
        validate_avoid::<E>(avoid)?;
        let columns = writable_columns::<E>(avoid);
        let values = entity.to_values();

        match self.position::<E>(&entity.key_values()) {
            Some(index) => {
                let entry = &mut self.entries[index];
                for (col, value) in values {
                    if columns.contains(&col) {
                        entry.set_value(col, value);
                    }
                }
                entry.mark_modified(&columns);
                log::debug!("Update {} entry {} {:?}", entry.meta.table, entry.id, entry.state);
            }
            None => {
                let state = if columns.is_empty() {
                    EntityState::Unchanged
                } else {
                    EntityState::Modified
                };
                self.push(EntityMeta::of::<E>(), values, state, columns);
            }
        }

        Ok(())
    }

    /// Copy the non-key columns of `entity` into the tracked entry of `key`.
    /// Without an avoid list only changed columns become modified.
    pub fn apply<E: Entity>(
        &mut self,
        key: &[Value],
        entity: &E,
        avoid: Option<&[&str]>,
    ) -> Result<()> {
        if let Some(avoid) = avoid {
            validate_avoid::<E>(avoid)?;
        }
        let columns = writable_columns::<E>(avoid.unwrap_or(&[]));
        let index = self
            .position::<E>(key)
            .ok_or_else(|| Error::entity_not_found(E::NAME))?;

        let entry = &mut self.entries[index];
        let mut changed = Vec::new();
        for (col, value) in entity.to_values() {
            if !columns.contains(&col) {
                continue;
            }

            let differs = entry
                .value(col)
                .map(|cur| !cur.matches(&value))
                .unwrap_or(true);
            if avoid.is_some() || differs {
                changed.push(col);
            }
            entry.set_value(col, value);
        }
        entry.mark_modified(&changed);
        log::debug!(
            "Apply {:?} to {} entry {} {:?}",
            changed,
            entry.meta.table,
            entry.id,
            entry.state
        );

        Ok(())
    }

    pub fn has_changes(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.state != EntityState::Unchanged)
    }

    /// Predicate excluding the rows of `E` that are pending delete
    pub fn hide_deleted<E: Entity>(&self) -> Predicate {
        let type_id = TypeId::of::<E>();
        self.entries
            .iter()
            .filter(|entry| entry.meta.type_id == type_id && entry.state == EntityState::Deleted)
            .fold(Predicate::all(), |pred, entry| {
                pred.and(entry.key_filter().not())
            })
    }

    pub fn state<E: Entity>(&self, key: &[Value]) -> Option<EntityState> {
        self.position::<E>(key)
            .map(|index| self.entries[index].state)
    }

    pub fn plan(&self, ensure_auto_history: bool) -> Result<SavePlan> {
        let mut plan = SavePlan::default();

        for entry in &self.entries {
            let pairs = entry.render()?;
            if pairs.is_empty() {
                continue;
            }
            plan.push(Some(entry.id), pairs);

            if ensure_auto_history
                && matches!(entry.state, EntityState::Modified | EntityState::Deleted)
            {
                plan.push(None, history::render(entry)?);
            }
        }

        Ok(plan)
    }

    /// Record a successful save of `plan`
    pub fn complete(&mut self, plan: &SavePlan, executions: &[Execution], accept: bool) {
        for (source, execution) in plan.sources.iter().zip(executions) {
            let entry = match source.and_then(|id| self.entries.iter_mut().find(|e| e.id == id)) {
                Some(entry) => entry,
                None => continue,
            };

            if entry.state == EntityState::Added && entry.is_key_generated() {
                if let Some(col) = entry.meta.auto_increment {
                    entry.set_value(col, Value::I64(execution.last_insert_id));
                }
            }
        }

        if accept {
            let saved = plan.sources.iter().flatten().collect::<Vec<_>>();
            self.accept(|entry| saved.contains(&&entry.id));
        }
    }

    pub fn accept_all(&mut self) {
        self.accept(|_| true);
    }

    fn accept<F: Fn(&Entry) -> bool>(&mut self, filter: F) {
        self.entries
            .retain(|entry| !(entry.state == EntityState::Deleted && filter(entry)));

        for entry in self.entries.iter_mut().filter(|entry| filter(entry)) {
            entry.state = EntityState::Unchanged;
            entry.modified.clear();
            entry.original = Some(entry.values.clone());
        }
        log::debug!("Accept changes, {} entries tracked", self.entries.len());
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

fn validate_avoid<E: Entity>(avoid: &[&str]) -> Result<()> {
    match avoid
        .iter()
        .find(|name| !E::COLUMNS.iter().any(|col| col == *name))
    {
        Some(name) => Err(crate::error::argument!(
            "Unknown column `{}` on {}",
            name,
            E::NAME
        )),
        None => Ok(()),
    }
}

fn writable_columns<E: Entity>(avoid: &[&str]) -> Vec<&'static str> {
    E::COLUMNS
        .iter()
        .filter(|col| !E::PRIMARY_KEYS.contains(col) && !avoid.contains(col))
        .copied()
        .collect()
}
