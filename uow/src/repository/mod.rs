mod query;

use std::{marker::PhantomData, sync::Arc};

use crate::{
    builder::FindBuilder,
    entity::key_predicate,
    error::{Error, Result},
    tracker::Local,
    unit_of_work::Session,
    Entity, Predicate,
};

pub use query::{Projection, Query};

/// Generic data access for one entity type, bound to the unit of work that
/// created it. Staging methods only touch the session's change tracker,
/// nothing reaches the database before `UnitOfWork::save`.
pub struct Repository<E: Entity> {
    session: Arc<Session>,
    _marker: PhantomData<E>,
}

impl<E: Entity> Repository<E> {
    pub(crate) fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            _marker: PhantomData,
        }
    }

    /// Stage an insert. Key conflicts surface on save.
    pub fn add(&self, entity: E) -> Result<E> {
        self.session.tracker()?.add(&entity);

        Ok(entity)
    }

    pub fn add_range<I>(&self, entities: I) -> Result<()>
    where
        I: IntoIterator<Item = E>,
    {
        let mut tracker = self.session.tracker()?;
        for entity in entities {
            tracker.add(&entity);
        }

        Ok(())
    }

    /// Load by primary key without tracking
    pub async fn find(&self, key: &E::PrimaryKey) -> Result<Option<E>> {
        let conn = self.session.connection()?;

        FindBuilder::<E>::new()
            .filter(key_predicate::<E>(E::key_to_values(key)))
            .first(&conn)
            .await
    }

    /// Load by primary key through the identity map. A tracked copy is
    /// returned without a query, a loaded row is tracked as unchanged.
    pub async fn find_tracked(&self, key: &E::PrimaryKey) -> Result<Option<E>> {
        let values = E::key_to_values(key);
        let local = self.session.tracker()?.find_local::<E>(&values)?;
        match local {
            Local::Found(entity) => return Ok(Some(entity)),
            Local::Deleted => return Ok(None),
            Local::Missing => {}
        }

        let conn = self.session.connection()?;
        let loaded = FindBuilder::<E>::new()
            .filter(key_predicate::<E>(values))
            .first(&conn)
            .await?;

        match loaded {
            Some(entity) => self.session.tracker()?.track_loaded(entity),
            None => Ok(None),
        }
    }

    /// First match without tracking
    pub async fn find_by(&self, predicate: Predicate) -> Result<Option<E>> {
        self.filter(predicate).first().await
    }

    pub async fn find_by_tracked(&self, predicate: Predicate) -> Result<Option<E>> {
        self.filter(predicate).tracked().first().await
    }

    /// First match passed through `projection`
    pub async fn find_project<R, F>(&self, predicate: Predicate, projection: F) -> Result<Option<R>>
    where
        F: Fn(E) -> R,
    {
        self.filter(predicate).select(projection).first().await
    }

    /// All matches without tracking
    pub async fn get(&self, predicate: Predicate) -> Result<Vec<E>> {
        self.filter(predicate).all().await
    }

    pub fn query(&self) -> Query<E> {
        Query::new(self.session.clone())
    }

    pub fn filter(&self, predicate: Predicate) -> Query<E> {
        self.query().filter(predicate)
    }

    /// Query loading the named relation field of every result
    pub fn include(&self, relation: &str) -> Query<E> {
        self.query().include(relation)
    }

    /// Stage the delete of the entity stored under `key`
    pub async fn delete(&self, key: &E::PrimaryKey) -> Result<E> {
        let entity = self
            .find_tracked(key)
            .await?
            .ok_or_else(|| Error::entity_not_found(E::NAME))?;
        self.session.tracker()?.delete(&entity);

        Ok(entity)
    }

    /// Stage the delete of the first match
    pub async fn delete_by(&self, predicate: Predicate) -> Result<E> {
        let entity = self
            .find_by_tracked(predicate)
            .await?
            .ok_or_else(|| Error::entity_not_found(E::NAME))?;
        self.session.tracker()?.delete(&entity);

        Ok(entity)
    }

    /// Stage the delete of every match, returns how many were staged
    pub async fn delete_range_by(&self, predicate: Predicate) -> Result<u64> {
        let list = self.filter(predicate).tracked().all().await?;
        if list.is_empty() {
            return Err(Error::not_found());
        }

        let mut tracker = self.session.tracker()?;
        for entity in &list {
            tracker.delete(entity);
        }

        Ok(list.len() as u64)
    }

    /// Stage a delete without loading. An entity still pending insert is
    /// simply dropped from the tracker.
    pub fn delete_entity(&self, entity: &E) -> Result<()> {
        self.session.tracker()?.delete(entity);

        Ok(())
    }

    /// An empty list stages nothing
    pub fn delete_range(&self, entities: &[E]) -> Result<()> {
        let mut tracker = self.session.tracker()?;
        for entity in entities {
            tracker.delete(entity);
        }

        Ok(())
    }

    /// Stage a full overwrite of every non-key column
    pub fn update(&self, entity: &E) -> Result<()> {
        self.session.tracker()?.update(entity, &[])
    }

    /// Stage an overwrite of every non-key column not named in `avoid`
    pub fn update_except(&self, entity: &E, avoid: &[&str]) -> Result<()> {
        self.session.tracker()?.update(entity, avoid)
    }

    pub fn update_range(&self, entities: &[E]) -> Result<()> {
        self.update_range_except(entities, &[])
    }

    pub fn update_range_except(&self, entities: &[E], avoid: &[&str]) -> Result<()> {
        let mut tracker = self.session.tracker()?;
        for entity in entities {
            tracker.update(entity, avoid)?;
        }

        Ok(())
    }

    /// Copy `entity` onto the stored row of `key`, only changed columns
    /// are written on save
    pub async fn update_by_key(&self, key: &E::PrimaryKey, entity: &E) -> Result<()> {
        self.apply(key, entity, None).await
    }

    pub async fn update_by_key_except(
        &self,
        key: &E::PrimaryKey,
        entity: &E,
        avoid: &[&str],
    ) -> Result<()> {
        self.apply(key, entity, Some(avoid)).await
    }

    async fn apply(&self, key: &E::PrimaryKey, entity: &E, avoid: Option<&[&str]>) -> Result<()> {
        if self.find_tracked(key).await?.is_none() {
            return Err(Error::entity_not_found(E::NAME));
        }

        self.session
            .tracker()?
            .apply::<E>(&E::key_to_values(key), entity, avoid)
    }
}
