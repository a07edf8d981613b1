use std::{marker::PhantomData, sync::Arc};

use crate::{
    builder::FindBuilder, error::Result, unit_of_work::Session, Entity, Page, Predicate,
};

/// Listing over one entity type. Builder methods are cheap, nothing runs
/// before a terminal (`all`, `first`, `count`, `page`).
///
/// ```ignore
/// let page = repo
///     .filter(Predicate::ge("age", 18))
///     .order_by("name", true)
///     .page(2, 20)
///     .await?;
/// ```
pub struct Query<E: Entity> {
    session: Arc<Session>,
    predicate: Predicate,
    orders: Vec<(String, bool)>,
    includes: Vec<String>,
    tracking: bool,
    _marker: PhantomData<E>,
}

impl<E: Entity> Query<E> {
    pub(crate) fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            predicate: Predicate::all(),
            orders: vec![],
            includes: vec![],
            tracking: false,
            _marker: PhantomData,
        }
    }

    /// AND `predicate` with the current filter
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = self.predicate.and(predicate);
        self
    }

    pub fn order_by(mut self, column: &str, is_asc: bool) -> Self {
        self.orders.push((column.to_string(), is_asc));
        self
    }

    pub fn include(mut self, relation: &str) -> Self {
        self.includes.push(relation.to_string());
        self
    }

    /// Register results in the session's identity map
    pub fn tracked(mut self) -> Self {
        self.tracking = true;
        self
    }

    pub fn select<R, F>(self, projection: F) -> Projection<E, R, F>
    where
        F: Fn(E) -> R,
    {
        Projection {
            query: self,
            projection,
            _marker: PhantomData,
        }
    }

    pub async fn all(&self) -> Result<Vec<E>> {
        self.load(self.finder()?).await
    }

    pub async fn first(&self) -> Result<Option<E>> {
        let list = self.load(self.finder()?.limit(1, 0)).await?;

        Ok(list.into_iter().next())
    }

    /// Matching rows, ordering and paging ignored. A tracked query does not
    /// count rows pending delete.
    pub async fn count(&self) -> Result<u64> {
        let predicate = self.predicate()?;
        let conn = self.session.connection()?;

        FindBuilder::<E>::new().filter(predicate).count(&conn).await
    }

    /// 1-indexed page. The total is counted over the filter alone, a page
    /// past the end is empty.
    pub async fn page(&self, page_no: u64, page_size: u64) -> Result<Page<E>> {
        if page_no == 0 || page_size == 0 {
            return Err(crate::error::argument!(
                "Invalid page {} of size {}",
                page_no,
                page_size
            ));
        }

        let finder = self.finder()?;
        let total_count = self.count().await?;
        let offset = (page_no - 1).saturating_mul(page_size);
        let items = if offset >= total_count {
            vec![]
        } else {
            // Sqlite binds LIMIT and OFFSET as i64
            let limit = page_size.min(i64::MAX as u64);
            self.load(finder.limit(limit, offset)).await?
        };

        Ok(Page {
            total_count,
            page_no,
            page_size,
            items,
        })
    }

    fn finder(&self) -> Result<FindBuilder<E>> {
        for (column, _) in &self.orders {
            if !E::COLUMNS.iter().any(|col| *col == column.as_str()) {
                return Err(crate::error::argument!(
                    "Unknown order column `{}` on {}",
                    column,
                    E::NAME
                ));
            }
        }
        for relation in &self.includes {
            if !E::RELATIONS.iter().any(|name| *name == relation.as_str()) {
                return Err(crate::error::argument!(
                    "Unknown relation `{}` on {}",
                    relation,
                    E::NAME
                ));
            }
        }

        Ok(self
            .orders
            .iter()
            .fold(FindBuilder::new().filter(self.predicate()?), |finder, (col, is_asc)| {
                finder.order_by(col, *is_asc)
            }))
    }

    /// Filter sent to the store, a tracked query leaves pending deletes out
    /// so limits apply to visible rows only
    fn predicate(&self) -> Result<Predicate> {
        if !self.tracking {
            return Ok(self.predicate.clone());
        }

        let hidden = self.session.tracker()?.hide_deleted::<E>();
        Ok(self.predicate.clone().and(hidden))
    }

    async fn load(&self, finder: FindBuilder<E>) -> Result<Vec<E>> {
        let conn = self.session.connection()?;
        let mut list = finder.execute(&conn).await?;

        if self.tracking {
            let mut tracker = self.session.tracker()?;
            let mut tracked = Vec::with_capacity(list.len());
            for entity in list {
                if let Some(entity) = tracker.track_loaded(entity)? {
                    tracked.push(entity);
                }
            }
            list = tracked;
        }

        for entity in list.iter_mut() {
            for relation in &self.includes {
                entity.load_relation(&conn, relation).await?;
            }
        }

        Ok(list)
    }
}

/// A query whose results are mapped client side after loading
pub struct Projection<E: Entity, R, F> {
    query: Query<E>,
    projection: F,
    _marker: PhantomData<fn() -> R>,
}

impl<E, R, F> Projection<E, R, F>
where
    E: Entity,
    F: Fn(E) -> R,
{
    pub async fn all(&self) -> Result<Vec<R>> {
        let list = self.query.all().await?;

        Ok(list.into_iter().map(&self.projection).collect())
    }

    pub async fn first(&self) -> Result<Option<R>> {
        let entity = self.query.first().await?;

        Ok(entity.map(&self.projection))
    }

    pub async fn page(&self, page_no: u64, page_size: u64) -> Result<Page<R>> {
        let page = self.query.page(page_no, page_size).await?;

        Ok(page.map(&self.projection))
    }
}
