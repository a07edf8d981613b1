mod scope;
mod session;

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use crate::{
    error::Result, tracker::SavePlan, Connection, Entity, EntityState, Execution, QueryExecutor,
    Repository, SessionOptions,
};

use scope::TransactionScope;
pub(crate) use session::Session;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// One session over a connection: a cache of repositories sharing a change
/// tracker, saved together by `save` or `save_changes`.
pub struct UnitOfWork {
    session: Arc<Session>,
    repositories: Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl UnitOfWork {
    pub fn new(conn: Connection) -> Self {
        Self::with_options(conn, SessionOptions::default())
    }

    pub fn with_options(conn: Connection, options: SessionOptions) -> Self {
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        log::debug!("Open unit of work {}", id);

        Self {
            session: Arc::new(Session::new(id, conn, options)),
            repositories: Mutex::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> u64 {
        self.session.id
    }

    pub fn is_disposed(&self) -> bool {
        self.session.is_disposed()
    }

    /// Repository of `E`, created on first use and cached for the lifetime
    /// of the session
    pub fn repository<E: Entity>(&self) -> Result<Arc<Repository<E>>> {
        self.session.ensure_open()?;

        let repo = self
            .repositories
            .lock()
            .map_err(|e| crate::error::runtime!("Repository cache lock error: {}", e))?
            .entry(TypeId::of::<E>())
            .or_insert_with(|| {
                Arc::new(Repository::<E>::new(self.session.clone())) as Arc<dyn Any + Send + Sync>
            })
            .clone();

        repo.downcast::<Repository<E>>().map_err(|_| {
            crate::error::runtime!("Cached repository of {} has another type", E::NAME)
        })
    }

    pub fn executor(&self) -> Result<QueryExecutor> {
        self.session.ensure_open()?;

        Ok(QueryExecutor::new(self.session.clone()))
    }

    /// Create the table and indexes of `E` when missing
    pub async fn ensure_created<E: Entity>(&self) -> Result<()> {
        self.session.connection()?.init_table(&E::INFO).await
    }

    pub fn has_changes(&self) -> Result<bool> {
        Ok(self.session.tracker()?.has_changes())
    }

    /// Tracked state of the entity stored under `key`
    pub fn entry_state<E: Entity>(&self, key: &E::PrimaryKey) -> Result<Option<EntityState>> {
        Ok(self.session.tracker()?.state::<E>(&E::key_to_values(key)))
    }

    /// Write staged changes and accept them, returns the affected rows
    pub async fn save(&self) -> Result<u64> {
        self.save_with(true).await
    }

    /// Write staged changes in one transaction. Without `accept_all_changes`
    /// the entries keep their state until `accept_all_changes` is called.
    pub async fn save_with(&self, accept_all_changes: bool) -> Result<u64> {
        let conn = self.session.connection()?;
        let plan = self.session.tracker()?.plan(false)?;
        if plan.is_empty() {
            return Ok(0);
        }

        let executions = conn.execute_many(plan.pairs()).await?;
        self.session
            .tracker()?
            .complete(&plan, &executions, accept_all_changes);

        let count = affected(&executions);
        log::debug!("Unit of work {} saved, {} rows affected", self.id(), count);

        Ok(count)
    }

    pub fn accept_all_changes(&self) -> Result<()> {
        self.session.tracker()?.accept_all();

        Ok(())
    }

    /// Save this session together with `others` under one transaction scope.
    /// The other sessions are written first, in order, then this one.
    /// Either every connection commits or all of them roll back.
    pub async fn save_changes(
        &self,
        ensure_auto_history: bool,
        others: &[&UnitOfWork],
    ) -> Result<u64> {
        let mut sessions = Vec::<&Arc<Session>>::with_capacity(others.len() + 1);
        for session in others.iter().map(|uow| &uow.session).chain([&self.session]) {
            if !sessions.iter().any(|s| s.id == session.id) {
                sessions.push(session);
            }
        }

        let mut work = Vec::<(&Arc<Session>, Connection, SavePlan)>::with_capacity(sessions.len());
        for session in sessions {
            let conn = session.connection()?;
            let plan = session.tracker()?.plan(ensure_auto_history)?;
            work.push((session, conn, plan));
        }
        if work.iter().all(|(_, _, plan)| plan.is_empty()) {
            return Ok(0);
        }

        let scope = TransactionScope::begin(work.iter().map(|(_, conn, _)| conn)).await?;
        let executions = match execute_plans(&scope, &work).await {
            Ok(executions) => executions,
            Err(e) => {
                scope.rollback().await;
                return Err(e);
            }
        };
        scope.commit().await?;

        let mut count = 0;
        for ((session, _, plan), executions) in work.iter().zip(&executions) {
            session.tracker()?.complete(plan, executions, true);
            count += affected(executions);
        }
        log::debug!(
            "Unit of work {} saved {} sessions, {} rows affected",
            self.id(),
            work.len(),
            count
        );

        Ok(count)
    }

    /// Drop the connection, the repositories and every staged change.
    /// Later calls do nothing.
    pub fn dispose(&self) {
        if !self.session.dispose() {
            return;
        }

        if let Ok(mut repositories) = self.repositories.lock() {
            repositories.clear();
        }
        log::debug!("Dispose unit of work {}", self.id());
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        self.dispose();
    }
}

async fn execute_plans(
    scope: &TransactionScope,
    work: &[(&Arc<Session>, Connection, SavePlan)],
) -> Result<Vec<Vec<Execution>>> {
    let mut list = Vec::with_capacity(work.len());
    for (session, conn, plan) in work {
        if plan.is_empty() {
            list.push(vec![]);
            continue;
        }

        log::debug!("Execute staged changes of unit of work {}", session.id);
        list.push(scope.transaction(conn)?.execute_many(plan.pairs()).await?);
    }

    Ok(list)
}

fn affected(executions: &[Execution]) -> u64 {
    executions.iter().map(|e| e.rows_affected).sum()
}

/// Creates units of work over one shared connection
#[derive(Clone)]
pub struct UnitOfWorkFactory {
    conn: Connection,
    options: SessionOptions,
}

impl UnitOfWorkFactory {
    pub fn new(conn: Connection) -> Self {
        Self::with_options(conn, SessionOptions::default())
    }

    pub fn with_options(conn: Connection, options: SessionOptions) -> Self {
        Self { conn, options }
    }

    pub async fn connect(url: &str) -> Result<Self> {
        Ok(Self::new(Connection::connect(url).await?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Fresh unit of work with its own tracker and repository cache
    pub fn create(&self) -> UnitOfWork {
        UnitOfWork::with_options(self.conn.clone(), self.options)
    }
}
