use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex, MutexGuard,
};

use crate::{error::Result, tracker::ChangeTracker, Connection, SessionOptions};

/// State shared by a unit of work and its repositories
pub(crate) struct Session {
    pub id: u64,
    pub options: SessionOptions,
    conn: Mutex<Option<Connection>>,
    tracker: Mutex<ChangeTracker>,
    disposed: AtomicBool,
}

impl Session {
    pub fn new(id: u64, conn: Connection, options: SessionOptions) -> Self {
        Self {
            id,
            options,
            conn: Mutex::new(Some(conn)),
            tracker: Mutex::new(ChangeTracker::default()),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn ensure_open(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(crate::error::disposed!("Unit of work {} is disposed", self.id));
        }

        Ok(())
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub fn connection(&self) -> Result<Connection> {
        self.ensure_open()?;

        let conn = self
            .conn
            .lock()
            .map_err(|e| crate::error::runtime!("Session lock error: {}", e))?;
        conn.clone()
            .ok_or_else(|| crate::error::disposed!("Unit of work {} is disposed", self.id))
    }

    /// Lock the change tracker. The guard must not live across an await.
    pub fn tracker(&self) -> Result<MutexGuard<'_, ChangeTracker>> {
        self.ensure_open()?;

        self.tracker
            .lock()
            .map_err(|e| crate::error::runtime!("Tracker lock error: {}", e))
    }

    /// Returns false when already disposed
    pub fn dispose(&self) -> bool {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return false;
        }

        if let Ok(mut conn) = self.conn.lock() {
            conn.take();
        }
        if let Ok(mut tracker) = self.tracker.lock() {
            tracker.clear();
        }

        true
    }
}
