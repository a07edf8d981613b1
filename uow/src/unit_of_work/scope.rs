use crate::{error::Result, Connection, Transaction};

/// Ambient transaction over every connection taking part in one
/// `save_changes`. Each distinct connection is opened once. Dropping the
/// scope before `commit` or `rollback` drops its transactions, which roll
/// back on the runtime.
pub(crate) struct TransactionScope {
    enlisted: Vec<(Connection, Transaction)>,
}

impl TransactionScope {
    /// Begin on each distinct connection in driver address order, so scopes
    /// sharing connections always take their gates in the same order
    pub async fn begin<'a, I>(conns: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Connection>,
    {
        let mut distinct = Vec::<Connection>::new();
        for conn in conns {
            if !distinct.iter().any(|c| c.same_connection(conn)) {
                distinct.push(conn.clone());
            }
        }
        distinct.sort_by_key(Connection::key);

        let mut scope = Self {
            enlisted: Vec::with_capacity(distinct.len()),
        };
        for conn in distinct {
            match conn.begin().await {
                Ok(tx) => scope.enlisted.push((conn, tx)),
                Err(e) => {
                    scope.rollback().await;
                    return Err(e);
                }
            }
        }
        log::debug!("Scope enlisted {} connections", scope.enlisted.len());

        Ok(scope)
    }

    /// Transaction opened for `conn`
    pub fn transaction(&self, conn: &Connection) -> Result<&Transaction> {
        self.enlisted
            .iter()
            .find(|(c, _)| c.same_connection(conn))
            .map(|(_, tx)| tx)
            .ok_or_else(|| crate::error::runtime!("Connection is not enlisted in the scope"))
    }

    /// Commit in enlist order. When a commit fails the remaining
    /// connections are rolled back, the failed one rolls back by itself.
    pub async fn commit(self) -> Result<()> {
        let mut enlisted = self.enlisted.into_iter();

        while let Some((_, tx)) = enlisted.next() {
            if let Err(e) = tx.commit().await {
                log::debug!("Scope commit failed: {}", e);
                rollback_all(enlisted).await;
                return Err(e);
            }
        }
        log::debug!("Scope committed");

        Ok(())
    }

    pub async fn rollback(self) {
        rollback_all(self.enlisted).await;
        log::debug!("Scope rolled back");
    }
}

async fn rollback_all<I>(enlisted: I)
where
    I: IntoIterator<Item = (Connection, Transaction)>,
{
    for (_, tx) in enlisted {
        if let Err(e) = tx.rollback().await {
            log::warn!("Rollback failed: {}", e);
        }
    }
}
