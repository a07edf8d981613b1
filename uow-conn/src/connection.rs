use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{Driver, Execution, Result, Row, TableInfo, Value};

/// Shared handle to one driver. Every statement waits on the connection gate,
/// which an open `Transaction` holds until it commits or rolls back.
#[derive(Clone)]
pub struct Connection {
    driver: Arc<dyn Driver>,
    gate: Arc<Mutex<()>>,
}

impl Connection {
    /// # Open connect
    ///
    /// Sqlite example:
    ///     - `connect("sqlite://memory")`
    ///     - `connect("sqlite:///tmp/db.sqlite")`
    pub async fn connect(url: &str) -> Result<Self> {
        #[cfg(feature = "sqlite")]
        if let Some(path) = url.strip_prefix("sqlite://") {
            return Self::connect_sqlite(path);
        }

        Err(uow_error::connection!("Unsupport url `{}`", url))
    }

    /// Whether both handles talk to the same underlying driver
    pub fn same_connection(&self, other: &Connection) -> bool {
        Arc::as_ptr(&self.driver) as *const () == Arc::as_ptr(&other.driver) as *const ()
    }

    /// Address of the driver, stable while any handle is alive
    pub fn key(&self) -> usize {
        Arc::as_ptr(&self.driver) as *const () as usize
    }

    pub async fn execute_many(
        &self,
        pairs: Vec<(String, Vec<Vec<Value>>)>,
    ) -> Result<Vec<Execution>> {
        let _gate = self.gate.lock().await;
        self.driver.execute_many(pairs).await
    }

    /// Execute one statement once, returns affected rows
    pub async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<u64> {
        let executions = self
            .execute_many(vec![(sql.to_string(), vec![params])])
            .await?;

        Ok(executions.iter().map(|e| e.rows_affected).sum())
    }

    pub async fn query_many(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>> {
        let _gate = self.gate.lock().await;
        self.driver.query_many(sql, params).await
    }

    pub async fn query_many_map<T, Fun>(
        &self,
        sql: &str,
        params: Vec<Value>,
        map: Fun,
    ) -> Result<Vec<T>>
    where
        Fun: Fn(Row) -> Result<T>,
    {
        let rows = self.query_many(sql, params).await?;
        let mut res_list = Vec::<T>::with_capacity(rows.len());

        for row in rows {
            res_list.push(map(row)?);
        }

        Ok(res_list)
    }

    pub async fn init_table(&self, info: &TableInfo) -> Result<()> {
        let _gate = self.gate.lock().await;
        self.driver.init_table(info).await?;

        Ok(())
    }

    /// Open a transaction. Statements through other handles of this
    /// connection wait until it is committed or rolled back.
    pub async fn begin(&self) -> Result<Transaction> {
        let gate = self.gate.clone().lock_owned().await;
        self.driver.begin().await?;

        Ok(Transaction {
            driver: self.driver.clone(),
            gate: Some(gate),
        })
    }

    #[cfg(feature = "sqlite")]
    fn connect_sqlite(path: &str) -> Result<Self> {
        let conn = if path == "memory" {
            rusqlite::Connection::open_in_memory()
                .map_err(|e| uow_error::connection!("Sqlite open_in_memory error: {}", e))?
        } else {
            rusqlite::Connection::open(path)
                .map_err(|e| uow_error::connection!("Sqlite open `{}` error: {}", path, e))?
        };
        let driver = crate::drivers::sqlite::SqliteConnProxy::new(conn);

        Ok(Self {
            driver: Arc::new(driver),
            gate: Arc::new(Mutex::new(())),
        })
    }
}

/// Open transaction owning the connection gate. Dropped without `commit` or
/// `rollback` it rolls back on the runtime and releases the gate afterwards.
pub struct Transaction {
    driver: Arc<dyn Driver>,
    gate: Option<OwnedMutexGuard<()>>,
}

impl Transaction {
    pub async fn execute_many(
        &self,
        pairs: Vec<(String, Vec<Vec<Value>>)>,
    ) -> Result<Vec<Execution>> {
        self.driver.execute_many(pairs).await
    }

    pub async fn query_many(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>> {
        self.driver.query_many(sql, params).await
    }

    /// Commit, a failed commit is rolled back before the gate is released
    pub async fn commit(mut self) -> Result<()> {
        let res = self.driver.commit().await;
        if let Err(e) = &res {
            log::debug!("Commit failed: {}", e);
            if let Err(e) = self.driver.rollback().await {
                log::debug!("Rollback after failed commit: {}", e);
            }
        }
        self.gate.take();

        res
    }

    pub async fn rollback(mut self) -> Result<()> {
        let res = self.driver.rollback().await;
        self.gate.take();

        res
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        let gate = match self.gate.take() {
            Some(gate) => gate,
            None => return,
        };

        let driver = self.driver.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = driver.rollback().await {
                        log::warn!("Rollback of dropped transaction failed: {}", e);
                    }
                    drop(gate);
                });
            }
            Err(_) => log::warn!("Transaction dropped outside a runtime, left open"),
        }
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_connect() {
        let conn = Connection::connect("sqlite://memory").await.unwrap();
        let other = conn.clone();
        assert!(conn.same_connection(&other));

        let fresh = Connection::connect("sqlite://memory").await.unwrap();
        assert!(!conn.same_connection(&fresh));

        assert!(Connection::connect("postgres://localhost").await.is_err());
    }

    #[tokio::test]
    async fn test_rollback() {
        let conn = Connection::connect("sqlite://memory").await.unwrap();
        conn.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)", vec![])
            .await
            .unwrap();

        let tx = conn.begin().await.unwrap();
        tx.execute_many(vec![(
            "INSERT INTO t (v) VALUES (?)".into(),
            vec![vec![Value::Str("a".into())]],
        )])
        .await
        .unwrap();
        tx.rollback().await.unwrap();

        let rows = conn.query_many("SELECT * FROM t", vec![]).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_batch_is_atomic() {
        let conn = Connection::connect("sqlite://memory").await.unwrap();
        conn.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT UNIQUE)", vec![])
            .await
            .unwrap();

        let res = conn
            .execute_many(vec![(
                "INSERT INTO t (v) VALUES (?)".into(),
                vec![vec![Value::Str("a".into())], vec![Value::Str("a".into())]],
            )])
            .await;
        assert!(res.is_err());

        let count = conn
            .query_many_map("SELECT COUNT(*) AS n FROM t", vec![], |row| {
                row.get::<u64>("n")
            })
            .await
            .unwrap();
        assert_eq!(count, vec![0]);
    }

    #[tokio::test]
    async fn test_transaction_holds_connection() {
        let conn = Connection::connect("sqlite://memory").await.unwrap();
        conn.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)", vec![])
            .await
            .unwrap();

        let tx = conn.begin().await.unwrap();
        tx.execute_many(vec![(
            "INSERT INTO t (v) VALUES (?)".into(),
            vec![vec![Value::Str("a".into())]],
        )])
        .await
        .unwrap();

        // Another handle waits for the transaction instead of joining it
        let other = conn.clone();
        let pending = tokio::spawn(async move {
            other
                .execute("INSERT INTO t (v) VALUES (?)", vec![Value::Str("b".into())])
                .await
        });
        tokio::task::yield_now().await;
        tx.rollback().await.unwrap();
        assert_eq!(pending.await.unwrap().unwrap(), 1);

        let values = conn
            .query_many_map("SELECT v FROM t", vec![], |row| row.get::<String>("v"))
            .await
            .unwrap();
        assert_eq!(values, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let conn = Connection::connect("sqlite://memory").await.unwrap();
        conn.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)", vec![])
            .await
            .unwrap();

        {
            let tx = conn.begin().await.unwrap();
            tx.execute_many(vec![(
                "INSERT INTO t (v) VALUES (?)".into(),
                vec![vec![Value::Str("a".into())]],
            )])
            .await
            .unwrap();
        }

        // The gate is released only after the rollback ran
        let rows = conn.query_many("SELECT * FROM t", vec![]).await.unwrap();
        assert!(rows.is_empty());
        let tx = conn.begin().await.unwrap();
        tx.commit().await.unwrap();
    }
}
