use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::error;

use crate::error::SqlManagerError;
use crate::manager::DbManager;

/// Callback run once with the outcome of a background operation.
pub type CompletionHandler<T> = Box<dyn FnOnce(&Result<T, SqlManagerError>) + Send + 'static>;

/// Resolves with the outcome of an operation submitted to the background runtime.
///
/// Dropping a `Completion` does not cancel the operation.
#[derive(Debug)]
pub struct Completion<T> {
    rx: oneshot::Receiver<Result<T, SqlManagerError>>,
}

impl<T> Completion<T> {
    fn ready(result: Result<T, SqlManagerError>) -> Self {
        let (tx, rx) = oneshot::channel();
        // the receiver is alive, so this cannot fail
        let _ = tx.send(result);
        Self { rx }
    }
}

impl<T> Future for Completion<T> {
    type Output = Result<T, SqlManagerError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                Err(SqlManagerError::ConnectionError(
                    "background task ended without a result".to_string(),
                ))
            })
        })
    }
}

impl DbManager {
    /// Run `fut` on the Tokio runtime without blocking the caller.
    ///
    /// `on_complete` runs exactly once with the outcome, then the returned `Completion`
    /// resolves with the same outcome. Nothing orders two submissions against each other;
    /// await one `Completion` before submitting work that depends on it. After `close()`
    /// the operation is not run and resolves with `ConnectionError`.
    ///
    /// Runs on the caller's Tokio runtime, or on the one the handle was built on when called
    /// from a plain thread. With neither, it resolves with `ConnectionError` without running.
    pub fn submit<T, F>(&self, fut: F, on_complete: Option<CompletionHandler<T>>) -> Completion<T>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, SqlManagerError>> + Send + 'static,
    {
        let tracker = self.tracker();
        let runtime = match (tracker.is_closed(), self.runtime()) {
            (false, Some(runtime)) => runtime,
            (closed, _) => {
                let reason = if closed {
                    "database manager is closed"
                } else {
                    "no Tokio runtime to run background work on"
                };
                let result = Err(SqlManagerError::ConnectionError(reason.to_string()));
                if let Some(handler) = on_complete {
                    handler(&result);
                }
                return Completion::ready(result);
            }
        };

        let (tx, rx) = oneshot::channel();
        let task = async move {
            let result = fut.await;
            if let Err(e) = &result {
                error!(error = %e, "background database operation failed");
            }
            if let Some(handler) = on_complete {
                handler(&result);
            }
            // the caller may have dropped the Completion
            let _ = tx.send(result);
        };
        tracker.spawn_on(task, &runtime);
        Completion { rx }
    }

    pub fn connect_detached(&self, on_complete: Option<CompletionHandler<()>>) -> Completion<()> {
        let db = self.clone();
        self.submit(async move { db.connect().await }, on_complete)
    }

    pub fn reconnect_detached(&self, on_complete: Option<CompletionHandler<()>>) -> Completion<()> {
        let db = self.clone();
        self.submit(async move { db.reconnect().await }, on_complete)
    }

    pub fn truncate_table_detached(
        &self,
        table: &str,
        on_complete: Option<CompletionHandler<()>>,
    ) -> Completion<()> {
        let db = self.clone();
        let table = table.to_string();
        self.submit(async move { db.truncate_table(&table).await }, on_complete)
    }

    pub fn table_exists_detached(
        &self,
        table: &str,
        on_complete: Option<CompletionHandler<bool>>,
    ) -> Completion<bool> {
        let db = self.clone();
        let table = table.to_string();
        self.submit(async move { db.table_exists(&table).await }, on_complete)
    }

    pub fn execute_update_detached(
        &self,
        sql: &str,
        params: Vec<crate::types::RowValues>,
        on_complete: Option<CompletionHandler<usize>>,
    ) -> Completion<usize> {
        let db = self.clone();
        let sql = sql.to_string();
        self.submit(
            async move { db.execute_update(&sql, &params).await },
            on_complete,
        )
    }

    pub fn select_detached(
        &self,
        table: &str,
        id: i64,
        on_complete: Option<CompletionHandler<bool>>,
    ) -> Completion<bool> {
        let db = self.clone();
        let table = table.to_string();
        self.submit(async move { db.select(&table, id).await }, on_complete)
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::config::SqliteOptions;

    #[test]
    fn without_any_runtime_work_is_refused() {
        let db = DbManager::sqlite(SqliteOptions::new(":memory:"));
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let completion = db.table_exists_detached(
            "users",
            Some(Box::new(move |result: &Result<bool, SqlManagerError>| {
                assert!(matches!(result, Err(SqlManagerError::ConnectionError(_))));
                seen.fetch_add(1, Ordering::SeqCst);
            })),
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let rt = tokio::runtime::Runtime::new().unwrap();
        let result = rt.block_on(completion);
        assert!(matches!(result, Err(SqlManagerError::ConnectionError(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn plain_threads_use_the_construction_runtime() {
        let db = DbManager::sqlite(SqliteOptions::new(":memory:"));
        let worker = db.clone();
        let completion = std::thread::spawn(move || worker.table_exists_detached("users", None))
            .join()
            .unwrap();
        assert!(!completion.await.unwrap());
        db.close().await.unwrap();
    }
}
