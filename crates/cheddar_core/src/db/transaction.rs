use super::store::SqliteStore;
use super::{DbError, DbResult};
use log::{info, warn};

/// Explicit transaction scope over a [`SqliteStore`].
///
/// Every statement issued through the store while the scope is active joins
/// the transaction. The transaction is rolled back if this value is dropped
/// before `commit` or `rollback`.
#[derive(Debug)]
pub struct SqliteTransaction {
    store: SqliteStore,
    // Active until committed or rolled back.
    is_active: bool,
}

impl SqliteTransaction {
    /// Begins a new transaction.
    pub async fn begin(store: &SqliteStore) -> DbResult<Self> {
        store
            .with_connection(|conn| -> DbResult<()> {
                conn.execute_batch("BEGIN TRANSACTION")?;
                Ok(())
            })
            .await?;
        info!("event=tx_begin module=db status=ok");
        Ok(Self {
            store: store.clone(),
            is_active: true,
        })
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Commits the transaction.
    ///
    /// A `COMMIT` that fails while SQLite is still inside the transaction
    /// (deferred constraints, busy database) is followed by a `ROLLBACK`, so
    /// the connection is released before the error returns.
    pub async fn commit(mut self) -> DbResult<()> {
        let failure = self
            .store
            .with_connection(|conn| -> DbResult<Option<rusqlite::Error>> {
                match conn.execute_batch("COMMIT TRANSACTION") {
                    Ok(()) => Ok(None),
                    Err(err) => {
                        if !conn.is_autocommit() {
                            conn.execute_batch("ROLLBACK TRANSACTION")?;
                        }
                        Ok(Some(err))
                    }
                }
            })
            .await?;
        self.is_active = false;

        match failure {
            None => {
                info!("event=tx_commit module=db status=ok");
                Ok(())
            }
            Some(err) => {
                warn!("event=tx_commit module=db status=error released=rollback error={err}");
                Err(err.into())
            }
        }
    }

    /// Rolls the transaction back.
    ///
    /// On failure the scope stays active and `Drop` retries the rollback.
    pub async fn rollback(mut self) -> DbResult<()> {
        self.finish("ROLLBACK TRANSACTION").await?;
        self.is_active = false;
        info!("event=tx_rollback module=db status=ok");
        Ok(())
    }

    async fn finish(&self, sql: &'static str) -> DbResult<()> {
        self.store
            .with_connection(move |conn| -> DbResult<()> {
                conn.execute_batch(sql)?;
                Ok(())
            })
            .await
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if !self.is_active {
            return;
        }

        let outcome = self.store.with_connection_blocking(|conn| {
            conn.execute_batch("ROLLBACK TRANSACTION")
                .map_err(DbError::from)
        });
        match outcome {
            Ok(()) => info!("event=tx_rollback module=db status=ok trigger=drop"),
            // The connection may already have left the transaction (explicit
            // COMMIT issued elsewhere); never panic while unwinding.
            Err(err) => warn!("event=tx_rollback module=db status=error trigger=drop error={err}"),
        }
    }
}
