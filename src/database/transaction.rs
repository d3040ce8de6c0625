//! Transactions
//!
//! [`ExtendedTx`] offers the same entity operations as
//! [`ExtendedDb`], bound to one open transaction. It is either driven by
//! [`ExtendedDb::transaction`], which commits or rolls back depending on the
//! closure's result, or opened with [`ExtendedDb::begin`] and finished by hand.
//! Dropping an `ExtendedTx` without committing rolls it back.
//!
//! ```ignore
//! let account = db
//!     .transaction(|tx| {
//!         Box::pin(async move {
//!             let mut account = Account::new("a@example.com");
//!             tx.create(&mut account).await?;
//!             Ok(account)
//!         })
//!     })
//!     .await?;
//! ```

use futures::future::BoxFuture;
use serde::Serialize;
use sqlx::{Postgres, Transaction};
use tracing::{error, warn};

use crate::database::connection::{ExtendedDb, owned_params};
use crate::database::error::Result;
use crate::database::traits::Entity;
use crate::database::values::DatabaseValue;
use crate::database::{delete, insert, query, update};

pub struct ExtendedTx {
    tx: Transaction<'static, Postgres>,
    connection_name: String,
}

impl ExtendedDb {
    pub async fn begin(&self) -> Result<ExtendedTx> {
        let tx = self.pool.begin().await?;
        Ok(ExtendedTx {
            tx,
            connection_name: self.connection_name.clone(),
        })
    }

    /// Runs `f` inside a transaction: committed when `f` returns `Ok`, rolled
    /// back when it returns `Err`, whose error is then returned unchanged.
    pub async fn transaction<F, R>(&self, f: F) -> Result<R>
    where
        F: for<'t> FnOnce(&'t mut ExtendedTx) -> BoxFuture<'t, Result<R>> + Send,
        R: Send,
    {
        let mut tx = self.begin().await?;
        match f(&mut tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(e) => {
                error!(connection = %self.connection_name, "rolling back transaction: {}", e);
                if let Err(rollback_error) = tx.rollback().await {
                    warn!(
                        connection = %self.connection_name,
                        "rollback failed: {}", rollback_error
                    );
                }
                Err(e)
            }
        }
    }
}

impl ExtendedTx {
    pub fn connection_name(&self) -> &str {
        &self.connection_name
    }

    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    pub async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }

    pub async fn create<T: Entity>(&mut self, entity: &mut T) -> Result<()> {
        insert::create(&mut *self.tx, entity).await
    }

    pub async fn update<T: Entity>(&mut self, entity: &mut T) -> Result<()> {
        update::update(&mut *self.tx, entity).await
    }

    pub async fn delete_by_id<T: Entity>(&mut self, id: u64) -> Result<u64> {
        delete::delete_by_id::<T>(&mut *self.tx, id).await
    }

    pub async fn select_by_id<T: Entity>(&mut self, id: u64) -> Result<T> {
        query::select_by_id(&mut *self.tx, id).await
    }

    pub async fn select_all<T: Entity>(&mut self) -> Result<Vec<T>> {
        query::select_all(&mut *self.tx).await
    }

    pub async fn filter<T: Entity, F: Serialize + ?Sized + Sync>(
        &mut self,
        filter: &F,
    ) -> Result<Vec<T>> {
        query::filter(&mut *self.tx, filter).await
    }

    pub async fn filter_by<T: Entity>(
        &mut self,
        params: Vec<(&str, DatabaseValue)>,
    ) -> Result<Vec<T>> {
        query::filter_by(&mut *self.tx, owned_params(params)).await
    }
}
