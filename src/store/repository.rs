//! Store
//!
//! Shared handle over the Postgres pool. Exposes the row-level queries against
//! the pool and the composite money-transfer operation, which runs inside a
//! single scoped unit of work.

use std::future::Future;
use std::pin::Pin;

use sqlx::{PgConnection, PgPool};

use super::models::{
    Account, AddAccountBalanceParams, CreateAccountParams, CreateEntryParams,
    CreateTransferParams, Entry, ListAccountsParams, ListEntriesParams, ListTransfersParams,
    Transfer, TransferTxParams, TransferTxResult,
};
use super::{accounts, entries, transfers, StoreError};

/// Future returned by a closure running inside [`Store::exec_tx`].
pub type TxFuture<'c, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'c>>;

/// Store for accounts, entries and transfers
#[derive(Debug, Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    /// Create a new Store with a database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool (for health checks and shutdown)
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // =========================================================================
    // Scoped unit of work
    // =========================================================================

    /// Run `f` inside one database transaction.
    ///
    /// Commits when `f` returns `Ok`, rolls back and returns the error when it
    /// returns `Err`. If the future is dropped or panics before finishing, the
    /// transaction guard rolls back on drop, so nothing `f` wrote is ever
    /// visible to other callers unless the whole closure succeeded.
    pub async fn exec_tx<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut PgConnection) -> TxFuture<'c, T> + Send,
    {
        let mut tx = self.pool.begin().await?;
        let outcome = f(&mut *tx).await;

        match outcome {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!("Rollback failed after {}: {}", err, rollback_err);
                } else {
                    tracing::warn!("Transaction rolled back: {}", err);
                }
                Err(err)
            }
        }
    }

    // =========================================================================
    // Money transfer
    // =========================================================================

    /// Move `amount` from one account to another.
    ///
    /// Creates the transfer record, one entry per account and applies both
    /// balance changes in one transaction. Balances are always updated in
    /// ascending account-id order, so two transfers crossing the same pair in
    /// opposite directions lock the rows in the same order and cannot deadlock.
    pub async fn transfer_tx(&self, params: TransferTxParams) -> Result<TransferTxResult, StoreError> {
        if params.from_account_id == params.to_account_id {
            return Err(StoreError::InvalidArgument(format!(
                "cannot transfer from account {} to itself",
                params.from_account_id
            )));
        }

        let result = self
            .exec_tx(move |conn| Box::pin(transfer_in_tx(conn, params)))
            .await
            .map_err(|err| {
                if err.is_retryable() {
                    tracing::warn!(
                        from_account_id = params.from_account_id,
                        to_account_id = params.to_account_id,
                        error = %err,
                        "Transfer rolled back, safe to retry"
                    );
                }
                err
            })?;

        tracing::debug!(
            transfer_id = result.transfer.id,
            from_account_id = params.from_account_id,
            to_account_id = params.to_account_id,
            amount = params.amount.value(),
            "Transfer committed"
        );

        Ok(result)
    }

    // =========================================================================
    // Row-level queries against the pool
    // =========================================================================

    pub async fn create_account(&self, params: &CreateAccountParams) -> Result<Account, StoreError> {
        accounts::create_account(&self.pool, params).await
    }

    pub async fn get_account(&self, id: i64) -> Result<Account, StoreError> {
        accounts::get_account(&self.pool, id).await
    }

    pub async fn list_accounts(&self, params: &ListAccountsParams) -> Result<Vec<Account>, StoreError> {
        accounts::list_accounts(&self.pool, params).await
    }

    pub async fn add_account_balance(
        &self,
        params: AddAccountBalanceParams,
    ) -> Result<Account, StoreError> {
        accounts::add_account_balance(&self.pool, params).await
    }

    pub async fn create_entry(&self, params: CreateEntryParams) -> Result<Entry, StoreError> {
        entries::create_entry(&self.pool, params).await
    }

    pub async fn get_entry(&self, id: i64) -> Result<Entry, StoreError> {
        entries::get_entry(&self.pool, id).await
    }

    pub async fn list_entries(&self, params: ListEntriesParams) -> Result<Vec<Entry>, StoreError> {
        entries::list_entries(&self.pool, params).await
    }

    pub async fn create_transfer(&self, params: CreateTransferParams) -> Result<Transfer, StoreError> {
        transfers::create_transfer(&self.pool, params).await
    }

    pub async fn get_transfer(&self, id: i64) -> Result<Transfer, StoreError> {
        transfers::get_transfer(&self.pool, id).await
    }

    pub async fn list_transfers(&self, params: ListTransfersParams) -> Result<Vec<Transfer>, StoreError> {
        transfers::list_transfers(&self.pool, params).await
    }
}

/// The five writes of a transfer, run on the connection of an open transaction.
async fn transfer_in_tx(
    conn: &mut PgConnection,
    params: TransferTxParams,
) -> Result<TransferTxResult, StoreError> {
    let transfer = transfers::create_transfer(
        &mut *conn,
        CreateTransferParams {
            from_account_id: params.from_account_id,
            to_account_id: params.to_account_id,
            amount: params.amount.value(),
        },
    )
    .await?;

    let from_entry = entries::create_entry(
        &mut *conn,
        CreateEntryParams {
            account_id: params.from_account_id,
            amount: params.amount.as_debit(),
        },
    )
    .await?;

    let to_entry = entries::create_entry(
        &mut *conn,
        CreateEntryParams {
            account_id: params.to_account_id,
            amount: params.amount.as_credit(),
        },
    )
    .await?;

    let debit = AddAccountBalanceParams {
        id: params.from_account_id,
        amount: params.amount.as_debit(),
    };
    let credit = AddAccountBalanceParams {
        id: params.to_account_id,
        amount: params.amount.as_credit(),
    };

    let [first, second] = balance_update_order(debit, credit);
    let first_account = accounts::add_account_balance(&mut *conn, first).await?;
    let second_account = accounts::add_account_balance(&mut *conn, second).await?;

    let (from_account, to_account) = if first_account.id == params.from_account_id {
        (first_account, second_account)
    } else {
        (second_account, first_account)
    };

    Ok(TransferTxResult {
        transfer,
        from_entry,
        to_entry,
        from_account,
        to_account,
    })
}

/// Lowest account id first, whichever side it is on.
fn balance_update_order(
    debit: AddAccountBalanceParams,
    credit: AddAccountBalanceParams,
) -> [AddAccountBalanceParams; 2] {
    if debit.id < credit.id {
        [debit, credit]
    } else {
        [credit, debit]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(id: i64, amount: i64) -> AddAccountBalanceParams {
        AddAccountBalanceParams { id, amount }
    }

    #[test]
    fn test_balance_update_order_from_lower_id() {
        let [first, second] = balance_update_order(delta(1, -200), delta(2, 200));
        assert_eq!((first.id, first.amount), (1, -200));
        assert_eq!((second.id, second.amount), (2, 200));
    }

    #[test]
    fn test_balance_update_order_from_higher_id() {
        let [first, second] = balance_update_order(delta(9, -50), delta(3, 50));
        assert_eq!((first.id, first.amount), (3, 50));
        assert_eq!((second.id, second.amount), (9, -50));
    }

    #[test]
    fn test_balance_update_order_is_direction_independent() {
        let forward = balance_update_order(delta(4, -10), delta(7, 10));
        let backward = balance_update_order(delta(7, -10), delta(4, 10));
        assert_eq!(forward[0].id, backward[0].id);
        assert_eq!(forward[1].id, backward[1].id);
    }
}
