//! Account queries
//!
//! Each query accepts any Postgres executor, so it can run against the pool
//! or against the connection of an open unit of work.

use sqlx::PgExecutor;

use super::models::{Account, AddAccountBalanceParams, CreateAccountParams, ListAccountsParams};
use super::StoreError;

pub async fn create_account<'e, E>(
    executor: E,
    params: &CreateAccountParams,
) -> Result<Account, StoreError>
where
    E: PgExecutor<'e>,
{
    let account = sqlx::query_as::<_, Account>(
        r#"
        INSERT INTO accounts (owner, balance, currency)
        VALUES ($1, $2, $3)
        RETURNING id, owner, balance, currency, created_at
        "#,
    )
    .bind(&params.owner)
    .bind(params.balance)
    .bind(params.currency.code())
    .fetch_one(executor)
    .await?;

    Ok(account)
}

pub async fn get_account<'e, E>(executor: E, id: i64) -> Result<Account, StoreError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, owner, balance, currency, created_at
        FROM accounts
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| StoreError::NotFound(format!("account {}", id)))
}

/// Lock the account row for the rest of the enclosing transaction.
///
/// `NO KEY UPDATE` keeps concurrent inserts of entries/transfers referencing
/// this account from blocking on the lock.
pub async fn get_account_for_update<'e, E>(executor: E, id: i64) -> Result<Account, StoreError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, owner, balance, currency, created_at
        FROM accounts
        WHERE id = $1
        FOR NO KEY UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| StoreError::NotFound(format!("account {}", id)))
}

pub async fn list_accounts<'e, E>(
    executor: E,
    params: &ListAccountsParams,
) -> Result<Vec<Account>, StoreError>
where
    E: PgExecutor<'e>,
{
    let accounts = sqlx::query_as::<_, Account>(
        r#"
        SELECT id, owner, balance, currency, created_at
        FROM accounts
        WHERE ($1::varchar IS NULL OR owner = $1)
        ORDER BY id
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(params.owner.as_deref())
    .bind(params.limit)
    .bind(params.offset)
    .fetch_all(executor)
    .await?;

    Ok(accounts)
}

/// Add a signed delta to the stored balance and return the updated row.
///
/// The increment happens inside a single UPDATE, so concurrent callers never
/// lose each other's updates.
pub async fn add_account_balance<'e, E>(
    executor: E,
    params: AddAccountBalanceParams,
) -> Result<Account, StoreError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Account>(
        r#"
        UPDATE accounts
        SET balance = balance + $2
        WHERE id = $1
        RETURNING id, owner, balance, currency, created_at
        "#,
    )
    .bind(params.id)
    .bind(params.amount)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| StoreError::NotFound(format!("account {}", params.id)))
}
