//! Transfer queries

use sqlx::PgExecutor;

use super::models::{CreateTransferParams, ListTransfersParams, Transfer};
use super::StoreError;

pub async fn create_transfer<'e, E>(
    executor: E,
    params: CreateTransferParams,
) -> Result<Transfer, StoreError>
where
    E: PgExecutor<'e>,
{
    let transfer = sqlx::query_as::<_, Transfer>(
        r#"
        INSERT INTO transfers (from_account_id, to_account_id, amount)
        VALUES ($1, $2, $3)
        RETURNING id, from_account_id, to_account_id, amount, created_at
        "#,
    )
    .bind(params.from_account_id)
    .bind(params.to_account_id)
    .bind(params.amount)
    .fetch_one(executor)
    .await?;

    Ok(transfer)
}

pub async fn get_transfer<'e, E>(executor: E, id: i64) -> Result<Transfer, StoreError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Transfer>(
        r#"
        SELECT id, from_account_id, to_account_id, amount, created_at
        FROM transfers
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| StoreError::NotFound(format!("transfer {}", id)))
}

pub async fn list_transfers<'e, E>(
    executor: E,
    params: ListTransfersParams,
) -> Result<Vec<Transfer>, StoreError>
where
    E: PgExecutor<'e>,
{
    let transfers = sqlx::query_as::<_, Transfer>(
        r#"
        SELECT id, from_account_id, to_account_id, amount, created_at
        FROM transfers
        WHERE from_account_id = $1 OR to_account_id = $2
        ORDER BY id
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(params.from_account_id)
    .bind(params.to_account_id)
    .bind(params.limit)
    .bind(params.offset)
    .fetch_all(executor)
    .await?;

    Ok(transfers)
}
