//! Entry queries

use sqlx::PgExecutor;

use super::models::{CreateEntryParams, Entry, ListEntriesParams};
use super::StoreError;

pub async fn create_entry<'e, E>(executor: E, params: CreateEntryParams) -> Result<Entry, StoreError>
where
    E: PgExecutor<'e>,
{
    let entry = sqlx::query_as::<_, Entry>(
        r#"
        INSERT INTO entries (account_id, amount)
        VALUES ($1, $2)
        RETURNING id, account_id, amount, created_at
        "#,
    )
    .bind(params.account_id)
    .bind(params.amount)
    .fetch_one(executor)
    .await?;

    Ok(entry)
}

pub async fn get_entry<'e, E>(executor: E, id: i64) -> Result<Entry, StoreError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Entry>(
        r#"
        SELECT id, account_id, amount, created_at
        FROM entries
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| StoreError::NotFound(format!("entry {}", id)))
}

pub async fn list_entries<'e, E>(
    executor: E,
    params: ListEntriesParams,
) -> Result<Vec<Entry>, StoreError>
where
    E: PgExecutor<'e>,
{
    let entries = sqlx::query_as::<_, Entry>(
        r#"
        SELECT id, account_id, amount, created_at
        FROM entries
        WHERE account_id = $1
        ORDER BY id
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(params.account_id)
    .bind(params.limit)
    .bind(params.offset)
    .fetch_all(executor)
    .await?;

    Ok(entries)
}
