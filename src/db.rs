//! Database module
//!
//! Database connection, schema and migration utilities.

use sqlx::{Executor, PgPool};

/// Schema applied by [`run_migrations`]. Every statement is `IF NOT EXISTS`.
const SCHEMA_SQL: &str = include_str!("../migrations/0001_init.sql");

/// Advisory lock key serializing concurrent migration runs
const MIGRATION_LOCK_KEY: i64 = 7_206_184_355;

const REQUIRED_TABLES: [&str; 3] = ["accounts", "entries", "transfers"];

/// Simple connectivity check
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the schema.
///
/// Runs on one pooled connection holding a session advisory lock, so several
/// processes (or test binaries) starting at once do not race on DDL.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut conn = pool.acquire().await?;

    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(&mut *conn)
        .await?;

    let applied = (&mut *conn).execute(SCHEMA_SQL).await;

    sqlx::query("SELECT pg_advisory_unlock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(&mut *conn)
        .await?;

    applied?;
    tracing::info!("Database schema is up to date");
    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = current_schema() AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    Ok(true)
}
