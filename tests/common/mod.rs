//! Common test utilities
#![allow(dead_code)]

use rand::distributions::Alphanumeric;
use rand::Rng;
use sqlx::postgres::PgPoolOptions;

use simple_bank::store::{Account, CreateAccountParams};
use simple_bank::{db, Currency, Store};

/// Connect to `DATABASE_URL` and make sure the schema exists.
///
/// Tests never truncate tables; each one works on freshly created accounts so
/// they can run in parallel against the same database.
pub async fn setup_test_store() -> Store {
    dotenvy::dotenv().ok();
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    db::run_migrations(&pool)
        .await
        .expect("Failed to apply schema");

    Store::new(pool)
}

pub fn random_owner() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("owner_{}", suffix.to_lowercase())
}

pub fn random_money() -> i64 {
    rand::thread_rng().gen_range(1..=1000)
}

pub async fn create_account(store: &Store, owner: &str, balance: i64, currency: Currency) -> Account {
    let params = CreateAccountParams {
        owner: owner.to_string(),
        balance,
        currency,
    };
    let account = store
        .create_account(&params)
        .await
        .expect("Failed to create account");

    assert_eq!(account.owner, params.owner);
    assert_eq!(account.balance, params.balance);
    assert_eq!(account.currency, params.currency);
    assert!(account.id > 0);

    account
}

pub async fn create_random_account(store: &Store) -> Account {
    create_account(store, &random_owner(), random_money(), Currency::Usd).await
}

/// An id no BIGSERIAL sequence will reach in a test database
pub const MISSING_ACCOUNT_ID: i64 = i64::MAX;
