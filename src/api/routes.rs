//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::domain::{Amount, Currency, OperationContext};
use crate::error::{AppError, AppResult};
use crate::store::{
    Account, CreateAccountParams, Entry, ListAccountsParams, ListEntriesParams, Store,
    Transfer, TransferTxParams, TransferTxResult,
};

/// Smallest page a list endpoint accepts
pub const MIN_PAGE_SIZE: i64 = 5;

/// Largest page a list endpoint accepts
pub const MAX_PAGE_SIZE: i64 = 10;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub owner: String,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
pub struct ListAccountsQuery {
    #[serde(default = "default_page_id")]
    pub page_id: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    #[serde(default)]
    pub owner: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page_id")]
    pub page_id: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page_id() -> i64 {
    1
}

fn default_page_size() -> i64 {
    MIN_PAGE_SIZE
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from_account_id: i64,
    pub to_account_id: i64,
    /// Minor currency units
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct EntriesResponse {
    pub account_id: i64,
    pub entries: Vec<Entry>,
}

/// Translate 1-based page parameters into `(limit, offset)`.
pub fn page_bounds(page_id: i64, page_size: i64) -> AppResult<(i64, i64)> {
    if page_id < 1 {
        return Err(AppError::InvalidRequest(format!(
            "page_id must be at least 1 (got {})",
            page_id
        )));
    }
    if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(AppError::InvalidRequest(format!(
            "page_size must be between {} and {} (got {})",
            MIN_PAGE_SIZE, MAX_PAGE_SIZE, page_size
        )));
    }
    let offset = page_id
        .checked_sub(1)
        .and_then(|page| page.checked_mul(page_size))
        .ok_or_else(|| {
            AppError::InvalidRequest(format!("page_id {} is out of range", page_id))
        })?;
    Ok((page_size, offset))
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<Store> {
    Router::new()
        .route("/accounts", post(create_account).get(list_accounts))
        .route("/accounts/:account_id", get(get_account))
        .route("/accounts/:account_id/entries", get(list_account_entries))
        .route("/transfers", post(create_transfer))
        .route("/transfers/:transfer_id", get(get_transfer))
}

// =========================================================================
// Accounts
// =========================================================================

/// Open a new account with a zero balance
async fn create_account(
    State(store): State<Store>,
    Json(request): Json<CreateAccountRequest>,
) -> AppResult<(StatusCode, Json<Account>)> {
    let owner = request.owner.trim();
    if owner.is_empty() {
        return Err(AppError::InvalidRequest("owner must not be empty".to_string()));
    }
    let currency: Currency = request.currency.parse()?;

    let account = store
        .create_account(&CreateAccountParams {
            owner: owner.to_string(),
            balance: 0,
            currency,
        })
        .await?;

    tracing::info!(account_id = account.id, currency = %currency, "Account created");

    Ok((StatusCode::CREATED, Json(account)))
}

async fn get_account(
    State(store): State<Store>,
    Path(account_id): Path<i64>,
) -> AppResult<Json<Account>> {
    let account = find_account(&store, account_id).await?;
    Ok(Json(account))
}

async fn list_accounts(
    State(store): State<Store>,
    Query(query): Query<ListAccountsQuery>,
) -> AppResult<Json<Vec<Account>>> {
    let (limit, offset) = page_bounds(query.page_id, query.page_size)?;

    let accounts = store
        .list_accounts(&ListAccountsParams {
            owner: query.owner,
            limit,
            offset,
        })
        .await?;

    Ok(Json(accounts))
}

async fn list_account_entries(
    State(store): State<Store>,
    Path(account_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<EntriesResponse>> {
    let (limit, offset) = page_bounds(query.page_id, query.page_size)?;
    find_account(&store, account_id).await?;

    let entries = store
        .list_entries(ListEntriesParams {
            account_id,
            limit,
            offset,
        })
        .await?;

    Ok(Json(EntriesResponse {
        account_id,
        entries,
    }))
}

// =========================================================================
// Transfers
// =========================================================================

/// Move money between two accounts of the same currency
async fn create_transfer(
    State(store): State<Store>,
    context: Option<Extension<OperationContext>>,
    Json(request): Json<TransferRequest>,
) -> AppResult<Json<TransferTxResult>> {
    let amount = Amount::new(request.amount)?;
    let currency: Currency = request.currency.parse()?;

    if request.from_account_id == request.to_account_id {
        return Err(AppError::InvalidRequest(
            "Cannot transfer to the same account".to_string(),
        ));
    }

    valid_account(&store, request.from_account_id, currency).await?;
    valid_account(&store, request.to_account_id, currency).await?;

    let result = store
        .transfer_tx(TransferTxParams {
            from_account_id: request.from_account_id,
            to_account_id: request.to_account_id,
            amount,
        })
        .await?;

    let correlation_id = context.and_then(|Extension(ctx)| ctx.correlation_id);
    tracing::info!(
        transfer_id = result.transfer.id,
        correlation_id = ?correlation_id,
        "Transfer completed"
    );

    Ok(Json(result))
}

async fn get_transfer(
    State(store): State<Store>,
    Path(transfer_id): Path<i64>,
) -> AppResult<Json<Transfer>> {
    let transfer = store.get_transfer(transfer_id).await?;
    Ok(Json(transfer))
}

// =========================================================================
// Helpers
// =========================================================================

async fn find_account(store: &Store, account_id: i64) -> AppResult<Account> {
    store.get_account(account_id).await.map_err(|e| {
        if e.is_not_found() {
            AppError::AccountNotFound(account_id)
        } else {
            AppError::Store(e)
        }
    })
}

/// The account must exist and be held in `currency`.
async fn valid_account(store: &Store, account_id: i64, currency: Currency) -> AppResult<Account> {
    let account = find_account(store, account_id).await?;
    if account.currency != currency {
        return Err(AppError::CurrencyMismatch {
            account_id,
            expected: currency,
            found: account.currency,
        });
    }
    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::util::ServiceExt;

    /// Router over a pool that never connects; only paths rejected before any
    /// query can be exercised with it.
    fn offline_app() -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/simple_bank_offline")
            .unwrap();
        create_router().with_state(Store::new(pool))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    fn post_json(uri: &str, body: &impl Serialize) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(body).unwrap()))
            .unwrap()
    }

    #[test]
    fn test_page_bounds() {
        assert_eq!(page_bounds(1, 5).unwrap(), (5, 0));
        assert_eq!(page_bounds(3, 10).unwrap(), (10, 20));
        assert!(page_bounds(0, 5).is_err());
        assert!(page_bounds(1, 4).is_err());
        assert!(page_bounds(1, 11).is_err());
    }

    #[test]
    fn test_page_bounds_offset_overflow() {
        let err = page_bounds(i64::MAX, 10).unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
        assert_eq!(page_bounds(i64::MAX / 10 + 1, 10).unwrap(), (10, i64::MAX / 10 * 10));
    }

    #[test]
    fn test_transfer_request_deserialize() {
        let json = r#"{
            "from_account_id": 1,
            "to_account_id": 2,
            "amount": 200,
            "currency": "USD"
        }"#;

        let request: TransferRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.from_account_id, 1);
        assert_eq!(request.to_account_id, 2);
        assert_eq!(request.amount, 200);
        assert_eq!(request.currency, "USD");
    }

    #[test]
    fn test_list_accounts_query_defaults() {
        let query: ListAccountsQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.page_id, 1);
        assert_eq!(query.page_size, MIN_PAGE_SIZE);
        assert!(query.owner.is_none());
    }

    #[tokio::test]
    async fn test_transfer_rejects_non_positive_amount() {
        let request = post_json(
            "/transfers",
            &TransferRequest {
                from_account_id: 1,
                to_account_id: 2,
                amount: 0,
                currency: "USD".to_string(),
            },
        );

        let (status, body) = send(offline_app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "invalid_amount");
    }

    #[tokio::test]
    async fn test_transfer_rejects_unsupported_currency() {
        let request = post_json(
            "/transfers",
            &TransferRequest {
                from_account_id: 1,
                to_account_id: 2,
                amount: 10,
                currency: "GBP".to_string(),
            },
        );

        let (status, body) = send(offline_app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "unsupported_currency");
        assert_eq!(body["details"], "GBP");
    }

    #[tokio::test]
    async fn test_transfer_rejects_same_account() {
        let request = post_json(
            "/transfers",
            &TransferRequest {
                from_account_id: 4,
                to_account_id: 4,
                amount: 10,
                currency: "EUR".to_string(),
            },
        );

        let (status, body) = send(offline_app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "invalid_request");
    }

    #[tokio::test]
    async fn test_create_account_rejects_empty_owner() {
        let request = post_json(
            "/accounts",
            &CreateAccountRequest {
                owner: "   ".to_string(),
                currency: "USD".to_string(),
            },
        );

        let (status, _) = send(offline_app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_accounts_rejects_large_page() {
        let request = Request::builder()
            .uri("/accounts?page_id=1&page_size=50")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(offline_app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "invalid_request");
    }

    #[tokio::test]
    async fn test_list_accounts_rejects_page_beyond_range() {
        let request = Request::builder()
            .uri("/accounts?page_id=9223372036854775807&page_size=10")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(offline_app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "invalid_request");
    }
}
