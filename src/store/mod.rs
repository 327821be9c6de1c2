//! Store module
//!
//! Persistence layer for accounts, entries and transfers in PostgreSQL,
//! including the atomic money-transfer operation.

pub mod accounts;
pub mod entries;
mod error;
pub mod models;
mod repository;
pub mod transfers;

pub use error::StoreError;
pub use models::{
    Account, AddAccountBalanceParams, CreateAccountParams, CreateEntryParams,
    CreateTransferParams, Entry, ListAccountsParams, ListEntriesParams, ListTransfersParams,
    Transfer, TransferTxParams, TransferTxResult,
};
pub use repository::{Store, TxFuture};
