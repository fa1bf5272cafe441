use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{AccountId, Tokens, TokenId};

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("The ledger rejected the transfer: {0}")]
    TransferRejected(String),
    #[error("Ledger account {0} does not exist")]
    AccountNotFound(AccountId),
    #[error("Invalid transfer amount: {0}")]
    InvalidAmount(Tokens),
    #[error("Could not create ledger account: {0}")]
    AccountCreationFailed(String),
    #[error("Ledger backend error: {0}")]
    BackendError(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        Self::BackendError(e.to_string())
    }
}

/// A request to move `amount` units of `token_id` from `sender` to `recipient`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub token_id: TokenId,
    pub sender: AccountId,
    pub recipient: AccountId,
    pub amount: Tokens,
    pub memo: String,
}

impl TransferRequest {
    pub fn new(token_id: TokenId, sender: AccountId, recipient: AccountId, amount: Tokens) -> Self {
        Self { token_id, sender, recipient, amount, memo: String::default() }
    }

    pub fn with_memo<S: Into<String>>(mut self, memo: S) -> Self {
        self.memo = memo.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub transfer_id: String,
    pub request: TransferRequest,
    pub executed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAccount {
    pub account_id: AccountId,
    pub public_key: String,
}

/// The ledger that backs bid escrow. Transfers are irreversible once this returns `Ok`.
pub trait LedgerGateway: Clone + Send + Sync + 'static {
    /// Creates a new account on the ledger. `alias` is informational only.
    fn create_account(&self, alias: &str) -> impl Future<Output = Result<LedgerAccount, LedgerError>> + Send;

    fn transfer(&self, request: TransferRequest) -> impl Future<Output = Result<TransferReceipt, LedgerError>> + Send;
}
