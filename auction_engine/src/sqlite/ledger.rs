//! `SqliteLedger` is a journal-backed [`LedgerGateway`].
//!
//! Accounts and transfers are recorded in the `ledger_accounts` and `ledger_transfers` tables. The journal is
//! append-only: a transfer is final as soon as its row is written.
use chrono::Utc;
use log::*;
use sqlx::{FromRow, SqlitePool};

use crate::{
    db_types::{AccountId, Tokens, TokenId},
    traits::{LedgerAccount, LedgerError, LedgerGateway, TransferReceipt, TransferRequest},
};

#[derive(Debug, Clone, FromRow)]
struct TransferRow {
    transfer_id: String,
    token_id: TokenId,
    sender: AccountId,
    recipient: AccountId,
    amount: Tokens,
    memo: String,
    executed_at: chrono::DateTime<Utc>,
}

impl From<TransferRow> for TransferReceipt {
    fn from(row: TransferRow) -> Self {
        let request = TransferRequest {
            token_id: row.token_id,
            sender: row.sender,
            recipient: row.recipient,
            amount: row.amount,
            memo: row.memo,
        };
        Self { transfer_id: row.transfer_id, request, executed_at: row.executed_at }
    }
}

#[derive(Debug, Clone)]
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All transfers that credited or debited the account, oldest first.
    pub async fn fetch_transfers_for(&self, account: &AccountId) -> Result<Vec<TransferReceipt>, LedgerError> {
        let rows: Vec<TransferRow> = sqlx::query_as(
            "SELECT * FROM ledger_transfers WHERE sender = $1 OR recipient = $1 ORDER BY executed_at ASC, id ASC",
        )
        .bind(account.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TransferReceipt::from).collect())
    }

    /// Net flow into the account across every recorded transfer of `token_id`.
    pub async fn net_balance(&self, account: &AccountId, token_id: &TokenId) -> Result<Tokens, LedgerError> {
        let (credits, debits): (i64, i64) = sqlx::query_as(
            r#"
                SELECT
                    COALESCE(SUM(CASE WHEN recipient = $1 THEN amount ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN sender = $1 THEN amount ELSE 0 END), 0)
                FROM ledger_transfers WHERE token_id = $2
            "#,
        )
        .bind(account.as_str())
        .bind(token_id.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(Tokens::from(credits - debits))
    }
}

impl LedgerGateway for SqliteLedger {
    async fn create_account(&self, alias: &str) -> Result<LedgerAccount, LedgerError> {
        let account_id = AccountId::from(format!("acct-{:016x}", rand::random::<u64>()));
        let public_key = format!("{:032x}{:032x}", rand::random::<u128>(), rand::random::<u128>());
        sqlx::query("INSERT INTO ledger_accounts (account_id, alias, public_key, created_at) VALUES ($1, $2, $3, $4)")
            .bind(account_id.as_str())
            .bind(alias)
            .bind(public_key.as_str())
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| LedgerError::AccountCreationFailed(e.to_string()))?;
        info!("💳️ Created ledger account {account_id} for '{alias}'");
        Ok(LedgerAccount { account_id, public_key })
    }

    async fn transfer(&self, request: TransferRequest) -> Result<TransferReceipt, LedgerError> {
        if request.amount.is_negative() {
            return Err(LedgerError::InvalidAmount(request.amount));
        }
        let transfer_id = format!("tx-{:016x}", rand::random::<u64>());
        let mut tx = self.pool.begin().await?;
        let row: TransferRow = sqlx::query_as(
            r#"
                INSERT INTO ledger_transfers (transfer_id, token_id, sender, recipient, amount, memo, executed_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *;
            "#,
        )
        .bind(transfer_id)
        .bind(request.token_id.as_str())
        .bind(request.sender.as_str())
        .bind(request.recipient.as_str())
        .bind(request.amount.value())
        .bind(request.memo)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        let receipt = TransferReceipt::from(row);
        debug!(
            "💳️ Transfer {} of {} from {} to {} recorded",
            receipt.transfer_id, receipt.request.amount, receipt.request.sender, receipt.request.recipient
        );
        Ok(receipt)
    }
}
