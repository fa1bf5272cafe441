use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use auction_engine::{
    db_types::{AccountId, CandidateSkill, SkillRequirement},
    traits::{LedgerAccount, LedgerError, LedgerGateway, SkillScorer, TransferReceipt, TransferRequest},
};
use chrono::Utc;
use mockall::mock;

mock! {
    pub Scorer {}
    impl SkillScorer for Scorer {
        fn score(&self, required: &[SkillRequirement], candidate: &[CandidateSkill]) -> f64;
    }
}

/// A ledger that records every transfer, and can be told to reject transfers to particular accounts.
#[derive(Debug, Clone, Default)]
pub struct RecordingLedger {
    transfers: Arc<Mutex<Vec<TransferRequest>>>,
    rejected_recipients: Arc<Mutex<HashSet<AccountId>>>,
    accounts_created: Arc<Mutex<Vec<String>>>,
}

impl RecordingLedger {
    pub fn reject_transfers_to(&self, account: &AccountId) {
        self.rejected_recipients.lock().unwrap().insert(account.clone());
    }

    pub fn accept_all_transfers(&self) {
        self.rejected_recipients.lock().unwrap().clear();
    }

    pub fn transfers(&self) -> Vec<TransferRequest> {
        self.transfers.lock().unwrap().clone()
    }

    pub fn accounts_created(&self) -> Vec<String> {
        self.accounts_created.lock().unwrap().clone()
    }
}

impl LedgerGateway for RecordingLedger {
    async fn create_account(&self, alias: &str) -> Result<LedgerAccount, LedgerError> {
        let mut created = self.accounts_created.lock().unwrap();
        created.push(alias.to_string());
        let account_id = AccountId::from(format!("acct-agent-{}", created.len()));
        Ok(LedgerAccount { account_id, public_key: format!("pk-{alias}") })
    }

    async fn transfer(&self, request: TransferRequest) -> Result<TransferReceipt, LedgerError> {
        if self.rejected_recipients.lock().unwrap().contains(&request.recipient) {
            return Err(LedgerError::TransferRejected(format!("transfers to {} are blocked", request.recipient)));
        }
        let mut transfers = self.transfers.lock().unwrap();
        transfers.push(request.clone());
        Ok(TransferReceipt { transfer_id: format!("tx-{}", transfers.len()), request, executed_at: Utc::now() })
    }
}
