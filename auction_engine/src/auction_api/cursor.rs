//! The in-memory highest-bid cursor.
//!
//! The cursor remembers the current `active` bid of every registered post. It is never authoritative: it is
//! rehydrated from the store when a post's jobs are registered, and re-derived from the store at the start of every
//! bid-processing tick. When the two disagree, the store wins and the divergence is logged.
use std::{collections::HashMap, sync::Arc};

use log::*;
use tokio::sync::RwLock;

use crate::db_types::{Bid, PostId};

#[derive(Debug, Clone, Default)]
pub struct HighestBidCursor {
    bids: Arc<RwLock<HashMap<PostId, Option<Bid>>>>,
}

impl HighestBidCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the cursor for a post from the store's active bid.
    pub async fn rehydrate(&self, post_id: &PostId, active: Option<Bid>) {
        match &active {
            Some(bid) => debug!("🏷️ Cursor for post {post_id} rehydrated with bid #{} ({})", bid.id, bid.amount),
            None => debug!("🏷️ Cursor for post {post_id} rehydrated with no active bid"),
        }
        self.bids.write().await.insert(post_id.clone(), active);
    }

    /// Replaces the cached value with the store's view, warning if they differ.
    pub async fn refresh(&self, post_id: &PostId, active: Option<Bid>) {
        let mut bids = self.bids.write().await;
        let cached = bids.get(post_id).map(|b| b.as_ref().map(|b| b.id));
        let stored = active.as_ref().map(|b| b.id);
        match cached {
            Some(cached) if cached != stored => {
                warn!(
                    "🏷️ Highest bid cursor for post {post_id} was {cached:?} but the store says {stored:?}. Using the \
                     stored value."
                );
            },
            None => trace!("🏷️ Cursor for post {post_id} was not loaded. Loading it now."),
            _ => {},
        }
        bids.insert(post_id.clone(), active);
    }

    pub async fn set(&self, post_id: &PostId, bid: Bid) {
        self.bids.write().await.insert(post_id.clone(), Some(bid));
    }

    /// The cached active bid. The outer `None` means the post has not been loaded.
    pub async fn get(&self, post_id: &PostId) -> Option<Option<Bid>> {
        self.bids.read().await.get(post_id).cloned()
    }

    pub async fn remove(&self, post_id: &PostId) {
        self.bids.write().await.remove(post_id);
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;

    use super::*;
    use crate::db_types::{AccountId, BidStatus, Tokens};

    fn bid(id: i64, amount: i64) -> Bid {
        Bid {
            id,
            post_id: PostId::from("p1"),
            bidder_id: format!("bidder-{id}"),
            bidder_account: AccountId::from("acct"),
            amount: Tokens::from(amount),
            score: 0.0,
            status: BidStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn refresh_prefers_the_store() {
        let cursor = HighestBidCursor::new();
        let post = PostId::from("p1");
        assert_eq!(cursor.get(&post).await, None);
        cursor.rehydrate(&post, None).await;
        assert_eq!(cursor.get(&post).await, Some(None));
        cursor.set(&post, bid(1, 100)).await;
        cursor.refresh(&post, Some(bid(2, 200))).await;
        let current = cursor.get(&post).await.flatten().unwrap();
        assert_eq!(current.id, 2);
        cursor.remove(&post).await;
        assert_eq!(cursor.get(&post).await, None);
    }
}
