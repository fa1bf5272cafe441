#![allow(dead_code)]
use std::{future::Future, time::Duration};

use auction_engine::{
    auction_objects::AuctionSettings,
    db_types::{
        AccountId,
        Bid,
        CandidateSkill,
        NewBid,
        NewCandidateProfile,
        NewPost,
        PostId,
        SkillLevel,
        SkillRequirement,
        TokenId,
        Tokens,
    },
    traits::{AuctionDatabase, BidManagement},
    SqliteDatabase,
};
use auction_scheduler::{
    config::{JobIntervals, SchedulerConfig},
    service::{create_scheduler, SqliteScheduler},
};
use chrono::{DateTime, Utc};
use log::*;
use tempfile::TempDir;

pub const TREASURY: &str = "acct-treasury";

/// A scheduler running against a throwaway database. The database is removed when this is dropped.
pub struct TestScheduler {
    pub dir: TempDir,
    pub config: SchedulerConfig,
    pub db: SqliteDatabase,
    pub scheduler: SqliteScheduler,
}

impl TestScheduler {
    /// A scheduler whose jobs tick every second, with the treasury agent registered.
    pub async fn new() -> Self {
        let system = Self::without_treasury(Duration::from_secs(1)).await;
        system.scheduler.ensure_main_agent(&AccountId::from(TREASURY)).await.expect("Error registering treasury");
        system
    }

    pub async fn without_treasury(period: Duration) -> Self {
        let _ = env_logger::try_init();
        let dir = tempfile::tempdir().expect("Error creating temp dir");
        let config = SchedulerConfig {
            database_url: format!("sqlite://{}", dir.path().join("auction.db").display()),
            max_connections: 5,
            intervals: JobIntervals { matching: period, bid_processing: period },
            watch_new_posts: false,
            new_post_poll_interval: period,
            event_buffer_size: 10,
            operator_account: AccountId::from(TREASURY),
            auction: AuctionSettings { token_id: TokenId::from("tok-pas"), ..AuctionSettings::default() },
        };
        let scheduler = create_scheduler(&config).await.expect("Error creating scheduler");
        let db = SqliteDatabase::new_with_url(&config.database_url, 5).await.expect("Error opening database");
        info!("🚀️ Test scheduler ready at {}", config.database_url);
        Self { dir, config, db, scheduler }
    }

    /// A second scheduler on the same database, as if the process had restarted.
    pub async fn restart(&self) -> SqliteScheduler {
        create_scheduler(&self.config).await.expect("Error creating scheduler")
    }

    pub async fn add_post(&self, id: &str, skills: &[(&str, SkillLevel)]) -> PostId {
        let skills = skills.iter().map(|(n, l)| SkillRequirement::new(*n, *l)).collect();
        let post = self.db.insert_post(NewPost::new(PostId::from(id), "A job", skills)).await.expect("Error adding post");
        post.id
    }

    pub async fn add_candidate(&self, candidate_id: &str, skills: &[(&str, SkillLevel)]) {
        let skills = skills.iter().map(|(n, l)| CandidateSkill::new(*n, *l)).collect();
        let account = AccountId::from(format!("acct-{candidate_id}"));
        self.db
            .insert_candidate_profile(NewCandidateProfile::new(candidate_id, account, skills))
            .await
            .expect("Error adding candidate");
    }

    pub async fn add_pending_bid(&self, post_id: &PostId, bidder: &str, amount: i64, at: DateTime<Utc>) -> Bid {
        let bid = NewBid::new(
            post_id.clone(),
            bidder,
            AccountId::from(format!("acct-{bidder}")),
            Tokens::from(amount),
            amount as f64 / 100.0,
        )
        .with_created_at(at);
        self.db.insert_bid(bid).await.expect("Error adding bid")
    }

    pub async fn topic_is_closed(&self, post_id: &PostId) -> bool {
        let topic = self.db.fetch_topic(post_id).await.expect("Error fetching topic");
        topic.map(|t| t.is_closed()).unwrap_or(false)
    }

    pub async fn tear_down(self) {
        self.scheduler.shutdown().await;
        let mut db = self.db;
        if let Err(e) = db.close().await {
            error!("🚀️ Failed to close database: {e}");
        }
    }
}

/// Polls `check` until it returns true, for at most ten seconds.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    false
}
