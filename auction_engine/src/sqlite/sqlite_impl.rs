//! `SqliteDatabase` is a concrete implementation of an auction engine backend.
//!
//! It uses SQLite as the backend and implements all the store traits defined in the [`crate::traits`] module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate, SqlitePool};

use super::db::{agents, bids, jobs, new_pool, posts, profiles, topics};
use crate::{
    db_types::{
        Agent,
        Bid,
        BidStatus,
        CandidateProfile,
        JobKind,
        JobRecord,
        NewAgent,
        NewBid,
        NewCandidateProfile,
        NewJobRecord,
        NewPost,
        Post,
        PostId,
        Topic,
        TopicId,
    },
    traits::{AgentManagement, AuctionDatabase, AuctionDbError, BidManagement, JobManagement, MarketplaceQueries},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl AuctionDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_topic(&self, post_id: &PostId) -> Result<Option<Topic>, AuctionDbError> {
        let mut conn = self.pool.acquire().await?;
        let topic = topics::fetch_topic(post_id, &mut conn).await?;
        Ok(topic)
    }

    async fn insert_topic(&self, post_id: &PostId, topic_id: &TopicId) -> Result<(Topic, bool), AuctionDbError> {
        let mut tx = self.pool.begin().await?;
        let result = topics::idempotent_insert(post_id, topic_id, Utc::now(), &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn close_topic(&self, post_id: &PostId, closed_at: DateTime<Utc>) -> Result<Option<Topic>, AuctionDbError> {
        let mut tx = self.pool.begin().await?;
        let topic = topics::close_topic(post_id, closed_at, &mut tx).await?;
        tx.commit().await?;
        if topic.is_some() {
            debug!("🗃️ Topic for post {post_id} closed at {closed_at}");
        }
        Ok(topic)
    }

    async fn fetch_posts_without_topic(&self, limit: i64) -> Result<Vec<Post>, AuctionDbError> {
        let mut conn = self.pool.acquire().await?;
        let posts = posts::fetch_posts_without_topic(limit, &mut conn).await?;
        Ok(posts)
    }

    async fn close(&mut self) -> Result<(), AuctionDbError> {
        self.pool.close().await;
        Ok(())
    }
}

impl BidManagement for SqliteDatabase {
    async fn insert_bid(&self, bid: NewBid) -> Result<Bid, AuctionDbError> {
        let mut tx = self.pool.begin().await?;
        let bid = bids::insert_bid(bid, &mut tx).await?;
        tx.commit().await?;
        Ok(bid)
    }

    async fn fetch_bid(&self, id: i64) -> Result<Option<Bid>, AuctionDbError> {
        let mut conn = self.pool.acquire().await?;
        let bid = bids::fetch_bid(id, &mut conn).await?;
        Ok(bid)
    }

    async fn fetch_first_bid(&self, post_id: &PostId) -> Result<Option<Bid>, AuctionDbError> {
        let mut conn = self.pool.acquire().await?;
        let bid = bids::fetch_first_bid(post_id, &mut conn).await?;
        Ok(bid)
    }

    async fn fetch_pending_bids(&self, post_id: &PostId) -> Result<Vec<Bid>, AuctionDbError> {
        let mut conn = self.pool.acquire().await?;
        let bids = bids::fetch_pending_bids(post_id, &mut conn).await?;
        Ok(bids)
    }

    async fn fetch_active_bid(&self, post_id: &PostId) -> Result<Option<Bid>, AuctionDbError> {
        let mut conn = self.pool.acquire().await?;
        let mut active = bids::fetch_active_bids(post_id, &mut conn).await?;
        match active.len() {
            0 => Ok(None),
            1 => Ok(active.pop()),
            n => {
                error!("🗃️ Post {post_id} has {n} active bids. The bid store is inconsistent.");
                Err(AuctionDbError::MultipleActiveBids(post_id.clone()))
            },
        }
    }

    async fn fetch_bids_for_post(&self, post_id: &PostId) -> Result<Vec<Bid>, AuctionDbError> {
        let mut conn = self.pool.acquire().await?;
        let bids = bids::fetch_bids_for_post(post_id, &mut conn).await?;
        Ok(bids)
    }

    async fn update_bid_status(
        &self,
        bid_id: i64,
        from: BidStatus,
        to: BidStatus,
    ) -> Result<Option<Bid>, AuctionDbError> {
        let mut tx = self.pool.begin().await?;
        let bid = bids::update_bid_status(bid_id, from, to, Utc::now(), &mut tx).await.map_err(|e| match e {
            sqlx::Error::Database(err) if err.is_unique_violation() => AuctionDbError::ActiveBidExists(bid_id),
            e => AuctionDbError::from(e),
        })?;
        tx.commit().await?;
        Ok(bid)
    }
}

impl MarketplaceQueries for SqliteDatabase {
    async fn fetch_post(&self, post_id: &PostId) -> Result<Option<Post>, AuctionDbError> {
        let mut conn = self.pool.acquire().await?;
        let post = posts::fetch_post(post_id, &mut conn).await?;
        Ok(post)
    }

    async fn fetch_candidate_profiles(&self, offset: i64, limit: i64) -> Result<Vec<CandidateProfile>, AuctionDbError> {
        let mut conn = self.pool.acquire().await?;
        let profiles = profiles::fetch_profiles(offset, limit, &mut conn).await?;
        Ok(profiles)
    }
}

impl AgentManagement for SqliteDatabase {
    async fn fetch_agent_by_name(&self, name: &str) -> Result<Option<Agent>, AuctionDbError> {
        let mut conn = self.pool.acquire().await?;
        let agent = agents::fetch_agent_by_name(name, &mut conn).await?;
        Ok(agent)
    }

    async fn insert_agent(&self, agent: NewAgent) -> Result<Agent, AuctionDbError> {
        let mut tx = self.pool.begin().await?;
        let agent = agents::insert_agent(agent, &mut tx).await?;
        tx.commit().await?;
        Ok(agent)
    }
}

impl JobManagement for SqliteDatabase {
    async fn upsert_job(&self, job: NewJobRecord) -> Result<JobRecord, AuctionDbError> {
        let mut tx = self.pool.begin().await?;
        let record = jobs::upsert_job(job, &mut tx).await?;
        tx.commit().await?;
        Ok(record)
    }

    async fn fetch_enabled_jobs(&self) -> Result<Vec<JobRecord>, AuctionDbError> {
        let mut conn = self.pool.acquire().await?;
        let jobs = jobs::fetch_enabled_jobs(&mut conn).await?;
        Ok(jobs)
    }

    async fn fetch_jobs_for_post(&self, post_id: &PostId) -> Result<Vec<JobRecord>, AuctionDbError> {
        let mut conn = self.pool.acquire().await?;
        let jobs = jobs::fetch_jobs_for_post(post_id, &mut conn).await?;
        Ok(jobs)
    }

    async fn disable_jobs_for_post(&self, post_id: &PostId) -> Result<u64, AuctionDbError> {
        let mut tx = self.pool.begin().await?;
        let n = jobs::disable_jobs_for_post(post_id, &mut tx).await?;
        tx.commit().await?;
        Ok(n)
    }

    async fn mark_job_run(&self, post_id: &PostId, kind: JobKind, at: DateTime<Utc>) -> Result<(), AuctionDbError> {
        let mut tx = self.pool.begin().await?;
        jobs::mark_job_run(post_id, kind, at, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Stores a post. Posts are normally written by the marketplace application; this is used for seeding and tests.
    pub async fn insert_post(&self, post: NewPost) -> Result<Post, AuctionDbError> {
        let mut tx = self.pool.begin().await?;
        let post = posts::insert_post(post, &mut tx).await?;
        tx.commit().await?;
        Ok(post)
    }

    /// Stores a candidate profile. Used for seeding and tests.
    pub async fn insert_candidate_profile(
        &self,
        profile: NewCandidateProfile,
    ) -> Result<CandidateProfile, AuctionDbError> {
        let mut tx = self.pool.begin().await?;
        let profile = profiles::insert_profile(profile, &mut tx).await?;
        tx.commit().await?;
        Ok(profile)
    }
}
