use std::future::Future;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{Post, PostId, Topic, TopicId},
    traits::{AgentManagement, BidManagement, JobManagement, MarketplaceQueries},
};

#[derive(Debug, Clone, Error)]
pub enum AuctionDbError {
    #[error("Database engine error: {0}")]
    DatabaseError(String),
    #[error("Could not decode stored value: {0}")]
    DecodeError(String),
    #[error("An agent named '{0}' already exists")]
    AgentAlreadyExists(String),
    #[error("More than one active bid exists for post {0}")]
    MultipleActiveBids(PostId),
    #[error("Bid #{0} cannot become active while another bid on the same post is active")]
    ActiveBidExists(i64),
}

impl From<sqlx::Error> for AuctionDbError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Decode(e) | sqlx::Error::ColumnDecode { source: e, .. } => Self::DecodeError(e.to_string()),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

/// This trait defines the highest level of behaviour for backends supporting the auction engine.
///
/// This behaviour includes:
/// * Access to bids, posts, candidate profiles, agents and job records via the supertraits.
/// * Topic lifecycle management. A topic is created once per post and transitions from `active` to `closed` exactly
///   once.
pub trait AuctionDatabase:
    Clone + Send + Sync + 'static + BidManagement + MarketplaceQueries + AgentManagement + JobManagement
{
    /// The URL of the database
    fn url(&self) -> &str;

    /// Fetches the topic for the given post, if one has been created.
    fn fetch_topic(&self, post_id: &PostId) -> impl Future<Output = Result<Option<Topic>, AuctionDbError>> + Send;

    /// Stores a new, active topic for the post. This call is idempotent: if a topic already exists for the post, the
    /// existing record is returned and the second element of the tuple is `false`. The given `topic_id` is discarded
    /// in that case.
    fn insert_topic(
        &self,
        post_id: &PostId,
        topic_id: &TopicId,
    ) -> impl Future<Output = Result<(Topic, bool), AuctionDbError>> + Send;

    /// Transitions the topic for the post from `active` to `closed`, recording `closed_at`.
    ///
    /// Returns the closed topic if this call performed the transition, and `None` if the topic was already closed or
    /// does not exist. `closed_at` is therefore only ever written once.
    fn close_topic(
        &self,
        post_id: &PostId,
        closed_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<Topic>, AuctionDbError>> + Send;

    /// Fetches up to `limit` posts that do not have a topic yet, oldest first.
    fn fetch_posts_without_topic(
        &self,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<Post>, AuctionDbError>> + Send;

    /// Closes the database connection.
    fn close(&mut self) -> impl Future<Output = Result<(), AuctionDbError>> + Send;
}
