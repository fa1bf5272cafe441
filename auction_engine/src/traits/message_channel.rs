use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{AccountId, TopicId};

#[derive(Debug, Clone, Error)]
pub enum ChannelError {
    #[error("Topic {0} does not exist")]
    TopicNotFound(TopicId),
    #[error("Could not create topic: {0}")]
    TopicCreationFailed(String),
    #[error("The message was rejected: {0}")]
    PublishRejected(String),
    #[error("Channel backend error: {0}")]
    BackendError(String),
}

impl From<sqlx::Error> for ChannelError {
    fn from(e: sqlx::Error) -> Self {
        Self::BackendError(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub topic_id: TopicId,
    /// Strictly increasing within a topic, starting at 1.
    pub sequence_number: i64,
    pub published_at: DateTime<Utc>,
}

/// An append-only, ordered message log, partitioned into topics.
pub trait MessageChannel: Clone + Send + Sync + 'static {
    fn create_topic(&self, owner: &AccountId, memo: &str) -> impl Future<Output = Result<TopicId, ChannelError>> + Send;

    /// Appends `payload` to the topic. Messages published to the same topic are totally ordered by their sequence
    /// number.
    fn publish(
        &self,
        publisher: &AccountId,
        topic_id: &TopicId,
        payload: &str,
    ) -> impl Future<Output = Result<PublishReceipt, ChannelError>> + Send;
}
