//! `SqliteMessageChannel` is a table-backed [`MessageChannel`].
//!
//! Topics live in `channel_topics` and messages in `topic_messages`. Sequence numbers are assigned inside the insert
//! statement, and `(topic_id, sequence_number)` is unique, so concurrent publishers can never share a number.
use chrono::Utc;
use log::*;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::{
    db_types::{AccountId, TopicId},
    traits::{ChannelError, MessageChannel, PublishReceipt},
};

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct TopicMessage {
    pub topic_id: TopicId,
    pub sequence_number: i64,
    pub publisher: AccountId,
    pub payload: String,
    pub published_at: chrono::DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SqliteMessageChannel {
    pool: SqlitePool,
}

impl SqliteMessageChannel {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All messages in the topic, in sequence order.
    pub async fn fetch_messages(&self, topic_id: &TopicId) -> Result<Vec<TopicMessage>, ChannelError> {
        let messages = sqlx::query_as(
            r#"
                SELECT topic_id, sequence_number, publisher, payload, published_at
                FROM topic_messages WHERE topic_id = $1
                ORDER BY sequence_number ASC
            "#,
        )
        .bind(topic_id.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }
}

impl MessageChannel for SqliteMessageChannel {
    async fn create_topic(&self, owner: &AccountId, memo: &str) -> Result<TopicId, ChannelError> {
        let topic_id = TopicId::from(format!("topic-{:016x}", rand::random::<u64>()));
        sqlx::query("INSERT INTO channel_topics (topic_id, owner, memo, created_at) VALUES ($1, $2, $3, $4)")
            .bind(topic_id.as_str())
            .bind(owner.as_str())
            .bind(memo)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| ChannelError::TopicCreationFailed(e.to_string()))?;
        info!("📡️ Created topic {topic_id} ({memo})");
        Ok(topic_id)
    }

    async fn publish(
        &self,
        publisher: &AccountId,
        topic_id: &TopicId,
        payload: &str,
    ) -> Result<PublishReceipt, ChannelError> {
        let exists: Option<(String,)> = sqlx::query_as("SELECT topic_id FROM channel_topics WHERE topic_id = $1")
            .bind(topic_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(ChannelError::TopicNotFound(topic_id.clone()));
        }
        // The insert must be the first statement of the transaction so it takes the write lock before reading
        let mut tx = self.pool.begin().await?;
        let published_at = Utc::now();
        let (sequence_number,): (i64,) = sqlx::query_as(
            r#"
                INSERT INTO topic_messages (topic_id, sequence_number, publisher, payload, published_at)
                SELECT $1, COALESCE(MAX(sequence_number), 0) + 1, $2, $3, $4
                FROM topic_messages WHERE topic_id = $1
                RETURNING sequence_number;
            "#,
        )
        .bind(topic_id.as_str())
        .bind(publisher.as_str())
        .bind(payload)
        .bind(published_at)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        trace!("📡️ Message #{sequence_number} published to {topic_id}");
        Ok(PublishReceipt { topic_id: topic_id.clone(), sequence_number, published_at })
    }
}
