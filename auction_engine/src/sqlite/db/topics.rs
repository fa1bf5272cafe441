use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{PostId, Topic, TopicId};

pub async fn fetch_topic(post_id: &PostId, conn: &mut SqliteConnection) -> Result<Option<Topic>, sqlx::Error> {
    let topic =
        sqlx::query_as("SELECT * FROM topics WHERE post_id = $1").bind(post_id.as_str()).fetch_optional(conn).await?;
    Ok(topic)
}

/// Inserts the topic for the post, returning `false` in the second parameter if the post already has a topic.
pub async fn idempotent_insert(
    post_id: &PostId,
    topic_id: &TopicId,
    created_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(Topic, bool), sqlx::Error> {
    let inserted: Option<Topic> = sqlx::query_as(
        r#"
            INSERT INTO topics (post_id, topic_id, status, created_at) VALUES ($1, $2, 'active', $3)
            ON CONFLICT (post_id) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(post_id.as_str())
    .bind(topic_id.as_str())
    .bind(created_at)
    .fetch_optional(&mut *conn)
    .await?;
    match inserted {
        Some(topic) => {
            debug!("📝️ Topic {} recorded for post {post_id}", topic.topic_id);
            Ok((topic, true))
        },
        None => {
            let topic = sqlx::query_as("SELECT * FROM topics WHERE post_id = $1")
                .bind(post_id.as_str())
                .fetch_one(&mut *conn)
                .await?;
            Ok((topic, false))
        },
    }
}

/// Closes the topic if it is still active. Returns `None` if it was already closed, so `closed_at` is written once.
pub async fn close_topic(
    post_id: &PostId,
    closed_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Topic>, sqlx::Error> {
    let topic = sqlx::query_as(
        "UPDATE topics SET status = 'closed', closed_at = $1 WHERE post_id = $2 AND status = 'active' RETURNING *",
    )
    .bind(closed_at)
    .bind(post_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(topic)
}
