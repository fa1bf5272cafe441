use log::debug;
use sqlx::{types::Json, SqliteConnection};

use crate::db_types::{NewPost, Post, PostId};

pub async fn insert_post(post: NewPost, conn: &mut SqliteConnection) -> Result<Post, sqlx::Error> {
    let post: Post = sqlx::query_as(
        "INSERT INTO posts (id, title, required_skills, created_at) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(post.id.as_str())
    .bind(post.title)
    .bind(Json(post.required_skills))
    .bind(post.created_at)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Post {} inserted", post.id);
    Ok(post)
}

pub async fn fetch_post(post_id: &PostId, conn: &mut SqliteConnection) -> Result<Option<Post>, sqlx::Error> {
    let post = sqlx::query_as("SELECT * FROM posts WHERE id = $1").bind(post_id.as_str()).fetch_optional(conn).await?;
    Ok(post)
}

/// Posts that have no auction topic yet, oldest first.
pub async fn fetch_posts_without_topic(limit: i64, conn: &mut SqliteConnection) -> Result<Vec<Post>, sqlx::Error> {
    let posts = sqlx::query_as(
        r#"
            SELECT posts.* FROM posts
            LEFT JOIN topics ON topics.post_id = posts.id
            WHERE topics.id IS NULL
            ORDER BY posts.created_at ASC
            LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(posts)
}
