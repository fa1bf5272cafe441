use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{JobKind, JobRecord, NewJobRecord, PostId};

/// Creates the job record, or refreshes and re-enables the existing record for the same post and job kind.
pub async fn upsert_job(job: NewJobRecord, conn: &mut SqliteConnection) -> Result<JobRecord, sqlx::Error> {
    let record: JobRecord = sqlx::query_as(
        r#"
            INSERT INTO scheduled_jobs (post_id, job_kind, context, interval_secs, enabled, created_at)
            VALUES ($1, $2, $3, $4, TRUE, $5)
            ON CONFLICT (post_id, job_kind) DO UPDATE SET
                context = excluded.context,
                interval_secs = excluded.interval_secs,
                enabled = TRUE,
                disabled_at = NULL
            RETURNING *;
        "#,
    )
    .bind(job.post_id.as_str())
    .bind(job.job_kind)
    .bind(job.context)
    .bind(job.interval_secs)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    debug!("📝️ {} job for post {} saved", record.job_kind, record.post_id);
    Ok(record)
}

pub async fn fetch_enabled_jobs(conn: &mut SqliteConnection) -> Result<Vec<JobRecord>, sqlx::Error> {
    let jobs =
        sqlx::query_as("SELECT * FROM scheduled_jobs WHERE enabled = TRUE ORDER BY post_id, job_kind").fetch_all(conn).await?;
    Ok(jobs)
}

pub async fn fetch_jobs_for_post(post_id: &PostId, conn: &mut SqliteConnection) -> Result<Vec<JobRecord>, sqlx::Error> {
    let jobs = sqlx::query_as("SELECT * FROM scheduled_jobs WHERE post_id = $1 ORDER BY job_kind")
        .bind(post_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(jobs)
}

pub async fn disable_jobs_for_post(post_id: &PostId, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("UPDATE scheduled_jobs SET enabled = FALSE, disabled_at = $1 WHERE post_id = $2 AND enabled = TRUE")
            .bind(Utc::now())
            .bind(post_id.as_str())
            .execute(conn)
            .await?;
    Ok(result.rows_affected())
}

pub async fn mark_job_run(
    post_id: &PostId,
    kind: JobKind,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE scheduled_jobs SET last_run_at = $1 WHERE post_id = $2 AND job_kind = $3")
        .bind(at)
        .bind(post_id.as_str())
        .bind(kind)
        .execute(conn)
        .await?;
    Ok(())
}
