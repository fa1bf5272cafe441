use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
    db_types::{JobKind, JobRecord, NewJobRecord, PostId},
    traits::AuctionDbError,
};

/// Persistence for recurring job registrations.
pub trait JobManagement {
    /// Creates the job record, or re-enables and refreshes an existing record for the same post and job kind.
    fn upsert_job(&self, job: NewJobRecord) -> impl Future<Output = Result<JobRecord, AuctionDbError>> + Send;

    /// Fetches all enabled job records, ordered by post and job kind.
    fn fetch_enabled_jobs(&self) -> impl Future<Output = Result<Vec<JobRecord>, AuctionDbError>> + Send;

    fn fetch_jobs_for_post(&self, post_id: &PostId) -> impl Future<Output = Result<Vec<JobRecord>, AuctionDbError>> + Send;

    /// Disables every job for the post. Returns the number of records that were disabled by this call.
    fn disable_jobs_for_post(&self, post_id: &PostId) -> impl Future<Output = Result<u64, AuctionDbError>> + Send;

    fn mark_job_run(
        &self,
        post_id: &PostId,
        kind: JobKind,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), AuctionDbError>> + Send;
}
