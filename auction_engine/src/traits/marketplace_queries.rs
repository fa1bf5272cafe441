use std::future::Future;

use crate::{
    db_types::{CandidateProfile, Post, PostId},
    traits::AuctionDbError,
};

/// Read-only access to marketplace data. Posts and candidate profiles are owned by the marketplace application.
pub trait MarketplaceQueries {
    fn fetch_post(&self, post_id: &PostId) -> impl Future<Output = Result<Option<Post>, AuctionDbError>> + Send;

    /// Fetches a page of candidate profiles, ordered by profile id.
    fn fetch_candidate_profiles(
        &self,
        offset: i64,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<CandidateProfile>, AuctionDbError>> + Send;
}
