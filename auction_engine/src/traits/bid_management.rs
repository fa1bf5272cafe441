use std::future::Future;

use crate::{
    db_types::{Bid, BidStatus, NewBid, PostId},
    traits::AuctionDbError,
};

/// The `BidManagement` trait defines the behaviour for storing and querying bids.
///
/// Bids are never deleted. After creation, only the `status` (and `updated_at`) of a bid may change, and only via
/// [`BidManagement::update_bid_status`].
pub trait BidManagement {
    /// Stores a new bid with `pending` status and returns the stored record.
    fn insert_bid(&self, bid: NewBid) -> impl Future<Output = Result<Bid, AuctionDbError>> + Send;

    fn fetch_bid(&self, id: i64) -> impl Future<Output = Result<Option<Bid>, AuctionDbError>> + Send;

    /// Fetches the earliest-created bid for the post, regardless of its status.
    fn fetch_first_bid(&self, post_id: &PostId) -> impl Future<Output = Result<Option<Bid>, AuctionDbError>> + Send;

    /// Fetches all `pending` bids for the post, sorted by amount (highest first). Ties are ordered by creation time
    /// and then by id, so the ordering is deterministic.
    fn fetch_pending_bids(&self, post_id: &PostId) -> impl Future<Output = Result<Vec<Bid>, AuctionDbError>> + Send;

    /// Fetches the `active` bid for the post, if any.
    ///
    /// If the store holds more than one active bid for the post, [`AuctionDbError::MultipleActiveBids`] is returned.
    fn fetch_active_bid(&self, post_id: &PostId) -> impl Future<Output = Result<Option<Bid>, AuctionDbError>> + Send;

    /// Fetches every bid for the post, oldest first.
    fn fetch_bids_for_post(&self, post_id: &PostId) -> impl Future<Output = Result<Vec<Bid>, AuctionDbError>> + Send;

    /// Atomically moves the bid from status `from` to status `to`.
    ///
    /// Returns the updated bid, or `None` if the bid was not in status `from` (in which case nothing changes). This
    /// makes every status transition idempotent and safe against a concurrent writer that got there first.
    fn update_bid_status(
        &self,
        bid_id: i64,
        from: BidStatus,
        to: BidStatus,
    ) -> impl Future<Output = Result<Option<Bid>, AuctionDbError>> + Send;
}
