use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    db_types::{Bid, PostId},
    traits::{PublishReceipt, TransferReceipt},
};

/// A qualifying candidate produced a new pending bid, and it was announced on the post's topic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBidEvent {
    pub bid: Bid,
    pub receipt: PublishReceipt,
}

impl NewBidEvent {
    pub fn new(bid: Bid, receipt: PublishReceipt) -> Self {
        Self { bid, receipt }
    }
}

/// A bid became the leading bid for its post. `previous` holds the bid it displaced, if there was one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighestBidEvent {
    pub bid: Bid,
    pub previous: Option<Bid>,
}

impl HighestBidEvent {
    pub fn new(bid: Bid, previous: Option<Bid>) -> Self {
        Self { bid, previous }
    }
}

/// A displaced bid's amount was returned to the bidder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BidRefundedEvent {
    pub bid: Bid,
    pub transfer: TransferReceipt,
}

impl BidRefundedEvent {
    pub fn new(bid: Bid, transfer: TransferReceipt) -> Self {
        Self { bid, transfer }
    }
}

/// The auction window for a post elapsed and its topic was closed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuctionClosedEvent {
    pub post_id: PostId,
    pub closed_at: DateTime<Utc>,
    /// The winning bid, if there was a leader and the award transfer succeeded.
    pub winner: Option<Bid>,
}

impl AuctionClosedEvent {
    pub fn new(post_id: PostId, closed_at: DateTime<Utc>, winner: Option<Bid>) -> Self {
        Self { post_id, closed_at, winner }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventType {
    NewBid(NewBidEvent),
    HighestBid(HighestBidEvent),
    BidRefunded(BidRefundedEvent),
    AuctionClosed(AuctionClosedEvent),
}
