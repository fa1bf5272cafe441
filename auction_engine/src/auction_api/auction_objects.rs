use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    auction_api::errors::AuctionError,
    db_types::{AccountId, Agent, Bid, Post, PostId, SkillRequirement, TokenId, Topic, TopicId},
    traits::{PublishReceipt, TransferReceipt},
};

pub const DEFAULT_AUCTION_DURATION_HOURS: i64 = 48;
pub const DEFAULT_QUALIFICATION_THRESHOLD: f64 = 20.0;
pub const DEFAULT_CANDIDATE_PAGE_SIZE: i64 = 500;
pub const DEFAULT_MAIN_AGENT_NAME: &str = "Main Agent";

//--------------------------------------    AuctionMessage     ---------------------------------------------------------
/// The body shared by every message published to an auction topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidMessage {
    pub post_id: PostId,
    pub bid_id: i64,
    pub bidder_id: String,
    pub amount: crate::db_types::Tokens,
    pub timestamp: DateTime<Utc>,
}

impl BidMessage {
    pub fn from_bid(bid: &Bid, timestamp: DateTime<Utc>) -> Self {
        Self {
            post_id: bid.post_id.clone(),
            bid_id: bid.id,
            bidder_id: bid.bidder_id.clone(),
            amount: bid.amount,
            timestamp,
        }
    }
}

/// Messages published to an auction topic. Serialized as JSON with a `type` tag, e.g.
/// `{"type":"new.bid","postId":"p1","bidId":1,"bidderId":"B","amount":4500,"timestamp":"..."}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AuctionMessage {
    #[serde(rename = "new.bid")]
    NewBid(BidMessage),
    #[serde(rename = "highest.bid")]
    HighestBid(BidMessage),
}

impl AuctionMessage {
    pub fn new_bid(bid: &Bid) -> Self {
        Self::NewBid(BidMessage::from_bid(bid, bid.created_at))
    }

    pub fn highest_bid(bid: &Bid, timestamp: DateTime<Utc>) -> Self {
        Self::HighestBid(BidMessage::from_bid(bid, timestamp))
    }

    pub fn to_json(&self) -> Result<String, AuctionError> {
        Ok(serde_json::to_string(self)?)
    }
}

//--------------------------------------     Job contexts      ---------------------------------------------------------
/// Everything the matching job needs, captured once when the post is scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingJobContext {
    pub post_id: PostId,
    pub required_skills: Vec<SkillRequirement>,
    pub topic_id: TopicId,
    pub post_agent_account: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidProcessingJobContext {
    pub post_id: PostId,
    pub topic_id: TopicId,
    pub post_agent_account: AccountId,
    pub main_agent_account: AccountId,
}

//--------------------------------------   AuctionSettings     ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct AuctionSettings {
    /// How long after the first bid the auction closes.
    pub auction_duration: Duration,
    /// A candidate must score strictly more than this to bid.
    pub qualification_threshold: f64,
    pub candidate_page_size: i64,
    /// The token used for refunds and awards.
    pub token_id: TokenId,
    pub main_agent_name: String,
}

impl Default for AuctionSettings {
    fn default() -> Self {
        Self {
            auction_duration: Duration::hours(DEFAULT_AUCTION_DURATION_HOURS),
            qualification_threshold: DEFAULT_QUALIFICATION_THRESHOLD,
            candidate_page_size: DEFAULT_CANDIDATE_PAGE_SIZE,
            token_id: TokenId::default(),
            main_agent_name: DEFAULT_MAIN_AGENT_NAME.to_string(),
        }
    }
}

//--------------------------------------       Outcomes        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    TopicClosed,
    NoQualifyingCandidates,
    BidPlaced { bid: Bid, receipt: PublishReceipt },
}

/// The result of comparing the top pending bid against the active bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidDecision {
    /// The pending bid is strictly higher and comes from a different bidder.
    Promote,
    /// The pending bid does not beat the active bid. Equal amounts never displace the incumbent.
    NotHigher,
    /// The pending bid is higher, but was placed by the bidder who already holds the active bid.
    SameBidder,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AwardOutcome {
    NoActiveBid,
    Awarded { bid: Bid, transfer: TransferReceipt },
    /// The award transfer failed. The bid remains `active`.
    Failed { bid: Bid, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CloseOutcome {
    AlreadyClosed,
    Closed { closed_at: DateTime<Utc>, award: AwardOutcome },
}

#[derive(Debug, Clone, PartialEq)]
pub enum BidProcessingOutcome {
    AlreadyClosed,
    Closed(CloseOutcome),
    NoPendingBids,
    Unchanged(BidDecision),
    /// Another writer moved the top pending bid before it could be promoted.
    PromotionSkipped(i64),
    Promoted { bid: Bid, refunded: Option<Bid> },
}

impl BidProcessingOutcome {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::AlreadyClosed | Self::Closed(_))
    }
}

/// Everything needed to register the recurring jobs for a post.
#[derive(Debug, Clone)]
pub struct PreparedAuction {
    pub post: Post,
    pub main_agent: Agent,
    pub post_agent: Agent,
    pub topic: Topic,
    /// `true` if the topic was created by this call
    pub topic_created: bool,
}

impl PreparedAuction {
    pub fn matching_context(&self) -> MatchingJobContext {
        MatchingJobContext {
            post_id: self.post.id.clone(),
            required_skills: self.post.required_skills.clone(),
            topic_id: self.topic.topic_id.clone(),
            post_agent_account: self.post_agent.account_id.clone(),
        }
    }

    pub fn processing_context(&self) -> BidProcessingJobContext {
        BidProcessingJobContext {
            post_id: self.post.id.clone(),
            topic_id: self.topic.topic_id.clone(),
            post_agent_account: self.post_agent.account_id.clone(),
            main_agent_account: self.main_agent.account_id.clone(),
        }
    }
}
