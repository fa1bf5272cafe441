//! The auction state machine.
//!
//! | Current state | Trigger                                                   | Result                               |
//! |---------------|-----------------------------------------------------------|--------------------------------------|
//! | Open          | Top pending bid is strictly higher, from another bidder    | Refund active bid, promote, publish  |
//! | Open          | Top pending bid is equal or lower                          | Nothing                              |
//! | Open          | Top pending bid is higher, from the active bidder          | Nothing (logged)                     |
//! | Open          | `now - first bid > auction duration`                       | Close topic, award active bid        |
//! | Closed        | Any                                                        | Nothing                              |
//!
//! Bids move `pending -> active -> refunded | won`. Every move is a conditional update on the expected current status,
//! so repeating a step is harmless.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    auction_api::{
        auction_objects::{
            AuctionMessage,
            AuctionSettings,
            AwardOutcome,
            BidDecision,
            BidProcessingJobContext,
            BidProcessingOutcome,
            CloseOutcome,
        },
        cursor::HighestBidCursor,
        errors::AuctionError,
    },
    db_types::{Bid, BidStatus, PostId, Topic},
    events::{AuctionClosedEvent, BidRefundedEvent, EventProducers, HighestBidEvent},
    traits::{AuctionDatabase, AuctionDbError, LedgerGateway, MessageChannel, TransferReceipt, TransferRequest},
};

/// Compares the top pending bid with the current active bid.
///
/// A pending bid takes the lead only if its amount is strictly greater than the active bid's amount (or there is no
/// active bid) and it was placed by a different bidder.
pub fn evaluate_top_bid(active: Option<&Bid>, top: &Bid) -> BidDecision {
    match active {
        None => BidDecision::Promote,
        Some(active) if top.amount <= active.amount => BidDecision::NotHigher,
        Some(active) if top.bidder_id == active.bidder_id => BidDecision::SameBidder,
        Some(_) => BidDecision::Promote,
    }
}

/// `AuctionFlowApi` drives the bid-processing job, and closes auctions once their window has elapsed.
pub struct AuctionFlowApi<B, L, C> {
    db: B,
    ledger: L,
    channel: C,
    settings: AuctionSettings,
    cursor: HighestBidCursor,
    producers: EventProducers,
}

impl<B, L, C> Debug for AuctionFlowApi<B, L, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuctionFlowApi ({} window)", self.settings.auction_duration)
    }
}

impl<B, L, C> AuctionFlowApi<B, L, C> {
    pub fn new(db: B, ledger: L, channel: C, settings: AuctionSettings, producers: EventProducers) -> Self {
        Self { db, ledger, channel, settings, cursor: HighestBidCursor::new(), producers }
    }

    pub fn cursor(&self) -> &HighestBidCursor {
        &self.cursor
    }

    pub fn settings(&self) -> &AuctionSettings {
        &self.settings
    }
}

impl<B, L, C> AuctionFlowApi<B, L, C>
where
    B: AuctionDatabase,
    L: LedgerGateway,
    C: MessageChannel,
{
    /// Loads the post's active bid from the store into the highest-bid cursor.
    pub async fn rehydrate(&self, post_id: &PostId) -> Result<Option<Bid>, AuctionError> {
        let active = self.db.fetch_active_bid(post_id).await?;
        self.cursor.rehydrate(post_id, active.clone()).await;
        Ok(active)
    }

    pub async fn process_bids(&self, ctx: &BidProcessingJobContext) -> Result<BidProcessingOutcome, AuctionError> {
        self.process_bids_at(ctx, Utc::now()).await
    }

    /// Runs a single bid-processing tick as if the current time were `now`.
    ///
    /// 1. If the topic is closed, nothing happens.
    /// 2. If the auction window has elapsed, the auction is closed (see [`Self::close_auction_at`]).
    /// 3. Otherwise the top pending bid is compared against the active bid. If it takes the lead, the active bid is
    ///    refunded first. A failed refund aborts the tick, and nothing is promoted.
    /// 4. The promoted bid is announced on the topic as `highest.bid`.
    pub async fn process_bids_at(
        &self,
        ctx: &BidProcessingJobContext,
        now: DateTime<Utc>,
    ) -> Result<BidProcessingOutcome, AuctionError> {
        let post_id = &ctx.post_id;
        let topic = self.fetch_topic(post_id).await?;
        if topic.is_closed() {
            debug!("🏷️ Auction for post {post_id} is already closed");
            return Ok(BidProcessingOutcome::AlreadyClosed);
        }
        if self.is_expired(post_id, now).await? {
            info!("🏷️ The auction window for post {post_id} has elapsed. Closing the auction.");
            let outcome = self.close_auction_at(ctx, now).await?;
            return Ok(BidProcessingOutcome::Closed(outcome));
        }
        let pending = self.db.fetch_pending_bids(post_id).await?;
        let Some(top) = pending.into_iter().next() else {
            trace!("🏷️ No pending bids for post {post_id}");
            return Ok(BidProcessingOutcome::NoPendingBids);
        };
        let active = self.db.fetch_active_bid(post_id).await?;
        self.cursor.refresh(post_id, active.clone()).await;
        match evaluate_top_bid(active.as_ref(), &top) {
            BidDecision::NotHigher => {
                trace!("🏷️ Top pending bid #{} ({}) does not beat the active bid", top.id, top.amount);
                Ok(BidProcessingOutcome::Unchanged(BidDecision::NotHigher))
            },
            BidDecision::SameBidder => {
                info!(
                    "🏷️ Bidder {} already holds the lead on post {post_id}. Bid #{} ({}) is not promoted.",
                    top.bidder_id, top.id, top.amount
                );
                Ok(BidProcessingOutcome::Unchanged(BidDecision::SameBidder))
            },
            BidDecision::Promote => self.promote(ctx, top, active, now).await,
        }
    }

    async fn promote(
        &self,
        ctx: &BidProcessingJobContext,
        top: Bid,
        active: Option<Bid>,
        now: DateTime<Utc>,
    ) -> Result<BidProcessingOutcome, AuctionError> {
        let post_id = &ctx.post_id;
        let refunded = match active {
            Some(active) => {
                let (refunded, _) = self.refund_bid(ctx, &active).await?;
                Some(refunded)
            },
            None => None,
        };
        let promoted = match self.db.update_bid_status(top.id, BidStatus::Pending, BidStatus::Active).await {
            Ok(Some(bid)) => bid,
            Ok(None) => {
                warn!("🏷️ Bid #{} was no longer pending and could not be promoted", top.id);
                return Ok(BidProcessingOutcome::PromotionSkipped(top.id));
            },
            Err(AuctionDbError::ActiveBidExists(id)) => {
                warn!("🏷️ Another bid on post {post_id} became active first. Bid #{id} stays pending.");
                return Ok(BidProcessingOutcome::PromotionSkipped(id));
            },
            Err(e) => return Err(e.into()),
        };
        self.cursor.set(post_id, promoted.clone()).await;
        info!("🏷️ Bid #{} by {} ({}) is now the highest bid on post {post_id}", promoted.id, promoted.bidder_id, promoted.amount);
        let payload = AuctionMessage::highest_bid(&promoted, now).to_json()?;
        let receipt = self.channel.publish(&ctx.post_agent_account, &ctx.topic_id, &payload).await.map_err(|e| {
            error!("🏷️ Bid #{} was promoted but highest.bid could not be published: {e}", promoted.id);
            e
        })?;
        trace!("🏷️ highest.bid published as message #{}", receipt.sequence_number);
        self.producers.publish_highest_bid(HighestBidEvent::new(promoted.clone(), refunded.clone())).await;
        Ok(BidProcessingOutcome::Promoted { bid: promoted, refunded })
    }

    /// `true` once more than the auction duration has passed since the post's first bid. Posts without bids never
    /// expire.
    pub async fn is_expired(&self, post_id: &PostId, now: DateTime<Utc>) -> Result<bool, AuctionError> {
        let first = self.db.fetch_first_bid(post_id).await?;
        Ok(first.is_some_and(|bid| now - bid.created_at > self.settings.auction_duration))
    }

    pub async fn close_auction(&self, ctx: &BidProcessingJobContext) -> Result<CloseOutcome, AuctionError> {
        self.close_auction_at(ctx, Utc::now()).await
    }

    /// Closes the auction and awards the active bid, if there is one.
    ///
    /// The topic is closed first, with a conditional update, so only one caller ever gets to award. A failed award is
    /// logged and reported in the outcome; the bid stays `active` and the topic stays closed.
    pub async fn close_auction_at(
        &self,
        ctx: &BidProcessingJobContext,
        now: DateTime<Utc>,
    ) -> Result<CloseOutcome, AuctionError> {
        let post_id = &ctx.post_id;
        let Some(topic) = self.db.close_topic(post_id, now).await? else {
            debug!("🔒️ Auction for post {post_id} was already closed");
            return Ok(CloseOutcome::AlreadyClosed);
        };
        let closed_at = topic.closed_at.unwrap_or(now);
        let award = match self.db.fetch_active_bid(post_id).await? {
            None => {
                info!("🔒️ Auction for post {post_id} closed without a winner");
                AwardOutcome::NoActiveBid
            },
            Some(bid) => match self.award_bid(ctx, &bid).await {
                Ok((bid, transfer)) => {
                    info!("🔒️ Auction for post {post_id} closed. {} won with {}", bid.bidder_id, bid.amount);
                    AwardOutcome::Awarded { bid, transfer }
                },
                Err(e) => {
                    error!("🔒️ Auction for post {post_id} closed, but bid #{} could not be awarded: {e}", bid.id);
                    AwardOutcome::Failed { bid, reason: e.to_string() }
                },
            },
        };
        self.cursor.remove(post_id).await;
        let winner = match &award {
            AwardOutcome::Awarded { bid, .. } => Some(bid.clone()),
            _ => None,
        };
        self.producers.publish_auction_closed(AuctionClosedEvent::new(post_id.clone(), closed_at, winner)).await;
        Ok(CloseOutcome::Closed { closed_at, award })
    }

    /// Returns the bid's amount from the treasury to the bidder and marks the bid `refunded`.
    ///
    /// The bid is only marked once the transfer has succeeded. If the transfer fails, the bid stays `active`.
    pub async fn refund_bid(
        &self,
        ctx: &BidProcessingJobContext,
        bid: &Bid,
    ) -> Result<(Bid, TransferReceipt), AuctionError> {
        let request = self.transfer_request(ctx, bid).with_memo(format!("Refund for bid #{} on post {}", bid.id, bid.post_id));
        let receipt = self.ledger.transfer(request).await.map_err(|e| {
            error!("🏷️ Refund of {} for bid #{} failed: {e}", bid.amount, bid.id);
            e
        })?;
        let refunded = self
            .db
            .update_bid_status(bid.id, BidStatus::Active, BidStatus::Refunded)
            .await?
            .ok_or(AuctionError::BidStateConflict(bid.id))?;
        info!("🏷️ Bid #{} displaced. {} refunded to {}", bid.id, bid.amount, bid.bidder_account);
        self.producers.publish_bid_refunded(BidRefundedEvent::new(refunded.clone(), receipt.clone())).await;
        Ok((refunded, receipt))
    }

    /// Pays the bid's amount from the treasury to the bidder and marks the bid `won`.
    pub async fn award_bid(
        &self,
        ctx: &BidProcessingJobContext,
        bid: &Bid,
    ) -> Result<(Bid, TransferReceipt), AuctionError> {
        let request = self.transfer_request(ctx, bid).with_memo(format!("Award for post {}", bid.post_id));
        let receipt = self.ledger.transfer(request).await?;
        let won = self
            .db
            .update_bid_status(bid.id, BidStatus::Active, BidStatus::Won)
            .await?
            .ok_or(AuctionError::BidStateConflict(bid.id))?;
        Ok((won, receipt))
    }

    /// Every bid on the post, oldest first.
    pub async fn bids_for_post(&self, post_id: &PostId) -> Result<Vec<Bid>, AuctionError> {
        Ok(self.db.fetch_bids_for_post(post_id).await?)
    }

    async fn fetch_topic(&self, post_id: &PostId) -> Result<Topic, AuctionError> {
        self.db.fetch_topic(post_id).await?.ok_or_else(|| AuctionError::TopicNotFound(post_id.clone()))
    }

    fn transfer_request(&self, ctx: &BidProcessingJobContext, bid: &Bid) -> TransferRequest {
        TransferRequest::new(
            self.settings.token_id.clone(),
            ctx.main_agent_account.clone(),
            bid.bidder_account.clone(),
            bid.amount,
        )
    }
}
