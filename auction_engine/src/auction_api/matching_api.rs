use std::{fmt::Debug, sync::Arc};

use log::*;

use crate::{
    auction_api::{
        auction_objects::{AuctionMessage, AuctionSettings, MatchOutcome, MatchingJobContext},
        errors::AuctionError,
    },
    db_types::{CandidateProfile, NewBid, Tokens},
    events::{EventProducers, NewBidEvent},
    traits::{AuctionDatabase, MessageChannel, SkillScorer},
};

/// `MatchingApi` runs the matching job: it scores every candidate against a post and places a bid on behalf of the
/// best qualifying candidate.
pub struct MatchingApi<B, C> {
    db: B,
    channel: C,
    scorer: Arc<dyn SkillScorer>,
    settings: AuctionSettings,
    producers: EventProducers,
}

impl<B, C> Debug for MatchingApi<B, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MatchingApi (threshold {})", self.settings.qualification_threshold)
    }
}

impl<B, C> MatchingApi<B, C> {
    pub fn new(
        db: B,
        channel: C,
        scorer: Arc<dyn SkillScorer>,
        settings: AuctionSettings,
        producers: EventProducers,
    ) -> Self {
        Self { db, channel, scorer, settings, producers }
    }
}

impl<B, C> MatchingApi<B, C>
where
    B: AuctionDatabase,
    C: MessageChannel,
{
    /// Runs a single matching tick for the post described by `ctx`.
    ///
    /// 1. If the post's topic is closed, nothing happens.
    /// 2. Every candidate profile is loaded, page by page, and scored against the required skills captured in `ctx`.
    /// 3. Candidates scoring zero or less, or not strictly above the qualification threshold, are discarded.
    /// 4. The best scoring candidate wins. Ties go to the candidate that was loaded first.
    /// 5. A `pending` bid of `floor(score * 100)` tokens is stored and announced on the topic as `new.bid`.
    ///
    /// A bid is placed on every tick that finds a qualifying candidate, so the same candidate may bid more than once.
    pub async fn run_matching(&self, ctx: &MatchingJobContext) -> Result<MatchOutcome, AuctionError> {
        let post_id = &ctx.post_id;
        let topic = self.db.fetch_topic(post_id).await?.ok_or_else(|| AuctionError::TopicNotFound(post_id.clone()))?;
        if topic.is_closed() {
            debug!("🔨️ Auction for post {post_id} is closed. Skipping matching.");
            return Ok(MatchOutcome::TopicClosed);
        }
        let Some((best, score)) = self.best_candidate(ctx).await? else {
            debug!("🔨️ No candidates qualify for post {post_id}");
            return Ok(MatchOutcome::NoQualifyingCandidates);
        };
        let amount = Tokens::floor_from_f64(score * 100.0).map_err(|e| AuctionError::InvalidAmount(e.to_string()))?;
        let new_bid = NewBid::new(post_id.clone(), best.candidate_id.clone(), best.account_id.clone(), amount, score);
        let bid = self.db.insert_bid(new_bid).await?;
        info!("🔨️ Candidate {} bid {} on post {post_id} (score {score})", bid.bidder_id, bid.amount);
        let payload = AuctionMessage::new_bid(&bid).to_json()?;
        let receipt = self.channel.publish(&ctx.post_agent_account, &ctx.topic_id, &payload).await.map_err(|e| {
            error!("🔨️ Could not announce bid #{} on topic {}: {e}", bid.id, ctx.topic_id);
            e
        })?;
        trace!("🔨️ new.bid for bid #{} published as message #{}", bid.id, receipt.sequence_number);
        self.producers.publish_new_bid(NewBidEvent::new(bid.clone(), receipt.clone())).await;
        Ok(MatchOutcome::BidPlaced { bid, receipt })
    }

    /// Scans every candidate profile and returns the first one with the highest qualifying score.
    async fn best_candidate(
        &self,
        ctx: &MatchingJobContext,
    ) -> Result<Option<(CandidateProfile, f64)>, AuctionError> {
        let page_size = self.settings.candidate_page_size.max(1);
        let threshold = self.settings.qualification_threshold;
        let mut best: Option<(CandidateProfile, f64)> = None;
        let mut offset = 0;
        let mut scanned = 0usize;
        loop {
            let page = self.db.fetch_candidate_profiles(offset, page_size).await?;
            let count = page.len();
            scanned += count;
            for profile in page {
                let score = self.scorer.score(&ctx.required_skills, &profile.skills);
                if score <= 0.0 || score <= threshold {
                    continue;
                }
                trace!("🔨️ Candidate {} qualifies for post {} with {score}", profile.candidate_id, ctx.post_id);
                // Strictly greater, so the earliest loaded candidate keeps a tie
                if best.as_ref().map_or(true, |(_, s)| score > *s) {
                    best = Some((profile, score));
                }
            }
            if (count as i64) < page_size {
                break;
            }
            offset += page_size;
        }
        debug!("🔨️ Scored {scanned} candidates for post {}", ctx.post_id);
        Ok(best)
    }
}
