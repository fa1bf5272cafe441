use std::{collections::HashMap, sync::Arc};

use auction_engine::{
    auction_objects::{BidProcessingOutcome, PreparedAuction},
    db_types::{Bid, PostId, SkillLevel},
    events::EventProducers,
    traits::BidManagement,
    AuctionFlowApi,
    MatchingApi,
    SqliteDatabase,
    SqliteMessageChannel,
};
use chrono::{DateTime, Duration, Utc};
use cucumber::World;

use crate::support::{
    fakes::{MockScorer, RecordingLedger},
    prepare_env::TestSystem,
};

#[derive(Default, Debug, World)]
pub struct AuctionWorld {
    pub system: Option<AuctionSystem>,
}

#[derive(Debug)]
pub struct AuctionSystem {
    pub sys: TestSystem,
    pub post: PostId,
    pub auction: PreparedAuction,
    pub flow: AuctionFlowApi<SqliteDatabase, RecordingLedger, SqliteMessageChannel>,
    /// Scores handed out by the scorer, keyed by candidate id
    pub scores: HashMap<String, f64>,
    /// The auction clock. Bids are placed at increasing offsets from this instant.
    pub start: DateTime<Utc>,
    pub bids_placed: i64,
    pub last_outcome: Option<Result<BidProcessingOutcome, String>>,
}

impl AuctionWorld {
    pub fn system(&mut self) -> &mut AuctionSystem {
        self.system.as_mut().expect("Auction has not been set up")
    }
}

impl AuctionSystem {
    pub async fn new(post_id: &str, skill: &str) -> Self {
        let sys = TestSystem::new().await;
        let post = sys.add_post(post_id, &[(skill, SkillLevel::Advanced)]).await;
        let auction = sys.prepare(&post).await;
        let flow = sys.flow_api(EventProducers::default());
        Self {
            sys,
            post,
            auction,
            flow,
            scores: HashMap::new(),
            start: Utc::now() - Duration::hours(72),
            bids_placed: 0,
            last_outcome: None,
        }
    }

    /// Each candidate carries a single skill named after them, so the scorer can tell them apart.
    pub fn matching_api(&self) -> MatchingApi<SqliteDatabase, SqliteMessageChannel> {
        let scores = self.scores.clone();
        let mut scorer = MockScorer::new();
        scorer.expect_score().returning(move |_, skills| {
            skills.first().and_then(|s| scores.get(&s.name)).copied().unwrap_or_default()
        });
        self.sys.matching_api(Arc::new(scorer))
    }

    pub async fn add_pending_bid(&mut self, bidder: &str, amount: i64) -> Bid {
        self.bids_placed += 1;
        let at = self.start + Duration::minutes(self.bids_placed);
        self.sys.add_pending_bid(&self.post, bidder, amount, at).await
    }

    pub async fn bids(&self) -> Vec<Bid> {
        self.sys.db.fetch_bids_for_post(&self.post).await.expect("Error fetching bids")
    }

    /// A time shortly after the most recent bid, well inside the auction window.
    pub fn during_auction(&self) -> DateTime<Utc> {
        self.start + Duration::minutes(self.bids_placed + 1)
    }
}
