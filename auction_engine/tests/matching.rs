use std::sync::Arc;

use auction_engine::{
    auction_objects::{AuctionSettings, BidProcessingOutcome, MatchOutcome},
    db_types::{BidStatus, SkillLevel, Tokens},
    events::EventProducers,
    traits::{AuctionDatabase, BidManagement},
    SkillMatchScorer,
};
use chrono::Utc;

use crate::support::{
    fakes::MockScorer,
    prepare_env::{test_settings, TestSystem},
};

mod support;

fn scorer_returning(scores: Vec<f64>) -> Arc<MockScorer> {
    let mut scorer = MockScorer::new();
    let mut scores = scores.into_iter();
    let n = scores.len();
    scorer.expect_score().times(n).returning(move |_, _| scores.next().unwrap());
    Arc::new(scorer)
}

#[tokio::test]
async fn best_qualifying_candidate_bids_and_is_promoted() {
    let sys = TestSystem::new().await;
    let post = sys.add_post("post-go", &[("Go", SkillLevel::Advanced)]).await;
    for candidate in ["A", "B", "C"] {
        sys.add_candidate(candidate, &[("Go", SkillLevel::Beginner)]).await;
    }
    let auction = sys.prepare(&post).await;
    let matching = sys.matching_api(scorer_returning(vec![25.0, 45.0, 10.0]));

    let MatchOutcome::BidPlaced { bid, receipt } = matching.run_matching(&auction.matching_context()).await.unwrap()
    else {
        panic!("Expected a bid")
    };
    assert_eq!(bid.bidder_id, "B");
    assert_eq!(bid.bidder_account.as_str(), "acct-B");
    assert_eq!(bid.amount, Tokens::from(4500));
    assert_eq!(bid.status, BidStatus::Pending);
    assert_eq!(receipt.sequence_number, 1);

    let messages = sys.channel.fetch_messages(&auction.topic.topic_id).await.unwrap();
    let msg: serde_json::Value = serde_json::from_str(&messages[0].payload).unwrap();
    assert_eq!(msg["type"], "new.bid");
    assert_eq!(msg["postId"], "post-go");
    assert_eq!(msg["bidId"], bid.id);
    assert_eq!(msg["bidderId"], "B");
    assert_eq!(msg["amount"], 4500);
    assert_eq!(messages[0].publisher, auction.post_agent.account_id);

    let flow = sys.flow_api(EventProducers::default());
    let outcome = flow.process_bids_at(&auction.processing_context(), Utc::now()).await.unwrap();
    assert!(matches!(outcome, BidProcessingOutcome::Promoted { bid: ref b, .. } if b.bidder_id == "B"));
    let messages = sys.channel.fetch_messages(&auction.topic.topic_id).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert!(messages[1].payload.contains(r#""type":"highest.bid""#));
    sys.tear_down().await;
}

#[tokio::test]
async fn scores_at_or_below_the_threshold_do_not_bid() {
    let sys = TestSystem::new().await;
    let post = sys.add_post("post-weak", &[("Go", SkillLevel::Expert)]).await;
    for candidate in ["A", "B", "C"] {
        sys.add_candidate(candidate, &[]).await;
    }
    let auction = sys.prepare(&post).await;
    let matching = sys.matching_api(scorer_returning(vec![20.0, 0.0, -5.0]));
    let outcome = matching.run_matching(&auction.matching_context()).await.unwrap();
    assert_eq!(outcome, MatchOutcome::NoQualifyingCandidates);
    assert!(sys.db.fetch_bids_for_post(&post).await.unwrap().is_empty());
    assert!(sys.channel.fetch_messages(&auction.topic.topic_id).await.unwrap().is_empty());
    sys.tear_down().await;
}

#[tokio::test]
async fn ties_go_to_the_first_loaded_candidate_across_pages() {
    let settings = AuctionSettings { candidate_page_size: 2, ..test_settings() };
    let sys = TestSystem::with_settings(settings).await;
    let post = sys.add_post("post-pages", &[("Rust", SkillLevel::Advanced)]).await;
    for candidate in ["A", "B", "C", "D", "E"] {
        sys.add_candidate(candidate, &[]).await;
    }
    let auction = sys.prepare(&post).await;
    let matching = sys.matching_api(scorer_returning(vec![30.0, 35.5, 60.25, 21.0, 60.25]));
    let MatchOutcome::BidPlaced { bid, .. } = matching.run_matching(&auction.matching_context()).await.unwrap() else {
        panic!("Expected a bid")
    };
    assert_eq!(bid.bidder_id, "C");
    assert_eq!(bid.amount, Tokens::from(6025));
    sys.tear_down().await;
}

#[tokio::test]
async fn every_tick_places_a_fresh_bid() {
    let sys = TestSystem::new().await;
    let post = sys.add_post("post-repeat", &[("Go", SkillLevel::Intermediate)]).await;
    sys.add_candidate("A", &[("go", SkillLevel::Advanced)]).await;
    let auction = sys.prepare(&post).await;
    let matching = sys.matching_api(Arc::new(SkillMatchScorer::new()));
    for _ in 0..2 {
        let outcome = matching.run_matching(&auction.matching_context()).await.unwrap();
        assert!(matches!(outcome, MatchOutcome::BidPlaced { ref bid, .. } if bid.amount == Tokens::from(10_000)));
    }
    assert_eq!(sys.db.fetch_bids_for_post(&post).await.unwrap().len(), 2);
    let messages = sys.channel.fetch_messages(&auction.topic.topic_id).await.unwrap();
    assert_eq!(messages.iter().map(|m| m.sequence_number).collect::<Vec<_>>(), vec![1, 2]);
    sys.tear_down().await;
}

#[tokio::test]
async fn closed_topics_are_not_matched() {
    let sys = TestSystem::new().await;
    let post = sys.add_post("post-closed", &[("Go", SkillLevel::Beginner)]).await;
    sys.add_candidate("A", &[("Go", SkillLevel::Expert)]).await;
    let auction = sys.prepare(&post).await;
    sys.db.close_topic(&post, Utc::now()).await.unwrap();
    let mut scorer = MockScorer::new();
    scorer.expect_score().never();
    let matching = sys.matching_api(Arc::new(scorer));
    assert_eq!(matching.run_matching(&auction.matching_context()).await.unwrap(), MatchOutcome::TopicClosed);
    sys.tear_down().await;
}
