use auction_engine::{
    auction_objects::{AwardOutcome, BidProcessingOutcome, CloseOutcome, MatchOutcome},
    db_types::{BidStatus, SkillLevel, Tokens},
    traits::{AuctionDatabase, BidManagement},
};
use chrono::Duration;
use cucumber::{given, then, when};

use crate::cucumber::{AuctionSystem, AuctionWorld};

#[given(expr = "an auction for post '{word}' requiring '{word}'")]
async fn auction_for_post(world: &mut AuctionWorld, post_id: String, skill: String) {
    world.system = Some(AuctionSystem::new(&post_id, &skill).await);
}

#[given(expr = "candidate '{word}' who scores {float}")]
async fn candidate_with_score(world: &mut AuctionWorld, candidate: String, score: f64) {
    let system = world.system();
    system.sys.add_candidate(&candidate, &[(candidate.as_str(), SkillLevel::Beginner)]).await;
    system.scores.insert(candidate, score);
}

#[given(expr = "a pending bid of {int} from '{word}'")]
async fn pending_bid(world: &mut AuctionWorld, amount: i64, bidder: String) {
    world.system().add_pending_bid(&bidder, amount).await;
}

#[when(expr = "the matching job runs")]
async fn matching_runs(world: &mut AuctionWorld) {
    let system = world.system();
    let ctx = system.auction.matching_context();
    let outcome = system.matching_api().run_matching(&ctx).await.expect("Matching failed");
    if let MatchOutcome::BidPlaced { .. } = outcome {
        system.bids_placed += 1;
    }
}

#[when(expr = "the bid processing job runs")]
async fn processing_runs(world: &mut AuctionWorld) {
    let system = world.system();
    let now = system.during_auction();
    run_processing(system, now).await;
}

#[when(expr = "the bid processing job runs {int} hours after the first bid")]
async fn processing_runs_later(world: &mut AuctionWorld, hours: i64) {
    let system = world.system();
    let first = system.sys.db.fetch_first_bid(&system.post).await.unwrap().expect("There are no bids");
    let now = first.created_at + Duration::hours(hours);
    run_processing(system, now).await;
}

async fn run_processing(system: &mut AuctionSystem, now: chrono::DateTime<chrono::Utc>) {
    let ctx = system.auction.processing_context();
    let outcome = system.flow.process_bids_at(&ctx, now).await.map_err(|e| e.to_string());
    system.last_outcome = Some(outcome);
}

#[when(expr = "refunds to '{word}' are failing")]
async fn refunds_failing(world: &mut AuctionWorld, bidder: String) {
    let system = world.system();
    system.sys.ledger.reject_transfers_to(&format!("acct-{bidder}").into());
}

#[then(expr = "there is a pending bid of {int} from '{word}'")]
async fn check_pending_bid(world: &mut AuctionWorld, amount: i64, bidder: String) {
    let bids = world.system().bids().await;
    let found = bids
        .iter()
        .any(|b| b.bidder_id == bidder && b.amount == Tokens::from(amount) && b.status == BidStatus::Pending);
    assert!(found, "No pending bid of {amount} from {bidder} in {bids:?}");
}

#[then(expr = "there are no bids")]
async fn check_no_bids(world: &mut AuctionWorld) {
    assert!(world.system().bids().await.is_empty());
}

#[then(expr = "the active bid is {int} from '{word}'")]
async fn check_active_bid(world: &mut AuctionWorld, amount: i64, bidder: String) {
    let system = world.system();
    let active = system.sys.db.fetch_active_bid(&system.post).await.unwrap().expect("There is no active bid");
    assert_eq!(active.bidder_id, bidder);
    assert_eq!(active.amount, Tokens::from(amount));
}

#[then(expr = "the bid from '{word}' is {word}")]
async fn check_bid_status(world: &mut AuctionWorld, bidder: String, status: String) {
    let expected: BidStatus = status.parse().expect("Not a bid status");
    let bids = world.system().bids().await;
    let bid = bids.iter().rev().find(|b| b.bidder_id == bidder).expect("Bidder has no bids");
    assert_eq!(bid.status, expected);
}

#[then(expr = "'{word}' received {int} tokens")]
async fn check_transfer(world: &mut AuctionWorld, bidder: String, amount: i64) {
    let transfers = world.system().sys.ledger.transfers();
    let account = format!("acct-{bidder}");
    let received: Vec<_> = transfers.iter().filter(|t| t.recipient.as_str() == account).collect();
    assert_eq!(received.len(), 1, "Expected exactly one transfer to {bidder}, found {transfers:?}");
    assert_eq!(received[0].amount, Tokens::from(amount));
}

#[then(expr = "no tokens were transferred")]
async fn check_no_transfers(world: &mut AuctionWorld) {
    let transfers = world.system().sys.ledger.transfers();
    assert!(transfers.is_empty(), "Unexpected transfers: {transfers:?}");
}

#[then(expr = "{int} transfer(s) was/were made")]
async fn check_transfer_count(world: &mut AuctionWorld, count: usize) {
    assert_eq!(world.system().sys.ledger.transfers().len(), count);
}

#[then(expr = "the auction is closed with {word} winner")]
async fn check_closed(world: &mut AuctionWorld, winner: String) {
    let system = world.system();
    let topic = system.sys.db.fetch_topic(&system.post).await.unwrap().unwrap();
    assert!(topic.is_closed());
    assert!(topic.closed_at.is_some());
    match (winner.as_str(), &system.last_outcome) {
        ("a", Some(Ok(BidProcessingOutcome::Closed(CloseOutcome::Closed { award, .. })))) => {
            assert!(matches!(award, AwardOutcome::Awarded { .. }), "Expected an award, got {award:?}")
        },
        ("no", Some(Ok(BidProcessingOutcome::Closed(CloseOutcome::Closed { award, .. })))) => {
            assert_eq!(award, &AwardOutcome::NoActiveBid)
        },
        (_, other) => panic!("Unexpected outcome {other:?}"),
    }
}

#[then(expr = "the auction was already closed")]
async fn check_already_closed(world: &mut AuctionWorld) {
    let outcome = world.system().last_outcome.clone();
    assert!(matches!(outcome, Some(Ok(BidProcessingOutcome::AlreadyClosed))), "Got {outcome:?}");
}

#[then(expr = "the auction is still open")]
async fn check_open(world: &mut AuctionWorld) {
    let system = world.system();
    let topic = system.sys.db.fetch_topic(&system.post).await.unwrap().unwrap();
    assert!(!topic.is_closed());
}

#[then(expr = "the bid processing job failed")]
async fn check_failed(world: &mut AuctionWorld) {
    let outcome = world.system().last_outcome.clone();
    assert!(matches!(outcome, Some(Err(_))), "Expected an error, got {outcome:?}");
}

#[then(expr = "the topic has {int} message(s) and the last is '{word}' for '{word}'")]
async fn check_messages(world: &mut AuctionWorld, count: usize, kind: String, bidder: String) {
    let system = world.system();
    let messages = system.sys.channel.fetch_messages(&system.auction.topic.topic_id).await.unwrap();
    assert_eq!(messages.len(), count);
    let last: serde_json::Value = serde_json::from_str(&messages[count - 1].payload).unwrap();
    assert_eq!(last["type"], kind);
    assert_eq!(last["bidderId"], bidder);
}
