use auction_engine::{
    db_types::{AccountId, PostId, SkillLevel},
    traits::{AgentManagement, AuctionDatabase},
    AuctionError,
};

use crate::support::prepare_env::{TestSystem, TREASURY};

mod support;

#[tokio::test]
async fn preparing_twice_reuses_agent_and_topic() {
    let sys = TestSystem::new().await;
    let post = sys.add_post("post-7", &[("Go", SkillLevel::Beginner)]).await;
    let first = sys.prepare(&post).await;
    assert!(first.topic_created);
    assert_eq!(first.post_agent.name, "PostAgent-post-7");
    assert_eq!(first.main_agent.account_id.as_str(), TREASURY);
    assert_eq!(first.matching_context().required_skills.len(), 1);

    let second = sys.prepare(&post).await;
    assert!(!second.topic_created);
    assert_eq!(second.topic.topic_id, first.topic.topic_id);
    assert_eq!(second.post_agent.account_id, first.post_agent.account_id);
    assert_eq!(sys.ledger.accounts_created(), vec!["PostAgent-post-7".to_string()]);
    let ctx = second.processing_context();
    assert_eq!(ctx.main_agent_account.as_str(), TREASURY);
    assert_eq!(ctx.post_agent_account, first.post_agent.account_id);
    sys.tear_down().await;
}

#[tokio::test]
async fn missing_post_creates_nothing() {
    let sys = TestSystem::new().await;
    let missing = PostId::from("nope");
    let err = sys.setup_api().prepare_auction(&missing).await.unwrap_err();
    assert!(matches!(err, AuctionError::PostNotFound(id) if id == missing));
    assert!(sys.db.fetch_agent_by_name("PostAgent-nope").await.unwrap().is_none());
    sys.tear_down().await;
}

#[tokio::test]
async fn missing_treasury_creates_nothing() {
    let sys = TestSystem::without_treasury().await;
    let post = sys.add_post("post-8", &[("Go", SkillLevel::Beginner)]).await;
    let err = sys.setup_api().prepare_auction(&post).await.unwrap_err();
    assert!(matches!(err, AuctionError::AgentNotFound(name) if name == "Main Agent"));
    assert!(sys.db.fetch_topic(&post).await.unwrap().is_none());
    assert!(sys.db.fetch_agent_by_name("PostAgent-post-8").await.unwrap().is_none());
    assert!(sys.ledger.accounts_created().is_empty());
    sys.tear_down().await;
}

#[tokio::test]
async fn treasury_is_registered_once() {
    let sys = TestSystem::without_treasury().await;
    let api = sys.setup_api();
    let operator = AccountId::from("acct-operator");
    let agent = api.ensure_main_agent(&operator).await.unwrap();
    assert_eq!(agent.name, "Main Agent");
    assert_eq!(agent.account_id, operator);
    let again = api.ensure_main_agent(&AccountId::from("acct-other")).await.unwrap();
    assert_eq!(again.id, agent.id);
    assert_eq!(again.account_id, operator);
    assert_eq!(api.main_agent().await.unwrap().id, agent.id);
    sys.tear_down().await;
}

#[tokio::test]
async fn posts_without_topics_are_listed_until_prepared() {
    let sys = TestSystem::new().await;
    let a = sys.add_post("post-a", &[]).await;
    let b = sys.add_post("post-b", &[]).await;
    let waiting = sys.db.fetch_posts_without_topic(10).await.unwrap();
    assert_eq!(waiting.iter().map(|p| p.id.clone()).collect::<Vec<_>>(), vec![a.clone(), b.clone()]);
    sys.prepare(&a).await;
    let waiting = sys.db.fetch_posts_without_topic(10).await.unwrap();
    assert_eq!(waiting.len(), 1);
    assert_eq!(waiting[0].id, b);
    sys.tear_down().await;
}
