use auction_engine::{
    auction_objects::{AuctionSettings, PreparedAuction},
    db_types::{
        AccountId,
        Bid,
        CandidateSkill,
        NewAgent,
        NewBid,
        NewCandidateProfile,
        NewPost,
        PostId,
        SkillLevel,
        SkillRequirement,
        TokenId,
        Tokens,
    },
    events::EventProducers,
    traits::{AgentManagement, AuctionDatabase, BidManagement, SkillScorer},
    AuctionFlowApi,
    AuctionSetupApi,
    MatchingApi,
    SqliteDatabase,
    SqliteMessageChannel,
};
use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use std::sync::Arc;

use super::fakes::RecordingLedger;

pub const TREASURY: &str = "acct-treasury";

pub fn random_db_path() -> String {
    let path = std::env::temp_dir().join(format!("auction_test_{}.db", rand::random::<u64>()));
    format!("sqlite://{}", path.display())
}

pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    create_database(url).await;
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    info!("🚀️ Test database ready at {url}");
    db
}

pub async fn create_database(url: &str) {
    if Sqlite::database_exists(url).await.unwrap_or(false) {
        if let Err(e) = Sqlite::drop_database(url).await {
            warn!("Error dropping database {url}: {e:?}");
        }
    }
    Sqlite::create_database(url).await.expect("Error creating database");
}

pub fn test_settings() -> AuctionSettings {
    AuctionSettings { token_id: TokenId::from("tok-pas"), ..AuctionSettings::default() }
}

/// A throwaway database with a treasury agent, a recording ledger and the sqlite message channel.
#[derive(Debug)]
pub struct TestSystem {
    pub url: String,
    pub db: SqliteDatabase,
    pub ledger: RecordingLedger,
    pub channel: SqliteMessageChannel,
    pub settings: AuctionSettings,
}

impl TestSystem {
    pub async fn new() -> Self {
        Self::with_settings(test_settings()).await
    }

    pub async fn with_settings(settings: AuctionSettings) -> Self {
        let url = random_db_path();
        let db = prepare_test_env(&url).await;
        let channel = SqliteMessageChannel::new(db.pool().clone());
        let system = Self { url, db, ledger: RecordingLedger::default(), channel, settings };
        system
            .db
            .insert_agent(NewAgent::new(system.settings.main_agent_name.clone(), AccountId::from(TREASURY), "pk".into()))
            .await
            .expect("Error creating treasury agent");
        system
    }

    /// A system without a treasury agent.
    pub async fn without_treasury() -> Self {
        let url = random_db_path();
        let db = prepare_test_env(&url).await;
        let channel = SqliteMessageChannel::new(db.pool().clone());
        Self { url, db, ledger: RecordingLedger::default(), channel, settings: test_settings() }
    }

    pub async fn add_post(&self, id: &str, skills: &[(&str, SkillLevel)]) -> PostId {
        let skills = skills.iter().map(|(n, l)| SkillRequirement::new(*n, *l)).collect();
        let post = self.db.insert_post(NewPost::new(PostId::from(id), "A job", skills)).await.expect("Error adding post");
        post.id
    }

    pub async fn add_candidate(&self, candidate_id: &str, skills: &[(&str, SkillLevel)]) {
        let skills = skills.iter().map(|(n, l)| CandidateSkill::new(*n, *l)).collect();
        let account = AccountId::from(format!("acct-{candidate_id}"));
        self.db
            .insert_candidate_profile(NewCandidateProfile::new(candidate_id, account, skills))
            .await
            .expect("Error adding candidate");
    }

    pub async fn add_pending_bid(&self, post_id: &PostId, bidder: &str, amount: i64, at: DateTime<Utc>) -> Bid {
        let bid = NewBid::new(
            post_id.clone(),
            bidder,
            AccountId::from(format!("acct-{bidder}")),
            Tokens::from(amount),
            amount as f64 / 100.0,
        )
        .with_created_at(at);
        self.db.insert_bid(bid).await.expect("Error adding bid")
    }

    pub fn setup_api(&self) -> AuctionSetupApi<SqliteDatabase, RecordingLedger, SqliteMessageChannel> {
        AuctionSetupApi::new(self.db.clone(), self.ledger.clone(), self.channel.clone(), self.settings.clone())
    }

    pub fn flow_api(
        &self,
        producers: EventProducers,
    ) -> AuctionFlowApi<SqliteDatabase, RecordingLedger, SqliteMessageChannel> {
        AuctionFlowApi::new(self.db.clone(), self.ledger.clone(), self.channel.clone(), self.settings.clone(), producers)
    }

    pub fn matching_api(&self, scorer: Arc<dyn SkillScorer>) -> MatchingApi<SqliteDatabase, SqliteMessageChannel> {
        MatchingApi::new(self.db.clone(), self.channel.clone(), scorer, self.settings.clone(), EventProducers::default())
    }

    pub async fn prepare(&self, post_id: &PostId) -> PreparedAuction {
        self.setup_api().prepare_auction(post_id).await.expect("Error preparing auction")
    }

    pub async fn tear_down(mut self) {
        if let Err(e) = self.db.close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        if let Err(e) = Sqlite::drop_database(&self.url).await {
            warn!("🚀️ Could not remove {}: {e}", self.url);
        }
    }
}
