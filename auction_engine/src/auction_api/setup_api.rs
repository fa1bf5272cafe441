use std::fmt::Debug;

use log::*;

use crate::{
    auction_api::{
        auction_objects::{AuctionSettings, PreparedAuction},
        errors::AuctionError,
    },
    db_types::{AccountId, Agent, NewAgent, PostId},
    traits::{AuctionDatabase, AuctionDbError, LedgerGateway, MessageChannel},
};

/// Name of the agent that owns a post's topic.
pub fn post_agent_name(post_id: &PostId) -> String {
    format!("PostAgent-{post_id}")
}

/// Memo attached to a post's topic when it is created.
pub fn topic_memo(post_id: &PostId) -> String {
    format!("Auction-{post_id}")
}

/// `AuctionSetupApi` prepares everything an auction needs before its jobs can run: the treasury agent, the per-post
/// agent and the post's topic.
pub struct AuctionSetupApi<B, L, C> {
    db: B,
    ledger: L,
    channel: C,
    settings: AuctionSettings,
}

impl<B, L, C> Debug for AuctionSetupApi<B, L, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuctionSetupApi")
    }
}

impl<B, L, C> AuctionSetupApi<B, L, C> {
    pub fn new(db: B, ledger: L, channel: C, settings: AuctionSettings) -> Self {
        Self { db, ledger, channel, settings }
    }
}

impl<B, L, C> AuctionSetupApi<B, L, C>
where
    B: AuctionDatabase,
    L: LedgerGateway,
    C: MessageChannel,
{
    /// Prepares the auction for a post.
    ///
    /// Nothing is created unless both the post and the treasury agent exist. The post agent and the topic are created
    /// at most once; calling this again for the same post returns the existing records.
    pub async fn prepare_auction(&self, post_id: &PostId) -> Result<PreparedAuction, AuctionError> {
        let post = self.db.fetch_post(post_id).await?.ok_or_else(|| {
            warn!("🕰️ Cannot schedule post {post_id}. It does not exist.");
            AuctionError::PostNotFound(post_id.clone())
        })?;
        let main_agent = self.main_agent().await?;
        let post_agent = self.register_agent(&post_agent_name(post_id)).await?;
        let (topic, topic_created) = match self.db.fetch_topic(post_id).await? {
            Some(topic) => (topic, false),
            None => {
                let topic_id = self.channel.create_topic(&post_agent.account_id, &topic_memo(post_id)).await?;
                let (topic, created) = self.db.insert_topic(post_id, &topic_id).await?;
                if !created {
                    warn!("🕰️ Post {post_id} already had topic {}. Channel topic {topic_id} is unused.", topic.topic_id);
                }
                (topic, created)
            },
        };
        if topic_created {
            info!("🕰️ Auction topic {} created for post {post_id}", topic.topic_id);
        }
        Ok(PreparedAuction { post, main_agent, post_agent, topic, topic_created })
    }

    /// The treasury agent, which pays refunds and awards.
    pub async fn main_agent(&self) -> Result<Agent, AuctionError> {
        let name = self.settings.main_agent_name.as_str();
        self.db.fetch_agent_by_name(name).await?.ok_or_else(|| {
            error!("🕰️ The treasury agent '{name}' does not exist");
            AuctionError::AgentNotFound(name.to_string())
        })
    }

    /// Records `account_id` as the treasury agent if no treasury agent exists yet. An existing agent is returned
    /// unchanged.
    pub async fn ensure_main_agent(&self, account_id: &AccountId) -> Result<Agent, AuctionError> {
        let name = self.settings.main_agent_name.as_str();
        if let Some(agent) = self.db.fetch_agent_by_name(name).await? {
            if &agent.account_id != account_id {
                warn!(
                    "🕰️ Treasury agent '{name}' is registered with account {}, not {account_id}. Keeping the stored \
                     account.",
                    agent.account_id
                );
            }
            return Ok(agent);
        }
        let agent = self.insert_agent_or_fetch(NewAgent::new(name, account_id.clone(), String::default())).await?;
        info!("🕰️ Treasury agent '{name}' registered with account {account_id}");
        Ok(agent)
    }

    /// Fetches the agent with the given name, creating a ledger account for it if it does not exist.
    pub async fn register_agent(&self, name: &str) -> Result<Agent, AuctionError> {
        if let Some(agent) = self.db.fetch_agent_by_name(name).await? {
            trace!("🕰️ Agent '{name}' already exists");
            return Ok(agent);
        }
        let account = self.ledger.create_account(name).await?;
        let agent = self.insert_agent_or_fetch(NewAgent::new(name, account.account_id, account.public_key)).await?;
        debug!("🕰️ Agent '{name}' created with account {}", agent.account_id);
        Ok(agent)
    }

    async fn insert_agent_or_fetch(&self, agent: NewAgent) -> Result<Agent, AuctionError> {
        let name = agent.name.clone();
        match self.db.insert_agent(agent).await {
            Ok(agent) => Ok(agent),
            // Lost a race with another registration
            Err(AuctionDbError::AgentAlreadyExists(_)) => {
                self.db.fetch_agent_by_name(&name).await?.ok_or(AuctionError::AgentNotFound(name))
            },
            Err(e) => Err(e.into()),
        }
    }
}
