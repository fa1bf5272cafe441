use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Agent, NewAgent},
    traits::AuctionDbError,
};

pub async fn fetch_agent_by_name(name: &str, conn: &mut SqliteConnection) -> Result<Option<Agent>, sqlx::Error> {
    let agent = sqlx::query_as("SELECT * FROM agents WHERE name = $1").bind(name).fetch_optional(conn).await?;
    Ok(agent)
}

pub async fn insert_agent(agent: NewAgent, conn: &mut SqliteConnection) -> Result<Agent, AuctionDbError> {
    let name = agent.name.clone();
    let agent: Agent = sqlx::query_as(
        "INSERT INTO agents (name, account_id, public_key, created_at) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(agent.name)
    .bind(agent.account_id.as_str())
    .bind(agent.public_key)
    .bind(Utc::now())
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => AuctionDbError::AgentAlreadyExists(name),
        e => AuctionDbError::from(e),
    })?;
    debug!("📝️ Agent '{}' stored with account {}", agent.name, agent.account_id);
    Ok(agent)
}
