use thiserror::Error;

use crate::{
    db_types::PostId,
    traits::{AuctionDbError, ChannelError, LedgerError},
};

#[derive(Debug, Clone, Error)]
pub enum AuctionError {
    #[error("Database error: {0}")]
    Database(#[from] AuctionDbError),
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("Message channel error: {0}")]
    Channel(#[from] ChannelError),
    #[error("Post {0} does not exist")]
    PostNotFound(PostId),
    #[error("No agent named '{0}' exists")]
    AgentNotFound(String),
    #[error("There is no auction topic for post {0}")]
    TopicNotFound(PostId),
    #[error("The auction for post {0} has closed")]
    AuctionClosed(PostId),
    #[error("Bid #{0} changed status underneath us")]
    BidStateConflict(i64),
    #[error("Could not serialize message: {0}")]
    Serialization(String),
    #[error("Invalid bid amount: {0}")]
    InvalidAmount(String),
}

impl From<serde_json::Error> for AuctionError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
