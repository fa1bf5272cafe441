use auction_engine::{traits::AuctionDbError, AuctionError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Invalid scheduler configuration. {0}")]
    ConfigurationError(String),
    #[error("Could not initialize the scheduler. {0}")]
    InitializeError(String),
    #[error("Auction error. {0}")]
    AuctionError(#[from] AuctionError),
    #[error("Database error. {0}")]
    DatabaseError(#[from] AuctionDbError),
    #[error("Could not convert a job context to or from JSON. {0}")]
    JobContextError(String),
    #[error("An I/O error happened in the scheduler. {0}")]
    IOError(#[from] std::io::Error),
}

impl From<serde_json::Error> for SchedulerError {
    fn from(e: serde_json::Error) -> Self {
        Self::JobContextError(e.to_string())
    }
}
