//! # Backend and collaborator contracts
//!
//! This module defines the interface contracts that the auction engine depends on. The engine never talks to a
//! database, a ledger or a message bus directly; it is handed implementations of these traits instead.
//!
//! ## Store traits
//! * [`AuctionDatabase`] is the highest-level store contract. It owns auction topics and brings the other store traits
//!   together.
//! * [`BidManagement`] manages bid records and their status transitions.
//! * [`MarketplaceQueries`] provides read-only access to posts and candidate profiles, which are owned by the
//!   marketplace application.
//! * [`AgentManagement`] stores the named ledger identities used by the auction.
//! * [`JobManagement`] persists recurring job registrations so that they survive restarts.
//!
//! ## Collaborators
//! * [`LedgerGateway`] executes irreversible token transfers (refunds and awards) and creates ledger accounts.
//! * [`MessageChannel`] is an append-only, per-topic ordered message log.
//! * [`SkillScorer`] maps required skills and candidate skills to a match score.
//!
//! Async methods are declared as `fn .. -> impl Future + Send` so that the engine APIs can be driven from spawned
//! tasks while remaining generic over the backend. Implementations are free to use `async fn`.
mod agent_management;
mod auction_database;
mod bid_management;
mod job_management;
mod ledger;
mod marketplace_queries;
mod message_channel;
mod scoring;

pub use agent_management::AgentManagement;
pub use auction_database::{AuctionDatabase, AuctionDbError};
pub use bid_management::BidManagement;
pub use job_management::JobManagement;
pub use ledger::{LedgerAccount, LedgerError, LedgerGateway, TransferReceipt, TransferRequest};
pub use marketplace_queries::MarketplaceQueries;
pub use message_channel::{ChannelError, MessageChannel, PublishReceipt};
pub use scoring::SkillScorer;
