//! Post Auction Engine
//!
//! The engine runs time-bounded ascending auctions for job posts. Candidates are matched against a post's required
//! skills, the best qualifying candidate places a bid, and the highest bid is tracked until the auction window closes
//! and the winner is paid.
//!
//! The library is divided into:
//! 1. Data types ([`mod@db_types`]) and backend contracts ([`mod@traits`]). The engine talks to its store, ledger,
//!    message channel and scorer only through these traits.
//! 2. A SQLite backend ([`SqliteDatabase`]) with self-hosted ledger and message channel implementations.
//! 3. The public API (matching, bid processing, closing and auction setup).
//!
//! The engine also emits events (new bids, new highest bids, refunds and closed auctions) that can be subscribed to
//! via [`events::EventHooks`].
mod auction_api;
mod scoring;

pub mod db_types;
pub mod events;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

pub use auction_api::{
    auction_flow_api::{evaluate_top_bid, AuctionFlowApi},
    auction_objects,
    cursor::HighestBidCursor,
    errors::AuctionError,
    matching_api::MatchingApi,
    setup_api::{post_agent_name, topic_memo, AuctionSetupApi},
};
pub use scoring::SkillMatchScorer;
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteDatabase, SqliteLedger, SqliteMessageChannel};
