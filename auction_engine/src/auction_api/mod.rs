//! # Auction engine public API
//!
//! * [`matching_api`] runs the matching job, turning the best qualifying candidate into a pending bid.
//! * [`auction_flow_api`] runs the bid-processing job: promotion, refunds, expiry, closing and awards.
//! * [`setup_api`] prepares the agents and topic an auction needs before its jobs are registered.
//!
//! Every API is created by supplying backends that implement the traits in [`crate::traits`]:
//!
//! ```rust,ignore
//! use auction_engine::{AuctionFlowApi, AuctionSettings, SqliteDatabase, SqliteLedger, SqliteMessageChannel};
//! let db = SqliteDatabase::new_with_url(url, 5).await?;
//! let ledger = SqliteLedger::new(db.pool().clone());
//! let channel = SqliteMessageChannel::new(db.pool().clone());
//! let api = AuctionFlowApi::new(db, ledger, channel, AuctionSettings::default(), EventProducers::default());
//! let outcome = api.process_bids(&ctx).await?;
//! ```
pub mod auction_flow_api;
pub mod auction_objects;
pub mod cursor;
pub mod errors;
pub mod matching_api;
pub mod setup_api;
