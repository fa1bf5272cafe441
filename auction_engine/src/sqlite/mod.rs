//! SQLite backend for the auction engine.
//!
//! [`SqliteDatabase`] implements the store traits. [`SqliteLedger`] and [`SqliteMessageChannel`] are self-hosted
//! collaborators that share the same database.
mod channel;
mod ledger;
mod sqlite_impl;

pub mod db;
pub use channel::{SqliteMessageChannel, TopicMessage};
pub use ledger::SqliteLedger;
pub use sqlite_impl::SqliteDatabase;
