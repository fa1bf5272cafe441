//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! Every interaction is a plain function that accepts a `&mut SqliteConnection` argument. Callers can obtain a
//! connection from a pool, or open a transaction when several calls must be atomic, and pass `&mut *tx` through
//! without any other changes.
use std::{str::FromStr, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod agents;
pub mod bids;
pub mod jobs;
pub mod posts;
pub mod profiles;
pub mod topics;

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens a connection pool to the database at `url`. The database file is created if it does not exist yet.
///
/// Connections use WAL journaling, so readers never block the single writer, and wait up to [`BUSY_TIMEOUT`] for the
/// write lock.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
