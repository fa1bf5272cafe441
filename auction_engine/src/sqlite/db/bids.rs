use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::db_types::{Bid, BidStatus, NewBid, PostId};

/// Inserts a new bid with `pending` status. `updated_at` is initialised to the creation time.
pub async fn insert_bid(bid: NewBid, conn: &mut SqliteConnection) -> Result<Bid, sqlx::Error> {
    let bid: Bid = sqlx::query_as(
        r#"
            INSERT INTO bids (
                post_id,
                bidder_id,
                bidder_account,
                amount,
                score,
                status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, 'pending', $6, $6)
            RETURNING *;
        "#,
    )
    .bind(bid.post_id)
    .bind(bid.bidder_id)
    .bind(bid.bidder_account)
    .bind(bid.amount.value())
    .bind(bid.score)
    .bind(bid.created_at)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Bid #{} for post {} inserted", bid.id, bid.post_id);
    Ok(bid)
}

pub async fn fetch_bid(id: i64, conn: &mut SqliteConnection) -> Result<Option<Bid>, sqlx::Error> {
    let bid = sqlx::query_as("SELECT * FROM bids WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(bid)
}

/// The earliest bid for the post, in any status. The auction clock starts with this bid.
pub async fn fetch_first_bid(post_id: &PostId, conn: &mut SqliteConnection) -> Result<Option<Bid>, sqlx::Error> {
    let bid = sqlx::query_as("SELECT * FROM bids WHERE post_id = $1 ORDER BY created_at ASC, id ASC LIMIT 1")
        .bind(post_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(bid)
}

/// Pending bids for the post, highest amount first. Equal amounts are ordered oldest first, then by id.
pub async fn fetch_pending_bids(post_id: &PostId, conn: &mut SqliteConnection) -> Result<Vec<Bid>, sqlx::Error> {
    let bids = sqlx::query_as(
        r#"
            SELECT * FROM bids
            WHERE post_id = $1 AND status = 'pending'
            ORDER BY amount DESC, created_at ASC, id ASC
        "#,
    )
    .bind(post_id.as_str())
    .fetch_all(conn)
    .await?;
    Ok(bids)
}

pub async fn fetch_active_bids(post_id: &PostId, conn: &mut SqliteConnection) -> Result<Vec<Bid>, sqlx::Error> {
    let bids = sqlx::query_as("SELECT * FROM bids WHERE post_id = $1 AND status = 'active' ORDER BY id")
        .bind(post_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(bids)
}

pub async fn fetch_bids_for_post(post_id: &PostId, conn: &mut SqliteConnection) -> Result<Vec<Bid>, sqlx::Error> {
    let bids = sqlx::query_as("SELECT * FROM bids WHERE post_id = $1 ORDER BY created_at ASC, id ASC")
        .bind(post_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(bids)
}

/// Moves the bid from `from` to `to` in a single conditional statement. If the bid is not in status `from`, no row is
/// touched and `None` is returned.
pub async fn update_bid_status(
    bid_id: i64,
    from: BidStatus,
    to: BidStatus,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Bid>, sqlx::Error> {
    let bid: Option<Bid> =
        sqlx::query_as("UPDATE bids SET status = $1, updated_at = $2 WHERE id = $3 AND status = $4 RETURNING *")
            .bind(to)
            .bind(at)
            .bind(bid_id)
            .bind(from)
            .fetch_optional(conn)
            .await?;
    match &bid {
        Some(_) => trace!("📝️ Bid #{bid_id} moved from {from} to {to}"),
        None => trace!("📝️ Bid #{bid_id} was not {from}. Status unchanged"),
    }
    Ok(bid)
}
