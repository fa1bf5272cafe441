use std::sync::Arc;

use auction_engine::{SkillMatchScorer, SqliteDatabase, SqliteLedger, SqliteMessageChannel};
use log::*;

use crate::{
    config::SchedulerConfig,
    errors::SchedulerError,
    hooks::create_event_handlers,
    post_watcher::{start_post_watcher, NEW_POST_BATCH_SIZE},
    scheduler::Scheduler,
};

pub type SqliteScheduler = Scheduler<SqliteDatabase, SqliteLedger, SqliteMessageChannel>;

/// Opens the database, brings its schema up to date and builds a scheduler backed by the SQLite ledger and message
/// channel.
pub async fn create_scheduler(config: &SchedulerConfig) -> Result<SqliteScheduler, SchedulerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| SchedulerError::InitializeError(format!("Could not connect to {}. {e}", config.database_url)))?;
    db.run_migrations().await.map_err(|e| SchedulerError::InitializeError(format!("Migrations failed. {e}")))?;
    let ledger = SqliteLedger::new(db.pool().clone());
    let channel = SqliteMessageChannel::new(db.pool().clone());
    let handlers = create_event_handlers(config.event_buffer_size);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let scheduler = Scheduler::new(
        db,
        ledger,
        channel,
        Arc::new(SkillMatchScorer),
        config.auction.clone(),
        config.intervals,
        producers,
    );
    Ok(scheduler)
}

/// Runs the scheduler until the process receives Ctrl-C.
///
/// On startup the treasury agent is registered if necessary, and the jobs of every open auction are resumed.
pub async fn run_scheduler(config: SchedulerConfig) -> Result<(), SchedulerError> {
    let scheduler = create_scheduler(&config).await?;
    let treasury = scheduler.ensure_main_agent(&config.operator_account).await?;
    info!("🕰️ Refunds and awards are paid from {} ({})", treasury.name, treasury.account_id);
    let resumed = scheduler.resume().await?;
    info!("🕰️ Scheduler started with {resumed} open auctions");
    let watcher = config
        .watch_new_posts
        .then(|| start_post_watcher(scheduler.clone(), config.new_post_poll_interval, NEW_POST_BATCH_SIZE));
    tokio::signal::ctrl_c().await?;
    info!("🕰️ Shutdown requested");
    scheduler.shutdown().await;
    if let Some(watcher) = watcher {
        if let Err(e) = watcher.await {
            warn!("🕰️ The new post watcher did not stop cleanly. {e}");
        }
    }
    Ok(())
}
