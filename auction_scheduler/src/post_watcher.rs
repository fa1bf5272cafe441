use std::time::Duration;

use auction_engine::traits::{AuctionDatabase, LedgerGateway, MessageChannel};
use log::*;
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::scheduler::Scheduler;

/// The maximum number of new posts scheduled on each poll.
pub const NEW_POST_BATCH_SIZE: i64 = 50;

/// Starts the new-post watcher, which periodically schedules every post that does not have an auction yet.
///
/// The watcher stops when [`Scheduler::shutdown`] is called.
pub fn start_post_watcher<B, L, C>(scheduler: Scheduler<B, L, C>, period: Duration, batch_size: i64) -> JoinHandle<()>
where
    B: AuctionDatabase,
    L: LedgerGateway,
    C: MessageChannel,
{
    tokio::spawn(async move {
        let mut shutdown = scheduler.shutdown_signal();
        let mut timer = tokio::time::interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("🕰️ New post watcher started. It checks for new posts every {}s", period.as_secs());
        while !*shutdown.borrow() {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = timer.tick() => {},
            }
            match scheduler.schedule_new_posts(batch_size).await {
                Ok(0) => trace!("🕰️ No new posts to schedule"),
                Ok(n) => info!("🕰️ {n} new posts scheduled"),
                Err(e) => error!("🕰️ Error checking for new posts: {e}"),
            }
        }
        info!("🕰️ New post watcher stopped");
    })
}
