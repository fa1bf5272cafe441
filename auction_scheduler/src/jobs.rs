use std::{sync::Weak, time::Duration};

use auction_engine::{
    auction_objects::{BidProcessingJobContext, MatchingJobContext},
    traits::{AuctionDatabase, LedgerGateway, MessageChannel},
};
use log::*;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};

use crate::scheduler::SchedulerInner;

/// Starts the matching job for a post. The first tick runs immediately.
///
/// The job stops when `stop` changes or its sender is dropped, or when the scheduler itself has been dropped.
pub(crate) fn spawn_matching_job<B, L, C>(
    scheduler: Weak<SchedulerInner<B, L, C>>,
    ctx: MatchingJobContext,
    period: Duration,
    mut stop: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    B: AuctionDatabase,
    L: LedgerGateway,
    C: MessageChannel,
{
    tokio::spawn(async move {
        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("🕰️ Matching job for post {} started. It runs every {}s", ctx.post_id, period.as_secs());
        loop {
            tokio::select! {
                biased;
                _ = stop.changed() => break,
                _ = timer.tick() => {},
            }
            let Some(scheduler) = scheduler.upgrade() else { break };
            scheduler.run_matching_tick(&ctx).await;
        }
        info!("🕰️ Matching job for post {} stopped", ctx.post_id);
    })
}

/// Starts the bid-processing job for a post. The first tick runs immediately.
///
/// When a tick reports that the auction has closed, the job deregisters both of the post's jobs.
pub(crate) fn spawn_processing_job<B, L, C>(
    scheduler: Weak<SchedulerInner<B, L, C>>,
    ctx: BidProcessingJobContext,
    period: Duration,
    mut stop: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    B: AuctionDatabase,
    L: LedgerGateway,
    C: MessageChannel,
{
    tokio::spawn(async move {
        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("🕰️ Bid-processing job for post {} started. It runs every {}s", ctx.post_id, period.as_secs());
        loop {
            tokio::select! {
                biased;
                _ = stop.changed() => break,
                _ = timer.tick() => {},
            }
            let Some(scheduler) = scheduler.upgrade() else { break };
            if scheduler.run_processing_tick(&ctx).await {
                if let Err(e) = scheduler.deregister(&ctx.post_id).await {
                    error!("🕰️ Could not deregister the jobs for closed post {}. {e}", ctx.post_id);
                }
                break;
            }
        }
        info!("🕰️ Bid-processing job for post {} stopped", ctx.post_id);
    })
}
