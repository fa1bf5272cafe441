//! The recurring job scheduler.
//!
//! Every scheduled post gets two tasks: a matching job and a bid-processing job. Each task drives its own interval
//! timer, so ticks of the same job never overlap. Jobs of different posts run concurrently, and the two jobs of a
//! single post may overlap. Every state change they make is a conditional update on the expected current status.
//!
//! Job registrations are persisted with their serialized contexts. [`Scheduler::resume`] starts them again when the
//! process restarts.
use std::{
    collections::{BTreeMap, HashMap},
    fmt::Debug,
    sync::Arc,
};

use auction_engine::{
    auction_objects::{
        AuctionSettings,
        BidProcessingJobContext,
        BidProcessingOutcome,
        CloseOutcome,
        MatchOutcome,
        MatchingJobContext,
    },
    db_types::{AccountId, Agent, JobKind, JobRecord, NewJobRecord, PostId, TopicId},
    events::EventProducers,
    traits::{AuctionDatabase, JobManagement, LedgerGateway, MessageChannel, SkillScorer},
    AuctionError,
    AuctionFlowApi,
    AuctionSetupApi,
    MatchingApi,
};
use chrono::Utc;
use log::*;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};

use crate::{
    config::JobIntervals,
    errors::SchedulerError,
    jobs::{spawn_matching_job, spawn_processing_job},
};

/// The result of scheduling a post.
#[derive(Debug, Clone)]
pub struct AuctionSchedule<B, L, C> {
    pub scheduler: Scheduler<B, L, C>,
    pub post_agent: Agent,
    pub topic_id: TopicId,
}

struct PostJobs {
    stop: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

pub(crate) struct SchedulerInner<B, L, C> {
    db: B,
    setup: AuctionSetupApi<B, L, C>,
    matching: MatchingApi<B, C>,
    flow: AuctionFlowApi<B, L, C>,
    intervals: JobIntervals,
    registry: Mutex<HashMap<PostId, PostJobs>>,
    shutdown: watch::Sender<bool>,
}

/// A cheaply cloneable handle to the job scheduler. All clones share the same job registry.
pub struct Scheduler<B, L, C> {
    inner: Arc<SchedulerInner<B, L, C>>,
}

impl<B, L, C> Clone for Scheduler<B, L, C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<B, L, C> Debug for Scheduler<B, L, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scheduler (matching every {}s, bid processing every {}s)",
            self.inner.intervals.matching.as_secs(),
            self.inner.intervals.bid_processing.as_secs()
        )
    }
}

impl<B, L, C> Scheduler<B, L, C>
where
    B: AuctionDatabase,
    L: LedgerGateway,
    C: MessageChannel,
{
    pub fn new(
        db: B,
        ledger: L,
        channel: C,
        scorer: Arc<dyn SkillScorer>,
        settings: AuctionSettings,
        intervals: JobIntervals,
        producers: EventProducers,
    ) -> Self {
        let setup = AuctionSetupApi::new(db.clone(), ledger.clone(), channel.clone(), settings.clone());
        let matching = MatchingApi::new(db.clone(), channel.clone(), scorer, settings.clone(), producers.clone());
        let flow = AuctionFlowApi::new(db.clone(), ledger, channel, settings, producers);
        let (shutdown, _) = watch::channel(false);
        let inner = SchedulerInner {
            db,
            setup,
            matching,
            flow,
            intervals,
            registry: Mutex::new(HashMap::new()),
            shutdown,
        };
        Self { inner: Arc::new(inner) }
    }

    /// Prepares the auction for a post and starts its matching and bid-processing jobs.
    ///
    /// This call is idempotent. The post agent and topic are created at most once, the job records are upserted and
    /// the jobs are only started if they are not already running. Posts whose auction has closed are never scheduled
    /// again.
    pub async fn schedule_post_matching(&self, post_id: &PostId) -> Result<AuctionSchedule<B, L, C>, SchedulerError> {
        let prepared = self.inner.setup.prepare_auction(post_id).await?;
        if prepared.topic.is_closed() {
            info!("🕰️ The auction for post {post_id} has already closed. It will not be scheduled again.");
            return Err(AuctionError::AuctionClosed(post_id.clone()).into());
        }
        let matching = prepared.matching_context();
        let processing = prepared.processing_context();
        let intervals = self.inner.intervals;
        let matching_job = NewJobRecord::new(
            post_id.clone(),
            JobKind::PostMatching,
            serde_json::to_string(&matching)?,
            JobIntervals::stored_secs(intervals.matching),
        );
        let processing_job = NewJobRecord::new(
            post_id.clone(),
            JobKind::ProcessBids,
            serde_json::to_string(&processing)?,
            JobIntervals::stored_secs(intervals.bid_processing),
        );
        self.inner.db.upsert_job(matching_job).await?;
        self.inner.db.upsert_job(processing_job).await?;
        self.inner.flow.rehydrate(post_id).await?;
        if SchedulerInner::register(&self.inner, matching, processing).await {
            info!("🕰️ Post {post_id} scheduled on topic {}", prepared.topic.topic_id);
        } else {
            debug!("🕰️ Jobs for post {post_id} are already running");
        }
        Ok(AuctionSchedule {
            scheduler: self.clone(),
            post_agent: prepared.post_agent,
            topic_id: prepared.topic.topic_id,
        })
    }

    /// Registers `account_id` as the treasury agent if there is no treasury agent yet.
    pub async fn ensure_main_agent(&self, account_id: &AccountId) -> Result<Agent, SchedulerError> {
        let agent = self.inner.setup.ensure_main_agent(account_id).await?;
        Ok(agent)
    }

    /// Restarts the jobs of every enabled job record whose auction is still open. Records of closed auctions are
    /// disabled. Returns the number of posts whose jobs were started.
    pub async fn resume(&self) -> Result<usize, SchedulerError> {
        let records = self.inner.db.fetch_enabled_jobs().await?;
        let mut by_post = BTreeMap::<PostId, Vec<JobRecord>>::new();
        for record in records {
            by_post.entry(record.post_id.clone()).or_default().push(record);
        }
        let mut resumed = 0;
        for (post_id, records) in by_post {
            let open = matches!(self.inner.db.fetch_topic(&post_id).await?, Some(t) if !t.is_closed());
            if !open {
                info!("🕰️ The auction for post {post_id} is not open. Disabling its stored jobs.");
                self.inner.db.disable_jobs_for_post(&post_id).await?;
                continue;
            }
            let started = match job_contexts(&records) {
                Ok((matching, processing)) => {
                    self.inner.flow.rehydrate(&post_id).await?;
                    SchedulerInner::register(&self.inner, matching, processing).await
                },
                Err(e) => {
                    warn!("🕰️ The stored jobs for post {post_id} cannot be restored ({e}). Scheduling the post again.");
                    match self.schedule_post_matching(&post_id).await {
                        Ok(_) => true,
                        Err(e) => {
                            error!("🕰️ Could not reschedule post {post_id}. {e}");
                            false
                        },
                    }
                },
            };
            if started {
                resumed += 1;
            }
        }
        info!("🕰️ Resumed the jobs of {resumed} posts");
        Ok(resumed)
    }

    /// Schedules up to `limit` posts that do not have an auction yet. Returns the number of posts scheduled.
    pub async fn schedule_new_posts(&self, limit: i64) -> Result<usize, SchedulerError> {
        let posts = self.inner.db.fetch_posts_without_topic(limit).await?;
        let mut scheduled = 0;
        for post in posts {
            match self.schedule_post_matching(&post.id).await {
                Ok(schedule) => {
                    debug!("🕰️ New post {} scheduled on topic {}", post.id, schedule.topic_id);
                    scheduled += 1;
                },
                Err(e) => warn!("🕰️ Could not schedule new post {}. {e}", post.id),
            }
        }
        Ok(scheduled)
    }

    /// Stops both jobs of the post and disables their records. In-flight ticks run to completion.
    pub async fn deregister(&self, post_id: &PostId) -> Result<bool, SchedulerError> {
        self.inner.deregister(post_id).await
    }

    pub async fn is_registered(&self, post_id: &PostId) -> bool {
        self.inner.registry.lock().await.contains_key(post_id)
    }

    pub async fn registered_posts(&self) -> Vec<PostId> {
        let mut posts = self.inner.registry.lock().await.keys().cloned().collect::<Vec<_>>();
        posts.sort();
        posts
    }

    /// Stops every job and waits for the tasks to finish. Job records stay enabled, so the jobs are picked up again
    /// by [`Self::resume`].
    pub async fn shutdown(&self) {
        self.inner.shutdown.send_replace(true);
        let jobs = self.inner.registry.lock().await.drain().collect::<Vec<_>>();
        info!("🕰️ Stopping the jobs of {} posts", jobs.len());
        for (post_id, jobs) in jobs {
            jobs.stop.send_replace(true);
            for handle in jobs.handles {
                if let Err(e) = handle.await {
                    warn!("🕰️ A job for post {post_id} did not stop cleanly. {e}");
                }
            }
        }
    }

    pub(crate) fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.inner.shutdown.subscribe()
    }

    pub fn flow_api(&self) -> &AuctionFlowApi<B, L, C> {
        &self.inner.flow
    }
}

impl<B, L, C> SchedulerInner<B, L, C>
where
    B: AuctionDatabase,
    L: LedgerGateway,
    C: MessageChannel,
{
    /// Starts the jobs for the post unless they are already running. Returns true if the jobs were started.
    async fn register(this: &Arc<Self>, matching: MatchingJobContext, processing: BidProcessingJobContext) -> bool {
        let post_id = matching.post_id.clone();
        let mut registry = this.registry.lock().await;
        if *this.shutdown.borrow() {
            warn!("🕰️ The scheduler is shutting down. Jobs for post {post_id} were not started.");
            return false;
        }
        if registry.contains_key(&post_id) {
            return false;
        }
        let (stop, _) = watch::channel(false);
        let handles = vec![
            spawn_matching_job(Arc::downgrade(this), matching, this.intervals.matching, stop.subscribe()),
            spawn_processing_job(Arc::downgrade(this), processing, this.intervals.bid_processing, stop.subscribe()),
        ];
        registry.insert(post_id, PostJobs { stop, handles });
        true
    }

    /// Removes the post from the registry and signals its jobs to stop. This may be called from inside one of the
    /// post's own jobs, so the job handles are never awaited here.
    pub(crate) async fn deregister(&self, post_id: &PostId) -> Result<bool, SchedulerError> {
        let removed = self.registry.lock().await.remove(post_id);
        if let Some(jobs) = &removed {
            jobs.stop.send_replace(true);
        }
        let disabled = self.db.disable_jobs_for_post(post_id).await?;
        info!("🕰️ Jobs for post {post_id} deregistered. {disabled} job records disabled.");
        Ok(removed.is_some())
    }

    pub(crate) async fn run_matching_tick(&self, ctx: &MatchingJobContext) {
        let post_id = &ctx.post_id;
        trace!("🕰️ Running matching job for post {post_id}");
        match self.matching.run_matching(ctx).await {
            Ok(MatchOutcome::BidPlaced { bid, receipt }) => {
                info!("🕰️ Matching for post {post_id} placed bid {bid}. Announced as message #{}", receipt.sequence_number)
            },
            Ok(MatchOutcome::NoQualifyingCandidates) => debug!("🕰️ Matching for post {post_id} found no candidates"),
            Ok(MatchOutcome::TopicClosed) => debug!("🕰️ Matching skipped. The auction for post {post_id} is closed."),
            Err(e) => error!("🕰️ Matching job for post {post_id} failed. {e}"),
        }
        self.mark_job_run(post_id, JobKind::PostMatching).await;
    }

    /// Runs one bid-processing tick. Returns true if the auction is closed and the post's jobs should stop.
    pub(crate) async fn run_processing_tick(&self, ctx: &BidProcessingJobContext) -> bool {
        let post_id = &ctx.post_id;
        trace!("🕰️ Running bid-processing job for post {post_id}");
        let closed = match self.flow.process_bids(ctx).await {
            Ok(outcome) => {
                log_processing_outcome(post_id, &outcome);
                outcome.is_closed()
            },
            Err(e) => {
                error!("🕰️ Bid-processing job for post {post_id} failed. {e}");
                false
            },
        };
        self.mark_job_run(post_id, JobKind::ProcessBids).await;
        closed
    }

    async fn mark_job_run(&self, post_id: &PostId, kind: JobKind) {
        if let Err(e) = self.db.mark_job_run(post_id, kind, Utc::now()).await {
            warn!("🕰️ Could not record the {kind} run for post {post_id}. {e}");
        }
    }
}

fn log_processing_outcome(post_id: &PostId, outcome: &BidProcessingOutcome) {
    match outcome {
        BidProcessingOutcome::Promoted { bid, refunded: Some(refunded) } => {
            info!("🕰️ Bid {bid} now leads the auction for post {post_id}. Bid #{} was refunded.", refunded.id)
        },
        BidProcessingOutcome::Promoted { bid, refunded: None } => {
            info!("🕰️ Bid {bid} is the first leader of the auction for post {post_id}")
        },
        BidProcessingOutcome::Closed(CloseOutcome::Closed { closed_at, award }) => {
            info!("🕰️ The auction for post {post_id} closed at {closed_at}. Award: {award:?}")
        },
        BidProcessingOutcome::Closed(CloseOutcome::AlreadyClosed) | BidProcessingOutcome::AlreadyClosed => {
            debug!("🕰️ The auction for post {post_id} is closed")
        },
        BidProcessingOutcome::PromotionSkipped(id) => {
            warn!("🕰️ Bid #{id} for post {post_id} changed status before it could be promoted")
        },
        other => trace!("🕰️ Bid processing for post {post_id}: {other:?}"),
    }
}

fn job_contexts(records: &[JobRecord]) -> Result<(MatchingJobContext, BidProcessingJobContext), SchedulerError> {
    let context = |kind: JobKind| {
        records
            .iter()
            .find(|r| r.job_kind == kind)
            .map(|r| r.context.as_str())
            .ok_or_else(|| SchedulerError::JobContextError(format!("the {kind} job record is missing")))
    };
    let matching = serde_json::from_str::<MatchingJobContext>(context(JobKind::PostMatching)?)?;
    let processing = serde_json::from_str::<BidProcessingJobContext>(context(JobKind::ProcessBids)?)?;
    Ok((matching, processing))
}
