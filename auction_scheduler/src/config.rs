use std::{env, fmt::Display, str::FromStr, time::Duration};

use auction_common::helpers::parse_boolean_flag;
use auction_engine::{
    auction_objects::{
        AuctionSettings,
        DEFAULT_AUCTION_DURATION_HOURS,
        DEFAULT_CANDIDATE_PAGE_SIZE,
        DEFAULT_MAIN_AGENT_NAME,
        DEFAULT_QUALIFICATION_THRESHOLD,
    },
    db_types::{AccountId, TokenId},
};
use log::*;

use crate::errors::SchedulerError;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/post_auction.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MATCHING_INTERVAL_SECS: u64 = 120;
const DEFAULT_BID_PROCESSING_INTERVAL_SECS: u64 = 240;
const DEFAULT_NEW_POST_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;

/// How often each recurring job runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JobIntervals {
    pub matching: Duration,
    pub bid_processing: Duration,
}

impl Default for JobIntervals {
    fn default() -> Self {
        Self {
            matching: Duration::from_secs(DEFAULT_MATCHING_INTERVAL_SECS),
            bid_processing: Duration::from_secs(DEFAULT_BID_PROCESSING_INTERVAL_SECS),
        }
    }
}

impl JobIntervals {
    /// The interval in whole seconds, as stored in a job record. Saturates at `i64::MAX`.
    pub fn stored_secs(interval: Duration) -> i64 {
        i64::try_from(interval.as_secs()).unwrap_or(i64::MAX)
    }
}

#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub intervals: JobIntervals,
    /// When true, posts without an auction are picked up and scheduled automatically.
    pub watch_new_posts: bool,
    pub new_post_poll_interval: Duration,
    pub event_buffer_size: usize,
    /// The treasury account that pays refunds and awards. It is registered as the main agent on startup if no main
    /// agent exists yet.
    pub operator_account: AccountId,
    pub auction: AuctionSettings,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            intervals: JobIntervals::default(),
            watch_new_posts: true,
            new_post_poll_interval: Duration::from_secs(DEFAULT_NEW_POST_POLL_INTERVAL_SECS),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            operator_account: AccountId::default(),
            auction: AuctionSettings::default(),
        }
    }
}

impl SchedulerConfig {
    /// Reads the configuration from `PAS_*` environment variables. Missing or invalid optional values fall back to
    /// their defaults. `PAS_OPERATOR_ACCOUNT_ID` and `PAS_TOKEN_ID` are mandatory.
    pub fn from_env_or_default() -> Result<Self, SchedulerError> {
        let operator_account = AccountId::from(required_env("PAS_OPERATOR_ACCOUNT_ID")?);
        let token_id = TokenId::from(required_env("PAS_TOKEN_ID")?);
        Ok(Self { operator_account, ..Self::optional_settings(token_id) })
    }

    fn optional_settings(token_id: TokenId) -> Self {
        let database_url = env::var("PAS_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ PAS_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = env_or_default("PAS_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let intervals = JobIntervals {
            matching: interval_or_default("PAS_MATCHING_INTERVAL", DEFAULT_MATCHING_INTERVAL_SECS),
            bid_processing: interval_or_default("PAS_BID_PROCESSING_INTERVAL", DEFAULT_BID_PROCESSING_INTERVAL_SECS),
        };
        let watch_new_posts = parse_boolean_flag(env::var("PAS_WATCH_NEW_POSTS").ok(), true);
        let new_post_poll_interval =
            interval_or_default("PAS_NEW_POST_POLL_INTERVAL", DEFAULT_NEW_POST_POLL_INTERVAL_SECS);
        let event_buffer_size = env_or_default("PAS_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE).max(1);
        let auction = AuctionSettings {
            auction_duration: hours_or_default("PAS_AUCTION_DURATION", DEFAULT_AUCTION_DURATION_HOURS),
            qualification_threshold: env_or_default("PAS_QUALIFICATION_THRESHOLD", DEFAULT_QUALIFICATION_THRESHOLD),
            candidate_page_size: env_or_default("PAS_CANDIDATE_PAGE_SIZE", DEFAULT_CANDIDATE_PAGE_SIZE),
            token_id,
            main_agent_name: env::var("PAS_MAIN_AGENT_NAME").ok().unwrap_or_else(|| DEFAULT_MAIN_AGENT_NAME.to_string()),
        };
        Self {
            database_url,
            max_connections,
            intervals,
            watch_new_posts,
            new_post_poll_interval,
            event_buffer_size,
            operator_account: AccountId::default(),
            auction,
        }
    }
}

fn required_env(name: &str) -> Result<String, SchedulerError> {
    match env::var(name) {
        Ok(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => {
            error!("🪛️ {name} is not set. The scheduler cannot start without it.");
            Err(SchedulerError::ConfigurationError(format!("{name} must be set")))
        },
    }
}

/// Interval timers cannot tick with a zero period, so zero is treated as invalid.
fn interval_or_default(name: &str, default_secs: u64) -> Duration {
    match env_or_default(name, default_secs) {
        0 => {
            warn!("🪛️ {name} must be at least one second. Using the default, {default_secs}s, instead.");
            Duration::from_secs(default_secs)
        },
        secs => Duration::from_secs(secs),
    }
}

/// Auction windows must be a positive number of hours that `chrono` can represent.
fn hours_or_default(name: &str, default_hours: i64) -> chrono::Duration {
    let hours = env_or_default(name, default_hours);
    match chrono::Duration::try_hours(hours).filter(|_| hours > 0) {
        Some(duration) => duration,
        None => {
            warn!("🪛️ {name} must be a positive number of hours, not {hours}. Using the default, {default_hours}h.");
            chrono::Duration::hours(default_hours)
        },
    }
}

fn env_or_default<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ Invalid configuration value for {name} ({s}). {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default value of {default}.");
            default
        },
    }
}
