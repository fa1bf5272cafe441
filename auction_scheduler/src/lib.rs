//! Post Auction Scheduler
//!
//! Runs the recurring jobs that drive post auctions. Each scheduled post gets a matching job, which places bids on
//! behalf of the best qualifying candidate, and a bid-processing job, which promotes higher bids, refunds displaced
//! ones and closes the auction once its window has elapsed.
//!
//! The binary reads its configuration from the environment (see [`config::SchedulerConfig`]), resumes the jobs of
//! every open auction and watches for new posts.
pub mod cli;
pub mod config;
pub mod errors;
pub mod hooks;
pub mod post_watcher;
pub mod scheduler;
pub mod service;

mod jobs;
