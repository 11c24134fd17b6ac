//! Background Jobs Module
//!
//! Periodic work registered with the job scheduler service. Each job takes the shared
//! `JobContext`, returns a `JobResult` with processed/failed counts, and never panics on
//! upstream failure.
//!
//! # Available Jobs
//!
//! - `universe_refresh_job` - Reloads the tradable symbol list from the listing source
//! - `publish_tick_job` - Publishes price snapshots for the current rotation batch

pub mod publish_tick_job;
pub mod universe_refresh_job;
