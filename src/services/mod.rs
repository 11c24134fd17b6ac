pub mod analytics_service;
pub mod consumer_service;
pub mod historical_service;
pub mod indicators;
pub mod job_scheduler_service;
pub mod price_cache;
pub mod publish_scheduler;
pub mod publisher;
pub mod symbol_universe;
