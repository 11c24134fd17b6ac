pub mod historical_queries;
