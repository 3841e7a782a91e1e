//! cpstats - LeetCode statistics service for a personal portfolio.
//!
//! Fetches one account's statistics from the LeetCode GraphQL API,
//! caches the normalized snapshot and serves it (plus a submission
//! heatmap) over a small HTTP API.

pub mod config;
pub mod server;
pub mod store;
pub mod upstream;
