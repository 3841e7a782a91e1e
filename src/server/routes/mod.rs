//! Route handlers module.

pub mod config;
pub mod health;
pub mod stats;
