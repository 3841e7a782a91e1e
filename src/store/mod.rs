//! Statistics storage and normalization module.
//!
//! Holds the normalized snapshot types, the sparse submission calendar,
//! the upstream-to-snapshot normalizer, the single-slot cache and the
//! heatmap aggregation built on top of the calendar.

pub mod aggregator;
pub mod calendar;
pub mod normalize;
pub mod stats_cache;
pub mod types;

pub use aggregator::*;
pub use calendar::*;
pub use normalize::*;
pub use stats_cache::*;
pub use types::*;
