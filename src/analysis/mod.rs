//! Analysis modules.
//!
//! Aggregation of classifier output into report statistics.

pub mod aggregator;

pub use aggregator::*;
