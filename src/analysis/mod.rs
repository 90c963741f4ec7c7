//! Aggregation of input records into a ranked summary.

pub mod aggregator;

pub use aggregator::*;
