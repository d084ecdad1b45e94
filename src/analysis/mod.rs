//! Analysis modules.
//!
//! Grouping and ranking of attrition rates over a loaded dataset.

pub mod aggregator;

pub use aggregator::*;
