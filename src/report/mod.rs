//! Executive summary generation.
//!
//! Ranks the strongest attrition drivers and feature combinations of a
//! dataset and renders them as Markdown, JSON or a dashboard tab.

pub mod generator;
pub mod summary;

pub use generator::{describe_profile, generate_json_summary, generate_markdown_summary, write_summary};
pub use summary::{ExecutiveSummary, SummaryOverview};
