//! Chart and page rendering.

pub mod chart;
pub mod page;

pub use chart::{bar_chart, heatmap, BarChart, Heatmap};
pub use page::{render_page, Page, Tab};
