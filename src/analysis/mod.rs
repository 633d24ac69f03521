//! Statistics over the episode collection.
//!
//! Views recompute from the full collection on every run; nothing here is
//! cached or persisted.

pub mod aggregator;
pub mod calendar;
pub mod summary;

pub use aggregator::*;
pub use calendar::{calendar_month, days_with_episodes, CalendarDay};
pub use summary::{dashboard, trends, DashboardSummary, TrendOptions, TrendsSummary};
