//! Derived analytics metrics for dashboard cards.
//!
//! Raw current/previous aggregates go through [`delta`] to produce values
//! and changes, then [`metrics`] turns them into an ordered list of
//! labeled, formatted cards. [`chart`] builds the revenue time series.

pub mod chart;
pub mod compare;
pub mod delta;
pub mod error;
pub mod formatting;
pub mod messages;
pub mod metrics;
pub mod range;
pub mod stats;

pub use delta::{Aggregate, Delta, compute_rate, compute_ratio, compute_simple};
pub use error::{MessagesError, QueryError};
pub use formatting::ValueFormat;
pub use messages::{LabelKey, Messages};
pub use metrics::{
    DerivedMetric, DerivedValue, DisplayFlags, MetricCard, MetricDescriptor, MetricKind,
    MetricsBar, Sentiment, Trend, ViewMode, assemble, revenue_metrics, revenue_metrics_bar,
    website_metrics, website_metrics_bar,
};
pub use stats::{QueryState, RevenueReport, WebsiteStats};
