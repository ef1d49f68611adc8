use crate::delta::Aggregate;
use crate::error::QueryError;
use crate::range::DateRange;
use serde::{Deserialize, Serialize};

/// Website statistics response: every quantity for the current and the
/// compared period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WebsiteStats {
    pub pageviews: Aggregate,
    pub visits: Aggregate,
    pub visitors: Aggregate,
    pub bounces: Aggregate,
    pub totaltime: Aggregate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenuePoint {
    pub time: String,
    pub sum: f64,
    pub avg: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueTotals {
    pub sum: f64,
    pub avg: f64,
    pub count: f64,
    pub unique_count: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportParameters {
    pub date_range: DateRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueReport {
    #[serde(default)]
    pub chart: Vec<RevenuePoint>,
    pub total: RevenueTotals,
    #[serde(default)]
    pub parameters: Option<ReportParameters>,
}

/// Lifecycle of one query as observed by the view: the fetch itself is
/// owned elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    pub data: Option<T>,
    pub is_loading: bool,
    pub is_fetched: bool,
    pub error: Option<QueryError>,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            is_loading: false,
            is_fetched: false,
            error: None,
        }
    }
}

impl<T> QueryState<T> {
    #[must_use]
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn fetched(data: T) -> Self {
        Self {
            data: Some(data),
            is_fetched: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failed(error: QueryError) -> Self {
        Self {
            is_fetched: true,
            error: Some(error),
            ..Self::default()
        }
    }
}
