use crate::compare::DateCompare;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Minute,
    Hour,
    #[default]
    Day,
    Month,
    Year,
}

impl TimeUnit {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    const fn label_format(self) -> &'static str {
        match self {
            Self::Minute => "%-I:%M",
            Self::Hour => "%-I %p",
            Self::Day => "%b %-d",
            Self::Month => "%b",
            Self::Year => "%Y",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[serde(default)]
    pub unit: TimeUnit,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// What the date filter currently points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeSelection {
    AllTime,
    Window(DateRange),
}

impl RangeSelection {
    #[must_use]
    pub const fn is_all_time(&self) -> bool {
        matches!(self, Self::AllTime)
    }

    #[must_use]
    pub const fn window(&self) -> Option<&DateRange> {
        match self {
            Self::AllTime => None,
            Self::Window(range) => Some(range),
        }
    }
}

/// Parameters sent to the statistics query service for one website.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsQuery {
    pub website_id: String,
    pub range: Option<DateRange>,
    pub compare: Option<DateCompare>,
}

impl StatsQuery {
    #[must_use]
    pub fn new(
        website_id: impl Into<String>,
        selection: &RangeSelection,
        compare: Option<DateCompare>,
    ) -> Self {
        Self {
            website_id: website_id.into(),
            range: selection.window().cloned(),
            compare,
        }
    }

    #[must_use]
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(4);
        if let Some(range) = &self.range {
            params.push(("startAt", range.start_date.timestamp_millis().to_string()));
            params.push(("endAt", range.end_date.timestamp_millis().to_string()));
            params.push(("unit", range.unit.as_str().to_string()));
        }
        if let Some(compare) = self.compare {
            params.push(("compare", compare.as_str().to_string()));
        }
        params
    }
}

/// Axis label for a chart bucket timestamp.
#[must_use]
pub fn render_date_label(time: &str, unit: TimeUnit) -> String {
    parse_bucket_time(time).map_or_else(
        || time.to_string(),
        |parsed| parsed.format(unit.label_format()).to_string(),
    )
}

fn parse_bucket_time(time: &str) -> Option<NaiveDateTime> {
    let trimmed = time.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.naive_utc());
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(parsed);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
