use crate::delta::{Delta, compute_rate, compute_ratio, compute_simple};
use crate::error::QueryError;
use crate::formatting::ValueFormat;
use crate::messages::{LabelKey, Messages};
use crate::range::RangeSelection;
use crate::stats::{QueryState, RevenueReport, WebsiteStats};
use serde::Serialize;

const BOUNCE_RATE_SCALE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Views,
    Visits,
    Visitors,
    BounceRate,
    VisitDuration,
    Total,
    Average,
    Transactions,
    UniqueCustomers,
}

/// Static metadata for one card: how it is labeled and displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub kind: MetricKind,
    pub label: LabelKey,
    pub format: ValueFormat,
    /// An increase is bad news (bounce rate going up).
    pub reverse_colors: bool,
}

impl MetricDescriptor {
    const fn new(kind: MetricKind, label: LabelKey, format: ValueFormat) -> Self {
        Self {
            kind,
            label,
            format,
            reverse_colors: false,
        }
    }

    const fn reversed(mut self) -> Self {
        self.reverse_colors = true;
        self
    }
}

pub const WEBSITE_METRICS: [MetricDescriptor; 5] = [
    MetricDescriptor::new(MetricKind::Views, LabelKey::Views, ValueFormat::CompactNumber),
    MetricDescriptor::new(MetricKind::Visits, LabelKey::Visits, ValueFormat::CompactNumber),
    MetricDescriptor::new(
        MetricKind::Visitors,
        LabelKey::Visitors,
        ValueFormat::CompactNumber,
    ),
    MetricDescriptor::new(MetricKind::BounceRate, LabelKey::BounceRate, ValueFormat::Percent)
        .reversed(),
    MetricDescriptor::new(
        MetricKind::VisitDuration,
        LabelKey::VisitDuration,
        ValueFormat::ShortDuration,
    ),
];

pub const REVENUE_METRICS: [MetricDescriptor; 4] = [
    MetricDescriptor::new(MetricKind::Total, LabelKey::Total, ValueFormat::LongNumber),
    MetricDescriptor::new(MetricKind::Average, LabelKey::Average, ValueFormat::LongNumber),
    MetricDescriptor::new(
        MetricKind::Transactions,
        LabelKey::Transactions,
        ValueFormat::LongNumber,
    ),
    MetricDescriptor::new(
        MetricKind::UniqueCustomers,
        LabelKey::UniqueCustomers,
        ValueFormat::LongNumber,
    ),
];

/// Computed number behind a card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DerivedValue {
    /// A single value with nothing to compare against.
    Snapshot(f64),
    Compared(Delta),
}

impl From<Delta> for DerivedValue {
    fn from(delta: Delta) -> Self {
        Self::Compared(delta)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedMetric {
    pub kind: MetricKind,
    pub label: String,
    pub value: f64,
    pub prev: Option<f64>,
    pub change: Option<f64>,
    pub format: ValueFormat,
    pub reverse_colors: bool,
}

impl DerivedMetric {
    #[must_use]
    pub fn new(descriptor: &MetricDescriptor, label: impl Into<String>, value: DerivedValue) -> Self {
        let (value, prev, change) = match value {
            DerivedValue::Snapshot(value) => (value, None, None),
            DerivedValue::Compared(delta) => (delta.value, Some(delta.prev), Some(delta.change)),
        };
        Self {
            kind: descriptor.kind,
            label: label.into(),
            value,
            prev,
            change,
            format: descriptor.format,
            reverse_colors: descriptor.reverse_colors,
        }
    }
}

/// Caller-side display state of a metrics bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewMode {
    pub range: RangeSelection,
    pub compare_mode: bool,
    pub show_change: bool,
}

impl ViewMode {
    #[must_use]
    pub const fn display_flags(&self) -> DisplayFlags {
        let all_time = self.range.is_all_time();
        DisplayFlags {
            show_change: !all_time && (self.compare_mode || self.show_change),
            show_previous: !all_time && self.compare_mode,
        }
    }

    /// The all-time range has no previous period, so it is not offered
    /// while comparing.
    #[must_use]
    pub const fn allows_all_time(&self) -> bool {
        !self.compare_mode
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayFlags {
    pub show_change: bool,
    pub show_previous: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Increase,
    Decrease,
    Unchanged,
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Good,
    Bad,
    Neutral,
}

/// Presentation record handed to the card renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    #[serde(flatten)]
    pub metric: DerivedMetric,
    pub show_change: bool,
    pub show_previous: bool,
}

impl MetricCard {
    #[must_use]
    pub fn label(&self) -> &str {
        &self.metric.label
    }

    #[must_use]
    pub fn formatted_value(&self) -> String {
        self.metric.format.apply(self.metric.value)
    }

    #[must_use]
    pub fn formatted_previous(&self) -> Option<String> {
        self.metric.prev.map(|prev| self.metric.format.apply(prev))
    }

    #[must_use]
    pub fn formatted_change(&self) -> Option<String> {
        self.metric
            .change
            .map(|change| self.metric.format.apply_signed(change))
    }

    #[must_use]
    pub fn trend(&self) -> Trend {
        match self.metric.change {
            Some(change) if !change.is_finite() => Trend::Undefined,
            None => Trend::Undefined,
            Some(change) if change > 0.0 => Trend::Increase,
            Some(change) if change < 0.0 => Trend::Decrease,
            Some(_) => Trend::Unchanged,
        }
    }

    #[must_use]
    pub fn sentiment(&self) -> Sentiment {
        let reverse = self.metric.reverse_colors;
        match self.trend() {
            Trend::Increase if reverse => Sentiment::Bad,
            Trend::Increase => Sentiment::Good,
            Trend::Decrease if reverse => Sentiment::Good,
            Trend::Decrease => Sentiment::Bad,
            Trend::Unchanged | Trend::Undefined => Sentiment::Neutral,
        }
    }
}

/// Builds one card per entry, in the order given.
#[must_use]
pub fn assemble(
    entries: &[(MetricDescriptor, DerivedValue)],
    messages: &Messages,
    flags: DisplayFlags,
) -> Vec<MetricCard> {
    entries
        .iter()
        .map(|(descriptor, value)| {
            let metric = DerivedMetric::new(descriptor, messages.format(descriptor.label), *value);
            let comparable = metric.change.is_some();
            MetricCard {
                metric,
                show_change: flags.show_change && comparable,
                show_previous: flags.show_previous && comparable,
            }
        })
        .collect()
}

#[must_use]
pub fn website_metrics(
    data: Option<&WebsiteStats>,
    messages: &Messages,
    mode: &ViewMode,
) -> Vec<MetricCard> {
    let Some(stats) = data else {
        return Vec::new();
    };
    let [views, visits, visitors, bounce_rate, visit_duration] = WEBSITE_METRICS;
    let entries: [(MetricDescriptor, DerivedValue); 5] = [
        (views, compute_simple(stats.pageviews).into()),
        (visits, compute_simple(stats.visits).into()),
        (visitors, compute_simple(stats.visitors).into()),
        (
            bounce_rate,
            compute_ratio(stats.bounces, stats.visits, BOUNCE_RATE_SCALE).into(),
        ),
        (visit_duration, compute_rate(stats.totaltime, stats.visits).into()),
    ];
    assemble(&entries, messages, mode.display_flags())
}

#[must_use]
pub fn revenue_metrics(data: Option<&RevenueReport>, messages: &Messages) -> Vec<MetricCard> {
    let Some(report) = data else {
        return Vec::new();
    };
    let totals = report.total;
    let [total, average, transactions, unique_customers] = REVENUE_METRICS;
    let entries = [
        (total, DerivedValue::Snapshot(totals.sum)),
        (average, DerivedValue::Snapshot(totals.avg)),
        (transactions, DerivedValue::Snapshot(totals.count)),
        (unique_customers, DerivedValue::Snapshot(totals.unique_count)),
    ];
    assemble(&entries, messages, DisplayFlags::default())
}

/// Cards plus the query lifecycle flags the bar widget displays.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsBar {
    pub is_loading: bool,
    pub is_fetched: bool,
    pub error: Option<QueryError>,
    pub cards: Vec<MetricCard>,
}

#[must_use]
pub fn website_metrics_bar(
    state: &QueryState<WebsiteStats>,
    messages: &Messages,
    mode: &ViewMode,
) -> MetricsBar {
    MetricsBar {
        is_loading: state.is_loading,
        is_fetched: state.is_fetched,
        error: state.error.clone(),
        cards: website_metrics(state.data.as_ref(), messages, mode),
    }
}

#[must_use]
pub fn revenue_metrics_bar(state: &QueryState<RevenueReport>, messages: &Messages) -> MetricsBar {
    MetricsBar {
        is_loading: state.is_loading,
        is_fetched: state.data.is_some(),
        error: state.error.clone(),
        cards: revenue_metrics(state.data.as_ref(), messages),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::Aggregate;
    use crate::range::{DateRange, TimeUnit};
    use crate::stats::RevenueTotals;
    use chrono::{TimeZone, Utc};

    fn week() -> RangeSelection {
        RangeSelection::Window(DateRange {
            unit: TimeUnit::Day,
            start_date: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 5, 7, 23, 59, 59).unwrap(),
        })
    }

    fn mode(range: RangeSelection, compare_mode: bool, show_change: bool) -> ViewMode {
        ViewMode {
            range,
            compare_mode,
            show_change,
        }
    }

    fn stats() -> WebsiteStats {
        WebsiteStats {
            pageviews: Aggregate::new(1200.0, 1000.0),
            visits: Aggregate::new(400.0, 400.0),
            visitors: Aggregate::new(300.0, 310.0),
            bounces: Aggregate::new(180.0, 160.0),
            totaltime: Aggregate::new(48_000.0, 40_000.0),
        }
    }

    #[test]
    fn display_flags_matrix() {
        let cases = [
            (false, false, false, false),
            (false, true, true, false),
            (true, false, true, true),
            (true, true, true, true),
        ];
        for (compare_mode, show_change, expect_change, expect_previous) in cases {
            let flags = mode(week(), compare_mode, show_change).display_flags();
            assert_eq!(flags.show_change, expect_change);
            assert_eq!(flags.show_previous, expect_previous);
        }
    }

    #[test]
    fn all_time_suppresses_change_and_previous() {
        for (compare_mode, show_change) in [(false, false), (false, true), (true, false), (true, true)] {
            let flags = mode(RangeSelection::AllTime, compare_mode, show_change).display_flags();
            assert!(!flags.show_change);
            assert!(!flags.show_previous);
        }
    }

    #[test]
    fn all_time_not_offered_in_compare_mode() {
        assert!(mode(week(), false, false).allows_all_time());
        assert!(!mode(week(), true, false).allows_all_time());
    }

    #[test]
    fn website_metrics_values() {
        let cards = website_metrics(Some(&stats()), &Messages::default(), &mode(week(), true, false));
        let kinds: Vec<_> = cards.iter().map(|card| card.metric.kind).collect();
        assert_eq!(
            kinds,
            [
                MetricKind::Views,
                MetricKind::Visits,
                MetricKind::Visitors,
                MetricKind::BounceRate,
                MetricKind::VisitDuration,
            ]
        );

        let bounce = &cards[3].metric;
        assert_eq!(bounce.value, 45.0);
        assert_eq!(bounce.prev, Some(40.0));
        assert_eq!(bounce.change, Some(5.0));
        assert!(bounce.reverse_colors);

        let duration = &cards[4].metric;
        assert_eq!(duration.value, 120.0);
        assert_eq!(duration.prev, Some(100.0));
        assert_eq!(cards[4].formatted_value(), "2m");
    }

    #[test]
    fn missing_data_yields_no_cards() {
        let cards = website_metrics(None, &Messages::default(), &mode(week(), true, true));
        assert!(cards.is_empty());
        assert!(revenue_metrics(None, &Messages::default()).is_empty());
    }

    #[test]
    fn sentiment_respects_reverse_colors() {
        let cards = website_metrics(Some(&stats()), &Messages::default(), &mode(week(), true, false));
        assert_eq!(cards[0].trend(), Trend::Increase);
        assert_eq!(cards[0].sentiment(), Sentiment::Good);
        assert_eq!(cards[2].trend(), Trend::Decrease);
        assert_eq!(cards[2].sentiment(), Sentiment::Bad);
        assert_eq!(cards[3].trend(), Trend::Increase);
        assert_eq!(cards[3].sentiment(), Sentiment::Bad);
        assert_eq!(cards[1].trend(), Trend::Unchanged);
        assert_eq!(cards[1].sentiment(), Sentiment::Neutral);
    }

    #[test]
    fn zero_visits_marks_ratio_metrics_undefined() {
        let mut data = stats();
        data.visits = Aggregate::new(0.0, 400.0);
        let cards = website_metrics(Some(&data), &Messages::default(), &mode(week(), true, false));
        for card in &cards[3..] {
            assert!(card.metric.value.is_nan());
            assert_eq!(card.trend(), Trend::Undefined);
            assert_eq!(card.sentiment(), Sentiment::Neutral);
            assert_eq!(card.formatted_value(), "-");
            assert_eq!(card.formatted_change().as_deref(), Some("-"));
        }
        assert_eq!(cards[3].formatted_previous().as_deref(), Some("40%"));
    }

    #[test]
    fn revenue_cards_are_snapshots() {
        let report = RevenueReport {
            chart: Vec::new(),
            total: RevenueTotals {
                sum: 12_345.5,
                avg: 41.15,
                count: 300.0,
                unique_count: 120.0,
            },
            parameters: None,
        };
        let cards = revenue_metrics(Some(&report), &Messages::default());
        let labels: Vec<_> = cards.iter().map(MetricCard::label).collect();
        assert_eq!(labels, ["Total", "Average", "Transactions", "Unique Customers"]);
        assert_eq!(cards[0].formatted_value(), "12,345.5");
        for card in &cards {
            assert!(!card.show_change && !card.show_previous);
            assert_eq!(card.metric.prev, None);
            assert_eq!(card.formatted_change(), None);
        }
    }

    #[test]
    fn assemble_keeps_caller_order() {
        let entries = [
            (WEBSITE_METRICS[4], DerivedValue::Snapshot(1.0)),
            (WEBSITE_METRICS[0], DerivedValue::Snapshot(1_000_000.0)),
            (WEBSITE_METRICS[2], DerivedValue::Snapshot(0.0)),
        ];
        let cards = assemble(&entries, &Messages::default(), DisplayFlags::default());
        let labels: Vec<_> = cards.iter().map(MetricCard::label).collect();
        assert_eq!(labels, ["Visit duration", "Views", "Visitors"]);
    }

    #[test]
    fn bar_passes_upstream_error_through() {
        let error = QueryError::new("stats service unavailable").with_status(503);
        let state = QueryState::<WebsiteStats>::failed(error.clone());
        let bar = website_metrics_bar(&state, &Messages::default(), &mode(week(), false, false));
        assert_eq!(bar.error, Some(error));
        assert!(bar.cards.is_empty());
        assert!(bar.is_fetched && !bar.is_loading);
    }

    #[test]
    fn revenue_bar_is_fetched_only_with_data() {
        let bar = revenue_metrics_bar(&QueryState::loading(), &Messages::default());
        assert!(bar.is_loading);
        assert!(!bar.is_fetched);
    }
}
