use chrono::{TimeZone, Utc};
use statbar::chart::{revenue_chart, x_labels};
use statbar::compare::{CompareStore, DateCompare};
use statbar::range::{DateRange, RangeSelection, StatsQuery, TimeUnit};
use statbar::{
    Messages, MetricKind, QueryError, QueryState, RevenueReport, Sentiment, Trend, ViewMode,
    WebsiteStats, revenue_metrics_bar, website_metrics_bar,
};

const WEBSITE_RESPONSE: &str = r#"{
    "pageviews": {"value": 1500, "prev": 1200},
    "visits": {"value": 500, "prev": 400},
    "visitors": {"value": 420, "prev": 400},
    "bounces": {"value": 250, "prev": 260},
    "totaltime": {"value": 60000, "prev": 40000}
}"#;

const REVENUE_RESPONSE: &str = r#"{
    "chart": [
        {"time": "2024-03-01T00:00:00Z", "sum": 1200.5, "avg": 40.0},
        {"time": "2024-04-01T00:00:00Z", "sum": 980.0, "avg": 35.0}
    ],
    "total": {"sum": 2180.5, "avg": 37.6, "count": 58, "uniqueCount": 41},
    "parameters": {
        "dateRange": {
            "unit": "month",
            "startDate": "2024-03-01T00:00:00Z",
            "endDate": "2024-04-30T23:59:59Z"
        }
    }
}"#;

fn compare_mode() -> ViewMode {
    ViewMode {
        range: RangeSelection::AllTime,
        compare_mode: true,
        show_change: false,
    }
}

fn windowed(compare_mode: bool, show_change: bool) -> ViewMode {
    ViewMode {
        range: RangeSelection::Window(DateRange {
            unit: TimeUnit::Day,
            start_date: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 5, 7, 23, 59, 59).unwrap(),
        }),
        compare_mode,
        show_change,
    }
}

#[test]
fn website_response_becomes_five_ordered_cards() {
    let stats: WebsiteStats = serde_json::from_str(WEBSITE_RESPONSE).unwrap();
    let bar = website_metrics_bar(
        &QueryState::fetched(stats),
        &Messages::default(),
        &windowed(true, false),
    );

    assert!(bar.is_fetched);
    assert!(!bar.is_loading);
    let kinds: Vec<MetricKind> = bar.cards.iter().map(|card| card.metric.kind).collect();
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

    let rendered: Vec<(String, Option<String>, Option<String>)> = bar
        .cards
        .iter()
        .map(|card| {
            (
                card.formatted_value(),
                card.formatted_previous(),
                card.formatted_change(),
            )
        })
        .collect();
    let expected = [
        ("1.5K", "1.2K", "+300"),
        ("500", "400", "+100"),
        ("420", "400", "+20"),
        ("50%", "65%", "-15%"),
        ("2m", "1m 40s", "+20s"),
    ];
    for (card, (value, prev, change)) in rendered.iter().zip(expected) {
        assert_eq!(card.0, value);
        assert_eq!(card.1.as_deref(), Some(prev));
        assert_eq!(card.2.as_deref(), Some(change));
    }
    assert!(bar.cards.iter().all(|card| card.show_change && card.show_previous));
}

#[test]
fn falling_bounce_rate_is_good_news() {
    let stats: WebsiteStats = serde_json::from_str(WEBSITE_RESPONSE).unwrap();
    let bar = website_metrics_bar(
        &QueryState::fetched(stats),
        &Messages::default(),
        &windowed(false, true),
    );
    let bounce = &bar.cards[3];
    assert_eq!(bounce.trend(), Trend::Decrease);
    assert_eq!(bounce.sentiment(), Sentiment::Good);
    assert!(bounce.show_change);
    assert!(!bounce.show_previous);
    assert_eq!(bar.cards[0].sentiment(), Sentiment::Good);
}

#[test]
fn all_time_hides_comparison_even_in_compare_mode() {
    let stats: WebsiteStats = serde_json::from_str(WEBSITE_RESPONSE).unwrap();
    let bar = website_metrics_bar(
        &QueryState::fetched(stats),
        &Messages::default(),
        &compare_mode(),
    );
    assert!(!compare_mode().allows_all_time());
    assert!(bar.cards.iter().all(|card| !card.show_change && !card.show_previous));
}

#[test]
fn zero_visits_leave_ratios_undefined() {
    let stats: WebsiteStats = serde_json::from_str(
        r#"{
            "pageviews": {"value": 0, "prev": 10},
            "visits": {"value": 0, "prev": 5},
            "visitors": {"value": 0, "prev": 4},
            "bounces": {"value": 0, "prev": 2},
            "totaltime": {"value": 0, "prev": 300}
        }"#,
    )
    .unwrap();
    let bar = website_metrics_bar(
        &QueryState::fetched(stats),
        &Messages::default(),
        &windowed(true, true),
    );

    let bounce = &bar.cards[3];
    assert_eq!(bounce.formatted_value(), "-");
    assert_eq!(bounce.formatted_previous().as_deref(), Some("40%"));
    assert_eq!(bounce.formatted_change().as_deref(), Some("-"));
    assert_eq!(bounce.trend(), Trend::Undefined);
    assert_eq!(bounce.sentiment(), Sentiment::Neutral);

    let duration = &bar.cards[4];
    assert_eq!(duration.formatted_value(), "-");
    assert_eq!(duration.formatted_previous().as_deref(), Some("1m"));
}

#[test]
fn missing_prev_defaults_to_zero() {
    let stats: WebsiteStats = serde_json::from_str(
        r#"{
            "pageviews": {"value": 12},
            "visits": {"value": 4},
            "visitors": {"value": 3},
            "bounces": {"value": 1},
            "totaltime": {"value": 200}
        }"#,
    )
    .unwrap();
    assert_eq!(stats.pageviews.prev, 0.0);
    let bar = website_metrics_bar(
        &QueryState::fetched(stats),
        &Messages::default(),
        &windowed(false, true),
    );
    assert_eq!(bar.cards[0].formatted_change().as_deref(), Some("+12"));
    assert_eq!(bar.cards[3].formatted_value(), "25%");
}

#[test]
fn loading_and_failed_states_render_no_cards() {
    let messages = Messages::default();
    let loading = website_metrics_bar(&QueryState::loading(), &messages, &windowed(false, false));
    assert!(loading.is_loading);
    assert!(loading.cards.is_empty());

    let failed = website_metrics_bar(
        &QueryState::failed(QueryError::new("gateway timeout").with_status(504)),
        &messages,
        &windowed(false, false),
    );
    assert!(failed.cards.is_empty());
    assert_eq!(failed.error.as_ref().map(ToString::to_string).as_deref(), Some("gateway timeout"));
    assert_eq!(failed.error.and_then(|error| error.status), Some(504));
}

#[test]
fn custom_labels_reach_the_cards() {
    let messages = Messages::from_json(r#"{"views": "Pages vues", "bounceRate": "Rebond"}"#).unwrap();
    let stats: WebsiteStats = serde_json::from_str(WEBSITE_RESPONSE).unwrap();
    let bar = website_metrics_bar(&QueryState::fetched(stats), &messages, &windowed(false, false));
    assert_eq!(bar.cards[0].label(), "Pages vues");
    assert_eq!(bar.cards[1].label(), "Visits");
    assert_eq!(bar.cards[3].label(), "Rebond");
}

#[test]
fn revenue_report_becomes_snapshot_cards_and_chart() {
    let report: RevenueReport = serde_json::from_str(REVENUE_RESPONSE).unwrap();
    let messages = Messages::default();
    let bar = revenue_metrics_bar(&QueryState::fetched(report.clone()), &messages);

    let values: Vec<(&str, String)> = bar
        .cards
        .iter()
        .map(|card| (card.label(), card.formatted_value()))
        .collect();
    assert_eq!(
        values,
        [
            ("Total", "2,180.5".to_string()),
            ("Average", "37.6".to_string()),
            ("Transactions", "58".to_string()),
            ("Unique Customers", "41".to_string()),
        ]
    );
    assert!(bar.cards.iter().all(|card| card.formatted_change().is_none()));

    let chart = revenue_chart(Some(&report), &messages);
    let labels: Vec<&str> = chart.datasets.iter().map(|set| set.label.as_str()).collect();
    assert_eq!(labels, ["Average", "Total"]);
    assert_eq!(chart.datasets[1].data[0].y, 1200.5);
    assert_eq!(x_labels(&report), ["Mar", "Apr"]);
}

#[test]
fn compare_store_drives_the_query() {
    let mut store = CompareStore::new();
    store.set("site-a", DateCompare::Yoy);
    let selection = windowed(true, false).range;

    let compared = StatsQuery::new("site-a", &selection, store.effective("site-a", true));
    let params = compared.params();
    assert!(params.contains(&("compare", "yoy".to_string())));
    assert!(params.contains(&("unit", "day".to_string())));

    let plain = StatsQuery::new("site-b", &selection, store.effective("site-b", true));
    assert!(plain.params().iter().all(|(key, _)| *key != "compare"));
    assert_eq!(store.selected("site-b"), DateCompare::Prev);
}
