use crate::export::write_output_file;
use crate::summary::unavailable_line;
use anyhow::Result;
use chrono::{DateTime, Local};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use minify_html::{Cfg, minify};
use statbar::chart::ChartData;
use statbar::metrics::{MetricCard, MetricsBar, Sentiment};
use std::path::Path;
use tracing::info;

pub struct HtmlReportContext<'a> {
    pub title: &'a str,
    pub source: &'a str,
    pub range: &'a str,
    pub compare: Option<&'a str>,
    pub run_started_at: &'a DateTime<Local>,
    pub bar: &'a MetricsBar,
    pub chart: Option<(&'a [String], &'a ChartData)>,
}

pub async fn save_html_report(output_path: &Path, context: &HtmlReportContext<'_>) -> Result<()> {
    let markup = render_html_report(context).into_string();
    let cfg = Cfg {
        minify_css: true,
        ..Cfg::default()
    };
    let minified = minify(markup.as_bytes(), &cfg);
    write_output_file(output_path, &minified).await?;
    info!(path = %output_path.display(), bytes = minified.len(), "saved HTML report");
    Ok(())
}

fn render_html_report(context: &HtmlReportContext<'_>) -> Markup {
    let generated_at = context
        .run_started_at
        .format("%Y-%m-%d %H:%M:%S %Z")
        .to_string();
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (context.title) " - " (context.run_started_at.format("%Y-%m-%d")) }
                style { (PreEscaped(REPORT_STYLE)) }
            }
            body {
                div.page {
                    header.hero {
                        div.pill { "statbar v" (env!("CARGO_PKG_VERSION")) }
                        h1 { (context.title) }
                        div.meta {
                            (meta_item("Generated", &generated_at))
                            (meta_item("Source", context.source))
                            (meta_item("Range", context.range))
                            @if let Some(compare) = context.compare {
                                (meta_item("Compared with", compare))
                            }
                        }
                    }
                    (render_bar(context.bar))
                    @if let Some((labels, chart)) = context.chart {
                        (render_chart(labels, chart))
                    }
                }
            }
        }
    }
}

fn meta_item(label: &str, value: &str) -> Markup {
    html! {
        div {
            span.label { (label) }
            span.value.mono { (value) }
        }
    }
}

fn render_bar(bar: &MetricsBar) -> Markup {
    html! {
        section.cards {
            @if let Some(error) = &bar.error {
                div.notice.error { (unavailable_line(error)) }
            } @else if bar.is_loading {
                div.notice { "Loading statistics..." }
            } @else if bar.cards.is_empty() {
                div.notice { "No statistics available." }
            } @else {
                @for card in &bar.cards {
                    (render_card(card))
                }
            }
        }
    }
}

fn render_card(card: &MetricCard) -> Markup {
    let previous = card
        .show_previous
        .then(|| card.formatted_previous())
        .flatten();
    let change = card.show_change.then(|| card.formatted_change()).flatten();
    html! {
        div.card {
            div.card-label { (card.label()) }
            div.card-value { (card.formatted_value()) }
            @if let Some(change) = change {
                span class={ "change " (sentiment_class(card.sentiment())) } { (change) }
            }
            @if let Some(previous) = previous {
                div.previous { "vs. " (previous) }
            }
        }
    }
}

const fn sentiment_class(sentiment: Sentiment) -> &'static str {
    match sentiment {
        Sentiment::Good => "good",
        Sentiment::Bad => "bad",
        Sentiment::Neutral => "neutral",
    }
}

fn render_chart(labels: &[String], chart: &ChartData) -> Markup {
    let peak = chart
        .datasets
        .iter()
        .flat_map(|dataset| dataset.data.iter().map(|point| point.y))
        .filter(|value| value.is_finite())
        .fold(0.0_f64, f64::max);
    html! {
        section.chart {
            h2 { "Revenue over time" }
            @if chart.is_empty() || labels.is_empty() {
                p.muted { "No chart data available." }
            } @else {
                div.legend {
                    @for dataset in &chart.datasets {
                        span.legend-item {
                            span.swatch style={ "background:" (dataset.background_color) } {}
                            (dataset.label)
                        }
                    }
                }
                table {
                    tbody {
                        @for (idx, label) in labels.iter().enumerate() {
                            tr {
                                th.mono { (label) }
                                td {
                                    @for dataset in &chart.datasets {
                                        @if let Some(point) = dataset.data.get(idx) {
                                            div.bar
                                                style={ "width:" (bar_width(point.y, peak)) "%;background:" (dataset.background_color) }
                                                title={ (dataset.label) ": " (format!("{:.2}", point.y)) } {}
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn bar_width(value: f64, peak: f64) -> String {
    if peak <= 0.0 || !value.is_finite() {
        return "0".to_string();
    }
    format!("{:.1}", (value / peak * 100.0).clamp(0.0, 100.0))
}

const REPORT_STYLE: &str = r"
:root {
  --bg: #f5f3fa;
  --ink: #1d1a24;
  --muted: #6d6878;
  --card: #ffffff;
  --border: #e4dff0;
  --good: #1f8a55;
  --bad: #c0392b;
}
* { box-sizing: border-box; }
body {
  margin: 0;
  font-family: 'Inter', 'Segoe UI', sans-serif;
  color: var(--ink);
  background: var(--bg);
}
.page { max-width: 1100px; margin: 0 auto; padding: 40px 20px 56px; }
.hero {
  background: var(--card);
  border: 1px solid var(--border);
  border-radius: 20px;
  padding: 28px 32px;
}
.pill {
  display: inline-block;
  padding: 4px 12px;
  border-radius: 999px;
  background: rgba(134, 1, 176, 0.1);
  color: #8601b0;
  font-size: 12px;
  font-weight: 600;
  text-transform: uppercase;
}
h1 { margin: 12px 0 16px; font-size: 2.2rem; }
.meta { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 12px; }
.label, .card-label {
  display: block;
  font-size: 12px;
  text-transform: uppercase;
  letter-spacing: 0.08em;
  color: var(--muted);
  margin-bottom: 4px;
}
.value { font-weight: 600; }
.mono { font-family: 'JetBrains Mono', ui-monospace, monospace; }
.cards { display: grid; grid-template-columns: repeat(auto-fit, minmax(170px, 1fr)); gap: 14px; margin: 24px 0; }
.card { background: var(--card); border: 1px solid var(--border); border-radius: 16px; padding: 16px 18px; }
.card-value { font-size: 28px; font-weight: 700; }
.change { display: inline-block; margin-top: 6px; padding: 2px 8px; border-radius: 999px; font-size: 12px; font-weight: 600; }
.change.good { background: rgba(31, 138, 85, 0.14); color: var(--good); }
.change.bad { background: rgba(192, 57, 43, 0.14); color: var(--bad); }
.change.neutral { background: rgba(109, 104, 120, 0.14); color: var(--muted); }
.previous { margin-top: 6px; font-size: 13px; color: var(--muted); }
.notice { grid-column: 1 / -1; padding: 16px; border-radius: 12px; background: var(--card); color: var(--muted); }
.notice.error { color: var(--bad); border: 1px solid rgba(192, 57, 43, 0.3); }
.chart { background: var(--card); border: 1px solid var(--border); border-radius: 16px; padding: 20px 24px; }
.chart h2 { margin: 0 0 12px; font-size: 1.3rem; }
.legend { display: flex; gap: 16px; margin-bottom: 12px; font-size: 13px; }
.legend-item { display: inline-flex; align-items: center; gap: 6px; }
.swatch { width: 12px; height: 12px; border-radius: 3px; display: inline-block; }
table { width: 100%; border-collapse: collapse; }
th { text-align: left; font-weight: 500; font-size: 13px; padding: 6px 12px 6px 0; width: 90px; color: var(--muted); }
td { padding: 6px 0; }
.bar { height: 8px; border-radius: 4px; margin: 2px 0; }
.muted { color: var(--muted); }
";
