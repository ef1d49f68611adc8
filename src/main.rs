use crate::cli::{Cli, Commands, DEFAULT_WINDOW_DAYS, LogLevel, RevenueArgs, WebsiteArgs};
use crate::progress::{ProgressState, Stage, run_with_spinner};
use crate::report::{HtmlReportContext, save_html_report};
use crate::source::{Fetcher, Source, into_query_state};
use crate::summary::{ChartRows, SummaryContext, SummaryPaths, print_summary};
use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime, Utc};
use clap::Parser;
use statbar::chart::{ChartData, revenue_chart, x_labels};
use statbar::compare::{CompareStore, compare_options};
use statbar::messages::Messages;
use statbar::metrics::{MetricsBar, ViewMode, revenue_metrics_bar, website_metrics_bar};
use statbar::range::{DateRange, RangeSelection, StatsQuery};
use statbar::stats::{RevenueReport, WebsiteStats};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cli;
mod export;
mod progress;
mod report;
mod source;
mod summary;

const WEBSITE_TITLE: &str = "Website Metrics";
const REVENUE_TITLE: &str = "Revenue";

/// Flags shared by every reporting command.
struct OutputOptions {
    labels: Option<PathBuf>,
    save_csv: Option<PathBuf>,
    save_html: Option<PathBuf>,
    save_chart: Option<PathBuf>,
    archive_csv: bool,
    token: Option<String>,
    no_progress: bool,
}

/// Paths written by a run, for the summary.
#[derive(Default)]
struct SavedOutputs {
    csv: Option<PathBuf>,
    html: Option<PathBuf>,
    chart: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    colored::control::set_override(true);

    let Cli {
        labels,
        save_csv,
        save_html,
        save_chart,
        archive_csv,
        token,
        no_progress,
        log_level,
        command,
    } = Cli::parse();

    init_logging(log_level)?;

    let options = OutputOptions {
        labels,
        save_csv,
        save_html,
        save_chart,
        archive_csv,
        token,
        no_progress,
    };

    match command {
        Some(Commands::Website(args)) => run_website(&options, args).await,
        Some(Commands::Revenue(args)) => run_revenue(&options, args).await,
        Some(Commands::Completions {
            shell,
            output_dir,
            install,
        }) => cli::generate_completions(shell, output_dir, install),
        None => Err(anyhow!(
            "no command given; run `statbar --help` for the available commands"
        )),
    }
}

fn init_logging(level: LogLevel) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing_subscriber::filter::LevelFilter::from(level).into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("failed to initialize logging: {err}"))
}

async fn load_messages(path: Option<&Path>) -> Result<Messages> {
    let Some(path) = path else {
        return Ok(Messages::default());
    };
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read labels file {}", path.display()))?;
    Messages::from_json(&raw).with_context(|| format!("invalid labels file {}", path.display()))
}

async fn run_website(options: &OutputOptions, args: WebsiteArgs) -> Result<()> {
    let run_started_at = Local::now();
    let selection = build_selection(&args, run_started_at.date_naive())?;
    let mode = validate_mode(ViewMode {
        range: selection.clone(),
        compare_mode: args.compare,
        show_change: args.show_change,
    })?;
    let messages = load_messages(options.labels.as_deref()).await?;

    let mut store = CompareStore::new();
    if let Some(date_compare) = args.date_compare {
        store.set(args.website_id.as_str(), date_compare);
    }
    let query = StatsQuery::new(
        args.website_id.as_str(),
        &selection,
        store.effective(&args.website_id, args.compare),
    );
    info!(website = %query.website_id, compare = ?query.compare, "loading website statistics");

    let source = Source::parse(&args.source);
    let source_label = source.to_string();
    let fetcher = Fetcher::new(options.token.clone())?;
    let progress = (!options.no_progress).then(ProgressState::new);
    let loaded = run_with_spinner(
        progress.as_ref(),
        Stage::Load,
        &source_label,
        fetcher.load_json::<WebsiteStats>(&source, &query.params()),
    )
    .await;
    let state = into_query_state(loaded);
    let bar = website_metrics_bar(&state, &messages, &mode);

    let range_label = describe_selection(&selection);
    let compare_label = args.compare.then(|| {
        let selected = store.selected(&args.website_id);
        compare_options(&messages)
            .into_iter()
            .find(|option| option.value == selected)
            .map_or_else(|| selected.as_str().to_string(), |option| option.label)
    });
    if options.save_chart.is_some() {
        warn!("--save-chart only applies to revenue reports; skipping");
    }

    let html_context = HtmlReportContext {
        title: WEBSITE_TITLE,
        source: &source_label,
        range: &range_label,
        compare: compare_label.as_deref(),
        run_started_at: &run_started_at,
        bar: &bar,
        chart: None,
    };
    let saved = run_with_spinner(
        progress.as_ref(),
        Stage::Save,
        "metric outputs",
        save_outputs(options, &bar, &html_context, None),
    )
    .await?;
    if let Some(progress) = &progress {
        progress.clear();
    }

    print_summary(&SummaryContext {
        title: WEBSITE_TITLE,
        source: &source_label,
        range: &range_label,
        compare: compare_label.as_deref(),
        run_started_at: &run_started_at,
        bar: &bar,
        chart: None,
        paths: saved.paths(),
    });

    finish(&bar)
}

async fn run_revenue(options: &OutputOptions, args: RevenueArgs) -> Result<()> {
    let run_started_at = Local::now();
    let messages = load_messages(options.labels.as_deref()).await?;

    let source = Source::parse(&args.source);
    let source_label = source.to_string();
    let fetcher = Fetcher::new(options.token.clone())?;
    let progress = (!options.no_progress).then(ProgressState::new);
    let loaded = run_with_spinner(
        progress.as_ref(),
        Stage::Load,
        &source_label,
        fetcher.load_json::<RevenueReport>(&source, &[]),
    )
    .await;
    let state = into_query_state(loaded);
    let bar = revenue_metrics_bar(&state, &messages);
    let chart = revenue_chart(state.data.as_ref(), &messages);
    let labels = state.data.as_ref().map(x_labels).unwrap_or_default();
    let range_label = state
        .data
        .as_ref()
        .and_then(|report| report.parameters.as_ref())
        .map_or_else(
            || "as reported".to_string(),
            |parameters| describe_range(&parameters.date_range),
        );

    let html_context = HtmlReportContext {
        title: REVENUE_TITLE,
        source: &source_label,
        range: &range_label,
        compare: None,
        run_started_at: &run_started_at,
        bar: &bar,
        chart: Some((labels.as_slice(), &chart)),
    };
    let saved = run_with_spinner(
        progress.as_ref(),
        Stage::Save,
        "revenue outputs",
        save_outputs(options, &bar, &html_context, Some(&chart)),
    )
    .await?;
    if let Some(progress) = &progress {
        progress.clear();
    }

    print_summary(&SummaryContext {
        title: REVENUE_TITLE,
        source: &source_label,
        range: &range_label,
        compare: None,
        run_started_at: &run_started_at,
        bar: &bar,
        chart: Some(ChartRows {
            labels: &labels,
            chart: &chart,
        }),
        paths: saved.paths(),
    });

    finish(&bar)
}

async fn save_outputs(
    options: &OutputOptions,
    bar: &MetricsBar,
    html_context: &HtmlReportContext<'_>,
    chart: Option<&ChartData>,
) -> Result<SavedOutputs> {
    let mut saved = SavedOutputs::default();
    if let Some(path) = options.save_csv.as_deref() {
        saved.csv = Some(export::save_cards_csv(&bar.cards, path, options.archive_csv).await?);
    }
    if let Some(path) = options.save_html.as_deref() {
        save_html_report(path, html_context).await?;
        saved.html = Some(path.to_path_buf());
    }
    if let (Some(path), Some(chart)) = (options.save_chart.as_deref(), chart) {
        export::save_chart_json(chart, path).await?;
        saved.chart = Some(path.to_path_buf());
    }
    Ok(saved)
}

impl SavedOutputs {
    fn paths(&self) -> SummaryPaths<'_> {
        SummaryPaths {
            csv: self.csv.as_deref(),
            html: self.html.as_deref(),
            chart: self.chart.as_deref(),
        }
    }
}

// The bar already shows the upstream error; the exit status reports it too.
fn finish(bar: &MetricsBar) -> Result<()> {
    match &bar.error {
        Some(error) => Err(anyhow!("statistics query failed: {error}")),
        None => Ok(()),
    }
}

fn validate_mode(mode: ViewMode) -> Result<ViewMode> {
    if mode.range.is_all_time() && !mode.allows_all_time() {
        bail!("the all-time range has no previous period; drop --all-time or --compare");
    }
    Ok(mode)
}

fn build_selection(args: &WebsiteArgs, today: NaiveDate) -> Result<RangeSelection> {
    if args.all_time {
        return Ok(RangeSelection::AllTime);
    }
    let end = args.end.unwrap_or(today);
    let start = match args.start {
        Some(start) => start,
        None => end
            .checked_sub_days(Days::new(DEFAULT_WINDOW_DAYS.unsigned_abs() - 1))
            .ok_or_else(|| anyhow!("cannot compute a {DEFAULT_WINDOW_DAYS}-day window ending {end}"))?,
    };
    if start > end {
        bail!("range start {start} is after range end {end}");
    }
    Ok(RangeSelection::Window(DateRange {
        unit: args.unit,
        start_date: day_start(start),
        end_date: day_end(end)?,
    }))
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn day_end(date: NaiveDate) -> Result<DateTime<Utc>> {
    date.and_hms_opt(23, 59, 59)
        .map(|last_second| last_second.and_utc())
        .ok_or_else(|| anyhow!("cannot compute the end of {date}"))
}

fn describe_selection(selection: &RangeSelection) -> String {
    selection
        .window()
        .map_or_else(|| "All time".to_string(), describe_range)
}

fn describe_range(range: &DateRange) -> String {
    format!(
        "{} to {} (by {})",
        range.start_date.format("%Y-%m-%d"),
        range.end_date.format("%Y-%m-%d"),
        range.unit.as_str()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use statbar::range::TimeUnit;

    fn args(all_time: bool, start: Option<NaiveDate>, end: Option<NaiveDate>) -> WebsiteArgs {
        WebsiteArgs {
            source: "stats.json".to_string(),
            website_id: "site".to_string(),
            compare: false,
            show_change: false,
            all_time,
            date_compare: None,
            unit: TimeUnit::Day,
            start,
            end,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn default_window_is_seven_days_ending_today() {
        let selection = build_selection(&args(false, None, None), date(2024, 5, 10)).unwrap();
        assert_eq!(describe_selection(&selection), "2024-05-04 to 2024-05-10 (by day)");
    }

    #[test]
    fn all_time_selection() {
        let selection = build_selection(&args(true, None, None), date(2024, 5, 10)).unwrap();
        assert!(selection.is_all_time());
        assert_eq!(describe_selection(&selection), "All time");
    }

    #[test]
    fn inverted_window_is_rejected() {
        let result = build_selection(
            &args(false, Some(date(2024, 5, 10)), Some(date(2024, 5, 1))),
            date(2024, 5, 10),
        );
        assert!(result.is_err());
    }

    #[test]
    fn compare_mode_rejects_all_time() {
        let selection = build_selection(&args(true, None, None), date(2024, 5, 10)).unwrap();
        let rejected = validate_mode(ViewMode {
            range: selection.clone(),
            compare_mode: true,
            show_change: false,
        });
        let message = rejected.unwrap_err().to_string();
        assert!(message.contains("--all-time"), "{message}");

        let accepted = validate_mode(ViewMode {
            range: selection,
            compare_mode: false,
            show_change: true,
        });
        assert!(accepted.is_ok());
    }

    #[test]
    fn compare_mode_accepts_windows() {
        let selection = build_selection(&args(false, None, None), date(2024, 5, 10)).unwrap();
        let mode = validate_mode(ViewMode {
            range: selection,
            compare_mode: true,
            show_change: false,
        })
        .unwrap();
        assert!(mode.display_flags().show_previous);
    }

    #[test]
    fn day_end_is_last_second() {
        let end = day_end(date(2024, 2, 29)).unwrap();
        assert_eq!(end.to_rfc3339(), "2024-02-29T23:59:59+00:00");
    }

    #[test]
    fn explicit_window_covers_whole_days() {
        let selection = build_selection(
            &args(false, Some(date(2024, 1, 1)), Some(date(2024, 1, 31))),
            date(2024, 5, 10),
        )
        .unwrap();
        let range = selection.window().unwrap();
        assert_eq!(range.start_date.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(range.end_date.to_rfc3339(), "2024-01-31T23:59:59+00:00");
    }
}
