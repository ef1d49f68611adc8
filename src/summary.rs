use chrono::{DateTime, Local};
use colored::{ColoredString, Colorize};
use statbar::chart::ChartData;
use statbar::error::QueryError;
use statbar::metrics::{MetricCard, MetricsBar, Sentiment};
use std::path::Path;

pub struct SummaryPaths<'a> {
    pub csv: Option<&'a Path>,
    pub html: Option<&'a Path>,
    pub chart: Option<&'a Path>,
}

pub struct ChartRows<'a> {
    pub labels: &'a [String],
    pub chart: &'a ChartData,
}

pub struct SummaryContext<'a> {
    pub title: &'a str,
    pub source: &'a str,
    pub range: &'a str,
    pub compare: Option<&'a str>,
    pub run_started_at: &'a DateTime<Local>,
    pub bar: &'a MetricsBar,
    pub chart: Option<ChartRows<'a>>,
    pub paths: SummaryPaths<'a>,
}

pub fn print_summary(context: &SummaryContext<'_>) {
    println!();
    print_summary_header(context);
    print_summary_paths(&context.paths);
    println!();
    println!("{}", context.title.bold().bright_magenta());
    let mut table_width = print_metrics_table(context.bar);
    if let Some(rows) = &context.chart {
        println!();
        table_width = table_width.max(print_chart_table(rows));
    }
    if table_width > 0 {
        println!("{}", "=".repeat(table_width).bright_cyan());
    }
}

fn print_summary_header(context: &SummaryContext<'_>) {
    println!(
        "{}",
        "====================== statbar ======================"
            .bold()
            .bright_cyan()
    );
    println!(
        "{} {}",
        "Generated".bright_yellow().bold(),
        context
            .run_started_at
            .format("%Y-%m-%d %H:%M:%S %Z")
            .to_string()
            .bright_white()
    );
    println!(
        "{} {}",
        "Source".bright_yellow().bold(),
        context.source.bright_white()
    );
    println!(
        "{} {}",
        "Range".bright_yellow().bold(),
        context.range.bright_white()
    );
    if let Some(compare) = context.compare {
        println!(
            "{} {}",
            "Compared with".bright_yellow().bold(),
            compare.bright_white()
        );
    }
}

fn print_summary_paths(paths: &SummaryPaths<'_>) {
    print_path_line("Metrics CSV", paths.csv, "not saved (use --save-csv)");
    print_path_line("HTML Report", paths.html, "not saved (use --save-html)");
    print_path_line("Chart JSON", paths.chart, "not saved (use --save-chart)");
}

fn print_path_line(label: &str, path: Option<&Path>, hint: &str) {
    let label_colored = label.bright_yellow().bold();
    match path {
        Some(path) => println!(
            "{} {}",
            label_colored,
            format!("{}", path.display()).bright_white()
        ),
        None => println!("{} {}", label_colored, hint.bright_black()),
    }
}

fn print_metrics_table(bar: &MetricsBar) -> usize {
    if let Some(error) = &bar.error {
        let message = unavailable_line(error);
        println!("{}", message.bright_red().bold());
        return message.len();
    }
    if bar.is_loading {
        let message = "Loading statistics...";
        println!("{}", message.bright_black());
        return message.len();
    }
    if bar.cards.is_empty() {
        let message = "No statistics available.";
        println!("{}", message.bright_black());
        return message.len();
    }

    let show_previous = bar.cards.iter().any(|card| card.show_previous);
    let show_change = bar.cards.iter().any(|card| card.show_change);

    let mut header = format!("{:<16} | {:>10}", "Metric", "Value");
    if show_previous {
        header.push_str(&format!(" | {:>10}", "Previous"));
    }
    if show_change {
        header.push_str(&format!(" | {:>10}", "Change"));
    }
    let separator = "-".repeat(header.len());
    println!("{}", header.bold().bright_white());
    println!("{}", separator.bright_black());

    let mut max_width = header.len();
    for card in &bar.cards {
        let mut line = format!("{:<16} | {:>10}", card.label(), card.formatted_value());
        if show_previous {
            let previous = card
                .show_previous
                .then(|| card.formatted_previous())
                .flatten()
                .unwrap_or_default();
            line.push_str(&format!(" | {previous:>10}"));
        }
        max_width = max_width.max(line.len());
        if show_change {
            let change = card
                .show_change
                .then(|| card.formatted_change())
                .flatten()
                .unwrap_or_default();
            let cell = format!("{change:>10}");
            max_width = max_width.max(line.len() + 3 + cell.len());
            println!("{} | {}", line.bright_white(), paint(cell, card));
        } else {
            println!("{}", line.bright_white());
        }
    }

    max_width
}

pub fn unavailable_line(error: &QueryError) -> String {
    error.status.map_or_else(
        || format!("Statistics unavailable: {error}"),
        |status| format!("Statistics unavailable (HTTP {status}): {error}"),
    )
}

fn paint(text: String, card: &MetricCard) -> ColoredString {
    match card.sentiment() {
        Sentiment::Good => text.bright_green().bold(),
        Sentiment::Bad => text.bright_red().bold(),
        Sentiment::Neutral => text.bright_black(),
    }
}

fn print_chart_table(rows: &ChartRows<'_>) -> usize {
    if rows.chart.is_empty() || rows.labels.is_empty() {
        let message = "No chart data available.";
        println!("{}", message.bright_black());
        return message.len();
    }

    let mut header = format!("{:<12}", "Time");
    for dataset in &rows.chart.datasets {
        header.push_str(&format!(" | {:>12}", dataset.label));
    }
    println!("{}", header.bold().bright_white());
    println!("{}", "-".repeat(header.len()).bright_black());

    let mut max_width = header.len();
    for (idx, label) in rows.labels.iter().enumerate() {
        let mut line = format!("{label:<12}");
        for dataset in &rows.chart.datasets {
            let value = dataset
                .data
                .get(idx)
                .map_or_else(|| "-".to_string(), |point| format!("{:.2}", point.y));
            line.push_str(&format!(" | {value:>12}"));
        }
        max_width = max_width.max(line.len());
        println!("{}", line.bright_green());
    }

    max_width
}
