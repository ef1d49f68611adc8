use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate, generate_to};
use statbar::compare::DateCompare;
use statbar::range::TimeUnit;
use tracing_subscriber::filter::LevelFilter;

pub const DEFAULT_CSV_PATH: &str = "data/output/metrics.csv";
pub const DEFAULT_HTML_PATH: &str = "data/output/metrics.html";
pub const DEFAULT_CHART_PATH: &str = "data/output/chart.json";
pub const DEFAULT_WEBSITE_ID: &str = "default";
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

pub const SAVE_CSV_HELP: &str = "Save the metric cards to the given CSV file (defaults to data/output/metrics.csv when no path is provided). Use --archive-csv to store a .gz instead.";
pub const SAVE_HTML_HELP: &str = "Save the HTML report to the given file (defaults to data/output/metrics.html when no path is provided).";
pub const SAVE_CHART_HELP: &str = "Save the revenue chart datasets as JSON (defaults to data/output/chart.json when no path is provided).";
pub const ARCHIVE_CSV_HELP: &str = "Archive the saved CSV output into a .gz file.";
pub const SOURCE_HELP: &str = "Statistics response to read: a JSON file path or an http(s) URL of the stats endpoint.";

#[derive(Debug, Parser)]
#[command(
    name = "statbar",
    about = "Turn website and revenue statistics into formatted metric cards with period-over-period changes.",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        help = "JSON file overriding metric labels, keyed by label id (views, bounceRate, ...)."
    )]
    pub labels: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = DEFAULT_CSV_PATH,
        help = SAVE_CSV_HELP
    )]
    pub save_csv: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = DEFAULT_HTML_PATH,
        help = SAVE_HTML_HELP
    )]
    pub save_html: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = DEFAULT_CHART_PATH,
        help = SAVE_CHART_HELP
    )]
    pub save_chart: Option<PathBuf>,
    #[arg(long, global = true, help = ARCHIVE_CSV_HELP)]
    pub archive_csv: bool,
    #[arg(long, global = true, help = "Bearer token sent with URL sources.")]
    pub token: Option<String>,
    #[arg(long, global = true, help = "Disable progress spinner output.")]
    pub no_progress: bool,
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = LogLevel::Warn,
        help = "Log level written to stderr; RUST_LOG takes precedence."
    )]
    pub log_level: LogLevel,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Summarize a website statistics response: views, visits, visitors, bounce rate, visit duration.
    Website(WebsiteArgs),
    /// Summarize a revenue report: totals and the sum/average time series.
    Revenue(RevenueArgs),
    /// Print or install the shell completion script for statbar.
    Completions {
        #[arg(value_enum, help = "Target shell.")]
        shell: Shell,
        #[arg(long, value_name = "DIR", help = "Write the script into DIR instead of stdout.")]
        output_dir: Option<PathBuf>,
        #[arg(long, help = "Write the script into the per-user completion directory of the shell.")]
        install: bool,
    },
}

#[derive(Debug, Args)]
pub struct WebsiteArgs {
    #[arg(value_name = "SOURCE", help = SOURCE_HELP)]
    pub source: String,
    #[arg(long, default_value = DEFAULT_WEBSITE_ID, help = "Website the statistics belong to.")]
    pub website_id: String,
    #[arg(long, help = "Show every metric next to its value for the compared period.")]
    pub compare: bool,
    #[arg(long, help = "Show the change against the previous period.")]
    pub show_change: bool,
    #[arg(
        long,
        conflicts_with_all = ["start", "end"],
        help = "Report over all time; there is no previous period to compare with."
    )]
    pub all_time: bool,
    #[arg(
        long,
        value_enum,
        help = "Period compared against in compare mode (prev or yoy)."
    )]
    pub date_compare: Option<DateCompare>,
    #[arg(long, value_enum, default_value_t = TimeUnit::Day, help = "Bucket unit of the date range.")]
    pub unit: TimeUnit,
    #[arg(long, value_name = "YYYY-MM-DD", help = "First day of the range (defaults to 7 days ago).")]
    pub start: Option<NaiveDate>,
    #[arg(long, value_name = "YYYY-MM-DD", help = "Last day of the range (defaults to today).")]
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Args)]
pub struct RevenueArgs {
    #[arg(value_name = "SOURCE", help = SOURCE_HELP)]
    pub source: String,
}

enum CompletionTarget {
    Stdout,
    Directory(PathBuf),
}

impl CompletionTarget {
    fn resolve(shell: Shell, output_dir: Option<PathBuf>, install: bool) -> Result<Self> {
        match (output_dir, install) {
            (Some(dir), _) => Ok(Self::Directory(dir)),
            (None, true) => user_completion_dir(shell).map(Self::Directory),
            (None, false) => Ok(Self::Stdout),
        }
    }
}

pub fn generate_completions(shell: Shell, output_dir: Option<PathBuf>, install: bool) -> Result<()> {
    let mut command = Cli::command();
    let bin_name = command.get_name().to_owned();

    match CompletionTarget::resolve(shell, output_dir, install)? {
        CompletionTarget::Directory(dir) => {
            fs::create_dir_all(&dir)
                .with_context(|| format!("cannot create {}", dir.display()))?;
            let written = generate_to(shell, &mut command, bin_name, &dir)
                .with_context(|| format!("cannot write {shell} completions into {}", dir.display()))?;
            println!("Wrote {shell} completions to {}", written.display());
        }
        CompletionTarget::Stdout => {
            let mut out = io::stdout().lock();
            generate(shell, &mut command, bin_name, &mut out);
            out.flush().context("cannot flush completions to stdout")?;
        }
    }
    Ok(())
}

const fn completion_subdir(shell: Shell) -> Option<&'static str> {
    match shell {
        Shell::Bash => Some(".local/share/bash-completion/completions"),
        Shell::Elvish => Some(".elvish/lib/completions"),
        Shell::Fish => Some(".config/fish/completions"),
        Shell::PowerShell => Some(".local/share/powershell/Scripts"),
        Shell::Zsh => Some(".local/share/zsh/site-functions"),
        _ => None,
    }
}

fn user_completion_dir(shell: Shell) -> Result<PathBuf> {
    let subdir = completion_subdir(shell)
        .ok_or_else(|| anyhow!("{shell} has no per-user completion directory; pass --output-dir"))?;
    let home = std::env::var_os("HOME")
        .ok_or_else(|| anyhow!("HOME is not set; pass --output-dir"))?;
    Ok(PathBuf::from(home).join(subdir))
}
