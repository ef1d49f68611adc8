use anyhow::{Context, Result};
use csv::Writer;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use statbar::chart::ChartData;
use statbar::metrics::{MetricCard, MetricKind};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

#[derive(Debug, Serialize)]
struct CsvRecord<'a> {
    position: usize,
    kind: MetricKind,
    label: &'a str,
    value: Option<f64>,
    prev: Option<f64>,
    change: Option<f64>,
    formatted_value: String,
    formatted_previous: Option<String>,
    formatted_change: Option<String>,
    reverse_colors: bool,
    show_change: bool,
    show_previous: bool,
}

impl<'a> CsvRecord<'a> {
    fn from_card(position: usize, card: &'a MetricCard) -> Self {
        let metric = &card.metric;
        Self {
            position,
            kind: metric.kind,
            label: metric.label.as_str(),
            value: finite(metric.value),
            prev: metric.prev.and_then(finite),
            change: metric.change.and_then(finite),
            formatted_value: card.formatted_value(),
            formatted_previous: card.formatted_previous(),
            formatted_change: card.formatted_change(),
            reverse_colors: metric.reverse_colors,
            show_change: card.show_change,
            show_previous: card.show_previous,
        }
    }
}

// Undefined ratios are written as empty cells.
fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

pub fn serialize_cards(cards: &[MetricCard]) -> Result<Vec<u8>> {
    let mut writer = Writer::from_writer(Vec::new());
    for (idx, card) in cards.iter().enumerate() {
        writer
            .serialize(CsvRecord::from_card(idx + 1, card))
            .context("failed to serialize metric card")?;
    }
    finalize_writer(writer, "metric CSV writer")
}

fn finalize_writer(mut writer: Writer<Vec<u8>>, label: &str) -> Result<Vec<u8>> {
    writer
        .flush()
        .with_context(|| format!("failed to flush {label}"))?;
    writer
        .into_inner()
        .with_context(|| format!("failed to finalize {label}"))
}

fn gzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(bytes)
        .context("failed to compress CSV output")?;
    encoder.finish().context("failed to finish CSV archive")
}

pub fn archive_path(path: &Path) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == "gz") {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_owned();
    name.push(".gz");
    PathBuf::from(name)
}

/// Writes the cards as CSV and returns the path actually written.
pub async fn save_cards_csv(cards: &[MetricCard], path: &Path, archive: bool) -> Result<PathBuf> {
    let serialized = serialize_cards(cards)?;
    let (target, bytes) = if archive {
        (archive_path(path), gzip(&serialized)?)
    } else {
        (path.to_path_buf(), serialized)
    };
    write_output_file(&target, &bytes).await?;
    info!(path = %target.display(), rows = cards.len(), "saved metric CSV");
    Ok(target)
}

pub async fn save_chart_json(chart: &ChartData, path: &Path) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(chart).context("failed to serialize chart datasets")?;
    write_output_file(path, &bytes).await?;
    info!(path = %path.display(), datasets = chart.datasets.len(), "saved chart JSON");
    Ok(())
}

pub async fn write_output_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    fs::write(path, bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    Ok(())
}
