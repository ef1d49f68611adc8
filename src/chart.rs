use crate::messages::{LabelKey, Messages};
use crate::range::{TimeUnit, render_date_label};
use crate::stats::{RevenuePoint, RevenueReport};
use serde::Serialize;

const AVERAGE_COLOR: &str = "#8601B0";
const TOTAL_COLOR: &str = "#f15bb5";
const BORDER_WIDTH: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: String,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<ChartPoint>,
    pub border_width: u32,
    pub background_color: &'static str,
    pub border_color: &'static str,
    pub order: u32,
}

/// Chart-ready series, serialized in the shape chart widgets consume.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartData {
    pub datasets: Vec<Dataset>,
}

impl ChartData {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

/// Average and total series over the report buckets, average first.
#[must_use]
pub fn revenue_chart(data: Option<&RevenueReport>, messages: &Messages) -> ChartData {
    let Some(report) = data else {
        return ChartData::default();
    };
    ChartData {
        datasets: vec![
            dataset(report, messages, LabelKey::Average, AVERAGE_COLOR, 1, |point| {
                point.avg
            }),
            dataset(report, messages, LabelKey::Total, TOTAL_COLOR, 2, |point| {
                point.sum
            }),
        ],
    }
}

fn dataset(
    report: &RevenueReport,
    messages: &Messages,
    label: LabelKey,
    color: &'static str,
    order: u32,
    pick: impl Fn(&RevenuePoint) -> f64,
) -> Dataset {
    Dataset {
        label: messages.format(label).to_string(),
        data: report
            .chart
            .iter()
            .map(|point| ChartPoint {
                x: point.time.clone(),
                y: pick(point),
            })
            .collect(),
        border_width: BORDER_WIDTH,
        background_color: color,
        border_color: color,
        order,
    }
}

/// Unit the report was bucketed by, `day` when the report does not say.
#[must_use]
pub fn report_unit(report: &RevenueReport) -> TimeUnit {
    report
        .parameters
        .as_ref()
        .map_or_else(TimeUnit::default, |parameters| parameters.date_range.unit)
}

/// X axis labels for the report buckets.
#[must_use]
pub fn x_labels(report: &RevenueReport) -> Vec<String> {
    let unit = report_unit(report);
    report
        .chart
        .iter()
        .map(|point| render_date_label(&point.time, unit))
        .collect()
}
