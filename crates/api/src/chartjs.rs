//! Line-chart renderer configuration for the browser dashboard.

use rankwatch_core::chart::{Dataset, DateAxis, SeriesPoint, StrokeStyle};
use serde::Serialize;
use serde_json::{json, Value};

const FILL_ALPHA: u8 = 0x33;
const DASH_PATTERN: [u32; 2] = [5, 5];

#[derive(Debug, Clone, Serialize)]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: ChartData,
    pub options: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<LineDataset>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDataset {
    pub label: String,
    pub data: Vec<SeriesPoint>,
    pub border_color: String,
    pub background_color: String,
    pub border_width: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_dash: Option<[u32; 2]>,
    pub point_radius: u32,
    pub tension: f64,
}

impl From<&Dataset> for LineDataset {
    fn from(ds: &Dataset) -> Self {
        Self {
            label: ds.label.clone(),
            data: ds.points.clone(),
            border_color: ds.color.to_string(),
            background_color: ds.color.with_alpha(FILL_ALPHA),
            border_width: 2,
            border_dash: match ds.stroke_style {
                StrokeStyle::Solid => None,
                StrokeStyle::Dashed => Some(DASH_PATTERN),
            },
            point_radius: 4,
            tension: 0.1,
        }
    }
}

pub fn line_chart(axis: &DateAxis, datasets: &[Dataset]) -> ChartConfig {
    ChartConfig {
        kind: "line",
        data: ChartData {
            labels: axis.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect(),
            datasets: datasets.iter().map(LineDataset::from).collect(),
        },
        options: options(),
    }
}

fn options() -> Value {
    // Rank 1 at the top.
    json!({
        "responsive": true,
        "maintainAspectRatio": false,
        "plugins": {
            "title": {"display": true, "text": "検索順位推移", "font": {"size": 16}},
            "legend": {"display": true, "position": "bottom"}
        },
        "scales": {
            "y": {
                "reverse": true,
                "beginAtZero": false,
                "min": 1,
                "ticks": {"stepSize": 1},
                "title": {"display": true, "text": "順位"}
            },
            "x": {
                "title": {"display": true, "text": "日付"}
            }
        }
    })
}
