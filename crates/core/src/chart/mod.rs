//! Turns filtered ranking records into a plottable chart and its summary stats.

pub mod aggregate;
pub mod dataset;
pub mod latest;
pub mod lifecycle;
pub mod stats;

pub use aggregate::{aggregate, Aggregation, DateAxis};
pub use dataset::{build_datasets, Dataset, Palette, SeriesPoint, StrokeStyle};
pub use lifecycle::{ChartHandle, ChartLifecycleManager, RenderSink};
pub use stats::{summarize, BestRank, StatsView, SummaryStats};

/// Everything one render needs, derived from a single record set.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ChartData {
    pub axis: DateAxis,
    pub datasets: Vec<Dataset>,
    pub stats: SummaryStats,
}

impl ChartData {
    pub fn from_records(records: &[crate::domain::ranking::RankingRecord], palette: &Palette) -> Self {
        let Aggregation { axis, combinations } = aggregate(records);
        let datasets = build_datasets(&axis, &combinations, palette);
        let stats = summarize(records);
        Self {
            axis,
            datasets,
            stats,
        }
    }
}
