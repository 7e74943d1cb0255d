//! Filter-change handling: fetch, discard stale responses, re-render chart and stats.

pub mod generation;

use crate::chart::latest::distinct_keywords;
use crate::chart::{
    ChartData, ChartHandle, ChartLifecycleManager, Palette, RenderSink, StatsView, SummaryStats,
};
use crate::domain::filters::RankingFilters;
use crate::source::{FetchError, RecordSource};
use generation::RequestGeneration;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Surface showing the summary cards and fetch failures.
pub trait StatsDisplay {
    fn display_stats(&mut self, stats: &SummaryStats);

    /// Shows a visible failure message. Must leave the previously displayed stats in place.
    fn display_error(&mut self, error: &FetchError);
}

/// In-memory stats surface holding the last rendered view and the last failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsPanel {
    pub view: Option<StatsView>,
    pub error: Option<String>,
}

impl StatsDisplay for StatsPanel {
    fn display_stats(&mut self, stats: &SummaryStats) {
        self.view = Some(stats.view());
        self.error = None;
    }

    fn display_error(&mut self, error: &FetchError) {
        self.error = Some(error.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { chart: ChartHandle, records: usize },
    /// A newer request was issued while this one was in flight.
    Stale,
    Failed(FetchError),
}

struct View<R: RenderSink, D> {
    chart: ChartLifecycleManager<R>,
    stats: D,
}

pub struct Dashboard<S, R: RenderSink, D> {
    source: S,
    palette: Palette,
    generation: RequestGeneration,
    view: Mutex<View<R, D>>,
}

impl<S, R, D> Dashboard<S, R, D>
where
    S: RecordSource,
    R: RenderSink,
    D: StatsDisplay,
{
    pub fn new(source: S, sink: R, stats: D, palette: Palette) -> Self {
        Self {
            source,
            palette,
            generation: RequestGeneration::new(),
            view: Mutex::new(View {
                chart: ChartLifecycleManager::new(sink),
                stats,
            }),
        }
    }

    /// Re-derives chart and stats for `filters`.
    ///
    /// The request generation is taken when this is called, not when the future is first
    /// polled, so call order defines which response is current.
    pub fn refresh<'a>(
        &'a self,
        filters: &'a RankingFilters,
    ) -> impl Future<Output = RefreshOutcome> + 'a {
        let ticket = self.generation.issue();
        async move {
            tracing::debug!(
                request = ticket.value(),
                source = self.source.source_name(),
                product = ?filters.product,
                keyword = ?filters.keyword,
                days = ?filters.days,
                "fetching ranking history"
            );
            let result = self.source.fetch_ranking_history(filters).await;

            let mut view = self.lock_view();
            if !ticket.is_current() {
                tracing::debug!(request = ticket.value(), "discarding stale ranking response");
                return RefreshOutcome::Stale;
            }

            match result {
                Ok(records) => {
                    let data = ChartData::from_records(&records, &self.palette);
                    let chart = view.chart.replace(&data.axis, &data.datasets);
                    view.stats.display_stats(&data.stats);
                    tracing::info!(
                        request = ticket.value(),
                        records = records.len(),
                        dates = data.axis.len(),
                        datasets = data.datasets.len(),
                        "dashboard refreshed"
                    );
                    RefreshOutcome::Applied {
                        chart,
                        records: records.len(),
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        request = ticket.value(),
                        stage = err.stage(),
                        error = %err,
                        "ranking fetch failed"
                    );
                    view.stats.display_error(&err);
                    RefreshOutcome::Failed(err)
                }
            }
        }
    }

    pub async fn load_options(&self) -> Result<Vec<String>, FetchError> {
        self.source.fetch_filter_options().await
    }

    /// Keywords recorded for `product`, for the keyword selector.
    pub async fn keyword_options(&self, product: &str) -> Result<Vec<String>, FetchError> {
        let records = self
            .source
            .fetch_ranking_history(&RankingFilters::for_product(product))
            .await?;
        Ok(distinct_keywords(&records))
    }

    pub fn live_chart(&self) -> Option<ChartHandle> {
        self.lock_view().chart.live()
    }

    /// Runs `f` against the current chart manager and stats surface.
    pub fn inspect<T>(&self, f: impl FnOnce(&ChartLifecycleManager<R>, &D) -> T) -> T {
        let view = self.lock_view();
        f(&view.chart, &view.stats)
    }

    fn lock_view(&self) -> MutexGuard<'_, View<R, D>> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
