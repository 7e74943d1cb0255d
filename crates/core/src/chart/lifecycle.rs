use crate::chart::aggregate::DateAxis;
use crate::chart::dataset::Dataset;

/// A charting backend that can draw an axis + datasets onto its display target.
pub trait RenderSink {
    type Instance;

    fn create(&mut self, axis: &DateAxis, datasets: &[Dataset]) -> Self::Instance;

    /// Releases everything `instance` holds on the display target.
    fn destroy(&mut self, instance: Self::Instance);
}

/// Identifies the chart instance currently attached to the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChartHandle(u64);

impl ChartHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Sole owner of the live chart instance.
///
/// Each replacement destroys the previous instance before the sink creates the next one, so the
/// display target never holds two charts.
pub struct ChartLifecycleManager<S: RenderSink> {
    sink: S,
    live: Option<(ChartHandle, S::Instance)>,
    next_id: u64,
}

impl<S: RenderSink> ChartLifecycleManager<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            live: None,
            next_id: 1,
        }
    }

    pub fn replace(&mut self, axis: &DateAxis, datasets: &[Dataset]) -> ChartHandle {
        if let Some((old, instance)) = self.live.take() {
            tracing::trace!(chart = old.id(), "destroying chart instance");
            self.sink.destroy(instance);
        }

        let handle = ChartHandle(self.next_id);
        self.next_id += 1;

        let instance = self.sink.create(axis, datasets);
        tracing::debug!(
            chart = handle.id(),
            dates = axis.len(),
            datasets = datasets.len(),
            "chart instance created"
        );
        self.live = Some((handle, instance));
        handle
    }

    pub fn clear(&mut self) {
        if let Some((old, instance)) = self.live.take() {
            tracing::trace!(chart = old.id(), "destroying chart instance");
            self.sink.destroy(instance);
        }
    }

    pub fn live(&self) -> Option<ChartHandle> {
        self.live.as_ref().map(|(h, _)| *h)
    }

    pub fn instance(&self) -> Option<&S::Instance> {
        self.live.as_ref().map(|(_, i)| i)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: RenderSink> Drop for ChartLifecycleManager<S> {
    fn drop(&mut self) {
        self.clear();
    }
}
