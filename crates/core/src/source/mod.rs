pub mod error;
pub mod file;
pub mod http;

use crate::domain::filters::RankingFilters;
use crate::domain::ranking::RankingRecord;
pub use error::FetchError;

#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// Ranking history matching `filters`, malformed rows already dropped.
    async fn fetch_ranking_history(
        &self,
        filters: &RankingFilters,
    ) -> Result<Vec<RankingRecord>, FetchError>;

    /// Distinct product names available for filtering.
    async fn fetch_filter_options(&self) -> Result<Vec<String>, FetchError>;
}
