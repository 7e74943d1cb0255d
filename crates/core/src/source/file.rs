use crate::chart::latest::{sorted_keywords, sorted_products};
use crate::domain::filters::RankingFilters;
use crate::domain::ranking::RankingRecord;
use crate::domain::wire::{decode_records, SkuNames, WireRankingRecord};
use crate::source::{FetchError, RecordSource};
use crate::time::local_date::today_at_offset;
use anyhow::Context;
use chrono::NaiveDate;
use std::path::PathBuf;

/// Read-only ranking export: a JSON array of wire records, re-read on every fetch so an external
/// writer's updates show up without a restart.
#[derive(Debug, Clone)]
pub struct FileRecordStore {
    path: PathBuf,
    tz_offset_hours: i32,
    fixed_today: Option<NaiveDate>,
}

impl FileRecordStore {
    pub fn new(path: impl Into<PathBuf>, tz_offset_hours: i32) -> Self {
        Self {
            path: path.into(),
            tz_offset_hours,
            fixed_today: None,
        }
    }

    /// Pins "today" for day-window filtering.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.fixed_today = Some(today);
        self
    }

    pub fn today(&self) -> anyhow::Result<NaiveDate> {
        match self.fixed_today {
            Some(d) => Ok(d),
            None => today_at_offset(chrono::Utc::now(), self.tz_offset_hours),
        }
    }

    /// All usable records, ordered by date. Records sharing a date keep their file order.
    pub async fn load_all(&self) -> anyhow::Result<Vec<RankingRecord>> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read ranking export {}", self.path.display()))?;
        parse_export(&text)
            .with_context(|| format!("invalid ranking export {}", self.path.display()))
    }

    /// Sorted product and keyword lists for the filter selectors.
    pub async fn options(&self) -> anyhow::Result<SkuNames> {
        let records = self.load_all().await?;
        Ok(SkuNames {
            sku_names: sorted_products(&records),
            keywords: sorted_keywords(&records),
        })
    }

    pub async fn load_filtered(&self, filters: &RankingFilters) -> anyhow::Result<Vec<RankingRecord>> {
        let today = self.today()?;
        let mut records = self.load_all().await?;
        records.retain(|r| filters.matches(r, today));
        Ok(records)
    }
}

pub fn parse_export(text: &str) -> anyhow::Result<Vec<RankingRecord>> {
    let rows = serde_json::from_str::<Vec<WireRankingRecord>>(text)
        .context("ranking export must be a JSON array of ranking rows")?;
    let mut records = decode_records(rows);
    records.sort_by_key(|r| r.date);
    Ok(records)
}

#[async_trait::async_trait]
impl RecordSource for FileRecordStore {
    fn source_name(&self) -> &'static str {
        "file"
    }

    async fn fetch_ranking_history(
        &self,
        filters: &RankingFilters,
    ) -> Result<Vec<RankingRecord>, FetchError> {
        self.load_filtered(filters)
            .await
            .map_err(|err| FetchError::Backend {
                message: format!("{err:#}"),
            })
    }

    async fn fetch_filter_options(&self) -> Result<Vec<String>, FetchError> {
        let options = self.options().await.map_err(|err| FetchError::Backend {
            message: format!("{err:#}"),
        })?;
        Ok(options.sku_names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ranking::Rank;
    use serde_json::json;

    fn export() -> String {
        json!([
            {"日付": "2024-01-03", "SKU名": "P1", "キーワード": "K1", "Amazon順位": 4, "楽天順位": 999},
            {"日付": "2024-01-01", "SKU名": "P2", "キーワード": "K1", "Amazon順位": 9, "楽天順位": 2},
            {"日付": "2024-01-01", "SKU名": "P1", "キーワード": "K2", "Amazon順位": "圏外", "楽天順位": "6"},
            {"SKU名": "P1", "キーワード": "K1", "Amazon順位": 1}
        ])
        .to_string()
    }

    fn temp_export(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "rankwatch-{}-{name}.json",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn parse_orders_by_date_and_drops_malformed_rows() {
        let records = parse_export(&export()).unwrap();
        assert_eq!(records.len(), 3);
        let order: Vec<(&str, &str)> = records
            .iter()
            .map(|r| (r.product_name.as_str(), r.keyword.as_str()))
            .collect();
        assert_eq!(order, vec![("P2", "K1"), ("P1", "K2"), ("P1", "K1")]);
        assert_eq!(records[1].amazon_rank, None);
        assert_eq!(records[1].rakuten_rank, Rank::new(6));
        assert_eq!(records[2].rakuten_rank, None);
    }

    #[test]
    fn parse_rejects_non_array_exports() {
        assert!(parse_export(r#"{"data": []}"#).is_err());
    }

    #[tokio::test]
    async fn fetch_applies_filters_against_pinned_today() {
        let path = temp_export("filters", &export());
        let store = FileRecordStore::new(&path, 9)
            .with_today(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());

        let filters = RankingFilters::new(Some("P1".to_string()), None, Some(1));
        let records = store.fetch_ranking_history(&filters).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].keyword, "K1");

        let options = store.fetch_filter_options().await.unwrap();
        assert_eq!(options, vec!["P1", "P2"]);

        let both = store.options().await.unwrap();
        assert_eq!(both.sku_names, vec!["P1", "P2"]);
        assert_eq!(both.keywords, vec!["K1", "K2"]);

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn missing_export_is_a_backend_failure() {
        let store = FileRecordStore::new("/nonexistent/rankwatch/rankings.json", 9);
        let err = store
            .fetch_ranking_history(&RankingFilters::default())
            .await
            .unwrap_err();
        assert_eq!(err.stage(), "backend");
    }
}
