use crate::config::Settings;
use crate::domain::filters::RankingFilters;
use crate::domain::ranking::RankingRecord;
use crate::domain::wire::{decode_records, Data, Envelope, SkuNames, WireRankingRecord};
use crate::source::{FetchError, RecordSource};
use anyhow::Context;
use serde::de::DeserializeOwned;
use std::time::Duration;

const HISTORY_PATH: &str = "/api/rankings/history";
const OPTIONS_PATH: &str = "/api/options";

/// Reads ranking history from the dashboard API. One attempt per call; callers decide what a
/// failure means.
#[derive(Debug, Clone)]
pub struct HttpRecordSource {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRecordSource {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let base_url = settings.require_api_base_url()?;
        Self::new(base_url, Duration::from_secs(settings.http_timeout_secs))
    }

    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build ranking api http client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, FetchError> {
        let url = self.url(path);
        let res = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|err| FetchError::Transport {
                detail: format!("GET {url}: {err}"),
            })?;

        let status = res.status();
        let text = res.text().await.map_err(|err| FetchError::Transport {
            detail: format!("failed to read response from {url}: {err}"),
        })?;

        decode_body(status.as_u16(), &text)
    }
}

/// Interprets a response body. Error envelopes win over the bare HTTP status because the API
/// puts its message there.
fn decode_body<T: DeserializeOwned>(status: u16, text: &str) -> Result<T, FetchError> {
    let parsed = serde_json::from_str::<Envelope<T>>(text);

    if !(200..300).contains(&status) {
        return Err(match parsed {
            Ok(Envelope::Error { message }) => FetchError::Backend { message },
            _ => FetchError::Status {
                status,
                body: text.to_string(),
            },
        });
    }

    match parsed {
        Ok(Envelope::Success(body)) => Ok(body),
        Ok(Envelope::Error { message }) => Err(FetchError::Backend { message }),
        Err(err) => Err(FetchError::Decode {
            detail: err.to_string(),
        }),
    }
}

#[async_trait::async_trait]
impl RecordSource for HttpRecordSource {
    fn source_name(&self) -> &'static str {
        "http"
    }

    async fn fetch_ranking_history(
        &self,
        filters: &RankingFilters,
    ) -> Result<Vec<RankingRecord>, FetchError> {
        let body: Data<Vec<WireRankingRecord>> =
            self.get(HISTORY_PATH, &filters.query_pairs()).await?;
        Ok(decode_records(body.data))
    }

    async fn fetch_filter_options(&self) -> Result<Vec<String>, FetchError> {
        let body: SkuNames = self.get(OPTIONS_PATH, &[]).await?;
        Ok(body.sku_names)
    }
}
