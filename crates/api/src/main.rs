use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rankwatch_core::chart::latest::{latest_rankings, LatestRanking};
use rankwatch_core::chart::{ChartData, Palette, StatsView, SummaryStats};
use rankwatch_core::domain::filters::RankingFilters;
use rankwatch_core::domain::wire::{encode_records, Data, Envelope, SkuNames, WireRankingRecord};
use rankwatch_core::source::file::FileRecordStore;

mod chartjs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = rankwatch_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let palette = settings.palette()?;
    let store = match settings.require_rankings_path() {
        Ok(path) => {
            tracing::info!(
                path,
                tz_offset_hours = settings.tz_offset_hours,
                "serving ranking export"
            );
            Some(FileRecordStore::new(path, settings.tz_offset_hours))
        }
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "RANKINGS_PATH missing; starting API in degraded mode");
            None
        }
    };

    let state = AppState { store, palette };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/options", get(get_options))
        .route("/api/rankings/history", get(get_ranking_history))
        .route("/api/rankings/latest", get(get_latest_rankings))
        .route("/api/rankings/chart", get(get_ranking_chart))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Clone)]
struct AppState {
    store: Option<FileRecordStore>,
    palette: Palette,
}

type ApiResult<T> = Result<Json<Envelope<T>>, (StatusCode, Json<Envelope<T>>)>;

fn success<T>(body: T) -> ApiResult<T> {
    Ok(Json(Envelope::Success(body)))
}

fn failure<T>(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Envelope<T>>) {
    (
        status,
        Json(Envelope::Error {
            message: message.into(),
        }),
    )
}

fn internal<T>(err: anyhow::Error) -> (StatusCode, Json<Envelope<T>>) {
    sentry_anyhow::capture_anyhow(&err);
    tracing::error!(error = %err, "ranking request failed");
    failure(StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}"))
}

fn store<T>(state: &AppState) -> Result<&FileRecordStore, (StatusCode, Json<Envelope<T>>)> {
    state
        .store
        .as_ref()
        .ok_or_else(|| failure(StatusCode::SERVICE_UNAVAILABLE, "ranking export is not configured"))
}

#[derive(Debug, Default, Deserialize)]
struct HistoryQuery {
    sku_name: Option<String>,
    keyword: Option<String>,
    days: Option<String>,
}

impl HistoryQuery {
    fn into_filters(self) -> Result<RankingFilters, String> {
        let days = match self.days.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) => match s.parse::<u32>() {
                Ok(n) if n > 0 => Some(n),
                _ => return Err(format!("days must be a positive integer (got {s:?})")),
            },
        };
        Ok(RankingFilters::new(self.sku_name, self.keyword, days))
    }
}

async fn get_options(State(state): State<AppState>) -> ApiResult<SkuNames> {
    let store = store(&state)?;
    let options = store.options().await.map_err(internal)?;
    success(options)
}

async fn get_ranking_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Data<Vec<WireRankingRecord>>> {
    let store = store(&state)?;
    let filters = query
        .into_filters()
        .map_err(|msg| failure(StatusCode::BAD_REQUEST, msg))?;

    let records = store.load_filtered(&filters).await.map_err(internal)?;
    success(Data {
        data: encode_records(&records),
    })
}

#[derive(Debug, Deserialize)]
struct LatestQuery {
    sku_name: Option<String>,
}

async fn get_latest_rankings(
    State(state): State<AppState>,
    Query(query): Query<LatestQuery>,
) -> ApiResult<Data<Vec<LatestRanking>>> {
    let store = store(&state)?;
    let filters = RankingFilters::new(query.sku_name, None, None);

    // Latest values look at the whole history, not the default day window.
    let today = store.today().map_err(internal)?;
    let mut records = store.load_all().await.map_err(internal)?;
    records.retain(|r| {
        r.date <= today
            && filters
                .product
                .as_deref()
                .map_or(true, |p| r.product_name == p)
    });

    success(Data {
        data: latest_rankings(&records),
    })
}

#[derive(Debug, Serialize)]
struct ChartPayload {
    chart: chartjs::ChartConfig,
    stats: SummaryStats,
    stats_view: StatsView,
}

async fn get_ranking_chart(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Data<ChartPayload>> {
    let store = store(&state)?;
    let filters = query
        .into_filters()
        .map_err(|msg| failure(StatusCode::BAD_REQUEST, msg))?;

    let records = store.load_filtered(&filters).await.map_err(internal)?;
    let data = ChartData::from_records(&records, &state.palette);

    success(Data {
        data: ChartPayload {
            chart: chartjs::line_chart(&data.axis, &data.datasets),
            stats_view: data.stats.view(),
            stats: data.stats,
        },
    })
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &rankwatch_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rankwatch_core::domain::ranking::{Rank, RankingRecord};

    #[test]
    fn blank_query_values_mean_all() {
        let q = HistoryQuery {
            sku_name: Some(String::new()),
            keyword: None,
            days: Some(" ".to_string()),
        };
        let f = q.into_filters().unwrap();
        assert_eq!(f, RankingFilters::default());
        assert_eq!(f.days_or_default(), 30);
    }

    #[test]
    fn rejects_non_positive_or_textual_days() {
        for bad in ["0", "-7", "week"] {
            let q = HistoryQuery {
                days: Some(bad.to_string()),
                ..Default::default()
            };
            assert!(q.into_filters().is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn oversized_day_window_covers_whole_history() {
        let q = HistoryQuery {
            days: Some("100000000".to_string()),
            ..Default::default()
        };
        let f = q.into_filters().unwrap();
        let record = RankingRecord {
            date: NaiveDate::from_ymd_opt(1999, 12, 31).unwrap(),
            product_name: "P1".to_string(),
            keyword: "K1".to_string(),
            amazon_rank: Rank::new(3),
            rakuten_rank: None,
        };
        assert!(f.matches(&record, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()));
    }

    #[test]
    fn parses_period_selection() {
        let q = HistoryQuery {
            sku_name: Some("P1".to_string()),
            keyword: Some("K1".to_string()),
            days: Some("90".to_string()),
        };
        let f = q.into_filters().unwrap();
        assert_eq!(f.product.as_deref(), Some("P1"));
        assert_eq!(f.keyword.as_deref(), Some("K1"));
        assert_eq!(f.days, Some(90));
    }
}
