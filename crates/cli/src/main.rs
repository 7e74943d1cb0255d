use anyhow::Context;
use clap::{Parser, Subcommand};
use rankwatch_core::chart::RenderSink;
use rankwatch_core::dashboard::{Dashboard, RefreshOutcome, StatsDisplay};
use rankwatch_core::domain::filters::{RankingFilters, PERIOD_CHOICES};
use rankwatch_core::source::http::HttpRecordSource;
use rankwatch_core::source::RecordSource;
use std::future::Future;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod render;

use render::{TerminalSink, TerminalStats};

#[derive(Debug, Parser)]
#[command(name = "rankwatch_cli")]
struct Args {
    /// Dashboard API base URL. Falls back to RANKWATCH_API_BASE_URL.
    #[arg(long)]
    api_base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the ranking chart and summary for a filter selection.
    Chart {
        #[arg(long)]
        product: Option<String>,

        #[arg(long)]
        keyword: Option<String>,

        /// Day window (7, 30, 90 or 365). The API defaults to 30.
        #[arg(long, value_parser = parse_period)]
        days: Option<u32>,

        /// Re-fetch every N seconds until interrupted.
        #[arg(long)]
        watch: Option<u64>,
    },

    /// List products that have ranking history.
    Options,

    /// List keywords recorded for a product.
    Keywords {
        #[arg(long)]
        product: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut settings = rankwatch_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    if let Some(url) = args.api_base_url {
        settings.api_base_url = Some(url);
    }

    let source = HttpRecordSource::from_settings(&settings)?;
    let dashboard = Dashboard::new(
        source,
        TerminalSink::new(std::io::stdout()),
        TerminalStats::default(),
        settings.palette()?,
    );

    let res = match args.command {
        Command::Chart {
            product,
            keyword,
            days,
            watch,
        } => {
            let filters = RankingFilters::new(product, keyword, days);
            match watch {
                Some(secs) => {
                    watch_chart(&dashboard, &filters, Duration::from_secs(secs), ctrl_c()).await
                }
                None => match dashboard.refresh(&filters).await {
                    RefreshOutcome::Failed(err) => Err(err.into()),
                    _ => Ok(()),
                },
            }
        }
        Command::Options => {
            for name in dashboard.load_options().await? {
                println!("{name}");
            }
            Ok(())
        }
        Command::Keywords { product } => {
            for keyword in dashboard.keyword_options(&product).await? {
                println!("{keyword}");
            }
            Ok(())
        }
    };

    if let Err(err) = &res {
        sentry_anyhow::capture_anyhow(err);
    }
    res
}

async fn watch_chart<S, R, D>(
    dashboard: &Dashboard<S, R, D>,
    filters: &RankingFilters,
    every: Duration,
    shutdown: impl Future<Output = anyhow::Result<()>>,
) -> anyhow::Result<()>
where
    S: RecordSource,
    R: RenderSink,
    D: StatsDisplay,
{
    anyhow::ensure!(!every.is_zero(), "--watch interval must be at least 1 second");
    let mut ticker = tokio::time::interval(every);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            res = &mut shutdown => return res,
        }

        println!("── {} ──", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
        tokio::select! {
            // Failures are already shown; keep the last chart and try again next tick.
            outcome = dashboard.refresh(filters) => {
                if let RefreshOutcome::Applied { chart, records } = outcome {
                    tracing::debug!(chart = chart.id(), records, "chart replaced");
                }
            }
            res = &mut shutdown => return res,
        }
    }
}

async fn ctrl_c() -> anyhow::Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")
}

fn parse_period(s: &str) -> Result<u32, String> {
    let days: u32 = s
        .parse()
        .map_err(|_| format!("days must be a number, got {s:?}"))?;
    if PERIOD_CHOICES.contains(&days) {
        Ok(days)
    } else {
        Err(format!("days must be one of {PERIOD_CHOICES:?}"))
    }
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
    use rankwatch_core::chart::Palette;
    use rankwatch_core::domain::ranking::RankingRecord;
    use rankwatch_core::source::FetchError;

    #[test]
    fn period_must_be_an_offered_choice() {
        assert_eq!(parse_period("30"), Ok(30));
        assert_eq!(parse_period("365"), Ok(365));
        assert!(parse_period("14").is_err());
        assert!(parse_period("month").is_err());
    }

    #[test]
    fn chart_arguments_parse() {
        let args = Args::try_parse_from([
            "rankwatch_cli",
            "--api-base-url",
            "http://localhost:3000",
            "chart",
            "--product",
            "P1",
            "--days",
            "7",
        ])
        .unwrap();

        assert_eq!(args.api_base_url.as_deref(), Some("http://localhost:3000"));
        match args.command {
            Command::Chart { product, keyword, days, watch } => {
                assert_eq!(product.as_deref(), Some("P1"));
                assert_eq!(keyword, None);
                assert_eq!(days, Some(7));
                assert_eq!(watch, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    struct StalledSource;

    #[async_trait::async_trait]
    impl RecordSource for StalledSource {
        fn source_name(&self) -> &'static str {
            "stalled"
        }

        async fn fetch_ranking_history(
            &self,
            _filters: &RankingFilters,
        ) -> Result<Vec<RankingRecord>, FetchError> {
            std::future::pending().await
        }

        async fn fetch_filter_options(&self) -> Result<Vec<String>, FetchError> {
            std::future::pending().await
        }
    }

    fn stalled_dashboard() -> Dashboard<StalledSource, TerminalSink<Vec<u8>>, TerminalStats> {
        Dashboard::new(
            StalledSource,
            TerminalSink::new(Vec::new()),
            TerminalStats::default(),
            Palette::default(),
        )
    }

    #[tokio::test]
    async fn watch_stops_while_a_refresh_is_in_flight() {
        let dashboard = stalled_dashboard();
        let shutdown = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(())
        };

        let res = tokio::time::timeout(
            Duration::from_secs(5),
            watch_chart(&dashboard, &RankingFilters::default(), Duration::from_secs(1), shutdown),
        )
        .await;
        assert!(matches!(res, Ok(Ok(()))), "watch did not stop: {res:?}");
        assert!(dashboard.live_chart().is_none());
    }

    #[tokio::test]
    async fn watch_rejects_zero_interval() {
        let dashboard = stalled_dashboard();
        let res = watch_chart(
            &dashboard,
            &RankingFilters::default(),
            Duration::ZERO,
            std::future::pending(),
        )
        .await;
        assert!(res.is_err());
    }
}
