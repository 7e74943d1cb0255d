pub mod chart;
pub mod dashboard;
pub mod domain;
pub mod source;
pub mod time;

pub mod config {
    use crate::chart::Palette;
    use crate::time::local_date::DEFAULT_OFFSET_HOURS;
    use anyhow::Context;

    const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub api_base_url: Option<String>,
        pub rankings_path: Option<String>,
        pub chart_palette: Option<String>,
        pub tz_offset_hours: i32,
        pub http_timeout_secs: u64,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let tz_offset_hours = parse_var(
                "RANKWATCH_TZ_OFFSET_HOURS",
                std::env::var("RANKWATCH_TZ_OFFSET_HOURS").ok(),
                DEFAULT_OFFSET_HOURS,
            )?;
            anyhow::ensure!(
                (-23..=23).contains(&tz_offset_hours),
                "RANKWATCH_TZ_OFFSET_HOURS must be within -23..=23 (got {tz_offset_hours})"
            );

            let http_timeout_secs = parse_var(
                "RANKWATCH_HTTP_TIMEOUT_SECS",
                std::env::var("RANKWATCH_HTTP_TIMEOUT_SECS").ok(),
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?;
            anyhow::ensure!(
                http_timeout_secs > 0,
                "RANKWATCH_HTTP_TIMEOUT_SECS must be positive"
            );

            Ok(Self {
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                api_base_url: std::env::var("RANKWATCH_API_BASE_URL").ok(),
                rankings_path: std::env::var("RANKINGS_PATH").ok(),
                chart_palette: std::env::var("CHART_PALETTE")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                tz_offset_hours,
                http_timeout_secs,
            })
        }

        pub fn require_api_base_url(&self) -> anyhow::Result<&str> {
            self.api_base_url
                .as_deref()
                .context("RANKWATCH_API_BASE_URL is required")
        }

        pub fn require_rankings_path(&self) -> anyhow::Result<&str> {
            self.rankings_path
                .as_deref()
                .context("RANKINGS_PATH is required")
        }

        /// Configured palette, or the default five-color cycle.
        pub fn palette(&self) -> anyhow::Result<Palette> {
            match self.chart_palette.as_deref() {
                Some(s) => Palette::parse(s).context("invalid CHART_PALETTE"),
                None => Ok(Palette::default()),
            }
        }
    }

    /// Parses an optional numeric variable; unset or blank falls back to `default`.
    fn parse_var<T>(name: &str, raw: Option<String>, default: T) -> anyhow::Result<T>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(default),
            Some(s) => s
                .parse::<T>()
                .with_context(|| format!("{name} must be a number (got {s:?})")),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn settings() -> Settings {
            Settings {
                sentry_dsn: None,
                api_base_url: None,
                rankings_path: None,
                chart_palette: None,
                tz_offset_hours: DEFAULT_OFFSET_HOURS,
                http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            }
        }

        #[test]
        fn missing_required_values_name_the_variable() {
            let s = settings();
            let err = s.require_api_base_url().unwrap_err();
            assert!(err.to_string().contains("RANKWATCH_API_BASE_URL"));
            assert!(s.require_rankings_path().is_err());
        }

        #[test]
        fn numeric_variables_fail_loudly_on_bad_values() {
            let err = parse_var::<u64>("RANKWATCH_HTTP_TIMEOUT_SECS", Some("soon".to_string()), 30)
                .unwrap_err();
            assert!(err.to_string().contains("RANKWATCH_HTTP_TIMEOUT_SECS"));
            assert!(parse_var::<i32>("RANKWATCH_TZ_OFFSET_HOURS", Some("+9h".to_string()), 9).is_err());

            assert_eq!(parse_var::<u64>("X", None, 30).unwrap(), 30);
            assert_eq!(parse_var::<u64>("X", Some(" ".to_string()), 30).unwrap(), 30);
            assert_eq!(parse_var::<u64>("X", Some(" 5 ".to_string()), 30).unwrap(), 5);
            assert_eq!(parse_var::<i32>("X", Some("-5".to_string()), 9).unwrap(), -5);
        }

        #[test]
        fn palette_defaults_and_overrides() {
            let mut s = settings();
            assert_eq!(s.palette().unwrap(), Palette::default());

            s.chart_palette = Some("#112233,#445566".to_string());
            assert_eq!(s.palette().unwrap().len(), 2);

            s.chart_palette = Some("not-a-color".to_string());
            assert!(s.palette().is_err());
        }
    }
}
