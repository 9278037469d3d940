use clap::Parser;
use std::time::Duration;

/// Command-line / environment configuration.
#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "HTTP request metrics dashboard backend: polls a metrics source and serves aggregated views."
)]
pub struct DashboardArgs {
    /// Address the dashboard API listens on
    #[arg(long, env = "DASHBOARD_LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: String,

    /// URL returning a JSON array of request records; omit to use generated mock data
    #[arg(long, env = "DASHBOARD_SOURCE_URL")]
    pub source_url: Option<String>,

    /// Seconds between refresh cycles
    #[arg(
        long,
        env = "DASHBOARD_REFRESH_SECS",
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub refresh_interval_secs: u64,

    /// Timeout for a single fetch from the source
    #[arg(
        long,
        env = "DASHBOARD_REQUEST_TIMEOUT_SECS",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub request_timeout_secs: u64,

    /// Records per batch when serving mock data
    #[arg(long, default_value_t = 500)]
    pub mock_count: usize,

    /// Seed for the mock data generator
    #[arg(long, default_value_t = 42)]
    pub mock_seed: u64,

    /// Milliseconds between Server-Sent Events pushes
    #[arg(
        long,
        default_value_t = 1000,
        value_parser = clap::value_parser!(u64).range(50..)
    )]
    pub stream_interval_ms: u64,

    /// Leave the refresh controller stopped at startup
    #[arg(long)]
    pub no_autostart: bool,

    /// Enable debug logging
    #[arg(long, short)]
    pub verbose: bool,
}

impl DashboardArgs {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn stream_interval(&self) -> Duration {
        Duration::from_millis(self.stream_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_polling() {
        let args = DashboardArgs::try_parse_from(["request-dashboard"]).unwrap();

        assert_eq!(args.listen, "0.0.0.0:3000");
        assert_eq!(args.refresh_interval(), Duration::from_secs(5));
        assert_eq!(args.mock_count, 500);
        assert!(!args.no_autostart);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let parsed = DashboardArgs::try_parse_from(["request-dashboard", "--refresh-interval-secs", "0"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn source_url_from_flag() {
        let args = DashboardArgs::try_parse_from([
            "request-dashboard",
            "--source-url",
            "http://localhost:9000/metrics",
            "--no-autostart",
        ])
        .unwrap();

        assert_eq!(args.source_url.as_deref(), Some("http://localhost:9000/metrics"));
        assert!(args.no_autostart);
    }
}
