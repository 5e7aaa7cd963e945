//! Exporter configuration.
//!
//! There is no config file: the daemon fills an `ExporterConfig` from its
//! command-line flags and calls [`ExporterConfig::validate`] before
//! starting anything.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_API_BASE_URL: &str = "https://coremud.org/api";

/// One step of a scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollStep {
    /// Fetch `/stocks` and publish commodity gauges.
    Market,
    /// Fetch the armour shop index and publish the shop count.
    ArmourShops,
    /// Fetch every armour shop and publish inventory quantities.
    ArmourInventory,
}

impl PollStep {
    pub const ALL: [PollStep; 3] = [
        PollStep::Market,
        PollStep::ArmourShops,
        PollStep::ArmourInventory,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PollStep::Market => "market",
            PollStep::ArmourShops => "armour-shops",
            PollStep::ArmourInventory => "armour-inventory",
        }
    }
}

impl fmt::Display for PollStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PollStep {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PollStep::ALL
            .into_iter()
            .find(|step| step.as_str() == s.trim())
            .ok_or_else(|| ConfigError::UnknownStep(s.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// Root of the upstream API, e.g. `https://coremud.org/api`.
    pub api_base_url: String,
    /// Scheduler tick period.
    pub poll_interval: Duration,
    /// Per-request transport timeout.
    pub request_timeout: Duration,
    /// Minimum time between two shop collections triggered by scrapes.
    pub shop_min_interval: Duration,
    /// Whether `/metrics` runs the shop collector.
    pub shop_collector: bool,
    /// Steps run on every scheduler tick, in order.
    pub steps: Vec<PollStep>,
    /// Main listener (health, banner, and metrics unless split).
    pub listen: SocketAddr,
    /// Dedicated metrics listener.
    pub metrics_listen: Option<SocketAddr>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            poll_interval: Duration::from_secs(60),
            request_timeout: Duration::from_secs(10),
            shop_min_interval: Duration::from_secs(60 * 60),
            shop_collector: true,
            steps: PollStep::ALL.to_vec(),
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
            metrics_listen: None,
        }
    }
}

impl ExporterConfig {
    /// Default config pointed at another upstream (used by tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Reject configurations the daemon cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.api_base_url.trim();
        if !base.starts_with("http://") && !base.starts_with("https://") {
            return Err(ConfigError::BaseUrl(self.api_base_url.clone()));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("poll interval"));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroInterval("request timeout"));
        }
        if self.steps.is_empty() && !self.shop_collector {
            return Err(ConfigError::NoWork);
        }
        // Port 0 asks the OS for a fresh port each time, so it never collides.
        if self.listen.port() != 0 && self.metrics_listen == Some(self.listen) {
            return Err(ConfigError::ListenerCollision(self.listen));
        }
        Ok(())
    }
}

/// Parse a duration string like "5s", "500ms", "2m", "1h".
///
/// A bare number is read as seconds.
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let s = s.trim();
    let bad = || ConfigError::Duration(s.to_string());

    if let Some(ms) = s.strip_suffix("ms") {
        return ms.parse::<u64>().map(Duration::from_millis).map_err(|_| bad());
    }

    let (digits, unit_secs) = if let Some(secs) = s.strip_suffix('s') {
        (secs, 1)
    } else if let Some(mins) = s.strip_suffix('m') {
        (mins, 60)
    } else if let Some(hours) = s.strip_suffix('h') {
        (hours, 3600)
    } else {
        (s, 1)
    };

    digits
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(unit_secs))
        .map(Duration::from_secs)
        .ok_or_else(bad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ExporterConfig::default();
        config.validate().unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.shop_min_interval, Duration::from_secs(3600));
        assert_eq!(config.steps, PollStep::ALL.to_vec());
    }

    #[test]
    fn rejects_non_http_base_url() {
        let config = ExporterConfig::with_base_url("ftp://coremud.org");
        assert!(matches!(config.validate(), Err(ConfigError::BaseUrl(_))));
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let config = ExporterConfig {
            poll_interval: Duration::ZERO,
            ..ExporterConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroInterval("poll interval"))
        ));
    }

    #[test]
    fn rejects_config_with_nothing_to_do() {
        let config = ExporterConfig {
            steps: Vec::new(),
            shop_collector: false,
            ..ExporterConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoWork)));

        // The shop collector alone is enough.
        let config = ExporterConfig {
            steps: Vec::new(),
            ..ExporterConfig::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn rejects_same_listener_twice() {
        let config = ExporterConfig {
            metrics_listen: Some(SocketAddr::from(([0, 0, 0, 0], 8080))),
            ..ExporterConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ListenerCollision(_))
        ));

        let ephemeral = SocketAddr::from(([127, 0, 0, 1], 0));
        let config = ExporterConfig {
            listen: ephemeral,
            metrics_listen: Some(ephemeral),
            ..ExporterConfig::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn poll_step_round_trips_names() {
        for step in PollStep::ALL {
            assert_eq!(step.as_str().parse::<PollStep>().unwrap(), step);
        }
        assert!(matches!(
            "shops".parse::<PollStep>(),
            Err(ConfigError::UnknownStep(_))
        ));
    }

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("10").unwrap(), Duration::from_secs(10));
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn parse_duration_rejects_overflow() {
        assert!(matches!(
            parse_duration("9999999999999999h"),
            Err(ConfigError::Duration(_))
        ));
        assert!(matches!(
            parse_duration("999999999999999999m"),
            Err(ConfigError::Duration(_))
        ));
        assert_eq!(
            parse_duration(&format!("{}s", u64::MAX)).unwrap(),
            Duration::from_secs(u64::MAX)
        );
    }
}
