use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use snafu::{ensure, Location, ResultExt, Snafu};
use url::Url;

use crate::model::CreditLabel;
use crate::session::{
    Eligibility, Timing, DEFAULT_FALLBACK_DURATION, DEFAULT_PROBE_INTERVAL,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_THRESHOLD,
};

/// Prefix of every environment variable read by [Config::from_env].
pub const ENV_PREFIX: &str = "PAYUP_";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("could not read the configuration from the environment: {source}"))]
    Load {
        source: envy::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("watch threshold must be within (0, 1], got {threshold}"))]
    InvalidThreshold {
        threshold: f64,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("{name} must be a positive duration"))]
    InvalidDuration {
        name: &'static str,
        #[snafu(implicit)]
        location: Location,
    },
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(rename = "report_endpoint", default = "default_endpoint")]
    pub endpoint: Url,
    #[serde(default)]
    pub credit_label: CreditLabel,

    #[serde(default = "default_probe_interval", deserialize_with = "human_duration")]
    pub probe_interval: Duration,
    #[serde(default = "default_request_timeout", deserialize_with = "human_duration")]
    pub request_timeout: Duration,

    #[serde(rename = "watch_threshold", default = "default_threshold")]
    pub threshold: f64,
    /// Seconds assumed when the player never reports a duration.
    #[serde(default = "default_fallback_duration")]
    pub fallback_duration: f64,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        envy::prefixed(ENV_PREFIX)
            .from_env::<Config>()
            .context(LoadSnafu)?
            .validate()
    }

    pub fn from_vars<I>(vars: I) -> Result<Config, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(ENV_PREFIX)
            .from_iter::<_, Config>(vars)
            .context(LoadSnafu)?
            .validate()
    }

    fn validate(self) -> Result<Config, ConfigError> {
        ensure!(
            self.threshold > 0.0 && self.threshold <= 1.0,
            InvalidThresholdSnafu {
                threshold: self.threshold
            }
        );
        ensure!(
            self.fallback_duration.is_finite() && self.fallback_duration > 0.0,
            InvalidDurationSnafu {
                name: "fallback duration"
            }
        );
        ensure!(
            !self.probe_interval.is_zero(),
            InvalidDurationSnafu {
                name: "probe interval"
            }
        );
        ensure!(
            !self.request_timeout.is_zero(),
            InvalidDurationSnafu {
                name: "request timeout"
            }
        );

        Ok(self)
    }

    pub fn eligibility(&self) -> Eligibility {
        Eligibility::new(self.threshold, self.fallback_duration)
    }

    pub fn timing(&self) -> Timing {
        Timing::new(self.probe_interval, self.request_timeout)
    }
}

fn human_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    humantime::parse_duration(&text).map_err(serde::de::Error::custom)
}

fn default_endpoint() -> Url {
    Url::parse("http://127.0.0.1:5000/api/report_watch").expect("default endpoint is a valid url")
}

fn default_probe_interval() -> Duration {
    DEFAULT_PROBE_INTERVAL
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_fallback_duration() -> f64 {
    DEFAULT_FALLBACK_DURATION
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn defaults_without_any_variable() {
        let config = Config::from_vars(vars(&[])).unwrap();

        assert_eq!(
            config.endpoint.as_str(),
            "http://127.0.0.1:5000/api/report_watch"
        );
        assert_eq!(config.credit_label, CreditLabel::default());
        assert_eq!(config.timing(), Timing::default());
        assert_eq!(config.eligibility(), Eligibility::default());
        assert_eq!(config.log_dir, PathBuf::from("logs"));
    }

    #[test]
    fn reads_prefixed_variables() {
        let config = Config::from_vars(vars(&[
            ("PAYUP_REPORT_ENDPOINT", "https://payup.example/api/report_watch"),
            ("PAYUP_CREDIT_LABEL", "0.05"),
            ("PAYUP_PROBE_INTERVAL", "2s 500ms"),
            ("PAYUP_REQUEST_TIMEOUT", "1m"),
            ("PAYUP_WATCH_THRESHOLD", "0.9"),
            ("PAYUP_FALLBACK_DURATION", "45"),
            ("REPORT_ENDPOINT", "http://ignored.example"),
        ]))
        .unwrap();

        assert_eq!(config.endpoint.host_str(), Some("payup.example"));
        assert_eq!(config.credit_label.to_string(), "0.05");
        assert_eq!(
            config.timing(),
            Timing::new(Duration::from_millis(2500), Duration::from_secs(60))
        );
        assert_eq!(config.eligibility(), Eligibility::new(0.9, 45.0));
    }

    #[test]
    fn rejects_threshold_above_one() {
        let result = Config::from_vars(vars(&[("PAYUP_WATCH_THRESHOLD", "80")]));
        assert!(matches!(result, Err(ConfigError::InvalidThreshold { .. })));
    }

    #[test]
    fn rejects_zero_threshold() {
        let result = Config::from_vars(vars(&[("PAYUP_WATCH_THRESHOLD", "0")]));
        assert!(matches!(result, Err(ConfigError::InvalidThreshold { .. })));
    }

    #[test]
    fn rejects_non_positive_fallback_duration() {
        for fallback in ["0", "-5", "inf"] {
            let result = Config::from_vars(vars(&[("PAYUP_FALLBACK_DURATION", fallback)]));
            assert!(
                matches!(
                    result,
                    Err(ConfigError::InvalidDuration {
                        name: "fallback duration",
                        ..
                    })
                ),
                "fallback duration {fallback} was accepted"
            );
        }
    }

    #[test]
    fn rejects_zero_request_timeout() {
        let result = Config::from_vars(vars(&[("PAYUP_REQUEST_TIMEOUT", "0s")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidDuration {
                name: "request timeout",
                ..
            })
        ));
    }

    #[test]
    fn rejects_zero_probe_interval() {
        let result = Config::from_vars(vars(&[("PAYUP_PROBE_INTERVAL", "0s")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidDuration {
                name: "probe interval",
                ..
            })
        ));
    }

    #[test]
    fn rejects_unparsable_duration() {
        let result = Config::from_vars(vars(&[("PAYUP_REQUEST_TIMEOUT", "soon")]));
        assert!(matches!(result, Err(ConfigError::Load { .. })));
    }
}
