//! Receiver configuration structures.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::controller::Schedule;
use crate::probe::MAX_COUNT;

use super::metrics::MetricsConfig;
use super::target::TargetConfig;
use super::validation::{ConfigError, expand_env_vars};

/// Default collection interval (60 seconds).
pub const DEFAULT_COLLECTION_INTERVAL: Duration = Duration::from_secs(60);

/// Top-level configuration of the ping receiver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiverConfig {
    /// Time between collection cycles (default: 60s, minimum: 1s).
    #[serde(default, with = "humantime_serde")]
    pub collection_interval: Option<Duration>,

    /// Cron expression (6-field) used instead of `collection_interval`.
    #[serde(default)]
    pub cron: Option<String>,

    /// Deadline for a whole cycle; unset means probes are bounded only by
    /// their own timeouts.
    #[serde(default, with = "humantime_serde")]
    pub collection_timeout: Option<Duration>,

    /// Privileged mode for raw ICMP sockets.
    #[serde(default)]
    pub privileged: bool,

    /// Targets to ping.
    #[serde(default)]
    pub targets: Vec<TargetConfig>,

    /// Per-metric enable switches.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl ReceiverConfig {
    /// Load configuration from a YAML file.
    ///
    /// `${VAR}` and `${VAR:-default}` references are expanded before parsing.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(&expand_env_vars(content))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the targets.
    pub fn with_targets(mut self, targets: Vec<TargetConfig>) -> Self {
        self.targets = targets;
        self
    }

    /// Set privileged mode.
    pub fn with_privileged(mut self, privileged: bool) -> Self {
        self.privileged = privileged;
        self
    }

    /// Set the metric switches.
    pub fn with_metrics(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = metrics;
        self
    }

    /// Validate configuration values.
    ///
    /// Every problem is reported, not just the first one.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` listing all invalid fields.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.targets.is_empty() {
            problems.push("at least one target must be specified".to_string());
        }

        let mut seen_endpoints = HashSet::new();
        for (i, target) in self.targets.iter().enumerate() {
            if target.endpoint.trim().is_empty() {
                problems.push(format!("targets[{i}]: endpoint cannot be empty"));
            } else if !seen_endpoints.insert(target.endpoint.as_str()) {
                problems.push(format!(
                    "targets[{i}]: duplicate endpoint '{}'",
                    target.endpoint
                ));
            }
            if target.count < 0 {
                problems.push(format!("targets[{i}]: count cannot be negative"));
            } else if target.count as usize > MAX_COUNT {
                problems.push(format!("targets[{i}]: count cannot exceed {MAX_COUNT}"));
            }
        }

        if self.collection_interval.is_some() && self.cron.is_some() {
            problems.push("cannot specify both collection_interval and cron".to_string());
        }
        if let Some(ref expr) = self.cron
            && let Err(e) = Schedule::cron(expr)
        {
            problems.push(e.to_string());
        }

        ConfigError::from_problems(problems)
    }

    /// Schedule derived from `cron` or `collection_interval`.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` for an invalid cron expression.
    pub fn schedule(&self) -> Result<Schedule, ConfigError> {
        match self.cron {
            Some(ref expr) => {
                Schedule::cron(expr).map_err(|e| ConfigError::ValidationError(e.to_string()))
            }
            None => Ok(Schedule::interval(
                self.collection_interval
                    .unwrap_or(DEFAULT_COLLECTION_INTERVAL),
            )),
        }
    }

    /// Cycle deadline, if one is configured. A zero timeout counts as unset.
    pub fn cycle_timeout(&self) -> Option<Duration> {
        self.collection_timeout.filter(|t| !t.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricName;

    fn valid_config() -> ReceiverConfig {
        ReceiverConfig::default().with_targets(vec![
            TargetConfig::new("google.com")
                .with_count(4)
                .with_timeout(Duration::from_secs(5))
                .with_interval(Duration::from_secs(1)),
        ])
    }

    #[test]
    fn test_default_config() {
        let config = ReceiverConfig::default();
        assert!(config.targets.is_empty());
        assert!(!config.privileged);
        assert!(config.metrics.is_enabled(MetricName::PingErrors));
        match config.schedule().unwrap() {
            Schedule::Interval(d) => assert_eq!(d, DEFAULT_COLLECTION_INTERVAL),
            other => panic!("expected Interval, got {other:?}"),
        }
    }

    #[test]
    fn test_config_validation_valid() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_no_targets() {
        let err = ReceiverConfig::default().validate().unwrap_err();
        assert!(
            err.to_string()
                .contains("at least one target must be specified")
        );
    }

    #[test]
    fn test_config_validation_empty_endpoint() {
        let config = ReceiverConfig::default().with_targets(vec![TargetConfig::new("")]);
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "config validation error: targets[0]: endpoint cannot be empty"
        );
    }

    #[test]
    fn test_config_validation_negative_count() {
        let config =
            ReceiverConfig::default().with_targets(vec![TargetConfig::new("google.com").with_count(-1)]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("targets[0]: count cannot be negative"));
    }

    #[test]
    fn test_config_validation_count_too_large() {
        let config = ReceiverConfig::default()
            .with_targets(vec![TargetConfig::new("google.com").with_count(70_000)]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("targets[0]: count cannot exceed 65535"));

        let config = ReceiverConfig::default()
            .with_targets(vec![TargetConfig::new("google.com").with_count(65_535)]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_count_allowed() {
        let config =
            ReceiverConfig::default().with_targets(vec![TargetConfig::new("google.com").with_count(0)]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_multiple_errors() {
        let config = ReceiverConfig::default().with_targets(vec![TargetConfig::new("").with_count(-1)]);
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "config validation error: targets[0]: endpoint cannot be empty; \
             targets[0]: count cannot be negative"
        );
    }

    #[test]
    fn test_config_validation_duplicate_endpoint() {
        let config = ReceiverConfig::default().with_targets(vec![
            TargetConfig::new("1.1.1.1"),
            TargetConfig::new("8.8.8.8"),
            TargetConfig::new("1.1.1.1"),
        ]);
        let err = config.validate().unwrap_err();
        assert!(
            err.to_string()
                .contains("targets[2]: duplicate endpoint '1.1.1.1'")
        );
    }

    #[test]
    fn test_config_validation_interval_and_cron() {
        let mut config = valid_config();
        config.collection_interval = Some(Duration::from_secs(30));
        config.cron = Some("0 */5 * * * *".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cannot specify both"));
    }

    #[test]
    fn test_config_validation_invalid_cron() {
        let mut config = valid_config();
        config.cron = Some("not a cron".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("invalid cron"));
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
collection_interval: 30s
collection_timeout: 10s
privileged: true
targets:
  - endpoint: 8.8.8.8
    count: 3
  - endpoint: ${PINGCHECK_UNSET_TARGET_VAR:-1.1.1.1}
    timeout: 2s
metrics:
  ping.duration.stddev:
    enabled: false
"#;
        let config = ReceiverConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.collection_interval, Some(Duration::from_secs(30)));
        assert_eq!(config.cycle_timeout(), Some(Duration::from_secs(10)));
        assert!(config.privileged);
        assert_eq!(config.targets.len(), 2);
        assert_eq!(config.targets[0].count, 3);
        assert_eq!(config.targets[1].endpoint, "1.1.1.1");
        assert_eq!(config.targets[1].timeout, Duration::from_secs(2));
        assert!(!config.metrics.is_enabled(MetricName::PingDurationStddev));
    }

    #[test]
    fn test_config_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "targets:\n  - endpoint: localhost\n").unwrap();

        let config = ReceiverConfig::load(&path).unwrap();
        assert_eq!(config.targets, vec![TargetConfig::new("localhost")]);
    }

    #[test]
    fn test_config_load_missing_file() {
        let err = ReceiverConfig::load("/nonexistent/pingcheck.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn test_cron_schedule() {
        let mut config = valid_config();
        config.cron = Some("0 */5 * * * *".to_string());
        match config.schedule().unwrap() {
            Schedule::Cron(expr) => assert_eq!(expr, "0 */5 * * * *"),
            other => panic!("expected Cron, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_timeout_means_no_deadline() {
        let mut config = valid_config();
        config.collection_timeout = Some(Duration::ZERO);
        assert_eq!(config.cycle_timeout(), None);
    }
}
