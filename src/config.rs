//! Configuration loading via `ortho-config`.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::events::{EventKind, PollPolicies, PollPolicy};

/// Default base URL of the v1 API.
pub const DEFAULT_ENDPOINT: &str = "https://api.digitalocean.com/v1";

const SECTION: &str = "digitalocean";

/// Longest accepted wait budget for a single event, one week.
pub const MAX_WAIT_TIMEOUT_SECS: u64 = 604_800;

/// DigitalOcean client configuration derived from environment variables,
/// configuration files, and CLI flags.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "DIGITALOCEAN",
    discovery(
        app_name = "dropship",
        env_var = "DROPSHIP_CONFIG_PATH",
        config_file_name = "dropship.toml",
        dotfile_name = ".dropship.toml",
        project_file_name = "dropship.toml"
    )
)]
pub struct DigitalOceanConfig {
    /// Client identifier sent as the `client_id` query parameter.
    pub client_id: String,
    /// API key sent as the `api_key` query parameter.
    pub api_key: String,
    /// Base URL of the v1 API.
    #[ortho_config(default = DEFAULT_ENDPOINT.to_owned())]
    pub endpoint: String,
    /// Per-request HTTP timeout in seconds.
    #[ortho_config(default = 30)]
    pub http_timeout_secs: u64,
    /// Budget for a droplet to finish booting.
    #[ortho_config(default = 1200)]
    pub node_running_timeout_secs: u64,
    /// Budget for a droplet to power off.
    #[ortho_config(default = 120)]
    pub node_suspended_timeout_secs: u64,
    /// Budget for a droplet to be destroyed.
    #[ortho_config(default = 30)]
    pub node_terminated_timeout_secs: u64,
    /// Budget for a snapshot image to become available.
    #[ortho_config(default = 1200)]
    pub image_available_timeout_secs: u64,
    /// Delay before the second event poll.
    #[ortho_config(default = 1000)]
    pub poll_initial_period_ms: u64,
    /// Upper bound for the delay between event polls.
    #[ortho_config(default = 10000)]
    pub poll_max_period_ms: u64,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }

    fn hint(&self) -> String {
        format!(
            "set {} or add {} to [{SECTION}] in dropship.toml",
            self.env_var, self.toml_key
        )
    }
}

const CLIENT_ID: FieldMetadata =
    FieldMetadata::new("DigitalOcean client ID", "DIGITALOCEAN_CLIENT_ID", "client_id");
const API_KEY: FieldMetadata =
    FieldMetadata::new("DigitalOcean API key", "DIGITALOCEAN_API_KEY", "api_key");
const ENDPOINT: FieldMetadata =
    FieldMetadata::new("API endpoint", "DIGITALOCEAN_ENDPOINT", "endpoint");
const HTTP_TIMEOUT: FieldMetadata = FieldMetadata::new(
    "HTTP timeout",
    "DIGITALOCEAN_HTTP_TIMEOUT_SECS",
    "http_timeout_secs",
);
const NODE_RUNNING_TIMEOUT: FieldMetadata = FieldMetadata::new(
    "node running timeout",
    "DIGITALOCEAN_NODE_RUNNING_TIMEOUT_SECS",
    "node_running_timeout_secs",
);
const NODE_SUSPENDED_TIMEOUT: FieldMetadata = FieldMetadata::new(
    "node suspended timeout",
    "DIGITALOCEAN_NODE_SUSPENDED_TIMEOUT_SECS",
    "node_suspended_timeout_secs",
);
const NODE_TERMINATED_TIMEOUT: FieldMetadata = FieldMetadata::new(
    "node terminated timeout",
    "DIGITALOCEAN_NODE_TERMINATED_TIMEOUT_SECS",
    "node_terminated_timeout_secs",
);
const IMAGE_AVAILABLE_TIMEOUT: FieldMetadata = FieldMetadata::new(
    "image available timeout",
    "DIGITALOCEAN_IMAGE_AVAILABLE_TIMEOUT_SECS",
    "image_available_timeout_secs",
);
const POLL_INITIAL: FieldMetadata = FieldMetadata::new(
    "initial poll period",
    "DIGITALOCEAN_POLL_INITIAL_PERIOD_MS",
    "poll_initial_period_ms",
);
const POLL_MAX: FieldMetadata = FieldMetadata::new(
    "maximum poll period",
    "DIGITALOCEAN_POLL_MAX_PERIOD_MS",
    "poll_max_period_ms",
);

impl DigitalOceanConfig {
    /// Builds a configuration with the given credentials and every other
    /// field at its default.
    #[must_use]
    pub fn with_credentials(client_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            http_timeout_secs: 30,
            node_running_timeout_secs: 1200,
            node_suspended_timeout_secs: 120,
            node_terminated_timeout_secs: 30,
            image_available_timeout_secs: 1200,
            poll_initial_period_ms: 1000,
            poll_max_period_ms: 10_000,
        }
    }

    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: {}",
                metadata.description,
                metadata.hint()
            )));
        }
        Ok(())
    }

    fn require_positive(value: u64, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value == 0 {
            return Err(ConfigError::Invalid(format!(
                "{} must be greater than zero: {}",
                metadata.description,
                metadata.hint()
            )));
        }
        Ok(())
    }

    fn require_wait_budget(value: u64, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value > MAX_WAIT_TIMEOUT_SECS {
            return Err(ConfigError::Invalid(format!(
                "{} of {value} s exceeds the maximum of {MAX_WAIT_TIMEOUT_SECS} s: {}",
                metadata.description,
                metadata.hint()
            )));
        }
        Ok(())
    }

    /// Loads configuration using the `ortho-config` derive. Values merge
    /// defaults, configuration files, environment variables, and CLI flags in
    /// that order of precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the loader fails to merge sources.
    pub fn load_from_sources() -> Result<Self, ConfigError> {
        Self::load().map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("dropship")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation. Error messages name the environment
    /// variable and TOML key that supply the offending value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty
    /// and [`ConfigError::Invalid`] when a duration is zero, a wait budget
    /// exceeds [`MAX_WAIT_TIMEOUT_SECS`], or the poll periods are inverted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(&self.client_id, &CLIENT_ID)?;
        Self::require_field(&self.api_key, &API_KEY)?;
        Self::require_field(&self.endpoint, &ENDPOINT)?;
        Self::require_positive(self.http_timeout_secs, &HTTP_TIMEOUT)?;
        Self::require_wait_budget(self.node_running_timeout_secs, &NODE_RUNNING_TIMEOUT)?;
        Self::require_wait_budget(self.node_suspended_timeout_secs, &NODE_SUSPENDED_TIMEOUT)?;
        Self::require_wait_budget(self.node_terminated_timeout_secs, &NODE_TERMINATED_TIMEOUT)?;
        Self::require_wait_budget(self.image_available_timeout_secs, &IMAGE_AVAILABLE_TIMEOUT)?;
        Self::require_positive(self.poll_initial_period_ms, &POLL_INITIAL)?;
        Self::require_positive(self.poll_max_period_ms, &POLL_MAX)?;
        if self.poll_initial_period_ms > self.poll_max_period_ms {
            return Err(ConfigError::Invalid(format!(
                "{} ({} ms) exceeds the {} ({} ms): {}",
                POLL_INITIAL.description,
                self.poll_initial_period_ms,
                POLL_MAX.description,
                self.poll_max_period_ms,
                POLL_MAX.hint()
            )));
        }
        Ok(())
    }

    /// Per-request HTTP timeout.
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Polling budget for a single event kind.
    #[must_use]
    pub const fn poll_policy(&self, kind: EventKind) -> PollPolicy {
        let timeout_secs = match kind {
            EventKind::NodeRunning => self.node_running_timeout_secs,
            EventKind::NodeSuspended => self.node_suspended_timeout_secs,
            EventKind::NodeTerminated => self.node_terminated_timeout_secs,
            EventKind::ImageAvailable => self.image_available_timeout_secs,
        };
        PollPolicy {
            timeout: Duration::from_secs(timeout_secs),
            initial_period: Duration::from_millis(self.poll_initial_period_ms),
            max_period: Duration::from_millis(self.poll_max_period_ms),
        }
    }

    /// Polling budgets for every event kind.
    #[must_use]
    pub const fn poll_policies(&self) -> PollPolicies {
        PollPolicies {
            node_running: self.poll_policy(EventKind::NodeRunning),
            node_suspended: self.poll_policy(EventKind::NodeSuspended),
            node_terminated: self.poll_policy(EventKind::NodeTerminated),
            image_available: self.poll_policy(EventKind::ImageAvailable),
        }
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a field holds a value outside its accepted range.
    #[error("invalid configuration value: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn valid_config() -> DigitalOceanConfig {
        DigitalOceanConfig::with_credentials("client", "secret")
    }

    #[rstest]
    fn defaults_validate(valid_config: DigitalOceanConfig) {
        assert!(valid_config.validate().is_ok());
    }

    #[rstest]
    fn poll_policy_selects_budget_per_kind(valid_config: DigitalOceanConfig) {
        let running = valid_config.poll_policy(EventKind::NodeRunning);
        assert_eq!(running.timeout, Duration::from_secs(1200));
        assert_eq!(running.initial_period, Duration::from_secs(1));
        assert_eq!(running.max_period, Duration::from_secs(10));

        let suspended = valid_config.poll_policy(EventKind::NodeSuspended);
        assert_eq!(suspended.timeout, Duration::from_secs(120));
        let terminated = valid_config.poll_policy(EventKind::NodeTerminated);
        assert_eq!(terminated.timeout, Duration::from_secs(30));
        assert_eq!(
            valid_config.poll_policies().get(EventKind::ImageAvailable),
            valid_config.poll_policy(EventKind::ImageAvailable)
        );
    }

    #[rstest]
    fn zero_poll_period_is_rejected(valid_config: DigitalOceanConfig) {
        let cfg = DigitalOceanConfig {
            poll_initial_period_ms: 0,
            ..valid_config
        };
        let err = cfg.validate().expect_err("zero period must fail");
        let ConfigError::Invalid(ref message) = err else {
            panic!("expected Invalid, got {err:?}");
        };
        assert!(message.contains("DIGITALOCEAN_POLL_INITIAL_PERIOD_MS"));
    }

    #[rstest]
    #[case("DIGITALOCEAN_NODE_RUNNING_TIMEOUT_SECS")]
    #[case("DIGITALOCEAN_NODE_SUSPENDED_TIMEOUT_SECS")]
    #[case("DIGITALOCEAN_NODE_TERMINATED_TIMEOUT_SECS")]
    #[case("DIGITALOCEAN_IMAGE_AVAILABLE_TIMEOUT_SECS")]
    fn oversized_wait_budget_is_rejected(valid_config: DigitalOceanConfig, #[case] env_var: &str) {
        let mut cfg = valid_config;
        match env_var {
            "DIGITALOCEAN_NODE_RUNNING_TIMEOUT_SECS" => cfg.node_running_timeout_secs = u64::MAX,
            "DIGITALOCEAN_NODE_SUSPENDED_TIMEOUT_SECS" => {
                cfg.node_suspended_timeout_secs = MAX_WAIT_TIMEOUT_SECS.saturating_add(1);
            }
            "DIGITALOCEAN_NODE_TERMINATED_TIMEOUT_SECS" => {
                cfg.node_terminated_timeout_secs = u64::MAX;
            }
            _ => cfg.image_available_timeout_secs = MAX_WAIT_TIMEOUT_SECS.saturating_add(1),
        }

        let err = cfg.validate().expect_err("oversized budget must fail");
        let ConfigError::Invalid(ref message) = err else {
            panic!("expected Invalid, got {err:?}");
        };
        assert!(message.contains(env_var), "unexpected message: {message}");
        assert!(message.contains("maximum"), "unexpected message: {message}");
    }

    #[rstest]
    fn longest_wait_budget_is_accepted(valid_config: DigitalOceanConfig) {
        let cfg = DigitalOceanConfig {
            node_running_timeout_secs: MAX_WAIT_TIMEOUT_SECS,
            ..valid_config
        };
        assert!(cfg.validate().is_ok());
    }

    #[rstest]
    fn inverted_poll_periods_are_rejected(valid_config: DigitalOceanConfig) {
        let cfg = DigitalOceanConfig {
            poll_initial_period_ms: 20_000,
            ..valid_config
        };
        let err = cfg.validate().expect_err("inverted periods must fail");
        assert!(matches!(err, ConfigError::Invalid(ref message) if message.contains("exceeds")));
    }
}
