//! Gateway configuration.

use std::time::Duration;

use crate::error::{Result, ToolgateError};

/// Tunables recognized by the gatekeeper.
///
/// Timed-out calls are always treated as denied for execution; only the
/// wait bound and the persistence policy are configurable.
#[derive(Debug, Clone)]
pub struct GatekeeperConfig {
    /// How long a confirmation may stay unanswered before it times out.
    pub default_timeout: Duration,
    /// Whether "always" replies may create rules that survive the session.
    /// When false, persistent requests are demoted to session scope.
    pub allow_persistent_rules: bool,
}

impl Default for GatekeeperConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(60),
            allow_persistent_rules: false,
        }
    }
}

impl GatekeeperConfig {
    /// Load from environment variables, reading `.env` if present.
    ///
    /// Recognized: `TOOLGATE_TIMEOUT_SECS`, `TOOLGATE_ALLOW_PERSISTENT_RULES`
    /// (`1`/`true`/`0`/`false`). Unset variables keep their defaults;
    /// unparseable values are configuration errors.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("TOOLGATE_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|_| {
                ToolgateError::Configuration(format!(
                    "TOOLGATE_TIMEOUT_SECS: expected seconds, got {raw:?}"
                ))
            })?;
            config.default_timeout = Duration::from_secs(secs);
        }

        if let Ok(raw) = std::env::var("TOOLGATE_ALLOW_PERSISTENT_RULES") {
            config.allow_persistent_rules = match raw.as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => {
                    return Err(ToolgateError::Configuration(format!(
                        "TOOLGATE_ALLOW_PERSISTENT_RULES: expected a boolean, got {other:?}"
                    )))
                }
            };
        }

        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_persistent_rules(mut self, allow: bool) -> Self {
        self.allow_persistent_rules = allow;
        self
    }
}
