use std::env;
use std::time::Duration;

use sl_infra::LifecycleTimeouts;

use crate::error::CliError;

/// Wait timing, starting from the lifecycle defaults and overridden by:
///
/// - `SL_TRANSACTIONS_TIMEOUT_SECS`
/// - `SL_PUBLIC_ADDRESS_TIMEOUT_SECS`
/// - `SL_POLL_DELAY_SECS`
/// - `SL_MIN_POLL_INTERVAL_SECS`
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub timeouts: LifecycleTimeouts,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, CliError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CliError> {
        let secs = |key: &str| -> Result<Option<Duration>, CliError> {
            lookup(key)
                .map(|raw| {
                    raw.trim()
                        .parse::<u64>()
                        .map(Duration::from_secs)
                        .map_err(|_| {
                            CliError::Config(format!("{key} must be a whole number of seconds"))
                        })
                })
                .transpose()
        };

        let mut timeouts = LifecycleTimeouts::default();
        if let Some(timeout) = secs("SL_TRANSACTIONS_TIMEOUT_SECS")? {
            timeouts.transactions.timeout = timeout;
        }
        if let Some(timeout) = secs("SL_PUBLIC_ADDRESS_TIMEOUT_SECS")? {
            timeouts.public_address.timeout = timeout;
        }
        if let Some(delay) = secs("SL_POLL_DELAY_SECS")? {
            timeouts.transactions.delay = delay;
            timeouts.public_address.delay = delay;
        }
        if let Some(interval) = secs("SL_MIN_POLL_INTERVAL_SECS")? {
            timeouts.transactions.min_poll_interval = interval;
            timeouts.public_address.min_poll_interval = interval;
        }

        Ok(Self { timeouts })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, CliError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_overrides() {
        let config = config(&[]).unwrap();
        assert_eq!(config.timeouts, LifecycleTimeouts::default());
    }

    #[test]
    fn overrides_apply_to_both_waits() {
        let config = config(&[
            ("SL_TRANSACTIONS_TIMEOUT_SECS", "120"),
            ("SL_POLL_DELAY_SECS", "1"),
            ("SL_MIN_POLL_INTERVAL_SECS", "2"),
        ])
        .unwrap();

        assert_eq!(config.timeouts.transactions.timeout, Duration::from_secs(120));
        assert_eq!(
            config.timeouts.public_address.timeout,
            Duration::from_secs(1800)
        );
        assert_eq!(config.timeouts.public_address.delay, Duration::from_secs(1));
        assert_eq!(
            config.timeouts.transactions.min_poll_interval,
            Duration::from_secs(2)
        );
    }

    #[test]
    fn malformed_value_is_rejected() {
        let err = config(&[("SL_POLL_DELAY_SECS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("SL_POLL_DELAY_SECS"));
    }
}
