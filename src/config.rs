//! Engine settings, read from the environment with logged defaults.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `ORDER_ENGINE_TIMEOUT_MS` | `10000` |
//! | `ORDER_ENGINE_DELIVERY_FEE` | `300` |
//! | `ORDER_ENGINE_CHANNEL_CAPACITY` | `32` |
//! | `ORDER_ENGINE_CALLBACK_URL` | `http://localhost:3000/checkout` |

use std::{env, fmt::Display, str::FromStr, time::Duration};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Fixed timeout applied to every API call.
    pub request_timeout: Duration,
    /// Added to the cart subtotal at checkout, in minor units.
    pub delivery_fee: u64,
    pub channel_capacity: usize,
    /// Where the payment gateway sends the browser back to.
    pub callback_base_url: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_millis(10_000),
            delivery_fee: 300,
            channel_capacity: 32,
            callback_base_url: "http://localhost:3000/checkout".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(|key| env::var(key).ok())
    }

    /// Loads from any lookup, so tests don't have to touch the process environment.
    pub fn load(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let timeout_ms: u64 = try_load(&lookup, "ORDER_ENGINE_TIMEOUT_MS", "10000")?;
        let channel_capacity: usize = try_load(&lookup, "ORDER_ENGINE_CHANNEL_CAPACITY", "32")?;
        if channel_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "ORDER_ENGINE_CHANNEL_CAPACITY",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            request_timeout: Duration::from_millis(timeout_ms),
            delivery_fee: try_load(&lookup, "ORDER_ENGINE_DELIVERY_FEE", "300")?,
            channel_capacity,
            callback_base_url: try_load(
                &lookup,
                "ORDER_ENGINE_CALLBACK_URL",
                "http://localhost:3000/checkout",
            )?,
        })
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = EngineConfig::load(|_| None).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_overrides_are_parsed() {
        let vars = HashMap::from([
            ("ORDER_ENGINE_TIMEOUT_MS", "250"),
            ("ORDER_ENGINE_DELIVERY_FEE", "450"),
        ]);
        let config = EngineConfig::load(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.request_timeout, Duration::from_millis(250));
        assert_eq!(config.delivery_fee, 450);
        assert_eq!(config.channel_capacity, 32);
    }

    #[test]
    fn test_garbage_is_an_error_not_a_panic() {
        let err = EngineConfig::load(|key| {
            (key == "ORDER_ENGINE_DELIVERY_FEE").then(|| "three hundred".to_string())
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "ORDER_ENGINE_DELIVERY_FEE",
                ..
            }
        ));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = EngineConfig::load(|key| {
            (key == "ORDER_ENGINE_CHANNEL_CAPACITY").then(|| "0".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
