use backon::ExponentialBuilder;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionConfig {
    /// Wait before requesting a pairing code, giving the library time to generate keys.
    /// TOML: `connection.pairing_delay_ms`. Default: `3000`.
    #[serde(default = "default_pairing_delay_ms")]
    pub pairing_delay_ms: u64,

    /// TOML: `connection.retry`.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl ConnectionConfig {
    pub fn pairing_delay(&self) -> Duration {
        Duration::from_millis(self.pairing_delay_ms)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            pairing_delay_ms: default_pairing_delay_ms(),
            retry: RetryConfig::default(),
        }
    }
}

/// Whole-connection restart policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Restarts allowed before halting. Default: `5`.
    #[serde(default = "default_max_restarts")]
    pub max_restarts: usize,

    /// Default: `2000`.
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Default: `5000`.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Default: `2.0`.
    #[serde(default = "default_factor")]
    pub factor: f32,

    /// Default: `false`.
    #[serde(default)]
    pub jitter: bool,
}

impl RetryConfig {
    pub fn backoff(&self) -> ExponentialBuilder {
        let builder = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(self.min_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms.max(self.min_delay_ms)))
            .with_factor(self.factor.max(1.0))
            .with_max_times(self.max_restarts);
        if self.jitter {
            builder.with_jitter()
        } else {
            builder
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_restarts: default_max_restarts(),
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            factor: default_factor(),
            jitter: false,
        }
    }
}

fn default_pairing_delay_ms() -> u64 {
    3000
}

fn default_max_restarts() -> usize {
    5
}

fn default_min_delay_ms() -> u64 {
    2000
}

fn default_max_delay_ms() -> u64 {
    5000
}

fn default_factor() -> f32 {
    2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use backon::BackoffBuilder;

    #[test]
    fn backoff_is_bounded_by_max_restarts() {
        let retry = RetryConfig {
            max_restarts: 3,
            min_delay_ms: 100,
            max_delay_ms: 250,
            factor: 2.0,
            jitter: false,
        };
        let delays: Vec<Duration> = retry.backoff().build().collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(250),
            ]
        );
    }
}
