use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Protocol sidecar launched once per connection attempt.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BridgeConfig {
    /// TOML: `bridge.program`. Default: `node`.
    #[serde(default = "default_program")]
    pub program: String,

    /// TOML: `bridge.args`. Default: `["bridge.js"]`.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Browser triple announced to the server (platform, browser, version).
    /// TOML: `bridge.browser`.
    #[serde(default = "default_browser")]
    pub browser: Vec<String>,

    /// Upper bound for a single request/response round trip.
    /// TOML: `bridge.request_timeout_ms`. Default: `60000`.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl BridgeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            browser: default_browser(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_program() -> String {
    "node".to_string()
}

fn default_args() -> Vec<String> {
    vec!["bridge.js".to_string()]
}

fn default_browser() -> Vec<String> {
    ["Mac OS", "Google Chrome", "14.4.1"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_request_timeout_ms() -> u64 {
    60_000
}
