mod auth;
mod basic;
mod bridge;
mod connection;
mod session;

pub use auth::{AuthBackend, AuthConfig};
pub use basic::BasicConfig;
pub use bridge::BridgeConfig;
pub use connection::{ConnectionConfig, RetryConfig};
pub use session::{SessionConfig, SessionIdTiming};

use crate::error::IzumieError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Database and logging (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Credential store backend (see `auth` table).
    #[serde(default)]
    pub auth: AuthConfig,

    /// Pairing delay and restart policy (see `connection` table).
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Session id timing and local wipe (see `session` table).
    #[serde(default)]
    pub session: SessionConfig,

    /// Protocol sidecar process (see `bridge` table).
    #[serde(default)]
    pub bridge: BridgeConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "IZUMIE_";

impl Config {
    /// Builds a Figment that merges defaults, a TOML file (if present) and `IZUMIE_*` env vars.
    ///
    /// Nested keys use `__` in env names, e.g. `IZUMIE_BASIC__DATABASE_URL`. A bare
    /// `DATABASE_URL` is also honored for `basic.database_url`.
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf);

        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        let figment = if file.is_file() {
            figment.merge(Toml::file(file))
        } else {
            figment
        };

        figment
            .merge(
                Env::raw()
                    .only(&["DATABASE_URL"])
                    .map(|_| "basic.database_url".into()),
            )
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads configuration. An explicitly given path must exist; the default `config.toml` is
    /// optional.
    pub fn load(path: Option<&Path>) -> Result<Self, IzumieError> {
        if let Some(p) = path
            && !p.is_file()
        {
            return Err(IzumieError::UnexpectedError(format!(
                "config file not found: {}",
                p.display()
            )));
        }
        Ok(Self::figment(path).extract()?)
    }
}
